// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for alertdesk integration tests.
//!
//! - [`MockSlack`]: scripted Slack responses with call capture
//! - [`MemoryStorage`]: in-memory storage with failure injection
//! - [`TestHarness`]: temp SQLite storage, a mock Slack and a rate limiter

pub mod harness;
pub mod memory_storage;
pub mod mock_slack;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_storage::MemoryStorage;
pub use mock_slack::{MockReply, MockSlack, history_page, slack_message, thread_parent};

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack Web API client.
//!
//! Issues `conversations.history` and `conversations.replies` with bearer
//! authentication and maps Slack's failure modes onto [`AlertdeskError`]
//! variants. The client never retries; that is the rate limiter's job.
//!
//! [`AlertdeskError`]: alertdesk_core::AlertdeskError

pub mod client;

pub use client::SlackClient;

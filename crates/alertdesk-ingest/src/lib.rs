// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack ingestion for alertdesk.
//!
//! [`FetchOrchestrator`] pages a channel's history and thread replies through
//! a shared [`alertdesk_resilience::RateLimiter`], persists every message
//! idempotently and records the run in the fetch history.

pub mod orchestrator;

pub use orchestrator::{FetchOrchestrator, FetchOutcome, FetchRequest};

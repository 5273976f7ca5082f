// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for outbound Slack traffic.
//!
//! [`RateLimiter`] caps how many operations start inside a sliding window and
//! retries operations that fail with an explicit rate-limit signal.

pub mod rate_limiter;

pub use rate_limiter::{RateLimitSignal, RateLimiter};

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every alertdesk crate.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across alertdesk adapter traits and pipelines.
#[derive(Debug, Error)]
pub enum AlertdeskError {
    /// Configuration errors (invalid TOML, missing token, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Slack answered with `ok: false`; `code` is Slack's error string.
    #[error("Slack API error: {code}")]
    Slack { code: String },

    /// Slack answered HTTP 429. `retry_after` comes from the `retry-after` header.
    #[error("rate limited by Slack (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Transport-level failures (connection refused, undecodable body, timeout).
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected before reaching storage (bad regex, bad channel ID format).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AlertdeskError {
    /// Returns `true` when the error is an HTTP 429 signal from Slack.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AlertdeskError::RateLimited { .. })
    }
}

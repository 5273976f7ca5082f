// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key
//! fails at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level alertdesk configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlertdeskConfig {
    #[serde(default)]
    pub log: LogConfig,

    /// Slack Web API access.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Outbound request budget shared by all fetches in a process.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl AlertdeskConfig {
    /// Render the configuration as TOML with the bot token masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.slack.bot_token.is_some() {
            shown.slack.bot_token = Some("[REDACTED]".to_string());
        }
        toml::to_string_pretty(&shown)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// trace, debug, info, warn or error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Slack Web API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`). Also read from `SLACK_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Page size for `conversations.history`.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_api_base_url(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Sliding-window request cap and retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum invocations inside one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Retries after an HTTP 429 before the error is returned.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_requests() -> usize {
    20
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_retries() -> u32 {
    3
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("alertdesk").join("alertdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("alertdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

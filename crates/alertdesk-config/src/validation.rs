// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::AlertdeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &AlertdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let base = config.slack.api_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("slack.api_base_url `{base}` must be an http(s) URL"),
        });
    }

    if !(1..=999).contains(&config.slack.page_limit) {
        errors.push(ConfigError::Validation {
            message: format!(
                "slack.page_limit must be between 1 and 999, got {}",
                config.slack.page_limit
            ),
        });
    }

    if config.slack.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "slack.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    if let Some(token) = &config.slack.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "slack.bot_token must not be empty when set".to_string(),
        });
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.max_requests must be at least 1".to_string(),
        });
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.window_ms must be greater than 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/alertdesk/alertdesk.toml`
//! 3. `~/.config/alertdesk/alertdesk.toml`
//! 4. `./alertdesk.toml`
//! 5. `SLACK_BOT_TOKEN` (token only)
//! 6. `ALERTDESK_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AlertdeskConfig;

pub const SYSTEM_CONFIG: &str = "/etc/alertdesk/alertdesk.toml";
pub const LOCAL_CONFIG: &str = "alertdesk.toml";

/// Top-level sections that `ALERTDESK_<SECTION>_<KEY>` variables map into.
const ENV_SECTIONS: &[&str] = &["rate_limit", "storage", "slack", "log"];

/// `~/.config/alertdesk/alertdesk.toml`, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("alertdesk").join("alertdesk.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<AlertdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<AlertdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AlertdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AlertdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AlertdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(slack_token_fallback())
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(AlertdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(slack_token_fallback())
        .merge(env_provider())
}

/// `SLACK_BOT_TOKEN`, the name Slack tooling conventionally uses.
fn slack_token_fallback() -> Env {
    Env::raw()
        .only(&["SLACK_BOT_TOKEN"])
        .map(|_| "slack.bot_token".into())
}

/// `ALERTDESK_*` variables with explicit section mapping.
///
/// Splitting on `_` would turn `ALERTDESK_SLACK_BOT_TOKEN` into
/// `slack.bot.token`, so only the section prefix is converted.
fn env_provider() -> Env {
    Env::prefixed("ALERTDESK_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key (`slack_bot_token`) to a
/// dotted config path (`slack.bot_token`).
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            .filter(|r| !r.is_empty())
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_section_prefix_only() {
        assert_eq!(map_env_key("slack_bot_token"), "slack.bot_token");
        assert_eq!(map_env_key("rate_limit_max_requests"), "rate_limit.max_requests");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("log_level"), "log.level");
    }

    #[test]
    fn leaves_unknown_keys_alone() {
        assert_eq!(map_env_key("unrelated"), "unrelated");
        assert_eq!(map_env_key("slack"), "slack");
    }
}

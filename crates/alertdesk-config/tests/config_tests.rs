// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the alertdesk configuration system.

use alertdesk_config::diagnostic::ConfigError;
use alertdesk_config::model::AlertdeskConfig;
use alertdesk_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[log]
level = "debug"

[slack]
bot_token = "xoxb-test"
api_base_url = "http://localhost:9000/api"
page_limit = 200
request_timeout_secs = 10

[rate_limit]
max_requests = 5
window_ms = 1000
max_retries = 1

[storage]
database_path = "/tmp/alertdesk-test.db"
wal_mode = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-test"));
    assert_eq!(config.slack.api_base_url, "http://localhost:9000/api");
    assert_eq!(config.slack.page_limit, 200);
    assert_eq!(config.slack.request_timeout_secs, 10);
    assert_eq!(config.rate_limit.max_requests, 5);
    assert_eq!(config.rate_limit.window_ms, 1000);
    assert_eq!(config.rate_limit.max_retries, 1);
    assert_eq!(config.storage.database_path, "/tmp/alertdesk-test.db");
    assert!(!config.storage.wal_mode);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.log.level, "info");
    assert_eq!(config.slack.bot_token, None);
    assert_eq!(config.slack.api_base_url, "https://slack.com/api");
    assert_eq!(config.slack.page_limit, 100);
    assert_eq!(config.slack.request_timeout_secs, 30);
    assert_eq!(config.rate_limit.max_requests, 20);
    assert_eq!(config.rate_limit.window_ms, 60_000);
    assert_eq!(config.rate_limit.max_retries, 3);
    assert!(config.storage.wal_mode);
    assert!(config.storage.database_path.ends_with("alertdesk.db"));
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = load_config_from_str("[rate_limit]\nmax_requests = 2\n").unwrap();
    assert_eq!(config.rate_limit.max_requests, 2);
    assert_eq!(config.rate_limit.window_ms, 60_000);
}

#[test]
fn dotted_override_maps_to_bot_token() {
    use figment::{Figment, providers::Serialized};

    let config: AlertdeskConfig = Figment::new()
        .merge(Serialized::defaults(AlertdeskConfig::default()))
        .merge(("slack.bot_token", "xoxb-from-env"))
        .extract()
        .expect("dot notation should reach slack.bot_token");

    assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-from-env"));
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[telegram]\nbot_token = \"x\"\n").expect_err("unknown section");
    let msg = err.to_string();
    assert!(msg.contains("telegram") || msg.contains("unknown field"), "{msg}");
}

#[test]
fn unknown_key_gets_suggestion_and_valid_keys() {
    let toml = r#"
[slack]
bot_tokn = "xoxb"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "bot_tokn"
                && suggestion.as_deref() == Some("bot_token")
                && valid_keys.contains("page_limit")
        })
    });
    assert!(found, "expected UnknownKey for bot_tokn, got: {errors:?}");
}

#[test]
fn wrong_type_is_reported_with_key_path() {
    let toml = r#"
[rate_limit]
max_requests = "twenty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::InvalidType { key, .. } if key.contains("max_requests"))
    });
    assert!(found, "expected InvalidType for max_requests, got: {errors:?}");
}

#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str("[slack]\npage_limit = 1000\n").expect_err("out of range");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("page_limit")))
    );
}

#[test]
fn config_errors_render_through_miette() {
    let errors = load_and_validate_str("[storage]\nwal_mod = true\n").expect_err("typo");
    let handler = miette::GraphicalReportHandler::new();
    let mut out = String::new();
    handler
        .render_report(&mut out, &errors[0] as &dyn miette::Diagnostic)
        .expect("render");
    assert!(out.contains("wal_mod"));
    assert!(out.contains("wal_mode"));
}

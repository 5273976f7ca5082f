// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment overrides. Serialized because they mutate process env.

use std::io::Write;

use alertdesk_config::load_config_from_path;
use serial_test::serial;

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn prefixed_env_overrides_file() {
    let file = config_file("[rate_limit]\nmax_requests = 5\n");
    // SAFETY: serialized with every other env-mutating test.
    unsafe { std::env::set_var("ALERTDESK_RATE_LIMIT_MAX_REQUESTS", "7") };
    let config = load_config_from_path(file.path());
    unsafe { std::env::remove_var("ALERTDESK_RATE_LIMIT_MAX_REQUESTS") };

    assert_eq!(config.unwrap().rate_limit.max_requests, 7);
}

#[test]
#[serial]
fn slack_bot_token_fallback_and_precedence() {
    let file = config_file("");
    unsafe { std::env::set_var("SLACK_BOT_TOKEN", "xoxb-fallback") };
    let fallback = load_config_from_path(file.path()).unwrap();

    unsafe { std::env::set_var("ALERTDESK_SLACK_BOT_TOKEN", "xoxb-prefixed") };
    let prefixed = load_config_from_path(file.path()).unwrap();

    unsafe {
        std::env::remove_var("SLACK_BOT_TOKEN");
        std::env::remove_var("ALERTDESK_SLACK_BOT_TOKEN");
    }

    assert_eq!(fallback.slack.bot_token.as_deref(), Some("xoxb-fallback"));
    assert_eq!(prefixed.slack.bot_token.as_deref(), Some("xoxb-prefixed"));
}

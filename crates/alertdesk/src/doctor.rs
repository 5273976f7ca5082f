// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `alertdesk doctor` command implementation.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use alertdesk_config::AlertdeskConfig;
use alertdesk_core::{HealthStatus, PluginAdapter, StorageAdapter};
use alertdesk_slack::SlackClient;
use alertdesk_storage::SqliteStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &'static str, start: Instant, status: CheckStatus, message: String) -> Self {
        Self {
            name,
            status,
            message,
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print a report. Fails when any check fails.
pub async fn run_doctor(config: &AlertdeskConfig) -> ExitCode {
    let use_color = std::io::stdout().is_terminal();
    let results = vec![
        check_database(config).await,
        check_slack_token(config),
        check_rate_limit(config),
    ];

    println!();
    println!("  alertdesk doctor");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_result(result, use_color));
    }
    println!();

    let failed = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
    let warned = results.iter().filter(|r| r.status == CheckStatus::Warn).count();
    if failed + warned == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {failed} failed, {warned} warning(s).");
    }
    println!();

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn format_result(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let ms = result.duration.as_millis();
    let (symbol, message) = match (result.status, use_color) {
        (CheckStatus::Pass, true) => ("✓".green().to_string(), result.message.clone()),
        (CheckStatus::Warn, true) => ("!".yellow().to_string(), result.message.yellow().to_string()),
        (CheckStatus::Fail, true) => ("✗".red().to_string(), result.message.red().to_string()),
        (CheckStatus::Pass, false) => ("[OK]  ".to_string(), result.message.clone()),
        (CheckStatus::Warn, false) => ("[WARN]".to_string(), result.message.clone()),
        (CheckStatus::Fail, false) => ("[FAIL]".to_string(), result.message.clone()),
    };
    format!("    {symbol} {:<14} {message} ({ms}ms)", result.name)
}

/// Open the database, run migrations and an integrity check.
async fn check_database(config: &AlertdeskConfig) -> CheckResult {
    let start = Instant::now();
    let storage = SqliteStorage::new(config.storage.clone());
    if let Err(e) = storage.initialize().await {
        return CheckResult::new("Database", start, CheckStatus::Fail, format!("open failed: {e}"));
    }
    let result = match storage.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(
            "Database",
            start,
            CheckStatus::Pass,
            config.storage.database_path.clone(),
        ),
        Ok(HealthStatus::Degraded(msg)) => {
            CheckResult::new("Database", start, CheckStatus::Warn, msg)
        }
        Ok(HealthStatus::Unhealthy(msg)) => {
            CheckResult::new("Database", start, CheckStatus::Fail, msg)
        }
        Err(e) => CheckResult::new("Database", start, CheckStatus::Fail, e.to_string()),
    };
    let _ = storage.shutdown().await;
    result
}

/// The token is only checked for presence; no Slack call is made.
fn check_slack_token(config: &AlertdeskConfig) -> CheckResult {
    let start = Instant::now();
    match SlackClient::new(&config.slack) {
        Ok(_) => CheckResult::new(
            "Slack token",
            start,
            CheckStatus::Pass,
            format!("configured ({})", config.slack.api_base_url),
        ),
        Err(e) => CheckResult::new("Slack token", start, CheckStatus::Warn, e.to_string()),
    }
}

fn check_rate_limit(config: &AlertdeskConfig) -> CheckResult {
    let start = Instant::now();
    let rl = &config.rate_limit;
    let message = format!(
        "{} request(s) per {}ms, {} retr(ies)",
        rl.max_requests, rl.window_ms, rl.max_retries
    );
    let status = if rl.max_retries == 0 {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    CheckResult::new("Rate limit", start, status, message)
}

#[cfg(test)]
mod tests {
    use alertdesk_config::StorageConfig;

    use super::*;

    fn config_with_db(dir: &tempfile::TempDir) -> AlertdeskConfig {
        AlertdeskConfig {
            storage: StorageConfig {
                database_path: dir.path().join("doctor.db").to_string_lossy().to_string(),
                wal_mode: true,
            },
            ..AlertdeskConfig::default()
        }
    }

    #[tokio::test]
    async fn database_check_passes_on_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_database(&config_with_db(&dir)).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[test]
    fn missing_token_is_a_warning() {
        let config = AlertdeskConfig::default();
        assert_eq!(check_slack_token(&config).status, CheckStatus::Warn);

        let mut config = AlertdeskConfig::default();
        config.slack.bot_token = Some("xoxb-test".into());
        assert_eq!(check_slack_token(&config).status, CheckStatus::Pass);
    }

    #[test]
    fn plain_output_has_status_tags() {
        let result = CheckResult {
            name: "Database",
            status: CheckStatus::Fail,
            message: "locked".into(),
            duration: Duration::from_millis(3),
        };
        let line = format_result(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("locked (3ms)"));
    }
}

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! alertdesk - Slack incident ingestion and classification.
//!
//! Binary entry point: loads configuration, installs tracing and dispatches
//! subcommands.

mod admin;
mod classify;
mod doctor;
mod fetch;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alertdesk_config::{AlertdeskConfig, ConfigError};
use alertdesk_core::{AlertdeskError, PluginAdapter, StorageAdapter};
use alertdesk_storage::SqliteStorage;
use clap::{Parser, Subcommand};
use tracing::error;

/// alertdesk - Slack incident ingestion and classification.
#[derive(Parser, Debug)]
#[command(name = "alertdesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch channel history and thread replies from Slack.
    Fetch(fetch::FetchArgs),
    /// Manage registered Slack channels.
    #[command(subcommand)]
    Channel(admin::ChannelCommand),
    /// Manage urgency and impact rules.
    #[command(subcommand)]
    Rule(admin::RuleCommand),
    /// Classify text or stored channel messages.
    Classify(classify::ClassifyArgs),
    /// Show fetch history for a channel.
    Runs(admin::RunsArgs),
    /// Check configuration, database and Slack credentials.
    Doctor,
    /// Print the effective configuration with secrets masked.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            alertdesk_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log.level);

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<AlertdeskConfig, Vec<ConfigError>> {
    match path {
        Some(path) => alertdesk_config::load_and_validate_path(path),
        None => alertdesk_config::load_and_validate(),
    }
}

async fn run(command: Commands, config: &AlertdeskConfig) -> Result<ExitCode, AlertdeskError> {
    match command {
        Commands::Doctor => return Ok(doctor::run_doctor(config).await),
        Commands::Config => {
            let rendered = config
                .to_redacted_toml()
                .map_err(|e| AlertdeskError::Config(e.to_string()))?;
            print!("{rendered}");
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let result = match command {
        Commands::Fetch(args) => fetch::run_fetch(config, storage.clone(), &args).await,
        Commands::Channel(cmd) => admin::run_channel(storage.as_ref(), cmd)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Rule(cmd) => admin::run_rule(storage.as_ref(), cmd)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Classify(args) => classify::run_classify(storage.clone(), &args)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Runs(args) => admin::run_runs(storage.as_ref(), &args)
            .await
            .map(|()| ExitCode::SUCCESS),
        Commands::Doctor | Commands::Config => Ok(ExitCode::SUCCESS),
    };

    if let Err(err) = storage.shutdown().await {
        error!(error = %err, "failed to close storage");
    }
    result
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("alertdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fetch_with_dates() {
        let cli = Cli::try_parse_from([
            "alertdesk",
            "fetch",
            "--channel",
            "C024BE91L",
            "--from",
            "2022-01-01",
            "--to",
            "2022-01-02T12:00:00Z",
        ])
        .unwrap();
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.channel.as_deref(), Some("C024BE91L"));
        assert_eq!(args.from.timestamp(), 1_640_995_200);
        assert_eq!(args.to.map(|t| t.timestamp()), Some(1_641_124_800));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["alertdesk", "doctor", "--config", "/tmp/a.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
    }

    #[test]
    fn rejects_unknown_rule_level() {
        let err = Cli::try_parse_from([
            "alertdesk", "rule", "add", "urgency", "--name", "n", "--pattern", "p", "--value",
            "critical",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let config = alertdesk_config::load_and_validate_str("").expect("defaults are valid");
        assert_eq!(config.log.level, "info");
    }
}

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel, rule and fetch-history administration commands.

use alertdesk_core::{
    AlertdeskError, Channel, ClassificationRule, FetchRun, Level, NewRule, RuleKind, RuleUpdate,
    StorageAdapter,
};
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum ChannelCommand {
    /// Register a Slack channel for ingestion.
    Add {
        /// Slack channel ID, e.g. C024BE91L.
        slack_channel_id: String,
        /// Display name.
        name: String,
    },
    /// List registered channels.
    List,
    /// Include a channel in `fetch --all`.
    Enable { channel: String },
    /// Exclude a channel from `fetch --all`.
    Disable { channel: String },
}

#[derive(Subcommand, Debug)]
pub enum RuleCommand {
    /// Create a rule.
    Add {
        /// `urgency` or `impact`.
        kind: RuleKind,
        #[arg(long)]
        name: String,
        /// Regular expression, matched case-insensitively.
        #[arg(long)]
        pattern: String,
        /// `high`, `medium` or `low`.
        #[arg(long)]
        value: Level,
        /// Create the rule disabled.
        #[arg(long)]
        disabled: bool,
    },
    /// List rules, both kinds unless one is given.
    List {
        kind: Option<RuleKind>,
        #[arg(long)]
        enabled_only: bool,
    },
    /// Change fields of an existing rule.
    Update {
        kind: RuleKind,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        value: Option<Level>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Delete a rule.
    Delete { kind: RuleKind, id: String },
}

#[derive(Args, Debug)]
pub struct RunsArgs {
    /// Internal id or Slack channel ID.
    pub channel: String,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

/// Find a channel by internal id, falling back to its Slack channel ID.
pub async fn resolve_channel(
    storage: &dyn StorageAdapter,
    key: &str,
) -> Result<Channel, AlertdeskError> {
    if let Some(channel) = storage.get_channel(key).await? {
        return Ok(channel);
    }
    storage
        .list_channels()
        .await?
        .into_iter()
        .find(|c| c.slack_channel_id == key)
        .ok_or_else(|| AlertdeskError::NotFound {
            entity: "channel",
            id: key.to_string(),
        })
}

pub async fn run_channel(
    storage: &dyn StorageAdapter,
    command: ChannelCommand,
) -> Result<(), AlertdeskError> {
    match command {
        ChannelCommand::Add {
            slack_channel_id,
            name,
        } => {
            let channel = storage.create_channel(&slack_channel_id, &name).await?;
            println!("{}", channel_line(&channel));
        }
        ChannelCommand::List => {
            let channels = storage.list_channels().await?;
            if channels.is_empty() {
                println!("No channels registered.");
            }
            for channel in &channels {
                println!("{}", channel_line(channel));
            }
        }
        ChannelCommand::Enable { channel } => {
            let channel = set_enabled(storage, &channel, true).await?;
            println!("{}", channel_line(&channel));
        }
        ChannelCommand::Disable { channel } => {
            let channel = set_enabled(storage, &channel, false).await?;
            println!("{}", channel_line(&channel));
        }
    }
    Ok(())
}

async fn set_enabled(
    storage: &dyn StorageAdapter,
    key: &str,
    enabled: bool,
) -> Result<Channel, AlertdeskError> {
    let channel = resolve_channel(storage, key).await?;
    storage.set_channel_enabled(&channel.id, enabled).await
}

pub async fn run_rule(
    storage: &dyn StorageAdapter,
    command: RuleCommand,
) -> Result<(), AlertdeskError> {
    match command {
        RuleCommand::Add {
            kind,
            name,
            pattern,
            value,
            disabled,
        } => {
            let rule = storage
                .create_rule(
                    kind,
                    &NewRule {
                        name,
                        pattern,
                        value,
                        enabled: !disabled,
                    },
                )
                .await?;
            println!("{}", rule_line(&rule));
        }
        RuleCommand::List { kind, enabled_only } => {
            let kinds = match kind {
                Some(kind) => vec![kind],
                None => vec![RuleKind::Urgency, RuleKind::Impact],
            };
            for kind in kinds {
                for rule in storage.list_rules(kind, enabled_only).await? {
                    println!("{}", rule_line(&rule));
                }
            }
        }
        RuleCommand::Update {
            kind,
            id,
            name,
            pattern,
            value,
            enabled,
        } => {
            let update = RuleUpdate {
                name,
                pattern,
                value,
                enabled,
            };
            if update == RuleUpdate::default() {
                return Err(AlertdeskError::Validation(
                    "nothing to update: pass at least one of --name, --pattern, --value, --enabled"
                        .to_string(),
                ));
            }
            let rule = storage.update_rule(kind, &id, &update).await?;
            println!("{}", rule_line(&rule));
        }
        RuleCommand::Delete { kind, id } => {
            storage.delete_rule(kind, &id).await?;
            println!("deleted {kind} rule {id}");
        }
    }
    Ok(())
}

pub async fn run_runs(storage: &dyn StorageAdapter, args: &RunsArgs) -> Result<(), AlertdeskError> {
    let channel = resolve_channel(storage, &args.channel).await?;
    let runs = storage.list_fetch_runs(&channel.id, Some(args.limit)).await?;
    if runs.is_empty() {
        println!("No fetch runs for #{}.", channel.name);
    }
    for run in &runs {
        println!("{}", run_line(run));
    }
    Ok(())
}

fn channel_line(channel: &Channel) -> String {
    format!(
        "{}  {:<12} #{:<20} {}",
        channel.id,
        channel.slack_channel_id,
        channel.name,
        if channel.enabled { "enabled" } else { "disabled" }
    )
}

fn rule_line(rule: &ClassificationRule) -> String {
    format!(
        "{}  {:<7} {:<6} {:<8} {:<24} /{}/",
        rule.id,
        rule.kind,
        rule.value,
        if rule.enabled { "enabled" } else { "disabled" },
        rule.name,
        rule.pattern
    )
}

fn run_line(run: &FetchRun) -> String {
    let mut line = format!(
        "{}  {:<11} {} .. {}  fetched={} api_calls={}",
        run.created_at, run.status, run.range_from, run.range_to, run.fetched_count, run.api_calls
    );
    if let Some(error) = &run.error_message {
        line.push_str(&format!("  error={error}"));
    }
    line
}

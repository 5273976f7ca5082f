// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `alertdesk fetch` command implementation.

use std::process::ExitCode;
use std::sync::Arc;

use alertdesk_config::AlertdeskConfig;
use alertdesk_core::{AlertdeskError, Channel, FetchStatus, StorageAdapter};
use alertdesk_ingest::{FetchOrchestrator, FetchOutcome, FetchRequest};
use alertdesk_resilience::RateLimiter;
use alertdesk_slack::SlackClient;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Channel to fetch: internal id or Slack channel ID.
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    pub channel: Option<String>,

    /// Fetch every enabled channel.
    #[arg(long)]
    pub all: bool,

    /// Start of the range (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    pub from: DateTime<Utc>,

    /// End of the range (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_date)]
    pub to: Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (UTC midnight).
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| format!("expected RFC 3339 or YYYY-MM-DD, got '{value}'"))
}

pub async fn run_fetch(
    config: &AlertdeskConfig,
    storage: Arc<dyn StorageAdapter>,
    args: &FetchArgs,
) -> Result<ExitCode, AlertdeskError> {
    let channels = match &args.channel {
        Some(key) => vec![crate::admin::resolve_channel(storage.as_ref(), key).await?],
        None => storage
            .list_channels()
            .await?
            .into_iter()
            .filter(|c| c.enabled)
            .collect(),
    };
    if channels.is_empty() {
        println!("No enabled channels to fetch.");
        return Ok(ExitCode::SUCCESS);
    }

    let slack = Arc::new(SlackClient::new(&config.slack)?);
    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let orchestrator =
        FetchOrchestrator::new(slack, storage, limiter).with_page_limit(config.slack.page_limit);

    let end_date = args.to.unwrap_or_else(Utc::now);
    info!(channels = channels.len(), from = %args.from, to = %end_date, "starting fetch");

    let outcomes = futures::future::join_all(channels.iter().map(|channel| {
        let request = FetchRequest {
            channel_id: channel.id.clone(),
            start_date: args.from,
            end_date,
        };
        let orchestrator = &orchestrator;
        async move { orchestrator.fetch_channel_messages(&request).await }
    }))
    .await;

    let mut failed = 0;
    for (channel, outcome) in channels.iter().zip(&outcomes) {
        println!("{}", summary_line(channel, outcome));
        if outcome.status == FetchStatus::Failed {
            failed += 1;
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn summary_line(channel: &Channel, outcome: &FetchOutcome) -> String {
    let mut line = format!(
        "#{} ({}): {}, {} new message(s), {} API call(s)",
        channel.name,
        channel.slack_channel_id,
        outcome.status,
        outcome.fetched_count,
        outcome.api_calls
    );
    if !outcome.failed_threads.is_empty() {
        line.push_str(&format!(
            ", {} thread(s) skipped",
            outcome.failed_threads.len()
        ));
    }
    if let Some(error) = &outcome.error {
        line.push_str(&format!(": {error}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_date_as_utc_midnight() {
        let at = parse_date("2022-01-01").unwrap();
        assert_eq!(at.timestamp(), 1_640_995_200);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let at = parse_date("2022-01-01T09:00:00+09:00").unwrap();
        assert_eq!(at.timestamp(), 1_640_995_200);
    }

    #[test]
    fn rejects_other_formats() {
        assert!(parse_date("01/02/2022").is_err());
        assert!(parse_date("2022-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn summary_mentions_skipped_threads_and_error() {
        let channel = Channel {
            id: "ch".into(),
            slack_channel_id: "C0OPS".into(),
            name: "ops".into(),
            enabled: true,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let outcome = FetchOutcome {
            run_id: Some("run".into()),
            fetched_count: 3,
            api_calls: 4,
            status: FetchStatus::Failed,
            error: Some("Slack API error: not_in_channel".into()),
            failed_threads: vec!["1.0".into()],
        };
        let line = summary_line(&channel, &outcome);
        assert_eq!(
            line,
            "#ops (C0OPS): failed, 3 new message(s), 4 API call(s), 1 thread(s) skipped: Slack API error: not_in_channel"
        );
    }
}

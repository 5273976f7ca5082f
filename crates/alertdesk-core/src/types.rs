// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::slack::SlackMessage;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// Message source (the Slack Web API).
    Source,
    /// Persistence backend.
    Storage,
}

/// Urgency or impact level assigned by a classification rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    /// Fixed precedence used when several rules fire: high=3 > medium=2 > low=1.
    pub fn rank(self) -> u8 {
        match self {
            Level::High => 3,
            Level::Medium => 2,
            Level::Low => 1,
        }
    }
}

/// Incident class derived from urgency and impact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum IncidentType {
    /// Service outage (`障害`).
    #[strum(serialize = "障害")]
    #[serde(rename = "障害")]
    Outage,
    /// Defect with limited blast radius (`不具合`).
    #[strum(serialize = "不具合")]
    #[serde(rename = "不具合")]
    Bug,
}

/// Which rule collection a [`ClassificationRule`] belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Urgency,
    Impact,
}

/// Lifecycle of a persisted fetch run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FetchRunStatus {
    InProgress,
    Completed,
    Failed,
}

/// Status reported to callers of a channel fetch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Completed,
    Failed,
    /// Part of the external fetch contract. Runs currently end `Completed`
    /// even when individual threads fail; see `FetchOutcome::failed_threads`.
    Partial,
}

/// A Slack channel registered for ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub slack_channel_id: String,
    pub name: String,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A stored Slack message, unique per `(channel_id, slack_ts)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    pub channel_id: String,
    pub slack_ts: String,
    /// The original Slack payload, kept opaque.
    pub raw: serde_json::Value,
    pub posted_at: String,
    pub created_at: String,
}

impl RawMessage {
    /// Message text from the stored payload, if present.
    pub fn text(&self) -> Option<&str> {
        self.raw.get("text").and_then(|t| t.as_str())
    }
}

/// Insert request for a raw message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRawMessage {
    pub channel_id: String,
    pub slack_ts: String,
    pub raw: serde_json::Value,
    pub posted_at: DateTime<Utc>,
}

impl NewRawMessage {
    /// Build an insert request from a Slack payload.
    ///
    /// Returns `None` when the payload has no usable `ts`, since that is the
    /// deduplication key.
    pub fn from_slack(channel_id: &str, message: &SlackMessage) -> Option<Self> {
        let ts = message.ts()?;
        let posted_at = crate::slack::parse_slack_ts(ts)?;
        Some(Self {
            channel_id: channel_id.to_string(),
            slack_ts: ts.to_string(),
            raw: message.to_value(),
            posted_at,
        })
    }
}

/// Result of inserting a raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// A row with the same `(channel_id, slack_ts)` already existed.
    Duplicate,
}

/// One invocation of the fetch orchestrator for a channel and date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRun {
    pub id: String,
    pub channel_id: String,
    pub range_from: String,
    pub range_to: String,
    pub status: FetchRunStatus,
    pub fetched_count: u32,
    pub api_calls: u32,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert request for a fetch run. New runs always start `in_progress` with zero counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFetchRun {
    pub channel_id: String,
    pub range_from: DateTime<Utc>,
    pub range_to: DateTime<Utc>,
}

/// A regex-to-level mapping used by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub id: String,
    pub kind: RuleKind,
    pub name: String,
    pub pattern: String,
    pub value: Level,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Create request for a classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub name: String,
    pub pattern: String,
    pub value: Level,
    pub enabled: bool,
}

/// Partial update for a classification rule; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub pattern: Option<String>,
    pub value: Option<Level>,
    pub enabled: Option<bool>,
}

/// Urgency, impact and derived type for an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub urgency: Option<Level>,
    pub impact: Option<Level>,
    pub incident_type: Option<IncidentType>,
    /// Set when the values came from rule evaluation rather than an operator.
    pub auto_classified: bool,
    pub urgency_manual: bool,
    pub impact_manual: bool,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn level_ranks_are_strictly_ordered() {
        assert!(Level::High.rank() > Level::Medium.rank());
        assert!(Level::Medium.rank() > Level::Low.rank());
        assert_eq!(Level::Low.rank(), 1);
    }

    #[test]
    fn level_parses_lowercase_names() {
        assert_eq!(Level::from_str("high").unwrap(), Level::High);
        assert_eq!(Level::Medium.to_string(), "medium");
        assert!(Level::from_str("urgent").is_err());
    }

    #[test]
    fn incident_type_uses_japanese_labels() {
        assert_eq!(IncidentType::Outage.to_string(), "障害");
        assert_eq!(IncidentType::from_str("不具合").unwrap(), IncidentType::Bug);
        let json = serde_json::to_string(&IncidentType::Outage).unwrap();
        assert_eq!(json, "\"障害\"");
    }

    #[test]
    fn fetch_run_status_is_snake_case() {
        assert_eq!(FetchRunStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            FetchRunStatus::from_str("completed").unwrap(),
            FetchRunStatus::Completed
        );
    }

    #[test]
    fn raw_message_text_reads_payload() {
        let msg = RawMessage {
            id: 1,
            channel_id: "ch".into(),
            slack_ts: "1.0".into(),
            raw: serde_json::json!({"text": "サーバー停止"}),
            posted_at: "2022-01-01T00:00:00+00:00".into(),
            created_at: "2022-01-01T00:00:00+00:00".into(),
        };
        assert_eq!(msg.text(), Some("サーバー停止"));
    }

    #[test]
    fn new_raw_message_requires_ts() {
        let with_ts: SlackMessage =
            serde_json::from_value(serde_json::json!({"ts": "1641038400.000100", "text": "hi"}))
                .unwrap();
        let row = NewRawMessage::from_slack("ch-1", &with_ts).unwrap();
        assert_eq!(row.slack_ts, "1641038400.000100");
        assert_eq!(row.posted_at.timestamp(), 1_641_038_400);

        let without_ts: SlackMessage =
            serde_json::from_value(serde_json::json!({"text": "no ts"})).unwrap();
        assert!(NewRawMessage::from_slack("ch-1", &without_ts).is_none());
    }
}

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack Web API request parameters and response shapes.
//!
//! Only `conversations.history` and `conversations.replies` are modelled.
//! Message payloads stay as opaque JSON maps so that fields Slack adds later
//! are persisted untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters for `conversations.history`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryParams {
    /// External Slack channel ID (`C...`).
    pub channel: String,
    /// Lower bound, epoch seconds.
    pub oldest: Option<String>,
    /// Upper bound, epoch seconds.
    pub latest: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Parameters for `conversations.replies`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepliesParams {
    pub channel: String,
    /// Timestamp of the thread's parent message.
    pub ts: String,
    pub cursor: Option<String>,
}

/// Pagination metadata returned alongside a page of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Envelope shared by both conversation endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackResponse {
    pub ok: bool,
    #[serde(default)]
    pub messages: Vec<SlackMessage>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl SlackResponse {
    /// Cursor for the next page. Slack signals the last page with an empty string.
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata
            .as_ref()
            .and_then(|m| m.next_cursor.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A single Slack message, kept as the raw JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlackMessage(pub serde_json::Map<String, serde_json::Value>);

impl SlackMessage {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn ts(&self) -> Option<&str> {
        self.str_field("ts").filter(|ts| !ts.is_empty())
    }

    pub fn text(&self) -> Option<&str> {
        self.str_field("text")
    }

    pub fn thread_ts(&self) -> Option<&str> {
        self.str_field("thread_ts").filter(|ts| !ts.is_empty())
    }

    /// `reply_count` from the payload; missing or non-numeric reads as zero.
    pub fn reply_count(&self) -> u64 {
        self.0
            .get("reply_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// True for thread parents that have at least one reply.
    pub fn has_replies(&self) -> bool {
        self.thread_ts().is_some() && self.reply_count() > 0
    }

    /// Time the message was posted, derived from `ts`.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.ts().and_then(parse_slack_ts)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }
}

impl From<serde_json::Value> for SlackMessage {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => SlackMessage(map),
            _ => SlackMessage::default(),
        }
    }
}

/// Parse a Slack `ts` (`"<seconds>.<micros>"`) into a UTC timestamp.
pub fn parse_slack_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = match ts.split_once('.') {
        Some((s, f)) => (s, f),
        None => (ts, ""),
    };
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = if frac.is_empty() {
        0
    } else {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Right-pad or truncate to six digits.
        let mut digits: String = frac.chars().take(6).collect();
        while digits.len() < 6 {
            digits.push('0');
        }
        digits.parse().ok()?
    };
    DateTime::from_timestamp(secs, micros * 1_000)
}

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted Slack API for deterministic tests.
//!
//! History pages are served in the order they were queued. Thread replies
//! are queued per parent `ts`. An empty queue answers with an empty page.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use alertdesk_core::slack::ResponseMetadata;
use alertdesk_core::{
    AdapterType, AlertdeskError, HealthStatus, HistoryParams, PluginAdapter, RepliesParams,
    SlackApi, SlackMessage, SlackResponse,
};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    Page(SlackResponse),
    RateLimited(Option<Duration>),
    /// Slack `ok: false` with this error code.
    SlackError(String),
    /// Transport failure.
    Http(String),
}

impl MockReply {
    fn into_result(self) -> Result<SlackResponse, AlertdeskError> {
        match self {
            MockReply::Page(page) => Ok(page),
            MockReply::RateLimited(retry_after) => Err(AlertdeskError::RateLimited { retry_after }),
            MockReply::SlackError(code) => Err(AlertdeskError::Slack { code }),
            MockReply::Http(message) => Err(AlertdeskError::Http {
                message,
                source: None,
            }),
        }
    }
}

impl From<SlackResponse> for MockReply {
    fn from(page: SlackResponse) -> Self {
        MockReply::Page(page)
    }
}

/// A `SlackApi` that replays queued replies and records every request.
#[derive(Default)]
pub struct MockSlack {
    history: Mutex<VecDeque<MockReply>>,
    replies: Mutex<HashMap<String, VecDeque<MockReply>>>,
    history_calls: Mutex<Vec<HistoryParams>>,
    replies_calls: Mutex<Vec<RepliesParams>>,
}

impl MockSlack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `conversations.history` answer.
    pub async fn push_history(&self, reply: impl Into<MockReply>) {
        self.history.lock().await.push_back(reply.into());
    }

    /// Queue the next `conversations.replies` answer for the thread at `ts`.
    pub async fn push_replies(&self, ts: &str, reply: impl Into<MockReply>) {
        self.replies
            .lock()
            .await
            .entry(ts.to_string())
            .or_default()
            .push_back(reply.into());
    }

    pub async fn history_calls(&self) -> Vec<HistoryParams> {
        self.history_calls.lock().await.clone()
    }

    pub async fn replies_calls(&self) -> Vec<RepliesParams> {
        self.replies_calls.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockSlack {
    fn name(&self) -> &str {
        "mock-slack"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AlertdeskError> {
        Ok(())
    }
}

#[async_trait]
impl SlackApi for MockSlack {
    async fn conversation_history(
        &self,
        params: &HistoryParams,
    ) -> Result<SlackResponse, AlertdeskError> {
        self.history_calls.lock().await.push(params.clone());
        let next = self.history.lock().await.pop_front();
        next.map_or_else(|| Ok(history_page(Vec::new(), None)), MockReply::into_result)
    }

    async fn thread_replies(
        &self,
        params: &RepliesParams,
    ) -> Result<SlackResponse, AlertdeskError> {
        self.replies_calls.lock().await.push(params.clone());
        let next = self
            .replies
            .lock()
            .await
            .get_mut(&params.ts)
            .and_then(VecDeque::pop_front);
        next.map_or_else(|| Ok(history_page(Vec::new(), None)), MockReply::into_result)
    }
}

/// A successful page with an optional continuation cursor.
pub fn history_page(messages: Vec<Value>, next_cursor: Option<&str>) -> SlackResponse {
    SlackResponse {
        ok: true,
        messages: messages.into_iter().map(SlackMessage::from).collect(),
        error: None,
        has_more: next_cursor.is_some(),
        response_metadata: Some(ResponseMetadata {
            next_cursor: Some(next_cursor.unwrap_or_default().to_string()),
        }),
    }
}

/// A plain channel message.
pub fn slack_message(ts: &str, text: &str) -> Value {
    json!({"type": "message", "ts": ts, "text": text, "user": "U0TEST"})
}

/// A thread parent with `reply_count` replies.
pub fn thread_parent(ts: &str, reply_count: u64, text: &str) -> Value {
    json!({
        "type": "message",
        "ts": ts,
        "thread_ts": ts,
        "reply_count": reply_count,
        "text": text,
        "user": "U0TEST"
    })
}

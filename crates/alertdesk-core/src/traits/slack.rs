// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack Web API source trait.

use async_trait::async_trait;

use crate::error::AlertdeskError;
use crate::slack::{HistoryParams, RepliesParams, SlackResponse};
use crate::traits::adapter::PluginAdapter;

/// The two Slack conversation reads the ingestion pipeline needs.
///
/// Implementations never retry. HTTP 429 surfaces as
/// [`AlertdeskError::RateLimited`] and `ok: false` as [`AlertdeskError::Slack`].
#[async_trait]
pub trait SlackApi: PluginAdapter {
    /// `conversations.history`: one page of channel messages.
    async fn conversation_history(
        &self,
        params: &HistoryParams,
    ) -> Result<SlackResponse, AlertdeskError>;

    /// `conversations.replies`: one page of a thread, parent message first.
    async fn thread_replies(&self, params: &RepliesParams)
    -> Result<SlackResponse, AlertdeskError>;
}

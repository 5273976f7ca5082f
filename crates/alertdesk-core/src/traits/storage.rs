// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::AlertdeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Channel, ClassificationRule, FetchRun, InsertOutcome, NewFetchRun, NewRawMessage, NewRule,
    RawMessage, RuleKind, RuleUpdate,
};

/// Persistence for channels, raw messages, fetch runs and classification rules.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the backend (migrations, connection).
    async fn initialize(&self) -> Result<(), AlertdeskError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), AlertdeskError>;

    // --- Channels ---

    /// Register a channel. A Slack ID that is already registered is a
    /// [`AlertdeskError::Validation`] error.
    async fn create_channel(
        &self,
        slack_channel_id: &str,
        name: &str,
    ) -> Result<Channel, AlertdeskError>;

    async fn get_channel(&self, id: &str) -> Result<Option<Channel>, AlertdeskError>;

    async fn list_channels(&self) -> Result<Vec<Channel>, AlertdeskError>;

    async fn set_channel_enabled(&self, id: &str, enabled: bool)
    -> Result<Channel, AlertdeskError>;

    // --- Raw messages ---

    /// Insert a message, reporting a `(channel_id, slack_ts)` collision as
    /// [`InsertOutcome::Duplicate`] rather than an error.
    async fn insert_raw_message(
        &self,
        message: &NewRawMessage,
    ) -> Result<InsertOutcome, AlertdeskError>;

    /// Messages for a channel ordered by `posted_at` ascending.
    async fn list_raw_messages(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<RawMessage>, AlertdeskError>;

    // --- Fetch runs ---

    async fn create_fetch_run(&self, run: &NewFetchRun) -> Result<FetchRun, AlertdeskError>;

    async fn complete_fetch_run(
        &self,
        id: &str,
        fetched_count: u32,
        api_calls: u32,
    ) -> Result<(), AlertdeskError>;

    async fn fail_fetch_run(
        &self,
        id: &str,
        fetched_count: u32,
        api_calls: u32,
        error: &str,
    ) -> Result<(), AlertdeskError>;

    /// Mark every `in_progress` run of a channel as failed. Returns how many rows changed.
    async fn fail_in_progress_fetch_runs(
        &self,
        channel_id: &str,
        fetched_count: u32,
        api_calls: u32,
        error: &str,
    ) -> Result<usize, AlertdeskError>;

    /// Runs for a channel, newest first.
    async fn list_fetch_runs(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<FetchRun>, AlertdeskError>;

    // --- Classification rules ---

    /// Rules of one kind in creation order.
    async fn list_rules(
        &self,
        kind: RuleKind,
        enabled_only: bool,
    ) -> Result<Vec<ClassificationRule>, AlertdeskError>;

    async fn create_rule(
        &self,
        kind: RuleKind,
        rule: &NewRule,
    ) -> Result<ClassificationRule, AlertdeskError>;

    async fn update_rule(
        &self,
        kind: RuleKind,
        id: &str,
        update: &RuleUpdate,
    ) -> Result<ClassificationRule, AlertdeskError>;

    async fn delete_rule(&self, kind: RuleKind, id: &str) -> Result<(), AlertdeskError>;
}

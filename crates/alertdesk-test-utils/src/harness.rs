// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for ingestion tests.
//!
//! `TestHarness` wires a temp SQLite database, a scripted [`MockSlack`] and a
//! [`RateLimiter`] together, with one channel already registered.

use std::sync::Arc;

use alertdesk_config::model::{RateLimitConfig, StorageConfig};
use alertdesk_core::{AlertdeskError, Channel, StorageAdapter};
use alertdesk_resilience::RateLimiter;
use alertdesk_storage::SqliteStorage;

use crate::mock_slack::MockSlack;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    rate_limit: RateLimitConfig,
    slack_channel_id: String,
    channel_name: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            // Generous enough that tests never wait on the window by default.
            rate_limit: RateLimitConfig {
                max_requests: 1_000,
                window_ms: 60_000,
                max_retries: 3,
            },
            slack_channel_id: "C0HARNESS".to_string(),
            channel_name: "incidents".to_string(),
        }
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Register a different channel instead of the default `C0HARNESS`.
    pub fn with_channel(mut self, slack_channel_id: &str, name: &str) -> Self {
        self.slack_channel_id = slack_channel_id.to_string();
        self.channel_name = name.to_string();
        self
    }

    pub async fn build(self) -> Result<TestHarness, AlertdeskError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| AlertdeskError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let channel = storage
            .create_channel(&self.slack_channel_id, &self.channel_name)
            .await?;

        Ok(TestHarness {
            storage: Arc::new(storage),
            slack: Arc::new(MockSlack::new()),
            limiter: Arc::new(RateLimiter::new(&self.rate_limit)),
            channel,
            _temp_dir: temp_dir,
        })
    }
}

/// Storage, Slack mock and limiter for one test.
pub struct TestHarness {
    /// SQLite storage in a temp directory, removed on drop.
    pub storage: Arc<SqliteStorage>,
    pub slack: Arc<MockSlack>,
    pub limiter: Arc<RateLimiter>,
    /// The channel registered at build time.
    pub channel: Channel,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Stored messages for the harness channel, oldest first.
    pub async fn stored_messages(&self) -> Result<Vec<alertdesk_core::RawMessage>, AlertdeskError> {
        self.storage.list_raw_messages(&self.channel.id, None).await
    }

    /// Fetch runs for the harness channel, newest first.
    pub async fn fetch_runs(&self) -> Result<Vec<alertdesk_core::FetchRun>, AlertdeskError> {
        self.storage.list_fetch_runs(&self.channel.id, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_with_registered_channel() {
        let harness = TestHarness::builder()
            .with_channel("C0OPS", "ops")
            .build()
            .await
            .unwrap();
        assert_eq!(harness.channel.slack_channel_id, "C0OPS");
        assert!(harness.channel.enabled);
        assert!(harness.stored_messages().await.unwrap().is_empty());
        assert!(harness.fetch_runs().await.unwrap().is_empty());
    }
}

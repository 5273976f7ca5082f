// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use alertdesk_config::model::StorageConfig;
use alertdesk_core::{
    AdapterType, AlertdeskError, Channel, ClassificationRule, FetchRun, HealthStatus,
    InsertOutcome, NewFetchRun, NewRawMessage, NewRule, PluginAdapter, RawMessage, RuleKind,
    RuleUpdate, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, AlertdeskError> {
        self.db.get().ok_or_else(|| AlertdeskError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertdeskError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        let integrity: String = db
            .connection()
            .call(|conn| conn.query_row("PRAGMA quick_check;", [], |row| row.get(0)))
            .await
            .map_err(map_tr_err)?;
        if integrity == "ok" {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!("quick_check: {integrity}")))
        }
    }

    async fn shutdown(&self) -> Result<(), AlertdeskError> {
        if self.db.get().is_some() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), AlertdeskError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AlertdeskError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), AlertdeskError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Channels ---

    async fn create_channel(
        &self,
        slack_channel_id: &str,
        name: &str,
    ) -> Result<Channel, AlertdeskError> {
        alertdesk_core::rules::validate_slack_channel_id(slack_channel_id)?;
        queries::channels::create_channel(self.db()?, slack_channel_id, name).await
    }

    async fn get_channel(&self, id: &str) -> Result<Option<Channel>, AlertdeskError> {
        queries::channels::get_channel(self.db()?, id).await
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, AlertdeskError> {
        queries::channels::list_channels(self.db()?).await
    }

    async fn set_channel_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Channel, AlertdeskError> {
        queries::channels::set_channel_enabled(self.db()?, id, enabled).await
    }

    // --- Raw messages ---

    async fn insert_raw_message(
        &self,
        message: &NewRawMessage,
    ) -> Result<InsertOutcome, AlertdeskError> {
        queries::messages::insert_raw_message(self.db()?, message).await
    }

    async fn list_raw_messages(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<RawMessage>, AlertdeskError> {
        queries::messages::list_raw_messages(self.db()?, channel_id, limit).await
    }

    // --- Fetch runs ---

    async fn create_fetch_run(&self, run: &NewFetchRun) -> Result<FetchRun, AlertdeskError> {
        queries::fetch_runs::create_fetch_run(self.db()?, run).await
    }

    async fn complete_fetch_run(
        &self,
        id: &str,
        fetched_count: u32,
        api_calls: u32,
    ) -> Result<(), AlertdeskError> {
        queries::fetch_runs::complete_fetch_run(self.db()?, id, fetched_count, api_calls).await
    }

    async fn fail_fetch_run(
        &self,
        id: &str,
        fetched_count: u32,
        api_calls: u32,
        error: &str,
    ) -> Result<(), AlertdeskError> {
        queries::fetch_runs::fail_fetch_run(self.db()?, id, fetched_count, api_calls, error).await
    }

    async fn fail_in_progress_fetch_runs(
        &self,
        channel_id: &str,
        fetched_count: u32,
        api_calls: u32,
        error: &str,
    ) -> Result<usize, AlertdeskError> {
        queries::fetch_runs::fail_in_progress_fetch_runs(
            self.db()?,
            channel_id,
            fetched_count,
            api_calls,
            error,
        )
        .await
    }

    async fn list_fetch_runs(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<FetchRun>, AlertdeskError> {
        queries::fetch_runs::list_fetch_runs(self.db()?, channel_id, limit).await
    }

    // --- Classification rules ---

    async fn list_rules(
        &self,
        kind: RuleKind,
        enabled_only: bool,
    ) -> Result<Vec<ClassificationRule>, AlertdeskError> {
        queries::rules::list_rules(self.db()?, kind, enabled_only).await
    }

    async fn create_rule(
        &self,
        kind: RuleKind,
        rule: &NewRule,
    ) -> Result<ClassificationRule, AlertdeskError> {
        queries::rules::create_rule(self.db()?, kind, rule).await
    }

    async fn update_rule(
        &self,
        kind: RuleKind,
        id: &str,
        update: &RuleUpdate,
    ) -> Result<ClassificationRule, AlertdeskError> {
        queries::rules::update_rule(self.db()?, kind, id, update).await
    }

    async fn delete_rule(&self, kind: RuleKind, id: &str) -> Result<(), AlertdeskError> {
        queries::rules::delete_rule(self.db()?, kind, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_str().unwrap().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn identity() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("id.db")));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("pre.db")));
        assert!(matches!(
            storage.list_channels().await,
            Err(AlertdeskError::Storage { .. })
        ));
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_is_an_error() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("twice.db")));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn create_channel_validates_slack_id() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("ch.db")));
        storage.initialize().await.unwrap();

        let err = storage.create_channel("general", "general").await.unwrap_err();
        assert!(matches!(err, AlertdeskError::Validation(_)));
        storage.create_channel("C0GENERAL", "general").await.unwrap();
        assert_eq!(storage.list_channels().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn data_survives_close_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.db");

        let storage = SqliteStorage::new(make_config(&path));
        storage.initialize().await.unwrap();
        let ch = storage.create_channel("C0PERSIST", "persist").await.unwrap();
        storage.shutdown().await.unwrap();
        drop(storage);

        let reopened = SqliteStorage::new(make_config(&path));
        reopened.initialize().await.unwrap();
        assert!(reopened.get_channel(&ch.id).await.unwrap().is_some());
    }
}

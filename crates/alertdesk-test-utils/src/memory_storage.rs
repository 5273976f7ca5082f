// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `StorageAdapter` with failure injection.
//!
//! Behaves like the SQLite backend for the operations the pipeline uses,
//! including duplicate detection and rule validation, without touching disk.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use alertdesk_core::rules::{validate_new_rule, validate_rule_update, validate_slack_channel_id};
use alertdesk_core::{
    AdapterType, AlertdeskError, Channel, ClassificationRule, FetchRun, FetchRunStatus,
    HealthStatus, InsertOutcome, NewFetchRun, NewRawMessage, NewRule, PluginAdapter, RawMessage,
    RuleKind, RuleUpdate, StorageAdapter,
};

#[derive(Default)]
struct State {
    channels: Vec<Channel>,
    messages: Vec<RawMessage>,
    message_keys: HashSet<(String, String)>,
    runs: Vec<FetchRun>,
    rules: Vec<ClassificationRule>,
}

/// In-memory storage for unit and pipeline tests.
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    /// Remaining successful inserts before every insert fails. `usize::MAX` disables.
    inserts_before_failure: AtomicUsize,
    fail_rule_reads: AtomicBool,
    fail_run_creation: AtomicBool,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

fn injected(what: &str) -> AlertdeskError {
    AlertdeskError::Storage {
        source: format!("injected {what} failure").into(),
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inserts_before_failure: AtomicUsize::new(usize::MAX),
            ..Self::default()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Let `n` more message inserts succeed, then fail every one after.
    pub fn fail_inserts_after(&self, n: usize) {
        self.inserts_before_failure.store(n, Ordering::SeqCst);
    }

    pub fn fail_rule_reads(&self, fail: bool) {
        self.fail_rule_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_run_creation(&self, fail: bool) {
        self.fail_run_creation.store(fail, Ordering::SeqCst);
    }

    /// Every stored run, in creation order.
    pub fn fetch_runs(&self) -> Vec<FetchRun> {
        self.state().runs.clone()
    }

    /// Number of stored messages across all channels.
    pub fn message_count(&self) -> usize {
        self.state().messages.len()
    }

    /// Insert a fetch run directly, bypassing the adapter.
    pub fn seed_fetch_run(&self, run: FetchRun) {
        self.state().runs.push(run);
    }

    fn finish_run(
        &self,
        id: &str,
        status: FetchRunStatus,
        fetched_count: u32,
        api_calls: u32,
        error: Option<&str>,
    ) -> Result<(), AlertdeskError> {
        let mut state = self.state();
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AlertdeskError::NotFound {
                entity: "fetch run",
                id: id.to_string(),
            })?;
        run.status = status;
        run.fetched_count = fetched_count;
        run.api_calls = api_calls;
        run.error_message = error.map(str::to_string);
        run.updated_at = now();
        Ok(())
    }
}

fn rule_not_found(kind: RuleKind, id: &str) -> AlertdeskError {
    AlertdeskError::NotFound {
        entity: match kind {
            RuleKind::Urgency => "urgency rule",
            RuleKind::Impact => "impact rule",
        },
        id: id.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertdeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AlertdeskError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), AlertdeskError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), AlertdeskError> {
        Ok(())
    }

    async fn create_channel(
        &self,
        slack_channel_id: &str,
        name: &str,
    ) -> Result<Channel, AlertdeskError> {
        validate_slack_channel_id(slack_channel_id)?;
        let mut state = self.state();
        if state
            .channels
            .iter()
            .any(|c| c.slack_channel_id == slack_channel_id)
        {
            return Err(AlertdeskError::Validation(format!(
                "Slack channel {slack_channel_id} is already registered"
            )));
        }
        let ts = now();
        let channel = Channel {
            id: uuid::Uuid::new_v4().to_string(),
            slack_channel_id: slack_channel_id.to_string(),
            name: name.to_string(),
            enabled: true,
            created_at: ts.clone(),
            updated_at: ts,
        };
        state.channels.push(channel.clone());
        Ok(channel)
    }

    async fn get_channel(&self, id: &str) -> Result<Option<Channel>, AlertdeskError> {
        Ok(self.state().channels.iter().find(|c| c.id == id).cloned())
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, AlertdeskError> {
        Ok(self.state().channels.clone())
    }

    async fn set_channel_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Channel, AlertdeskError> {
        let mut state = self.state();
        let channel = state
            .channels
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AlertdeskError::NotFound {
                entity: "channel",
                id: id.to_string(),
            })?;
        channel.enabled = enabled;
        channel.updated_at = now();
        Ok(channel.clone())
    }

    async fn insert_raw_message(
        &self,
        message: &NewRawMessage,
    ) -> Result<InsertOutcome, AlertdeskError> {
        let remaining = self.inserts_before_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(injected("insert"));
        }
        if remaining != usize::MAX {
            self.inserts_before_failure.store(remaining - 1, Ordering::SeqCst);
        }

        let mut state = self.state();
        let key = (message.channel_id.clone(), message.slack_ts.clone());
        if !state.message_keys.insert(key) {
            return Ok(InsertOutcome::Duplicate);
        }
        let id = state.messages.len() as i64 + 1;
        state.messages.push(RawMessage {
            id,
            channel_id: message.channel_id.clone(),
            slack_ts: message.slack_ts.clone(),
            raw: message.raw.clone(),
            posted_at: message
                .posted_at
                .to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            created_at: now(),
        });
        Ok(InsertOutcome::Inserted)
    }

    async fn list_raw_messages(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<RawMessage>, AlertdeskError> {
        let mut rows: Vec<RawMessage> = self
            .state()
            .messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.posted_at.cmp(&b.posted_at));
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn create_fetch_run(&self, run: &NewFetchRun) -> Result<FetchRun, AlertdeskError> {
        if self.fail_run_creation.load(Ordering::SeqCst) {
            return Err(injected("fetch run creation"));
        }
        let ts = now();
        let created = FetchRun {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: run.channel_id.clone(),
            range_from: run.range_from.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            range_to: run.range_to.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            status: FetchRunStatus::InProgress,
            fetched_count: 0,
            api_calls: 0,
            error_message: None,
            created_at: ts.clone(),
            updated_at: ts,
        };
        self.state().runs.push(created.clone());
        Ok(created)
    }

    async fn complete_fetch_run(
        &self,
        id: &str,
        fetched_count: u32,
        api_calls: u32,
    ) -> Result<(), AlertdeskError> {
        self.finish_run(id, FetchRunStatus::Completed, fetched_count, api_calls, None)
    }

    async fn fail_fetch_run(
        &self,
        id: &str,
        fetched_count: u32,
        api_calls: u32,
        error: &str,
    ) -> Result<(), AlertdeskError> {
        self.finish_run(id, FetchRunStatus::Failed, fetched_count, api_calls, Some(error))
    }

    async fn fail_in_progress_fetch_runs(
        &self,
        channel_id: &str,
        fetched_count: u32,
        api_calls: u32,
        error: &str,
    ) -> Result<usize, AlertdeskError> {
        let mut state = self.state();
        let mut changed = 0;
        for run in state
            .runs
            .iter_mut()
            .filter(|r| r.channel_id == channel_id && r.status == FetchRunStatus::InProgress)
        {
            run.status = FetchRunStatus::Failed;
            run.fetched_count = fetched_count;
            run.api_calls = api_calls;
            run.error_message = Some(error.to_string());
            run.updated_at = now();
            changed += 1;
        }
        Ok(changed)
    }

    async fn list_fetch_runs(
        &self,
        channel_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<FetchRun>, AlertdeskError> {
        let mut runs: Vec<FetchRun> = self
            .state()
            .runs
            .iter()
            .rev()
            .filter(|r| r.channel_id == channel_id)
            .cloned()
            .collect();
        if let Some(limit) = limit {
            runs.truncate(limit as usize);
        }
        Ok(runs)
    }

    async fn list_rules(
        &self,
        kind: RuleKind,
        enabled_only: bool,
    ) -> Result<Vec<ClassificationRule>, AlertdeskError> {
        if self.fail_rule_reads.load(Ordering::SeqCst) {
            return Err(injected("rule read"));
        }
        Ok(self
            .state()
            .rules
            .iter()
            .filter(|r| r.kind == kind && (!enabled_only || r.enabled))
            .cloned()
            .collect())
    }

    async fn create_rule(
        &self,
        kind: RuleKind,
        rule: &NewRule,
    ) -> Result<ClassificationRule, AlertdeskError> {
        validate_new_rule(rule)?;
        let ts = now();
        let created = ClassificationRule {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            name: rule.name.clone(),
            pattern: rule.pattern.clone(),
            value: rule.value,
            enabled: rule.enabled,
            created_at: ts.clone(),
            updated_at: ts,
        };
        self.state().rules.push(created.clone());
        Ok(created)
    }

    async fn update_rule(
        &self,
        kind: RuleKind,
        id: &str,
        update: &RuleUpdate,
    ) -> Result<ClassificationRule, AlertdeskError> {
        validate_rule_update(update)?;
        let mut state = self.state();
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == id && r.kind == kind)
            .ok_or_else(|| rule_not_found(kind, id))?;
        if let Some(name) = &update.name {
            rule.name = name.clone();
        }
        if let Some(pattern) = &update.pattern {
            rule.pattern = pattern.clone();
        }
        if let Some(value) = update.value {
            rule.value = value;
        }
        if let Some(enabled) = update.enabled {
            rule.enabled = enabled;
        }
        rule.updated_at = now();
        Ok(rule.clone())
    }

    async fn delete_rule(&self, kind: RuleKind, id: &str) -> Result<(), AlertdeskError> {
        let mut state = self.state();
        let before = state.rules.len();
        state.rules.retain(|r| !(r.id == id && r.kind == kind));
        if state.rules.len() == before {
            return Err(rule_not_found(kind, id));
        }
        Ok(())
    }
}

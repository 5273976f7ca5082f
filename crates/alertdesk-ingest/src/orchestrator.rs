// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel fetch: history pagination, thread expansion and run bookkeeping.

use std::sync::Arc;

use alertdesk_core::{
    AlertdeskError, Channel, FetchStatus, HistoryParams, InsertOutcome, NewFetchRun,
    NewRawMessage, RepliesParams, SlackApi, SlackMessage, SlackResponse, StorageAdapter,
};
use alertdesk_resilience::RateLimiter;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

/// Page size requested from `conversations.history` unless overridden.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// A request to ingest one channel over a time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Internal channel id, not the Slack `C...` id.
    pub channel_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Result of a channel fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Fetch run recorded for this attempt, absent when the run never started.
    pub run_id: Option<String>,
    /// Messages newly persisted by this run. Duplicates are not counted.
    pub fetched_count: u32,
    pub api_calls: u32,
    pub status: FetchStatus,
    pub error: Option<String>,
    /// Parent `ts` of threads whose replies could not be fetched.
    pub failed_threads: Vec<String>,
}

#[derive(Debug, Default)]
struct Progress {
    fetched: u32,
    api_calls: u32,
    failed_threads: Vec<String>,
}

impl Progress {
    fn into_outcome(self, run_id: Option<String>, error: Option<String>) -> FetchOutcome {
        FetchOutcome {
            run_id,
            fetched_count: self.fetched,
            api_calls: self.api_calls,
            status: if error.is_some() {
                FetchStatus::Failed
            } else {
                FetchStatus::Completed
            },
            error,
            failed_threads: self.failed_threads,
        }
    }
}

/// Drives a channel fetch from lookup to a finished fetch run.
///
/// Every Slack call goes through the shared limiter, so several orchestrators
/// (or several concurrent fetches on one orchestrator) respect one budget.
pub struct FetchOrchestrator {
    slack: Arc<dyn SlackApi>,
    storage: Arc<dyn StorageAdapter>,
    limiter: Arc<RateLimiter>,
    page_limit: u32,
}

impl FetchOrchestrator {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        storage: Arc<dyn StorageAdapter>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            slack,
            storage,
            limiter,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Override the `limit` sent with each history request.
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Fetch and persist every message of a channel between two instants.
    ///
    /// Failures never escape as errors: they end the run as `failed` and are
    /// reported through [`FetchOutcome::error`]. A thread whose replies cannot
    /// be fetched is skipped and listed in [`FetchOutcome::failed_threads`].
    pub async fn fetch_channel_messages(&self, request: &FetchRequest) -> FetchOutcome {
        let mut progress = Progress::default();

        let channel = match self.resolve_channel(request).await {
            Ok(channel) => channel,
            Err(err) => {
                warn!(channel_id = %request.channel_id, error = %err, "fetch rejected");
                return progress.into_outcome(None, Some(err.to_string()));
            }
        };

        let run = match self
            .storage
            .create_fetch_run(&NewFetchRun {
                channel_id: channel.id.clone(),
                range_from: request.start_date,
                range_to: request.end_date,
            })
            .await
        {
            Ok(run) => run,
            Err(err) => return self.fail(&channel.id, None, progress, err).await,
        };

        info!(
            channel_id = %channel.id,
            slack_channel_id = %channel.slack_channel_id,
            run_id = %run.id,
            "fetch started"
        );

        if let Err(err) = self.ingest(&channel, request, &mut progress).await {
            return self.fail(&channel.id, Some(&run.id), progress, err).await;
        }

        if let Err(err) = self
            .storage
            .complete_fetch_run(&run.id, progress.fetched, progress.api_calls)
            .await
        {
            return self.fail(&channel.id, Some(&run.id), progress, err).await;
        }

        info!(
            channel_id = %channel.id,
            fetched_count = progress.fetched,
            api_calls = progress.api_calls,
            failed_threads = progress.failed_threads.len(),
            "fetch completed"
        );
        progress.into_outcome(Some(run.id), None)
    }

    async fn resolve_channel(&self, request: &FetchRequest) -> Result<Channel, AlertdeskError> {
        if request.start_date > request.end_date {
            return Err(AlertdeskError::Validation(format!(
                "start date {} is after end date {}",
                request.start_date, request.end_date
            )));
        }
        self.storage
            .get_channel(&request.channel_id)
            .await?
            .ok_or_else(|| AlertdeskError::NotFound {
                entity: "channel",
                id: request.channel_id.clone(),
            })
    }

    /// Mark the run failed and build the failed outcome.
    ///
    /// Without a run id, every in-progress run of the channel is swept.
    async fn fail(
        &self,
        channel_id: &str,
        run_id: Option<&str>,
        progress: Progress,
        err: AlertdeskError,
    ) -> FetchOutcome {
        let message = err.to_string();
        error!(
            channel_id,
            fetched_count = progress.fetched,
            api_calls = progress.api_calls,
            error = %message,
            "fetch failed"
        );

        let recorded = match run_id {
            Some(id) => {
                self.storage
                    .fail_fetch_run(id, progress.fetched, progress.api_calls, &message)
                    .await
            }
            None => self
                .storage
                .fail_in_progress_fetch_runs(
                    channel_id,
                    progress.fetched,
                    progress.api_calls,
                    &message,
                )
                .await
                .map(|swept| debug!(channel_id, swept, "swept in-progress fetch runs")),
        };
        if let Err(record_err) = recorded {
            error!(channel_id, error = %record_err, "could not record failed fetch run");
        }

        progress.into_outcome(run_id.map(str::to_string), Some(message))
    }

    async fn ingest(
        &self,
        channel: &Channel,
        request: &FetchRequest,
        progress: &mut Progress,
    ) -> Result<(), AlertdeskError> {
        let mut params = HistoryParams {
            channel: channel.slack_channel_id.clone(),
            oldest: Some(request.start_date.timestamp().to_string()),
            latest: Some(request.end_date.timestamp().to_string()),
            limit: Some(self.page_limit),
            cursor: None,
        };
        let mut messages = Vec::new();

        loop {
            let page = self.history_page(&params, progress).await?;
            debug!(
                channel_id = %channel.id,
                messages = page.messages.len(),
                api_calls = progress.api_calls,
                "history page received"
            );
            let next = page.next_cursor().map(str::to_string);
            messages.extend(page.messages);
            match next {
                Some(cursor) => params.cursor = Some(cursor),
                None => break,
            }
        }

        // Nothing is stored until every history page has arrived.
        for message in &messages {
            self.persist(&channel.id, message, progress).await?;
            if message.has_replies()
                && let Some(ts) = message.ts()
            {
                self.expand_thread(channel, ts, progress).await?;
            }
        }
        Ok(())
    }

    /// Persist the replies of one thread. A failed replies fetch is recorded
    /// and skipped; a failed insert aborts the run.
    async fn expand_thread(
        &self,
        channel: &Channel,
        thread_ts: &str,
        progress: &mut Progress,
    ) -> Result<(), AlertdeskError> {
        match self.thread_replies(channel, thread_ts, progress).await {
            Ok(replies) => {
                for reply in &replies {
                    self.persist(&channel.id, reply, progress).await?;
                }
            }
            Err(err) => {
                warn!(
                    channel_id = %channel.id,
                    thread_ts,
                    error = %err,
                    "skipping thread, replies could not be fetched"
                );
                progress.failed_threads.push(thread_ts.to_string());
            }
        }
        Ok(())
    }

    async fn history_page(
        &self,
        params: &HistoryParams,
        progress: &mut Progress,
    ) -> Result<SlackResponse, AlertdeskError> {
        let slack = &self.slack;
        let api_calls = &mut progress.api_calls;
        self.limiter
            .execute(|| {
                *api_calls += 1;
                async move { slack.conversation_history(params).await }
            })
            .await
    }

    /// All replies of one thread, parent excluded.
    async fn thread_replies(
        &self,
        channel: &Channel,
        thread_ts: &str,
        progress: &mut Progress,
    ) -> Result<Vec<SlackMessage>, AlertdeskError> {
        let slack = &self.slack;
        let mut params = RepliesParams {
            channel: channel.slack_channel_id.clone(),
            ts: thread_ts.to_string(),
            cursor: None,
        };
        let mut replies = Vec::new();
        let mut first_page = true;

        loop {
            let api_calls = &mut progress.api_calls;
            let request = &params;
            let page = self
                .limiter
                .execute(|| {
                    *api_calls += 1;
                    async move { slack.thread_replies(request).await }
                })
                .await?;

            let next = page.next_cursor().map(str::to_string);
            // Slack returns the parent as the first element.
            let skip = usize::from(first_page);
            replies.extend(page.messages.into_iter().skip(skip));
            first_page = false;

            match next {
                Some(cursor) => params.cursor = Some(cursor),
                None => return Ok(replies),
            }
        }
    }

    async fn persist(
        &self,
        channel_id: &str,
        message: &SlackMessage,
        progress: &mut Progress,
    ) -> Result<(), AlertdeskError> {
        let Some(row) = NewRawMessage::from_slack(channel_id, message) else {
            warn!(channel_id, "skipping message without a usable ts");
            return Ok(());
        };
        match self.storage.insert_raw_message(&row).await? {
            InsertOutcome::Inserted => progress.fetched += 1,
            InsertOutcome::Duplicate => {
                debug!(channel_id, slack_ts = %row.slack_ts, "message already stored");
            }
        }
        Ok(())
    }
}

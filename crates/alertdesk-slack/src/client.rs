// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the two Slack conversation endpoints.

use std::time::Duration;

use alertdesk_config::SlackConfig;
use alertdesk_core::{
    AdapterType, AlertdeskError, HealthStatus, HistoryParams, PluginAdapter, RepliesParams,
    SlackApi, SlackResponse,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

/// Slack Web API client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
}

impl SlackClient {
    /// Build a client from configuration. A missing bot token is a config error.
    pub fn new(config: &SlackConfig) -> Result<Self, AlertdeskError> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AlertdeskError::Config(
                    "slack.bot_token is not set (use ALERTDESK_SLACK_BOT_TOKEN or SLACK_BOT_TOKEN)"
                        .to_string(),
                )
            })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| AlertdeskError::Config(format!("invalid bot token header value: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AlertdeskError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<SlackResponse, AlertdeskError> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AlertdeskError::Http {
                message: format!("{method} request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(method, status = %status, "Slack response received");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AlertdeskError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(AlertdeskError::Http {
                message: format!("{method} returned HTTP {status}"),
                source: None,
            });
        }

        let body: SlackResponse = response.json().await.map_err(|e| AlertdeskError::Http {
            message: format!("{method} returned an undecodable body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !body.ok {
            return Err(AlertdeskError::Slack {
                code: body.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        Ok(body)
    }
}

/// `retry-after` in whole seconds. Unparseable values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl PluginAdapter for SlackClient {
    fn name(&self) -> &str {
        "slack"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertdeskError> {
        // Construction already required a token; no request is made here.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AlertdeskError> {
        Ok(())
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn conversation_history(
        &self,
        params: &HistoryParams,
    ) -> Result<SlackResponse, AlertdeskError> {
        let mut query = vec![("channel", params.channel.clone())];
        if let Some(oldest) = &params.oldest {
            query.push(("oldest", oldest.clone()));
        }
        if let Some(latest) = &params.latest {
            query.push(("latest", latest.clone()));
        }
        if let Some(limit) = params.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = &params.cursor {
            query.push(("cursor", cursor.clone()));
        }
        self.get("conversations.history", &query).await
    }

    async fn thread_replies(
        &self,
        params: &RepliesParams,
    ) -> Result<SlackResponse, AlertdeskError> {
        let mut query = vec![("channel", params.channel.clone()), ("ts", params.ts.clone())];
        if let Some(cursor) = &params.cursor {
            query.push(("cursor", cursor.clone()));
        }
        self.get("conversations.replies", &query).await
    }
}

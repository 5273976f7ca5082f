// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait.

use async_trait::async_trait;

use crate::error::AlertdeskError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health and lifecycle shared by the Slack source and storage backends.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, AlertdeskError>;

    /// Releases any held resources.
    async fn shutdown(&self) -> Result<(), AlertdeskError>;
}

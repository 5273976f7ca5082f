// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so they can be shared as `Arc<dyn ...>`.

pub mod adapter;
pub mod slack;
pub mod storage;

pub use adapter::PluginAdapter;
pub use slack::SlackApi;
pub use storage::StorageAdapter;

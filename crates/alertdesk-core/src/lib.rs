// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for alertdesk.
//!
//! This crate provides the error type, domain types, Slack wire shapes and the
//! adapter traits shared by the ingestion pipeline, the classifier and the
//! storage backend.

pub mod error;
pub mod rules;
pub mod slack;
pub mod traits;
pub mod types;

pub use error::AlertdeskError;
pub use slack::{HistoryParams, RepliesParams, SlackMessage, SlackResponse};
pub use types::{
    AdapterType, Channel, Classification, ClassificationRule, FetchRun, FetchRunStatus,
    FetchStatus, HealthStatus, IncidentType, InsertOutcome, Level, NewFetchRun, NewRawMessage,
    NewRule, RawMessage, RuleKind, RuleUpdate,
};

pub use traits::{PluginAdapter, SlackApi, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strum() {
        use std::str::FromStr;
        for t in [AdapterType::Source, AdapterType::Storage] {
            assert_eq!(AdapterType::from_str(&t.to_string()).unwrap(), t);
        }
    }

    #[test]
    fn traits_are_object_safe() {
        fn _slack(_: &dyn SlackApi) {}
        fn _storage(_: &dyn StorageAdapter) {}
    }
}

// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.

pub mod channels;
pub mod fetch_runs;
pub mod messages;
pub mod rules;

use std::str::FromStr;

use rusqlite::types::Type;

/// Fixed-width UTC timestamps so text ordering matches time ordering.
pub(crate) fn now() -> String {
    timestamp(chrono::Utc::now())
}

pub(crate) fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse a text column through `FromStr`, surfacing failures as conversion errors.
pub(crate) fn parse_column<T>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use alertdesk_core::Channel;
    use tempfile::TempDir;

    use crate::database::Database;

    pub async fn open_temp() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    pub async fn with_channel() -> (Database, TempDir, Channel) {
        let (db, dir) = open_temp().await;
        let channel = super::channels::create_channel(&db, "C0INCIDENT", "incidents")
            .await
            .unwrap();
        (db, dir, channel)
    }
}

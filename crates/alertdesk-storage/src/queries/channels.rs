// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel registry queries.

use alertdesk_core::{AlertdeskError, Channel};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

const CHANNEL_COLUMNS: &str = "id, slack_channel_id, name, enabled, created_at, updated_at";

fn row_to_channel(row: &rusqlite::Row<'_>) -> Result<Channel, rusqlite::Error> {
    Ok(Channel {
        id: row.get(0)?,
        slack_channel_id: row.get(1)?,
        name: row.get(2)?,
        enabled: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Register a channel. A Slack ID that is already present is a validation error.
pub async fn create_channel(
    db: &Database,
    slack_channel_id: &str,
    name: &str,
) -> Result<Channel, AlertdeskError> {
    let now = super::now();
    let channel = Channel {
        id: uuid::Uuid::new_v4().to_string(),
        slack_channel_id: slack_channel_id.to_string(),
        name: name.to_string(),
        enabled: true,
        created_at: now.clone(),
        updated_at: now,
    };
    let row = channel.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO channels (id, slack_channel_id, name, enabled, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(slack_channel_id) DO NOTHING",
                params![
                    row.id,
                    row.slack_channel_id,
                    row.name,
                    row.enabled,
                    row.created_at,
                    row.updated_at
                ],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)?;

    if !inserted {
        return Err(AlertdeskError::Validation(format!(
            "Slack channel {slack_channel_id} is already registered"
        )));
    }
    Ok(channel)
}

pub async fn get_channel(db: &Database, id: &str) -> Result<Option<Channel>, AlertdeskError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
                params![id],
                row_to_channel,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All channels, oldest registration first.
pub async fn list_channels(db: &Database) -> Result<Vec<Channel>, AlertdeskError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY created_at ASC, rowid ASC"
            ))?;
            let rows = stmt.query_map([], row_to_channel)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_channel_enabled(
    db: &Database,
    id: &str,
    enabled: bool,
) -> Result<Channel, AlertdeskError> {
    let key = id.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE channels SET enabled = ?1, updated_at = ?2 WHERE id = ?3",
                params![enabled, super::now(), key],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
                params![key],
                row_to_channel,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    updated.ok_or_else(|| AlertdeskError::NotFound {
        entity: "channel",
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::open_temp;

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (db, _dir) = open_temp().await;
        let created = create_channel(&db, "C024BE91L", "ops-alerts").await.unwrap();
        assert!(created.enabled);

        let fetched = get_channel(&db, &created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(get_channel(&db, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_slack_id_is_rejected() {
        let (db, _dir) = open_temp().await;
        create_channel(&db, "C024BE91L", "ops").await.unwrap();
        let err = create_channel(&db, "C024BE91L", "ops-again").await.unwrap_err();
        assert!(matches!(err, AlertdeskError::Validation(_)));
        assert_eq!(list_channels(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_enabled() {
        let (db, _dir) = open_temp().await;
        let ch = create_channel(&db, "C1", "one").await.unwrap();
        let disabled = set_channel_enabled(&db, &ch.id, false).await.unwrap();
        assert!(!disabled.enabled);

        let err = set_channel_enabled(&db, "nope", true).await.unwrap_err();
        assert!(matches!(err, AlertdeskError::NotFound { entity: "channel", .. }));
    }
}

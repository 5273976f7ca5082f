// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw Slack message persistence.

use alertdesk_core::{AlertdeskError, InsertOutcome, NewRawMessage, RawMessage};
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::{Database, map_tr_err};

/// Insert a message. A row with the same `(channel_id, slack_ts)` is left
/// untouched and reported as [`InsertOutcome::Duplicate`].
pub async fn insert_raw_message(
    db: &Database,
    message: &NewRawMessage,
) -> Result<InsertOutcome, AlertdeskError> {
    let raw = serde_json::to_string(&message.raw).map_err(|e| AlertdeskError::Storage {
        source: Box::new(e),
    })?;
    let channel_id = message.channel_id.clone();
    let slack_ts = message.slack_ts.clone();
    let posted_at = super::timestamp(message.posted_at);

    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO slack_messages (channel_id, slack_ts, raw, posted_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(channel_id, slack_ts) DO NOTHING",
                params![channel_id, slack_ts, raw, posted_at, super::now()],
            )?;
            Ok(if changed == 0 {
                InsertOutcome::Duplicate
            } else {
                InsertOutcome::Inserted
            })
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<RawMessage, rusqlite::Error> {
    let raw: String = row.get(3)?;
    let raw = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(RawMessage {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        slack_ts: row.get(2)?,
        raw,
        posted_at: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Messages for a channel in posting order.
pub async fn list_raw_messages(
    db: &Database,
    channel_id: &str,
    limit: Option<u32>,
) -> Result<Vec<RawMessage>, AlertdeskError> {
    let channel_id = channel_id.to_string();
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(i64::from).unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, slack_ts, raw, posted_at, created_at
                 FROM slack_messages WHERE channel_id = ?1
                 ORDER BY posted_at ASC, slack_ts ASC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![channel_id, limit], row_to_message)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::queries::test_support::with_channel;

    fn message(channel_id: &str, ts: &str, secs: i64, text: &str) -> NewRawMessage {
        NewRawMessage {
            channel_id: channel_id.to_string(),
            slack_ts: ts.to_string(),
            raw: serde_json::json!({"ts": ts, "text": text}),
            posted_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn second_insert_of_same_ts_is_duplicate() {
        let (db, _dir, ch) = with_channel().await;
        let msg = message(&ch.id, "1641038400.000100", 1_641_038_400, "first");

        assert_eq!(insert_raw_message(&db, &msg).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(insert_raw_message(&db, &msg).await.unwrap(), InsertOutcome::Duplicate);

        let rows = list_raw_messages(&db, &ch.id, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(), Some("first"));
    }

    #[tokio::test]
    async fn duplicate_does_not_overwrite_payload() {
        let (db, _dir, ch) = with_channel().await;
        insert_raw_message(&db, &message(&ch.id, "1.0", 1, "original")).await.unwrap();
        insert_raw_message(&db, &message(&ch.id, "1.0", 1, "edited")).await.unwrap();

        let rows = list_raw_messages(&db, &ch.id, None).await.unwrap();
        assert_eq!(rows[0].text(), Some("original"));
    }

    #[tokio::test]
    async fn listing_is_ordered_by_posted_at_and_limited() {
        let (db, _dir, ch) = with_channel().await;
        insert_raw_message(&db, &message(&ch.id, "300.0", 300, "c")).await.unwrap();
        insert_raw_message(&db, &message(&ch.id, "100.0", 100, "a")).await.unwrap();
        insert_raw_message(&db, &message(&ch.id, "200.0", 200, "b")).await.unwrap();

        let texts: Vec<_> = list_raw_messages(&db, &ch.id, None)
            .await
            .unwrap()
            .iter()
            .map(|m| m.text().unwrap().to_string())
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);

        assert_eq!(list_raw_messages(&db, &ch.id, Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_channel_is_a_storage_error() {
        let (db, _dir, _ch) = with_channel().await;
        let err = insert_raw_message(&db, &message("ghost", "1.0", 1, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AlertdeskError::Storage { .. }));
    }
}

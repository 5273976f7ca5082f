// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fetch run bookkeeping.

use alertdesk_core::{AlertdeskError, FetchRun, FetchRunStatus, NewFetchRun};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

fn row_to_run(row: &rusqlite::Row<'_>) -> Result<FetchRun, rusqlite::Error> {
    Ok(FetchRun {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        range_from: row.get(2)?,
        range_to: row.get(3)?,
        status: super::parse_column(4, row.get(4)?)?,
        fetched_count: row.get(5)?,
        api_calls: row.get(6)?,
        error_message: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Start a run in `in_progress` with zero counts.
pub async fn create_fetch_run(db: &Database, run: &NewFetchRun) -> Result<FetchRun, AlertdeskError> {
    let now = super::now();
    let created = FetchRun {
        id: uuid::Uuid::new_v4().to_string(),
        channel_id: run.channel_id.clone(),
        range_from: super::timestamp(run.range_from),
        range_to: super::timestamp(run.range_to),
        status: FetchRunStatus::InProgress,
        fetched_count: 0,
        api_calls: 0,
        error_message: None,
        created_at: now.clone(),
        updated_at: now,
    };
    let row = created.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO fetch_runs
                   (id, channel_id, range_from, range_to, status, fetched_count, api_calls,
                    error_message, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, NULL, ?6, ?7)",
                params![
                    row.id,
                    row.channel_id,
                    row.range_from,
                    row.range_to,
                    row.status.to_string(),
                    row.created_at,
                    row.updated_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(created)
}

async fn finish_run(
    db: &Database,
    id: &str,
    status: FetchRunStatus,
    fetched_count: u32,
    api_calls: u32,
    error: Option<String>,
) -> Result<(), AlertdeskError> {
    let key = id.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE fetch_runs
                 SET status = ?1, fetched_count = ?2, api_calls = ?3, error_message = ?4,
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    status.to_string(),
                    fetched_count,
                    api_calls,
                    error,
                    super::now(),
                    key
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(AlertdeskError::NotFound {
            entity: "fetch run",
            id: id.to_string(),
        });
    }
    Ok(())
}

pub async fn complete_fetch_run(
    db: &Database,
    id: &str,
    fetched_count: u32,
    api_calls: u32,
) -> Result<(), AlertdeskError> {
    finish_run(db, id, FetchRunStatus::Completed, fetched_count, api_calls, None).await
}

pub async fn fail_fetch_run(
    db: &Database,
    id: &str,
    fetched_count: u32,
    api_calls: u32,
    error: &str,
) -> Result<(), AlertdeskError> {
    finish_run(
        db,
        id,
        FetchRunStatus::Failed,
        fetched_count,
        api_calls,
        Some(error.to_string()),
    )
    .await
}

/// Fail every `in_progress` run of a channel. Returns the number of runs updated.
pub async fn fail_in_progress_fetch_runs(
    db: &Database,
    channel_id: &str,
    fetched_count: u32,
    api_calls: u32,
    error: &str,
) -> Result<usize, AlertdeskError> {
    let channel_id = channel_id.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE fetch_runs
                 SET status = 'failed', fetched_count = ?1, api_calls = ?2, error_message = ?3,
                     updated_at = ?4
                 WHERE channel_id = ?5 AND status = 'in_progress'",
                params![fetched_count, api_calls, error, super::now(), channel_id],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Runs for a channel, newest first.
pub async fn list_fetch_runs(
    db: &Database,
    channel_id: &str,
    limit: Option<u32>,
) -> Result<Vec<FetchRun>, AlertdeskError> {
    let channel_id = channel_id.to_string();
    let limit = limit.map(i64::from).unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, range_from, range_to, status, fetched_count, api_calls,
                        error_message, created_at, updated_at
                 FROM fetch_runs WHERE channel_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![channel_id, limit], row_to_run)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

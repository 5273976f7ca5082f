// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: PRAGMA setup, migrations and connection lifecycle.
//!
//! Every query runs on tokio-rusqlite's background thread. Do not open
//! extra connections for writes.

use std::path::Path;

use alertdesk_core::AlertdeskError;
use tracing::debug;

use crate::migrations;

const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Convert a tokio-rusqlite error into [`AlertdeskError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AlertdeskError {
    AlertdeskError::Storage {
        source: Box::new(e),
    }
}

fn storage_err<E>(e: E) -> AlertdeskError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AlertdeskError::Storage {
        source: Box::new(e),
    }
}

/// Per-connection settings. `journal_mode` persists in the file; the rest do not.
fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
    }
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
    Ok(())
}

/// An open, migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` with WAL enabled and
    /// all migrations applied.
    pub async fn open(path: &str) -> Result<Self, AlertdeskError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing whether to switch the journal to WAL.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, AlertdeskError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }

        // Migrations need `&mut rusqlite::Connection`, so they run on a
        // short-lived blocking connection before the shared one is opened.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AlertdeskError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(storage_err)?;
            apply_pragmas(&conn, wal_mode).map_err(storage_err)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| AlertdeskError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(storage_err)?;
        conn.call(move |conn| apply_pragmas(conn, wal_mode))
            .await
            .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The shared connection. Queries go through `connection().call(...)`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), AlertdeskError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), AlertdeskError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(storage_err)
    }
}

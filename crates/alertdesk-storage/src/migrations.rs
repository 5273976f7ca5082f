// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! The SQL files under `migrations/` are compiled in with refinery's
//! `embed_migrations!` and applied when the database is opened.

use alertdesk_core::AlertdeskError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations. Applied versions live in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AlertdeskError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| AlertdeskError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}

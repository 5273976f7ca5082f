// SPDX-FileCopyrightText: 2026 Alertdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for alertdesk.
//!
//! WAL-mode SQLite with embedded migrations. All access goes through
//! `tokio-rusqlite`'s single background thread, so writes are serialized.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;

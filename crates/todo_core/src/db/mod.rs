//! Schema layer of the embedded table service.
//!
//! # Responsibility
//! - Open SQLite connections and bring `users`, `todos` and `todo_comments`
//!   up to the latest schema.
//! - Check a live table against the columns a caller intends to read/write.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Every failure names the migration version or table it belongs to.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening, migrating or inspecting the embedded schema.
#[derive(Debug)]
pub enum DbError {
    /// Statement failure outside any migration step.
    Sqlite(rusqlite::Error),
    /// Migration `version` failed and its transaction was rolled back.
    Migration { version: u32, source: rusqlite::Error },
    /// The file was written by a newer build than this one.
    SchemaTooNew { found: u32, supported: u32 },
    /// `table` should exist once migration `version` is applied but does not.
    MissingTable { table: &'static str, version: u32 },
    /// `table` lacks a column the table service serves.
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite failure: {err}"),
            Self::Migration { version, source } => {
                write!(f, "migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "schema version {found} is newer than the supported version {supported}"
            ),
            Self::MissingTable { table, version } => {
                write!(f, "table `{table}` missing after schema version {version}")
            }
            Self::MissingColumn { table, column } => {
                write!(f, "table `{table}` has no column `{column}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } | Self::MissingTable { .. } | Self::MissingColumn { .. } => {
                None
            }
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Fails with the first of `columns` that `table` does not have.
pub fn ensure_columns(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> DbResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    match columns
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name == column))
    {
        Some(column) => Err(DbError::MissingColumn { table, column }),
        None => Ok(()),
    }
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

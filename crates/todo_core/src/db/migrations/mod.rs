//! Versioned schema for the embedded table service.
//!
//! # Invariants
//! - Versions are contiguous from 1 and each one lists the tables it creates.
//! - Pending versions run in one transaction; a failure leaves the previous
//!   version in place.
//! - After a run, every table created up to the reached version exists.

use super::{table_exists, DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct Migration {
    version: u32,
    creates: &'static [&'static str],
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        creates: &["users", "todos"],
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        creates: &["todo_comments"],
        sql: include_str!("0002_todo_comments.sql"),
    },
];

/// Newest schema version this build can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Tables present once `version` is applied, paired with the version that
/// created each one.
pub fn tables_at(version: u32) -> Vec<(&'static str, u32)> {
    MIGRATIONS
        .iter()
        .take_while(|migration| migration.version <= version)
        .flat_map(|migration| {
            migration
                .creates
                .iter()
                .map(move |table| (*table, migration.version))
        })
        .collect()
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings `conn` to [`latest_version`]. Returns the versions applied by this
/// call, oldest first; an up-to-date database yields an empty list.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<u32>> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > found)
        .collect();

    if !pending.is_empty() {
        let tx = conn.transaction()?;
        for migration in &pending {
            let step = format!("{}\nPRAGMA user_version = {};", migration.sql, migration.version);
            tx.execute_batch(&step).map_err(|source| DbError::Migration {
                version: migration.version,
                source,
            })?;
        }
        tx.commit()?;
        for migration in &pending {
            info!(
                "event=db_migrate module=db status=ok version={} tables={}",
                migration.version,
                migration.creates.join(",")
            );
        }
    }

    for (table, version) in tables_at(supported) {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingTable { table, version });
        }
    }

    Ok(pending.iter().map(|migration| migration.version).collect())
}

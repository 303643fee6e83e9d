//! Embedded relational table service backed by SQLite.
//!
//! # Responsibility
//! - Serve the Remote Store contract from a local SQLite database.
//! - Assign `id` and `created_at` the way the hosted service does.
//!
//! # Invariants
//! - Column names are checked against a per-table allow-list before any SQL
//!   text is built.
//! - A store only wraps a connection whose schema holds every allow-listed
//!   column of every served table.
//! - The connection lock is never held across an `.await`.

use super::{Direction, RemoteError, RemoteResult, RemoteStore, Row, SelectQuery, Table};
use crate::db::migrations::{schema_version, tables_at};
use crate::db::{ensure_columns, open_db, open_db_in_memory, DbError, DbResult};
use crate::model::utc_timestamp;
use async_trait::async_trait;
use log::debug;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const TODO_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "priority",
    "status",
    "story_points",
    "due_date",
    "assignee_id",
    "creator_id",
    "created_at",
    "updated_at",
];
const TODO_COMMENT_COLUMNS: &[&str] = &["id", "comment", "todo_id", "user_id", "created_at"];
const USER_COLUMNS: &[&str] = &["id", "username", "email", "created_at", "updated_at"];

fn table_columns(table: Table) -> &'static [&'static str] {
    match table {
        Table::Todos => TODO_COLUMNS,
        Table::TodoComments => TODO_COMMENT_COLUMNS,
        Table::Users => USER_COLUMNS,
    }
}

/// Checks the schema of `conn` against what this store serves: each table
/// must belong to the connection's schema version and carry its allow-list.
fn verify_schema(conn: &Connection) -> DbResult<()> {
    let version = schema_version(conn)?;
    let known = tables_at(version);
    for table in Table::ALL {
        let name = table.as_str();
        if !known.iter().any(|(created, _)| *created == name) {
            return Err(DbError::MissingTable { table: name, version });
        }
    }
    for table in Table::ALL {
        ensure_columns(conn, table.as_str(), table_columns(table))?;
    }
    Ok(())
}

fn checked_column<'a>(table: Table, column: &'a str) -> RemoteResult<&'a str> {
    if table_columns(table).contains(&column) {
        Ok(column)
    } else {
        Err(RemoteError::Query(format!(
            "unknown column `{column}` for table `{table}`"
        )))
    }
}

/// SQLite-backed implementation of [`RemoteStore`].
pub struct SqliteTableStore {
    conn: Mutex<Connection>,
}

impl SqliteTableStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RemoteResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a fresh in-memory database and applies migrations.
    pub fn open_in_memory() -> RemoteResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps an already-migrated connection after checking its schema.
    pub fn from_connection(conn: Connection) -> RemoteResult<Self> {
        verify_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RemoteError::Unavailable("sqlite connection lock poisoned".to_string()))
    }

    fn select_rows(&self, table: Table, query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        let mut sql = format!("SELECT * FROM {table} WHERE 1 = 1");
        let mut bind_values = Vec::with_capacity(query.filters.len() + 1);

        for (column, value) in &query.filters {
            let column = checked_column(table, column)?;
            sql.push_str(&format!(" AND {column} = ?"));
            bind_values.push(to_sql_value(value));
        }

        if let Some(order) = &query.order {
            let column = checked_column(table, &order.column)?;
            let direction = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            // rowid breaks ties between rows stamped in the same microsecond.
            sql.push_str(&format!(" ORDER BY {column} {direction}, rowid {direction}"));
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(SqlValue::Integer(i64::from(limit)));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut out = Vec::new();

        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, name) in column_names.iter().enumerate() {
                record.insert(name.clone(), to_json_value(row.get_ref(index)?)?);
            }
            out.push(record);
        }

        Ok(out)
    }

    fn insert_row(&self, table: Table, mut row: Row) -> RemoteResult<()> {
        if row.get("id").map_or(true, Value::is_null) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if row.get("created_at").map_or(true, Value::is_null) {
            row.insert("created_at".to_string(), Value::String(utc_timestamp()));
        }

        let mut columns = Vec::with_capacity(row.len());
        let mut bind_values = Vec::with_capacity(row.len());
        for (column, value) in &row {
            columns.push(checked_column(table, column)?);
            bind_values.push(to_sql_value(value));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders});",
            columns.join(", ")
        );

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(())
    }

    fn update_row(&self, table: Table, patch: Row, id: &str) -> RemoteResult<()> {
        let mut assignments = Vec::with_capacity(patch.len());
        let mut bind_values = Vec::with_capacity(patch.len() + 1);
        for (column, value) in &patch {
            if column == "id" {
                continue;
            }
            assignments.push(format!("{} = ?", checked_column(table, column)?));
            bind_values.push(to_sql_value(value));
        }
        if assignments.is_empty() {
            return Ok(());
        }
        bind_values.push(SqlValue::Text(id.to_string()));

        let sql = format!("UPDATE {table} SET {} WHERE id = ?;", assignments.join(", "));
        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(())
    }

    fn delete_row(&self, table: Table, id: &str) -> RemoteResult<()> {
        let conn = self.lock()?;
        conn.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
        Ok(())
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn to_json_value(value: ValueRef<'_>) -> RemoteResult<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(integer) => Ok(Value::Number(integer.into())),
        ValueRef::Real(real) => Ok(Number::from_f64(real).map_or(Value::Null, Value::Number)),
        ValueRef::Text(bytes) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err(RemoteError::Query(
            "blob columns are not supported".to_string(),
        )),
    }
}

#[async_trait]
impl RemoteStore for SqliteTableStore {
    async fn select(&self, table: Table, query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        debug!("event=remote_select module=remote backend=sqlite table={table}");
        self.select_rows(table, query)
    }

    async fn insert(&self, table: Table, row: Row) -> RemoteResult<()> {
        debug!("event=remote_insert module=remote backend=sqlite table={table}");
        self.insert_row(table, row)
    }

    async fn update(&self, table: Table, patch: Row, id: &str) -> RemoteResult<()> {
        debug!("event=remote_update module=remote backend=sqlite table={table}");
        self.update_row(table, patch, id)
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        debug!("event=remote_delete module=remote backend=sqlite table={table}");
        self.delete_row(table, id)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteTableStore;
    use crate::db::migrations::latest_version;
    use crate::db::DbError;
    use crate::remote::{RemoteError, RemoteStore, Row, SelectQuery, Table};
    use rusqlite::Connection;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("fixture should be an object")
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_at() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        store
            .insert(
                Table::Users,
                row(json!({ "username": "ada", "email": "ada@example.com" })),
            )
            .await
            .unwrap();

        let rows = store.select(Table::Users, &SelectQuery::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(rows[0]["created_at"].is_string());
        assert!(rows[0]["updated_at"].is_null());
    }

    #[tokio::test]
    async fn unknown_column_is_rejected_before_sql() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        let err = store
            .insert(Table::Users, row(json!({ "username": "x", "email": "y", "role": "admin" })))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Query(message) if message.contains("role")));

        let err = store
            .select(Table::Users, &SelectQuery::all().eq("1=1 OR id", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Query(_)));
    }

    #[tokio::test]
    async fn newest_first_with_limit_returns_latest_insert() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        for name in ["first", "second", "third"] {
            store
                .insert(
                    Table::Users,
                    row(json!({ "username": name, "email": format!("{name}@example.com") })),
                )
                .await
                .unwrap();
        }

        let latest = store
            .select(Table::Users, &SelectQuery::all().newest_first().limit(1))
            .await
            .unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0]["username"], json!("third"));
    }

    #[tokio::test]
    async fn update_and_delete_match_by_id() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        store
            .insert(
                Table::Users,
                row(json!({ "id": "u1", "username": "old", "email": "u1@example.com" })),
            )
            .await
            .unwrap();

        store
            .update(Table::Users, row(json!({ "username": "new" })), "u1")
            .await
            .unwrap();
        let rows = store
            .select(Table::Users, &SelectQuery::all().eq("id", "u1"))
            .await
            .unwrap();
        assert_eq!(rows[0]["username"], json!("new"));

        store.delete(Table::Users, "u1").await.unwrap();
        store.delete(Table::Users, "u1").await.unwrap();
        let rows = store.select(Table::Users, &SelectQuery::all()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn todo_insert_requires_existing_creator() {
        let store = SqliteTableStore::open_in_memory().unwrap();
        let err = store
            .insert(
                Table::Todos,
                row(json!({ "name": "orphan", "priority": "low", "creator_id": "nobody" })),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Db(_)));
    }

    #[test]
    fn connection_missing_a_served_column_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE users (id TEXT, username TEXT, email TEXT, created_at TEXT, updated_at TEXT);
             CREATE TABLE todos (id TEXT, name TEXT, priority TEXT, creator_id TEXT);
             CREATE TABLE todo_comments (id TEXT, comment TEXT, todo_id TEXT, user_id TEXT, created_at TEXT);
             PRAGMA user_version = {};",
            latest_version()
        ))
        .unwrap();

        let err = match SqliteTableStore::from_connection(conn) {
            Ok(_) => panic!("schema without todos.description should be refused"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            RemoteError::Db(DbError::MissingColumn { table: "todos", column: "description" })
        ));
    }

    #[test]
    fn connection_behind_the_comment_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id TEXT, username TEXT, email TEXT, created_at TEXT, updated_at TEXT);
             PRAGMA user_version = 1;",
        )
        .unwrap();

        let err = match SqliteTableStore::from_connection(conn) {
            Ok(_) => panic!("version 1 schema has no todo_comments table"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            RemoteError::Db(DbError::MissingTable { table: "todo_comments", version: 1 })
        ));
    }
}

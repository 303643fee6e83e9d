use rusqlite::Connection;
use todo_core::db::migrations::{apply_migrations, latest_version, tables_at};
use todo_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "todos");
    assert_table_exists(&conn, "todo_comments");
}

#[test]
fn reopening_file_database_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todos.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO users (id, username, email) VALUES ('u1', 'ada', 'ada@example.com');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let users: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 1);
}

#[test]
fn todo_status_defaults_to_pending() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, username, email) VALUES ('u1', 'ada', 'ada@example.com');
         INSERT INTO todos (id, name, priority, creator_id) VALUES ('t1', 'Buy milk', 'low', 'u1');",
    )
    .unwrap();

    let status: String = conn
        .query_row("SELECT status FROM todos WHERE id = 't1';", [], |row| row.get(0))
        .unwrap();
    assert_eq!(status, "pending");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn migrations_report_applied_versions_once() {
    let mut conn = Connection::open_in_memory().unwrap();

    assert_eq!(apply_migrations(&mut conn).unwrap(), vec![1, 2]);
    assert!(apply_migrations(&mut conn).unwrap().is_empty());
    assert_eq!(
        tables_at(latest_version()),
        vec![("users", 1), ("todos", 1), ("todo_comments", 2)]
    );
    assert_eq!(tables_at(1), vec![("users", 1), ("todos", 1)]);
}

#[test]
fn version_stamp_without_tables_names_the_missing_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 2;").unwrap();

    match apply_migrations(&mut conn).unwrap_err() {
        DbError::MissingTable { table, version } => {
            assert_eq!(table, "users");
            assert_eq!(version, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_migration_reports_its_version_and_rolls_back() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id TEXT PRIMARY KEY NOT NULL);
         CREATE TABLE todos (id TEXT PRIMARY KEY NOT NULL);
         CREATE TABLE todo_comments (id TEXT PRIMARY KEY NOT NULL);
         PRAGMA user_version = 1;",
    )
    .unwrap();

    match apply_migrations(&mut conn).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(schema_version(&conn), 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

//! Remote Store capability and its backends.
//!
//! # Responsibility
//! - Define the CRUD contract the core needs from a relational table service.
//! - Collapse transport faults and error payloads into one `RemoteError`.
//! - Provide an optional deadline wrapper for remote calls.
//!
//! # Invariants
//! - Rows cross this boundary as JSON objects keyed by column name.
//! - Update and delete always match a single row by `id`.
//! - A call either returns `Ok` or a `RemoteError`; it never panics.

mod postgrest;
mod sqlite;

pub use postgrest::PostgrestStore;
pub use sqlite::SqliteTableStore;

use crate::db::DbError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One table row, keyed by column name.
pub type Row = Map<String, Value>;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Tables exposed by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Todos,
    TodoComments,
    Users,
}

impl Table {
    pub const ALL: [Table; 3] = [Self::Todos, Self::TodoComments, Self::Users];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todos => "todos",
            Self::TodoComments => "todo_comments",
            Self::Users => "users",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for [`SelectQuery`] ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering clause for [`SelectQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Select options: equality filters, optional order and optional limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectQuery {
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    /// Selects every row, unordered.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a `column = value` filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn newest_first(self) -> Self {
        self.order_by("created_at", Direction::Descending)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Failure of a Remote Store call.
///
/// Every variant means the same thing to callers: the remote attempt failed.
#[derive(Debug)]
pub enum RemoteError {
    /// Network-level failure before a response arrived.
    Transport(reqwest::Error),
    /// Service answered with a non-success status.
    Status { status: u16, message: String },
    /// Response or row could not be converted.
    Decode(serde_json::Error),
    /// Embedded table service failure.
    Db(DbError),
    /// Request rejected before reaching storage (unknown column, bad table).
    Query(String),
    /// Deadline expired before the call completed.
    Timeout(Duration),
    /// Store cannot serve requests at all.
    Unavailable(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "remote transport failure: {err}"),
            Self::Status { status, message } => {
                write!(f, "remote returned status {status}: {message}")
            }
            Self::Decode(err) => write!(f, "remote payload decode failure: {err}"),
            Self::Db(err) => write!(f, "remote table failure: {err}"),
            Self::Query(message) => write!(f, "invalid remote query: {message}"),
            Self::Timeout(limit) => {
                write!(f, "remote call timed out after {} ms", limit.as_millis())
            }
            Self::Unavailable(message) => write!(f, "remote unavailable: {message}"),
        }
    }
}

impl Error for RemoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Status { .. } | Self::Query(_) | Self::Timeout(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<DbError> for RemoteError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RemoteError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value.into())
    }
}

/// CRUD capability of a relational table service.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: Table, query: &SelectQuery) -> RemoteResult<Vec<Row>>;
    async fn insert(&self, table: Table, row: Row) -> RemoteResult<()>;
    async fn update(&self, table: Table, patch: Row, id: &str) -> RemoteResult<()>;
    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()>;
}

#[async_trait]
impl<S: RemoteStore + ?Sized> RemoteStore for Arc<S> {
    async fn select(&self, table: Table, query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        (**self).select(table, query).await
    }

    async fn insert(&self, table: Table, row: Row) -> RemoteResult<()> {
        (**self).insert(table, row).await
    }

    async fn update(&self, table: Table, patch: Row, id: &str) -> RemoteResult<()> {
        (**self).update(table, patch, id).await
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        (**self).delete(table, id).await
    }
}

/// Awaits a remote call, bounded by `deadline` when one is set.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, call: F) -> RemoteResult<T>
where
    F: Future<Output = RemoteResult<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| Err(RemoteError::Timeout(limit))),
        None => call.await,
    }
}

/// Converts a serializable value into a row. Non-object values are rejected.
pub fn encode_row<T: Serialize>(value: &T) -> RemoteResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(RemoteError::Query(format!(
            "expected a JSON object row, got `{other}`"
        ))),
    }
}

/// Converts rows into typed records.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> RemoteResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(RemoteError::from))
        .collect()
}

/// Renders a filter value the way the services expect it in a query string.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

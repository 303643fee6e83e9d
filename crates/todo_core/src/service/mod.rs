//! Core use-case services.
//!
//! # Responsibility
//! - Validate caller input before it reaches a store.
//! - Expose per-entity CRUD entry points to the API layer.
//!
//! # Invariants
//! - Invalid input never touches the Remote Store or the Local Mirror.
//! - Only the todo service falls back to the Local Mirror; comments and
//!   users pass straight through to the Remote Store.

pub mod comment_service;
pub mod todo_service;
pub mod user_service;
pub mod validation;

use crate::remote::{
    decode_rows, encode_row, with_deadline, RemoteError, RemoteStore, SelectQuery, Table,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use validation::ValidationError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for use-case entry points.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any store was touched.
    Validation(ValidationError),
    /// Remote Store failure on a pass-through service.
    Remote(RemoteError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Remote(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RemoteError> for ServiceError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

/// Typed access to one remote table, bounded by an optional deadline.
pub(crate) struct RemoteTable<S: RemoteStore> {
    remote: S,
    table: Table,
    deadline: Option<Duration>,
}

impl<S: RemoteStore> RemoteTable<S> {
    pub(crate) fn new(remote: S, table: Table, deadline: Option<Duration>) -> Self {
        Self {
            remote,
            table,
            deadline,
        }
    }

    pub(crate) async fn list<T: DeserializeOwned>(&self, query: &SelectQuery) -> ServiceResult<Vec<T>> {
        let rows = with_deadline(self.deadline, self.remote.select(self.table, query)).await?;
        Ok(decode_rows(rows)?)
    }

    pub(crate) async fn first<T: DeserializeOwned>(&self, id: &str) -> ServiceResult<Option<T>> {
        let query = SelectQuery::all().eq("id", id).limit(1);
        Ok(self.list(&query).await?.into_iter().next())
    }

    pub(crate) async fn insert<T: Serialize>(&self, value: &T) -> ServiceResult<()> {
        let row = encode_row(value)?;
        with_deadline(self.deadline, self.remote.insert(self.table, row)).await?;
        Ok(())
    }

    pub(crate) async fn update<T: Serialize>(&self, id: &str, patch: &T) -> ServiceResult<()> {
        let row = encode_row(patch)?;
        with_deadline(self.deadline, self.remote.update(self.table, row, id)).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, id: &str) -> ServiceResult<()> {
        with_deadline(self.deadline, self.remote.delete(self.table, id)).await?;
        Ok(())
    }
}

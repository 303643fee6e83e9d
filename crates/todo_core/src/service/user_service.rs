//! User use-case service.
//!
//! Pass-through to the `users` remote table.

use super::validation::{self, ValidationResult};
use super::{RemoteTable, ServiceResult};
use crate::model::user::{User, UserDraft, UserPatch};
use crate::remote::{RemoteStore, SelectQuery, Table};
use std::time::Duration;

pub struct UserService<S: RemoteStore> {
    table: RemoteTable<S>,
}

impl<S: RemoteStore> UserService<S> {
    pub fn new(remote: S, deadline: Option<Duration>) -> Self {
        Self {
            table: RemoteTable::new(remote, Table::Users, deadline),
        }
    }

    /// All users, newest first.
    pub async fn find(&self) -> ServiceResult<Vec<User>> {
        self.table.list(&SelectQuery::all().newest_first()).await
    }

    pub async fn find_one(&self, id: &str) -> ServiceResult<Option<User>> {
        validation::uuid("id", id)?;
        self.table.first(id).await
    }

    pub async fn create(&self, draft: &UserDraft) -> ServiceResult<()> {
        validation::non_empty("username", &draft.username)?;
        validation::email("email", &draft.email)?;
        self.table.insert(draft).await
    }

    pub async fn update(&self, id: &str, patch: &UserPatch) -> ServiceResult<()> {
        validation::uuid("id", id)?;
        validate_patch(patch)?;
        self.table.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        validation::uuid("id", id)?;
        self.table.delete(id).await
    }
}

fn validate_patch(patch: &UserPatch) -> ValidationResult {
    if let Some(username) = &patch.username {
        validation::non_empty("username", username)?;
    }
    if let Some(email) = &patch.email {
        validation::email("email", email)?;
    }
    Ok(())
}

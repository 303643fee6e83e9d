//! Todo comment use-case service.
//!
//! Pass-through to the `todo_comments` remote table; there is no local
//! fallback for comments.

use super::validation::{self, ValidationResult};
use super::{RemoteTable, ServiceResult};
use crate::model::comment::{TodoComment, TodoCommentDraft, TodoCommentPatch};
use crate::remote::{RemoteStore, SelectQuery, Table};
use std::time::Duration;

pub struct TodoCommentService<S: RemoteStore> {
    table: RemoteTable<S>,
}

impl<S: RemoteStore> TodoCommentService<S> {
    pub fn new(remote: S, deadline: Option<Duration>) -> Self {
        Self {
            table: RemoteTable::new(remote, Table::TodoComments, deadline),
        }
    }

    /// All comments, newest first.
    pub async fn find(&self) -> ServiceResult<Vec<TodoComment>> {
        self.table.list(&SelectQuery::all().newest_first()).await
    }

    pub async fn find_one(&self, id: &str) -> ServiceResult<Option<TodoComment>> {
        validation::uuid("id", id)?;
        self.table.first(id).await
    }

    /// Comments on one todo, newest first.
    pub async fn find_by_todo_id(&self, todo_id: &str) -> ServiceResult<Vec<TodoComment>> {
        validation::record_id("todo_id", todo_id)?;
        let query = SelectQuery::all().eq("todo_id", todo_id).newest_first();
        self.table.list(&query).await
    }

    pub async fn create(&self, draft: &TodoCommentDraft) -> ServiceResult<()> {
        validate_draft(draft)?;
        self.table.insert(draft).await
    }

    pub async fn update(&self, id: &str, patch: &TodoCommentPatch) -> ServiceResult<()> {
        validation::uuid("id", id)?;
        validate_patch(patch)?;
        self.table.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        validation::uuid("id", id)?;
        self.table.delete(id).await
    }
}

fn validate_draft(draft: &TodoCommentDraft) -> ValidationResult {
    validation::uuid("todo_id", &draft.todo_id)?;
    validation::uuid("user_id", &draft.user_id)
}

fn validate_patch(patch: &TodoCommentPatch) -> ValidationResult {
    if let Some(todo_id) = &patch.todo_id {
        validation::uuid("todo_id", todo_id)?;
    }
    if let Some(user_id) = &patch.user_id {
        validation::uuid("user_id", user_id)?;
    }
    Ok(())
}

//! Todo use-case service.
//!
//! # Responsibility
//! - Validate todo input at the boundary.
//! - Delegate to the dual-store repository.
//!
//! # Invariants
//! - Once input is valid, every call succeeds; degraded mode shows up only
//!   as `StoreOrigin::Local` on the result.

use super::validation::{self, ValidationResult};
use super::ServiceResult;
use crate::model::todo::{TodoDraft, TodoPatch};
use crate::remote::RemoteStore;
use crate::repo::todo_repo::{DualStoreTodoRepository, Listing, Lookup, WriteResult};

/// Use-case service wrapper for todo CRUD operations.
pub struct TodoService<S: RemoteStore> {
    repo: DualStoreTodoRepository<S>,
}

impl<S: RemoteStore> TodoService<S> {
    pub fn new(repo: DualStoreTodoRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &DualStoreTodoRepository<S> {
        &self.repo
    }

    pub async fn find(&self) -> Listing {
        self.repo.find().await
    }

    pub async fn find_one(&self, id: &str) -> ServiceResult<Option<Lookup>> {
        validation::record_id("id", id)?;
        Ok(self.repo.find_one(id).await)
    }

    pub async fn create(&self, draft: TodoDraft) -> ServiceResult<WriteResult> {
        validate_draft(&draft)?;
        Ok(self.repo.create(draft).await)
    }

    pub async fn update(&self, id: &str, patch: TodoPatch) -> ServiceResult<WriteResult> {
        validation::record_id("id", id)?;
        validate_patch(&patch)?;
        Ok(self.repo.update(id, patch).await)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<WriteResult> {
        validation::record_id("id", id)?;
        Ok(self.repo.delete(id).await)
    }
}

fn validate_draft(draft: &TodoDraft) -> ValidationResult {
    validation::non_empty("name", &draft.name)?;
    validation::non_empty("priority", &draft.priority)?;
    if let Some(status) = &draft.status {
        validation::non_empty("status", status)?;
    }
    if let Some(points) = draft.story_points {
        validation::story_points("story_points", points)?;
    }
    if let Some(due_date) = &draft.due_date {
        validation::timestamp("due_date", due_date)?;
    }
    validation::uuid("creator_id", &draft.creator_id)?;
    if let Some(assignee_id) = &draft.assignee_id {
        validation::uuid("assignee_id", assignee_id)?;
    }
    Ok(())
}

fn validate_patch(patch: &TodoPatch) -> ValidationResult {
    if let Some(name) = &patch.name {
        validation::non_empty("name", name)?;
    }
    if let Some(priority) = &patch.priority {
        validation::non_empty("priority", priority)?;
    }
    if let Some(status) = &patch.status {
        validation::non_empty("status", status)?;
    }
    if let Some(Some(points)) = patch.story_points {
        validation::story_points("story_points", points)?;
    }
    if let Some(Some(due_date)) = &patch.due_date {
        validation::timestamp("due_date", due_date)?;
    }
    if let Some(creator_id) = &patch.creator_id {
        validation::uuid("creator_id", creator_id)?;
    }
    if let Some(Some(assignee_id)) = &patch.assignee_id {
        validation::uuid("assignee_id", assignee_id)?;
    }
    Ok(())
}

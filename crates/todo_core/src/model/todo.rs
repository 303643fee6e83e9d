//! Todo domain model.
//!
//! # Responsibility
//! - Define the `todos` row, its create draft and its partial-update patch.
//! - Define provenance tags used by the Local Mirror.
//!
//! # Invariants
//! - `id` is never changed by a patch.
//! - `status` defaults to `pending` when a draft omits it.
//! - `updated_at` stays absent until the first update.

use super::{null_as_empty, present};
use serde::{Deserialize, Serialize};

/// Identifier of a todo row.
///
/// Remote rows carry server-assigned UUIDs; local-only rows carry
/// `local-{millis}-{seq}` ids.
pub type TodoId = String;

/// Status assigned when a draft does not carry one.
pub const DEFAULT_STATUS: &str = "pending";

/// One `todos` row.
///
/// `priority` and `status` are free-form; the UI gives `low|medium|high` and
/// `pending|in_progress|completed|archived` special treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub story_points: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub creator_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Todo {
    /// Builds a row from a draft with caller-assigned identity and creation time.
    ///
    /// # Invariants
    /// - Absent `status` becomes [`DEFAULT_STATUS`].
    /// - `updated_at` is left absent.
    pub fn from_draft(id: impl Into<TodoId>, draft: TodoDraft, created_at: String) -> Self {
        Self {
            id: id.into(),
            name: draft.name,
            description: draft.description,
            priority: draft.priority,
            status: draft.status.unwrap_or_else(default_status),
            story_points: draft.story_points,
            due_date: draft.due_date,
            assignee_id: draft.assignee_id,
            creator_id: draft.creator_id,
            created_at,
            updated_at: None,
        }
    }

    /// Overwrites every field the patch carries; leaves the rest untouched.
    pub fn apply(&mut self, patch: &TodoPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = &patch.priority {
            self.priority = priority.clone();
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(story_points) = patch.story_points {
            self.story_points = story_points;
        }
        if let Some(due_date) = &patch.due_date {
            self.due_date = due_date.clone();
        }
        if let Some(assignee_id) = &patch.assignee_id {
            self.assignee_id = assignee_id.clone();
        }
        if let Some(creator_id) = &patch.creator_id {
            self.creator_id = creator_id.clone();
        }
    }
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Create input: a todo without `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TodoDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub story_points: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub creator_id: String,
}

impl TodoDraft {
    pub fn new(
        name: impl Into<String>,
        priority: impl Into<String>,
        creator_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority: priority.into(),
            creator_id: creator_id.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Partial update. Nullable columns are tri-state: absent, `null`, or a value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub story_points: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Where a Local Mirror entry came from.
///
/// An id the mirror does not hold is implicitly remote-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Shadow copy of a Remote Store row. Remote wins when reachable.
    Mirrored,
    /// Exists locally only, or diverged after a failed remote write.
    LocalOnly,
}

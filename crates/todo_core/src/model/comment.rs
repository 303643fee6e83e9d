//! Todo comment model (`todo_comments` table).

use serde::{Deserialize, Serialize};

/// One `todo_comments` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoComment {
    pub id: String,
    pub comment: String,
    pub todo_id: String,
    pub user_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Create input for a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCommentDraft {
    pub comment: String,
    pub todo_id: String,
    pub user_id: String,
}

/// Partial update for a comment. Every column is non-nullable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodoCommentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

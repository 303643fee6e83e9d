//! Local Mirror: the in-process fallback collection of todos.
//!
//! # Responsibility
//! - Hold shadow copies of remote rows and local-only rows, newest first.
//! - Apply merges and removals by id.
//!
//! # Invariants
//! - Ids are unique; prepending a present id replaces the old entry.
//! - Order is insertion order reversed (newest first).
//! - Nothing is persisted; contents reset with the process.

use crate::model::todo::{Provenance, Todo, TodoPatch};
use std::collections::VecDeque;

/// One mirrored todo with its provenance tag.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorEntry {
    pub todo: Todo,
    pub provenance: Provenance,
}

/// Ordered, owned collection of todo records.
#[derive(Debug, Default)]
pub struct LocalMirror {
    entries: VecDeque<MirrorEntry>,
}

impl LocalMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Puts `todo` at the front, replacing any entry with the same id.
    pub fn prepend(&mut self, todo: Todo, provenance: Provenance) {
        self.entries.retain(|entry| entry.todo.id != todo.id);
        self.entries.push_front(MirrorEntry { todo, provenance });
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.entry(id).map(|entry| &entry.todo)
    }

    /// Returns the provenance of `id`, or `None` when the mirror does not hold it.
    pub fn provenance(&self, id: &str) -> Option<Provenance> {
        self.entry(id).map(|entry| entry.provenance)
    }

    /// Returns a newest-first snapshot of every record.
    pub fn list(&self) -> Vec<Todo> {
        self.entries.iter().map(|entry| entry.todo.clone()).collect()
    }

    /// Merges `patch` into the entry for `id` and sets its `updated_at`.
    ///
    /// The caller supplies the stamp so a mirrored copy can carry the same
    /// value that was sent to the Remote Store. Returns the merged record, or
    /// `None` when the id is not present.
    pub fn merge(&mut self, id: &str, patch: &TodoPatch, updated_at: &str) -> Option<Todo> {
        let entry = self.entry_mut(id)?;
        entry.todo.apply(patch);
        entry.todo.updated_at = Some(updated_at.to_string());
        Some(entry.todo.clone())
    }

    /// Changes the provenance tag of `id`. Returns whether the id was present.
    pub fn retag(&mut self, id: &str, provenance: Provenance) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.provenance = provenance;
                true
            }
            None => false,
        }
    }

    /// Removes the entry for `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.todo.id != id);
        self.entries.len() != before
    }

    fn entry(&self, id: &str) -> Option<&MirrorEntry> {
        self.entries.iter().find(|entry| entry.todo.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut MirrorEntry> {
        self.entries.iter_mut().find(|entry| entry.todo.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::LocalMirror;
    use crate::model::todo::{Provenance, Todo, TodoDraft, TodoPatch};

    fn todo(id: &str, name: &str) -> Todo {
        Todo::from_draft(
            id,
            TodoDraft::new(name, "low", "u1"),
            "2024-01-01T00:00:00.000000Z".to_string(),
        )
    }

    #[test]
    fn prepend_keeps_newest_first() {
        let mut mirror = LocalMirror::new();
        mirror.prepend(todo("a", "A"), Provenance::LocalOnly);
        mirror.prepend(todo("b", "B"), Provenance::LocalOnly);
        mirror.prepend(todo("c", "C"), Provenance::Mirrored);

        let ids: Vec<_> = mirror.list().into_iter().map(|todo| todo.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn prepend_replaces_existing_id() {
        let mut mirror = LocalMirror::new();
        mirror.prepend(todo("a", "old"), Provenance::LocalOnly);
        mirror.prepend(todo("b", "B"), Provenance::LocalOnly);
        mirror.prepend(todo("a", "new"), Provenance::Mirrored);

        assert_eq!(mirror.len(), 2);
        assert_eq!(mirror.list()[0].name, "new");
        assert_eq!(mirror.provenance("a"), Some(Provenance::Mirrored));
    }

    #[test]
    fn merge_uses_given_stamp_and_keeps_tag_until_retagged() {
        let mut mirror = LocalMirror::new();
        mirror.prepend(todo("a", "A"), Provenance::Mirrored);

        let patch = TodoPatch {
            status: Some("completed".to_string()),
            ..TodoPatch::default()
        };
        let stamp = "2024-02-03T04:05:06.000007Z";
        let merged = mirror.merge("a", &patch, stamp).expect("entry should exist");
        assert_eq!(merged.status, "completed");
        assert_eq!(merged.updated_at.as_deref(), Some(stamp));
        assert_eq!(mirror.get("a").and_then(|t| t.updated_at.as_deref()), Some(stamp));
        assert_eq!(mirror.provenance("a"), Some(Provenance::Mirrored));

        assert!(mirror.retag("a", Provenance::LocalOnly));
        assert_eq!(mirror.provenance("a"), Some(Provenance::LocalOnly));
        assert!(mirror.merge("missing", &patch, stamp).is_none());
        assert!(!mirror.retag("missing", Provenance::LocalOnly));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut mirror = LocalMirror::new();
        mirror.prepend(todo("a", "A"), Provenance::LocalOnly);
        assert!(mirror.remove("a"));
        assert!(!mirror.remove("a"));
        assert!(mirror.is_empty());
    }
}

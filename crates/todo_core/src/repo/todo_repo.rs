//! Dual-store todo repository.
//!
//! # Responsibility
//! - Serve find/find_one/create/update/delete against the Remote Store first.
//! - Fall back to the Local Mirror when the remote call fails or is not useful.
//!
//! # Invariants
//! - No operation returns an error; lookups signal absence with `None`.
//! - The mirror lock is released before every `.await`.
//! - Remote rows win whenever the Remote Store answers with data.
//! - A failed remote create always leaves a `LocalOnly` record behind.
//!
//! # Known races
//! - `create` recovers the server-assigned row by re-querying the newest row.
//!   Another client inserting in between makes the wrong row get mirrored.
//! - Local ids carry a process-wide sequence, so same-millisecond creates do
//!   not collide; cross-process collisions are not considered.

use crate::mirror::LocalMirror;
use crate::model::todo::{Provenance, Todo, TodoDraft, TodoId, TodoPatch};
use crate::model::utc_timestamp;
use crate::remote::{
    decode_rows, encode_row, with_deadline, RemoteResult, RemoteStore, SelectQuery, Table,
};
use chrono::Utc;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

static LOCAL_ID_SEQ: AtomicU64 = AtomicU64::new(0);

/// Store that produced a repository result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOrigin {
    Remote,
    /// Degraded mode: the Local Mirror answered.
    Local,
}

/// Result of `find`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub origin: StoreOrigin,
    /// Newest first.
    pub items: Vec<Todo>,
}

/// Result of a successful `find_one`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookup {
    pub origin: StoreOrigin,
    pub item: Todo,
}

/// Result of a write (`create`, `update`, `delete`).
///
/// Always a success shape. `count` is the number of records the answering
/// store reports as affected:
/// - create: always 1, including a remote insert whose re-query failed.
/// - remote update/delete: 1. The Remote Store acknowledges match-writes
///   without a row count, so an accepted write counts as one.
/// - local update/delete: 1 when the mirror held the id, 0 otherwise.
///
/// `data` carries the affected record when the answering store produced one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteResult<T = Todo> {
    pub origin: StoreOrigin,
    pub count: usize,
    pub data: Option<T>,
}

impl<T> WriteResult<T> {
    pub fn remote(count: usize, data: Option<T>) -> Self {
        Self {
            origin: StoreOrigin::Remote,
            count,
            data,
        }
    }

    pub fn local(count: usize, data: Option<T>) -> Self {
        Self {
            origin: StoreOrigin::Local,
            count,
            data,
        }
    }

    /// Remote acknowledgement of a single-record write with no payload.
    pub fn remote_ack() -> Self {
        Self::remote(1, None)
    }
}

/// Todo repository that shadows a Remote Store with a Local Mirror.
pub struct DualStoreTodoRepository<S: RemoteStore> {
    remote: S,
    mirror: Mutex<LocalMirror>,
    deadline: Option<Duration>,
}

impl<S: RemoteStore> DualStoreTodoRepository<S> {
    /// Creates a repository with an injected mirror and no remote deadline.
    pub fn new(remote: S, mirror: LocalMirror) -> Self {
        Self {
            remote,
            mirror: Mutex::new(mirror),
            deadline: None,
        }
    }

    /// Bounds every remote call; expiry is treated as a remote failure.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn remote(&self) -> &S {
        &self.remote
    }

    /// Provenance of `id` in the mirror; `None` means remote-only or unknown.
    pub fn provenance(&self, id: &str) -> Option<Provenance> {
        self.mirror().provenance(id)
    }

    /// Newest-first snapshot of the mirror.
    pub fn mirror_snapshot(&self) -> Vec<Todo> {
        self.mirror().list()
    }

    /// Returns all todos, newest first.
    ///
    /// Remote rows are returned verbatim when there is at least one; an empty
    /// or failed remote answer yields the mirror contents.
    pub async fn find(&self) -> Listing {
        let query = SelectQuery::all().newest_first();
        let outcome = self
            .guarded(self.remote.select(Table::Todos, &query))
            .await
            .and_then(decode_rows::<Todo>);

        match outcome {
            Ok(items) if !items.is_empty() => Listing {
                origin: StoreOrigin::Remote,
                items,
            },
            Ok(_) => {
                debug!("event=todo_find module=repo status=fallback reason=remote_empty");
                self.local_listing()
            }
            Err(err) => {
                warn!("event=todo_find module=repo status=fallback error={err}");
                self.local_listing()
            }
        }
    }

    /// Returns one todo by id from the first store that has it.
    pub async fn find_one(&self, id: &str) -> Option<Lookup> {
        let query = SelectQuery::all().eq("id", id).limit(1);
        let outcome = self
            .guarded(self.remote.select(Table::Todos, &query))
            .await
            .and_then(decode_rows::<Todo>);

        match outcome {
            Ok(items) => {
                if let Some(item) = items.into_iter().next() {
                    return Some(Lookup {
                        origin: StoreOrigin::Remote,
                        item,
                    });
                }
            }
            Err(err) => {
                warn!("event=todo_find_one module=repo status=fallback id={id} error={err}");
            }
        }

        self.mirror().get(id).cloned().map(|item| Lookup {
            origin: StoreOrigin::Local,
            item,
        })
    }

    /// Creates a todo. Never fails: a rejected remote insert yields a
    /// `LocalOnly` record in the mirror.
    pub async fn create(&self, draft: TodoDraft) -> WriteResult {
        let inserted = match encode_row(&draft) {
            Ok(row) => self.guarded(self.remote.insert(Table::Todos, row)).await,
            Err(err) => Err(err),
        };

        if let Err(err) = inserted {
            warn!("event=todo_create module=repo status=fallback error={err}");
            // Id and stamp are minted under the lock so mirror order matches
            // `created_at` order across concurrent callers.
            let mut mirror = self.mirror();
            let todo = Todo::from_draft(next_local_id(), draft, utc_timestamp());
            mirror.prepend(todo.clone(), Provenance::LocalOnly);
            return WriteResult::local(1, Some(todo));
        }

        let latest = self.fetch_latest().await;
        if let Some(todo) = &latest {
            self.mirror().prepend(todo.clone(), Provenance::Mirrored);
        }
        WriteResult::remote(1, latest)
    }

    /// Merges `patch` into the todo `id` and stamps `updated_at`.
    ///
    /// One stamp is taken per call and written to both stores. On remote
    /// success the mirror copy (if any) is merged too. On remote failure only
    /// the mirror is merged and the entry becomes `LocalOnly`; a missing entry
    /// yields `count: 0, data: None`, not an error.
    pub async fn update(&self, id: &str, patch: TodoPatch) -> WriteResult {
        let updated_at = utc_timestamp();
        let updated = match encode_row(&patch) {
            Ok(mut row) => {
                row.insert("updated_at".to_string(), Value::String(updated_at.clone()));
                self.guarded(self.remote.update(Table::Todos, row, id)).await
            }
            Err(err) => Err(err),
        };

        let mut mirror = self.mirror();
        match updated {
            Ok(()) => {
                mirror.merge(id, &patch, &updated_at);
                WriteResult::remote_ack()
            }
            Err(err) => {
                warn!("event=todo_update module=repo status=fallback id={id} error={err}");
                let merged = mirror.merge(id, &patch, &updated_at);
                mirror.retag(id, Provenance::LocalOnly);
                WriteResult::local(usize::from(merged.is_some()), merged)
            }
        }
    }

    /// Deletes the todo `id` from every store that holds it. Idempotent.
    pub async fn delete(&self, id: &str) -> WriteResult {
        let deleted = self.guarded(self.remote.delete(Table::Todos, id)).await;

        let removed = self.mirror().remove(id);
        match deleted {
            Ok(()) => WriteResult::remote_ack(),
            Err(err) => {
                warn!("event=todo_delete module=repo status=fallback id={id} error={err}");
                WriteResult::local(usize::from(removed), None)
            }
        }
    }

    async fn fetch_latest(&self) -> Option<Todo> {
        let query = SelectQuery::all().newest_first().limit(1);
        let outcome = self
            .guarded(self.remote.select(Table::Todos, &query))
            .await
            .and_then(decode_rows::<Todo>);

        match outcome {
            Ok(items) => items.into_iter().next(),
            Err(err) => {
                warn!("event=todo_create module=repo status=requery_failed error={err}");
                None
            }
        }
    }

    async fn guarded<T, F>(&self, call: F) -> RemoteResult<T>
    where
        F: Future<Output = RemoteResult<T>>,
    {
        with_deadline(self.deadline, call).await
    }

    fn local_listing(&self) -> Listing {
        Listing {
            origin: StoreOrigin::Local,
            items: self.mirror().list(),
        }
    }

    fn mirror(&self) -> MutexGuard<'_, LocalMirror> {
        // Mirror mutations cannot leave it half-written, so a poisoned lock
        // still guards consistent data.
        self.mirror.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-local id for records created while the Remote Store is failing.
fn next_local_id() -> TodoId {
    let millis = Utc::now().timestamp_millis();
    let seq = LOCAL_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("local-{millis}-{seq}")
}

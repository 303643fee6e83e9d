//! Repository layer over the Remote Store and the Local Mirror.
//!
//! # Responsibility
//! - Resolve every todo operation remote-first with local fallback.
//! - Keep the Local Mirror reconciled after successful remote writes.
//!
//! # Invariants
//! - Remote failures are logged and absorbed; callers never see them.
//! - Results carry the store that answered (`StoreOrigin`).

pub mod todo_repo;

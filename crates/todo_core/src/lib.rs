//! Core domain logic for the todo tracker.
//!
//! Todos are served remote-first from a relational table service and fall
//! back to an in-process Local Mirror whenever the remote side fails.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod remote;
pub mod repo;
pub mod service;

pub use api::{ApiError, ApiResult, ApiRouter, Procedure};
pub use config::{AppConfig, ConfigError, RemoteBackend};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mirror::{LocalMirror, MirrorEntry};
pub use model::comment::{TodoComment, TodoCommentDraft, TodoCommentPatch};
pub use model::todo::{Provenance, Todo, TodoDraft, TodoId, TodoPatch};
pub use model::user::{User, UserDraft, UserPatch};
pub use remote::{
    PostgrestStore, RemoteError, RemoteResult, RemoteStore, Row, SelectQuery, SqliteTableStore,
    Table,
};
pub use repo::todo_repo::{DualStoreTodoRepository, Listing, Lookup, StoreOrigin, WriteResult};
pub use service::comment_service::TodoCommentService;
pub use service::todo_service::TodoService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

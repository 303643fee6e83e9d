//! Procedure dispatch for the UI-facing API.
//!
//! # Responsibility
//! - Map `namespace.procedure` names onto service calls.
//! - Decode JSON input and encode JSON output.
//!
//! # Invariants
//! - Procedure names follow the `todo.*`, `todoComment.*` and `user.*`
//!   namespaces.
//! - Writes answer with an `{origin, data}` envelope.

use crate::config::AppConfig;
use crate::mirror::LocalMirror;
use crate::model::comment::{TodoComment, TodoCommentDraft, TodoCommentPatch};
use crate::model::todo::{TodoDraft, TodoPatch};
use crate::model::user::{User, UserDraft, UserPatch};
use crate::remote::{RemoteResult, RemoteStore};
use crate::repo::todo_repo::{DualStoreTodoRepository, WriteResult};
use crate::service::comment_service::TodoCommentService;
use crate::service::todo_service::TodoService;
use crate::service::user_service::UserService;
use crate::service::ServiceError;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ApiResult<T> = Result<T, ApiError>;

/// Dispatch failure.
#[derive(Debug)]
pub enum ApiError {
    UnknownProcedure(String),
    InvalidInput {
        procedure: Procedure,
        source: serde_json::Error,
    },
    Service(ServiceError),
    Encode(serde_json::Error),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProcedure(name) => write!(f, "unknown procedure `{name}`"),
            Self::InvalidInput { procedure, source } => {
                write!(f, "invalid input for `{}`: {source}", procedure.name())
            }
            Self::Service(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode result: {err}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownProcedure(_) => None,
            Self::InvalidInput { source, .. } => Some(source),
            Self::Service(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

/// Every procedure the router serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    TodoFind,
    TodoFindOne,
    TodoCreate,
    TodoUpdate,
    TodoDelete,
    CommentFind,
    CommentFindOne,
    CommentFindByTodoId,
    CommentCreate,
    CommentUpdate,
    CommentDelete,
    UserFind,
    UserFindOne,
    UserCreate,
    UserUpdate,
    UserDelete,
}

impl Procedure {
    pub const ALL: &'static [Procedure] = &[
        Self::TodoFind,
        Self::TodoFindOne,
        Self::TodoCreate,
        Self::TodoUpdate,
        Self::TodoDelete,
        Self::CommentFind,
        Self::CommentFindOne,
        Self::CommentFindByTodoId,
        Self::CommentCreate,
        Self::CommentUpdate,
        Self::CommentDelete,
        Self::UserFind,
        Self::UserFindOne,
        Self::UserCreate,
        Self::UserUpdate,
        Self::UserDelete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TodoFind => "todo.find",
            Self::TodoFindOne => "todo.findOne",
            Self::TodoCreate => "todo.create",
            Self::TodoUpdate => "todo.update",
            Self::TodoDelete => "todo.delete",
            Self::CommentFind => "todoComment.find",
            Self::CommentFindOne => "todoComment.findOne",
            Self::CommentFindByTodoId => "todoComment.findByTodoId",
            Self::CommentCreate => "todoComment.create",
            Self::CommentUpdate => "todoComment.update",
            Self::CommentDelete => "todoComment.delete",
            Self::UserFind => "user.find",
            Self::UserFindOne => "user.findOne",
            Self::UserCreate => "user.create",
            Self::UserUpdate => "user.update",
            Self::UserDelete => "user.delete",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|procedure| procedure.name() == name.trim())
    }
}

#[derive(Debug, Deserialize)]
struct IdInput {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodoIdInput {
    todo_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateInput<P> {
    id: String,
    #[serde(flatten)]
    patch: P,
}

/// Routes procedure calls to the entity services.
pub struct ApiRouter<S: RemoteStore> {
    todos: TodoService<S>,
    comments: TodoCommentService<S>,
    users: UserService<S>,
}

impl<S: RemoteStore> ApiRouter<S> {
    pub fn new(
        todos: TodoService<S>,
        comments: TodoCommentService<S>,
        users: UserService<S>,
    ) -> Self {
        Self {
            todos,
            comments,
            users,
        }
    }

    pub fn todos(&self) -> &TodoService<S> {
        &self.todos
    }

    /// Dispatches one call by procedure name.
    ///
    /// # Errors
    /// - `UnknownProcedure` for names outside the known namespaces.
    /// - `InvalidInput` when `input` does not decode into the procedure shape.
    /// - `Service` for validation failures and pass-through remote failures.
    pub async fn dispatch(&self, name: &str, input: Value) -> ApiResult<Value> {
        let procedure =
            Procedure::parse(name).ok_or_else(|| ApiError::UnknownProcedure(name.to_string()))?;
        let started_at = Instant::now();

        let result = self.call(procedure, input).await;
        match &result {
            Ok(_) => debug!(
                "event=api_call module=api status=ok procedure={} duration_ms={}",
                procedure.name(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=api_call module=api status=error procedure={} duration_ms={} error={err}",
                procedure.name(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    async fn call(&self, procedure: Procedure, input: Value) -> ApiResult<Value> {
        match procedure {
            Procedure::TodoFind => encode(&self.todos.find().await),
            Procedure::TodoFindOne => {
                let input: IdInput = decode(procedure, input)?;
                encode(&self.todos.find_one(&input.id).await?)
            }
            Procedure::TodoCreate => {
                let draft: TodoDraft = decode(procedure, input)?;
                encode(&self.todos.create(draft).await?)
            }
            Procedure::TodoUpdate => {
                let input: UpdateInput<TodoPatch> = decode(procedure, input)?;
                encode(&self.todos.update(&input.id, input.patch).await?)
            }
            Procedure::TodoDelete => {
                let input: IdInput = decode(procedure, input)?;
                encode(&self.todos.delete(&input.id).await?)
            }
            Procedure::CommentFind => encode(&self.comments.find().await?),
            Procedure::CommentFindOne => {
                let input: IdInput = decode(procedure, input)?;
                encode(&self.comments.find_one(&input.id).await?)
            }
            Procedure::CommentFindByTodoId => {
                let input: TodoIdInput = decode(procedure, input)?;
                encode(&self.comments.find_by_todo_id(&input.todo_id).await?)
            }
            Procedure::CommentCreate => {
                let draft: TodoCommentDraft = decode(procedure, input)?;
                self.comments.create(&draft).await?;
                encode(&WriteResult::<TodoComment>::remote_ack())
            }
            Procedure::CommentUpdate => {
                let input: UpdateInput<TodoCommentPatch> = decode(procedure, input)?;
                self.comments.update(&input.id, &input.patch).await?;
                encode(&WriteResult::<TodoComment>::remote_ack())
            }
            Procedure::CommentDelete => {
                let input: IdInput = decode(procedure, input)?;
                self.comments.delete(&input.id).await?;
                encode(&WriteResult::<TodoComment>::remote_ack())
            }
            Procedure::UserFind => encode(&self.users.find().await?),
            Procedure::UserFindOne => {
                let input: IdInput = decode(procedure, input)?;
                encode(&self.users.find_one(&input.id).await?)
            }
            Procedure::UserCreate => {
                let draft: UserDraft = decode(procedure, input)?;
                self.users.create(&draft).await?;
                encode(&WriteResult::<User>::remote_ack())
            }
            Procedure::UserUpdate => {
                let input: UpdateInput<UserPatch> = decode(procedure, input)?;
                self.users.update(&input.id, &input.patch).await?;
                encode(&WriteResult::<User>::remote_ack())
            }
            Procedure::UserDelete => {
                let input: IdInput = decode(procedure, input)?;
                self.users.delete(&input.id).await?;
                encode(&WriteResult::<User>::remote_ack())
            }
        }
    }
}

impl ApiRouter<Arc<dyn RemoteStore>> {
    /// Wires every service onto the configured Remote Store and a fresh
    /// Local Mirror.
    pub fn from_config(config: &AppConfig) -> RemoteResult<Self> {
        let remote = config.connect_remote()?;
        let deadline = config.remote_timeout;
        let repo = DualStoreTodoRepository::new(Arc::clone(&remote), LocalMirror::new())
            .with_deadline(deadline);

        Ok(Self::new(
            TodoService::new(repo),
            TodoCommentService::new(Arc::clone(&remote), deadline),
            UserService::new(remote, deadline),
        ))
    }
}

fn decode<T: DeserializeOwned>(procedure: Procedure, input: Value) -> ApiResult<T> {
    serde_json::from_value(input).map_err(|source| ApiError::InvalidInput { procedure, source })
}

fn encode<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(ApiError::Encode)
}

//! Application configuration loaded from the environment.
//!
//! # Responsibility
//! - Select the Remote Store backend and its credentials.
//! - Carry the remote deadline and logging settings.
//!
//! # Invariants
//! - `DATABASE_URL` and `API_KEY` are either both set or both absent.
//! - A timeout of `0` means remote calls are unbounded.

use crate::logging::default_log_level;
use crate::remote::{PostgrestStore, RemoteResult, RemoteStore, SqliteTableStore};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_SQLITE_PATH: &str = "TODO_SQLITE_PATH";
pub const ENV_REMOTE_TIMEOUT_MS: &str = "TODO_REMOTE_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Only one of a pair of required variables is set.
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
    Invalid {
        key: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incomplete { present, missing } => {
                write!(f, "`{present}` is set but `{missing}` is missing")
            }
            Self::Invalid { key, value } => write!(f, "invalid value `{value}` for `{key}`"),
        }
    }
}

impl Error for ConfigError {}

/// Which service plays the Remote Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteBackend {
    /// Hosted PostgREST endpoint.
    Postgrest { url: String, api_key: String },
    /// Embedded SQLite table service; `None` keeps it in memory.
    Sqlite { path: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: RemoteBackend,
    pub remote_timeout: Option<Duration>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: RemoteBackend::Sqlite { path: None },
            remote_timeout: Some(DEFAULT_REMOTE_TIMEOUT),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match (get(ENV_DATABASE_URL), get(ENV_API_KEY)) {
            (Some(url), Some(api_key)) => RemoteBackend::Postgrest { url, api_key },
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: ENV_DATABASE_URL,
                    missing: ENV_API_KEY,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    present: ENV_API_KEY,
                    missing: ENV_DATABASE_URL,
                })
            }
            (None, None) => RemoteBackend::Sqlite {
                path: get(ENV_SQLITE_PATH).map(PathBuf::from),
            },
        };

        let remote_timeout = match get(ENV_REMOTE_TIMEOUT_MS) {
            None => Some(DEFAULT_REMOTE_TIMEOUT),
            Some(value) => match value.parse::<u64>() {
                Ok(0) => None,
                Ok(millis) => Some(Duration::from_millis(millis)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        key: ENV_REMOTE_TIMEOUT_MS,
                        value,
                    })
                }
            },
        };

        Ok(Self {
            backend,
            remote_timeout,
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        })
    }

    pub fn with_backend(mut self, backend: RemoteBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Connects the configured Remote Store backend.
    pub fn connect_remote(&self) -> RemoteResult<Arc<dyn RemoteStore>> {
        let store: Arc<dyn RemoteStore> = match &self.backend {
            RemoteBackend::Postgrest { url, api_key } => {
                Arc::new(PostgrestStore::new(url.as_str(), api_key.as_str())?)
            }
            RemoteBackend::Sqlite { path: Some(path) } => Arc::new(SqliteTableStore::open(path)?),
            RemoteBackend::Sqlite { path: None } => Arc::new(SqliteTableStore::open_in_memory()?),
        };
        Ok(store)
    }
}

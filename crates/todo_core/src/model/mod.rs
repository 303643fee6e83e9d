//! Domain model for todos, comments and users.
//!
//! # Responsibility
//! - Define the row shapes shared with the remote tables.
//! - Define create drafts and partial-update patches per entity.
//!
//! # Invariants
//! - Field names match remote column names (`snake_case`).
//! - Timestamps are RFC 3339 strings in UTC.

pub mod comment;
pub mod todo;
pub mod user;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

/// Returns the current UTC time as an RFC 3339 string with microseconds.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Deserializes a present field into `Some(value)`, including explicit `null`.
///
/// Combined with `#[serde(default)]` this yields a tri-state patch field:
/// absent -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Deserializes a nullable string column into `String`, mapping `null` to "".
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

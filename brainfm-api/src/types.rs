//! Data types for Brain.fm API results.
//!
//! Field names follow Rust conventions; the raw wire names (`string_id`,
//! `player`, `token`, ...) are rewritten by each operation's response
//! projection before these types are built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A station as listed by the explore endpoints.
///
/// Projected JSON fields: `station_id` (from `id`), `name`,
/// `canonical_name` (from `string_id`), `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Numeric station ID, used by `get_station` / `get_token`.
    pub id: i64,
    /// Display name (e.g. "Focus").
    pub name: String,
    /// Stable string identifier (e.g. "focus").
    pub canonical_name: String,
    /// Parent station ID, absent for top-level stations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// Detail view of a single station.
///
/// Projected JSON fields: `station_id`, `name`, `canonical_name`,
/// `playable` (from `player`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDetail {
    /// Numeric station ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Stable string identifier.
    pub canonical_name: String,
    /// Whether the station can currently be played.
    pub playable: bool,
}

/// A playback session token.
///
/// Projected JSON fields: `session_id` (from `id`), `group`, `name`,
/// `station_id`, `session_token` (from `token`). The token string is opaque;
/// append it to the stream endpoint to play
/// (see [`Endpoints::stream_url`](crate::client::Endpoints::stream_url)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamToken {
    /// Playback session ID (used when rating the session).
    pub session_id: i64,
    /// Station group (e.g. "Focus").
    pub group: String,
    /// Session display name.
    pub name: String,
    /// Station the token was issued for.
    pub station_id: i64,
    /// Opaque token string.
    pub session_token: String,
}

/// A structured error rendered from a matched transport failure.
///
/// The service reports domain conditions as bare HTTP statuses; operations
/// with a registered error template translate those into this value so the
/// caller keeps context (e.g. which station id was unknown). Distinct from
/// both a successful result and a raised [`BrainfmError`](crate::BrainfmError).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
    /// Rendered template fields, e.g. `code` and `error`.
    pub fields: BTreeMap<String, String>,
}

impl StructuredError {
    /// Look up one rendered field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The `code` field, when the template declares one.
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// The `error` field, when the template declares one.
    pub fn message(&self) -> Option<&str> {
        self.get("error")
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code(), self.message()) {
            (Some(code), Some(message)) => write!(f, "{code}: {message}"),
            _ => {
                let mut first = true;
                for (field, value) in &self.fields {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}={value}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Result of one operation call: either the projected value or a structured
/// error the service expressed as a transport failure.
///
/// Transport and contract failures that no template matches are raised as
/// [`BrainfmError`](crate::BrainfmError) instead, so a full call signature
/// reads `Result<Outcome<T>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The call succeeded.
    Success(T),
    /// The service refused the call in a way the catalogue knows how to name.
    Failure(StructuredError),
}

impl<T> Outcome<T> {
    /// Map the success value, passing failures through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(error) => Outcome::Failure(error),
        }
    }

    /// The success value, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }
}

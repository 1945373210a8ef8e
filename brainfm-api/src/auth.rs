//! Credentials and on-disk session persistence.
//!
//! The session file is stored at `~/.config/brainfm/session.json`:
//!
//! ```json
//! {
//!   "email": "you@example.com",
//!   "password": "...",
//!   "svu": "a0b1c2..."
//! }
//! ```
//!
//! `svu` is the visitor identity issued at login. Caching it avoids a login
//! round-trip on the next run; when it goes stale the service starts
//! rejecting calls and the session should be cleared and re-established.

use crate::error::{BrainfmError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Login credentials sent in the `POST /login` exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Persistent session backed by a JSON file on disk.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StoredSession {
    /// Login email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Login password, stored in the clear like the web client's own config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Cached visitor identity from a previous run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svu: Option<String>,
}

impl StoredSession {
    /// Load the session from `~/.config/brainfm/session.json`.
    ///
    /// Returns a default (empty) session if the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the session to disk, creating parent directories if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data)?;
        Ok(())
    }

    /// Delete the session file from disk.
    pub fn clear() -> Result<()> {
        let path = Self::path()?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// The stored credentials, when both halves are present.
    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            email: self.email.clone()?,
            password: self.password.clone()?,
        })
    }

    /// Whether this session can establish a connection at all
    /// (credentials or a cached identity).
    pub fn is_usable(&self) -> bool {
        self.svu.is_some() || self.credentials().is_some()
    }

    fn path() -> Result<PathBuf> {
        let config = dirs::config_dir()
            .ok_or_else(|| BrainfmError::Other("cannot determine config directory".into()))?;
        Ok(config.join("brainfm").join("session.json"))
    }
}

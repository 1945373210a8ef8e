//! Connection-scoped session state: the visitor identity and the
//! per-operation signing-key map.
//!
//! Both fields are lazy and fetched at most once per connection. The cells
//! only mutate on a successful fetch; a failed fetch leaves them unset so the
//! next call retries. Once populated they are read-only for the connection's
//! remaining lifetime — if the service rotates keys, the connection must be
//! torn down and re-established.

use crate::error::{BrainfmError, Result};
use once_cell::sync::OnceCell;
use std::collections::HashMap;

pub(crate) struct SessionState {
    /// Visitor/session identity (`siteVisitorUUID`), established at login.
    svu: OnceCell<String>,
    /// Wire operation name → signing key, fetched all-at-once.
    operation_keys: OnceCell<HashMap<String, String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            svu: OnceCell::new(),
            operation_keys: OnceCell::new(),
        }
    }

    /// Start from a pre-supplied identity (e.g. cached from a previous run),
    /// skipping the login exchange entirely.
    pub fn with_identity(svu: String) -> Self {
        let state = Self::new();
        // A fresh cell cannot already be set.
        let _ = state.svu.set(svu);
        state
    }

    /// The visitor identity, running `fetch` on first access. Concurrent
    /// first accesses block so `fetch` runs at most once.
    pub fn identity<F>(&self, fetch: F) -> Result<&str>
    where
        F: FnOnce() -> Result<String>,
    {
        self.svu.get_or_try_init(fetch).map(String::as_str)
    }

    /// The identity if it has already been fetched, without triggering login.
    pub fn cached_identity(&self) -> Option<&str> {
        self.svu.get().map(String::as_str)
    }

    /// The signing key for one wire operation name, running `fetch` to
    /// populate the whole map on first access.
    pub fn signing_key<F>(&self, wire_name: &str, fetch: F) -> Result<&str>
    where
        F: FnOnce() -> Result<HashMap<String, String>>,
    {
        let keys = self.operation_keys.get_or_try_init(fetch)?;
        keys.get(wire_name)
            .map(String::as_str)
            .ok_or_else(|| BrainfmError::UnknownSigningKey(wire_name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_fetched_once_and_cached() {
        let state = SessionState::new();
        let mut fetches = 0;
        for _ in 0..3 {
            let svu = state
                .identity(|| {
                    fetches += 1;
                    Ok("uuid-1".to_owned())
                })
                .unwrap();
            assert_eq!(svu, "uuid-1");
        }
        assert_eq!(fetches, 1);
    }

    #[test]
    fn failed_identity_fetch_leaves_state_retryable() {
        let state = SessionState::new();
        let err = state
            .identity(|| Err(BrainfmError::Other("login down".into())))
            .unwrap_err();
        assert!(matches!(err, BrainfmError::Other(_)));
        assert_eq!(state.cached_identity(), None);

        let svu = state.identity(|| Ok("uuid-2".to_owned())).unwrap();
        assert_eq!(svu, "uuid-2");
    }

    #[test]
    fn preseeded_identity_never_fetches() {
        let state = SessionState::with_identity("cached".to_owned());
        let svu = state.identity(|| panic!("should not fetch")).unwrap();
        assert_eq!(svu, "cached");
    }

    #[test]
    fn missing_wire_name_is_a_catalogue_mismatch() {
        let state = SessionState::new();
        let fetch = || Ok(HashMap::from([("getStation".to_owned(), "k".to_owned())]));
        assert_eq!(state.signing_key("getStation", fetch).unwrap(), "k");

        let err = state
            .signing_key("getTokenJSON", || panic!("already fetched"))
            .unwrap_err();
        match err {
            BrainfmError::UnknownSigningKey(name) => assert_eq!(name, "getTokenJSON"),
            other => panic!("expected UnknownSigningKey, got {other:?}"),
        }
    }
}

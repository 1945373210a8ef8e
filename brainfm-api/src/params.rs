//! Parameter validation and alias → wire-name mapping.
//!
//! Runs entirely before any network I/O: callers address parameters by their
//! caller-facing names, the validator rejects anything outside the declared
//! contract, applies defaults, and rewrites the surviving names to the wire
//! names the service expects.

use crate::catalogue::{OperationSpec, ParameterSpec};
use crate::error::{BrainfmError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Caller-supplied arguments, keyed by caller-facing name.
pub type CallerArgs = BTreeMap<String, Value>;

/// Validated arguments, keyed by wire name.
pub type WireParams = BTreeMap<String, Value>;

/// Build a [`CallerArgs`] map from a `json!({...})` object literal.
/// Non-object values produce an empty map.
pub fn caller_args(value: Value) -> CallerArgs {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => CallerArgs::new(),
    }
}

/// Check `args` against the operation's parameter contract and rewrite it to
/// wire names.
///
/// - Undeclared names fail with [`BrainfmError::UnexpectedParameters`].
/// - Omitted required names fail with [`BrainfmError::MissingParameters`].
/// - Optional parameters fall back to their declared default (dynamic
///   defaults are evaluated fresh per call) or are omitted entirely.
///
/// Pure: no side effects, no type coercion.
pub fn validate_and_map(spec: &OperationSpec, args: &CallerArgs) -> Result<WireParams> {
    let declared: BTreeSet<&str> = spec
        .parameters
        .iter()
        .map(ParameterSpec::caller_name)
        .collect();
    let supplied: BTreeSet<&str> = args.keys().map(String::as_str).collect();

    let unexpected: Vec<String> = supplied
        .difference(&declared)
        .map(ToString::to_string)
        .collect();
    if !unexpected.is_empty() {
        return Err(BrainfmError::UnexpectedParameters(unexpected));
    }

    let required: BTreeSet<&str> = spec
        .parameters
        .iter()
        .filter(|p| p.required)
        .map(ParameterSpec::caller_name)
        .collect();
    let missing: Vec<String> = required
        .difference(&supplied)
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(BrainfmError::MissingParameters(missing));
    }

    let mut wire = WireParams::new();
    for param in spec.parameters {
        if let Some(value) = args.get(param.caller_name()) {
            wire.insert(param.name.to_owned(), value.clone());
        } else if let Some(default) = &param.default {
            wire.insert(param.name.to_owned(), default.produce());
        }
    }
    Ok(wire)
}

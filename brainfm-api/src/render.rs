//! Error rendering — translating matched transport failures into
//! [`StructuredError`] values.
//!
//! The service answers domain conditions with bare HTTP statuses (an unknown
//! station id is a plain 404). Operations that declare `(matcher, template)`
//! pairs get those statuses rendered into structured errors whose messages
//! can reference the wire parameters of the failed call; anything unmatched
//! propagates unchanged.

use crate::catalogue::{ErrorTemplate, OperationSpec};
use crate::error::BrainfmError;
use crate::params::WireParams;
use crate::types::StructuredError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Walk the operation's `(matcher, template)` pairs in order; on the first
/// match, render the template against the wire parameters of the failed call.
/// Returns `None` when nothing matches and the error should propagate.
pub fn render_if_matched(
    spec: &OperationSpec,
    error: &BrainfmError,
    wire: &WireParams,
) -> Option<StructuredError> {
    for (matcher, template) in spec.renders {
        if matcher.matches(error) {
            return Some(render(template, wire));
        }
    }
    None
}

/// Instantiate every field of the template against the wire parameters.
fn render(template: ErrorTemplate, wire: &WireParams) -> StructuredError {
    let mut fields = BTreeMap::new();
    for (field, pattern) in template {
        fields.insert((*field).to_owned(), substitute(pattern, wire));
    }
    StructuredError { fields }
}

/// Replace each `{wire_name}` placeholder with the parameter's value.
/// Placeholders with no matching parameter are left verbatim.
fn substitute(pattern: &str, wire: &WireParams) -> String {
    let mut out = pattern.to_owned();
    for (name, value) in wire {
        let placeholder = format!("{{{name}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &display_value(value));
        }
    }
    out
}

/// Human-facing rendering of a wire value: strings bare, everything else as
/// compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

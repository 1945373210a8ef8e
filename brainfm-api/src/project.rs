//! Response projections — declarative reshaping of raw JSON responses.
//!
//! Each catalogued operation may declare a [`Projection`] that extracts the
//! caller-facing fields from the raw response body. Projections are pure and
//! deliberately permissive: a missing source key projects to `null` and a
//! response that does not match the expected shape yields `null` rather than
//! an error, so a field the service renames degrades gracefully instead of
//! failing the whole call.
//!
//! The three shapes below cover every operation in the catalogue; this is not
//! a general query engine.

use serde_json::Value;

/// Output-field list: `(output key, source key)` pairs.
pub type Fields = &'static [(&'static str, &'static str)];

/// A declarative extraction rule applied to a raw JSON response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Pick and rename fields from a single top-level object.
    Object(Fields),
    /// Project each element of the array found under the given key,
    /// e.g. `stations[].{...}`.
    ArrayAt(&'static str, Fields),
    /// The response is an object whose values are arrays of objects
    /// (Brain.fm groups explore stations by category). Project every
    /// element of every array, flattened in iteration order.
    ValuesFlatten(Fields),
}

impl Projection {
    /// Apply this projection to a raw response body.
    pub fn apply(&self, raw: &Value) -> Value {
        match self {
            Self::Object(fields) => pick(raw, fields),
            Self::ArrayAt(key, fields) => raw
                .get(*key)
                .and_then(Value::as_array)
                .map(|arr| Value::Array(arr.iter().map(|el| pick(el, fields)).collect()))
                .unwrap_or(Value::Null),
            Self::ValuesFlatten(fields) => raw
                .as_object()
                .map(|obj| {
                    let mut out = Vec::new();
                    for value in obj.values() {
                        if let Some(arr) = value.as_array() {
                            out.extend(arr.iter().map(|el| pick(el, fields)));
                        }
                    }
                    Value::Array(out)
                })
                .unwrap_or(Value::Null),
        }
    }
}

/// Build an object containing each declared field, renamed to its output key.
/// Missing source keys project to `null`; undeclared source keys are dropped.
fn pick(value: &Value, fields: Fields) -> Value {
    if !value.is_object() {
        return Value::Null;
    }
    let mut out = serde_json::Map::new();
    for (output, source) in fields {
        out.insert(
            (*output).to_owned(),
            value.get(*source).cloned().unwrap_or(Value::Null),
        );
    }
    Value::Object(out)
}

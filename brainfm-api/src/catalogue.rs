//! The operation catalogue — a static description of every remote operation.
//!
//! Brain.fm's web client drives everything through a handful of RPC-style
//! endpoints whose names, parameters, and response shapes were observed from
//! the browser. Each [`OperationSpec`] here records one operation's wire name,
//! parameter contract, response projection, and transport-error translations.
//! The set is closed at compile time: [`Operation`] enumerates every entry,
//! so there is no runtime registry and no lookup that can fail.
//!
//! Known but unmapped operations (not yet observed with enough confidence to
//! catalogue): `setSessionCompleted`, `setTrialSessionCompletedFunc`,
//! `createFeedbackQueue`, `setTestCompleted`, `setFeedback`,
//! `getMainStations`, `testToken`, `getFeedbackQueueJSON`,
//! `setDisclaimerAccepted`.

use crate::error::BrainfmError;
use crate::project::Projection;
use serde_json::Value;

/// HTTP method used for an operation.
///
/// Every catalogued operation currently posts to the shared RPC endpoint;
/// `Get` exists because later protocol variants expose the same operations
/// as GET routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Get,
}

/// Declared value kind of a parameter.
///
/// These are contract documentation: the typed `Connection` methods enforce
/// them through their signatures, and the validator performs no runtime
/// coercion or type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Text,
    Boolean,
}

/// Default value for an optional parameter.
///
/// `Dynamic` defaults are re-evaluated on every call, never cached.
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    Int(i64),
    Str(&'static str),
    Bool(bool),
    Dynamic(fn() -> Value),
}

impl DefaultValue {
    /// Produce the concrete value for one call.
    pub fn produce(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::from(*s),
            Self::Bool(b) => Value::from(*b),
            Self::Dynamic(producer) => producer(),
        }
    }
}

/// One parameter of an operation.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    /// Name as the wire protocol knows it (e.g. `sid`).
    pub name: &'static str,
    /// Caller-facing name when it differs from the wire name
    /// (e.g. `station_id` for `sid`).
    pub alias: Option<&'static str>,
    /// Whether the caller must supply this parameter. Required parameters
    /// never carry a default.
    pub required: bool,
    /// Default applied when an optional parameter is not supplied.
    pub default: Option<DefaultValue>,
    /// Declared value kind (documentation, see [`ValueKind`]).
    pub kind: ValueKind,
}

impl ParameterSpec {
    /// The name callers use: the alias if one is declared, else the wire name.
    pub fn caller_name(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }
}

/// Condition under which a transport error is translated into a structured
/// error value instead of propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// A non-2xx response with exactly this status code.
    HttpStatus(u16),
}

impl Matcher {
    /// Test whether this matcher applies to the given error.
    pub fn matches(&self, error: &BrainfmError) -> bool {
        match self {
            Self::HttpStatus(want) => {
                matches!(error, BrainfmError::Status { status, .. } if status == want)
            }
        }
    }
}

/// Structured-error template: `(field name, format string)` pairs. Format
/// strings reference wire parameter names in braces, e.g. `"Unknown station {sid}"`.
pub type ErrorTemplate = &'static [(&'static str, &'static str)];

/// Immutable descriptor of one remote operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    /// Operation name as the wire protocol knows it.
    pub name: &'static str,
    /// HTTP method.
    pub method: Method,
    /// Parameter contract, checked before any network I/O.
    pub parameters: &'static [ParameterSpec],
    /// Response projection; `None` for fire-and-forget operations.
    pub response: Option<Projection>,
    /// Ordered transport-error translations, first match wins.
    pub renders: &'static [(Matcher, ErrorTemplate)],
}

/// Output shape shared by the three station-listing operations.
const STATION_FIELDS: &[(&str, &str)] = &[
    ("station_id", "id"),
    ("name", "name"),
    ("canonical_name", "string_id"),
    ("parent_id", "parent_id"),
];

static SET_RATING: OperationSpec = OperationSpec {
    name: "setRating",
    method: Method::Post,
    parameters: &[
        ParameterSpec {
            name: "session_id",
            alias: None,
            required: true,
            default: None,
            kind: ValueKind::Integer,
        },
        ParameterSpec {
            name: "rating",
            alias: None,
            required: true,
            default: None,
            kind: ValueKind::Integer,
        },
        ParameterSpec {
            name: "token",
            alias: Some("stream_token"),
            required: true,
            default: None,
            kind: ValueKind::Text,
        },
        ParameterSpec {
            name: "station_id",
            alias: None,
            required: true,
            default: None,
            kind: ValueKind::Integer,
        },
        ParameterSpec {
            name: "reason",
            alias: None,
            required: true,
            default: None,
            kind: ValueKind::Text,
        },
    ],
    response: None,
    renders: &[],
};

static GET_STATIONS: OperationSpec = OperationSpec {
    name: "getExploreStations",
    method: Method::Post,
    parameters: &[],
    response: Some(Projection::ValuesFlatten(STATION_FIELDS)),
    renders: &[],
};

static GET_STATIONS_BY_ID: OperationSpec = OperationSpec {
    name: "getStationsByID",
    method: Method::Post,
    parameters: &[ParameterSpec {
        name: "pid",
        alias: Some("parent_id"),
        required: true,
        default: None,
        kind: ValueKind::Integer,
    }],
    response: Some(Projection::ArrayAt("stations", STATION_FIELDS)),
    renders: &[],
};

static GET_STATION: OperationSpec = OperationSpec {
    name: "getStation",
    method: Method::Post,
    parameters: &[ParameterSpec {
        name: "id",
        alias: Some("station_id"),
        required: true,
        default: None,
        kind: ValueKind::Integer,
    }],
    response: Some(Projection::Object(&[
        ("station_id", "id"),
        ("name", "name"),
        ("canonical_name", "string_id"),
        ("playable", "player"),
    ])),
    renders: &[(
        Matcher::HttpStatus(404),
        &[("code", "UnknownStationID"), ("error", "Unknown station {id}")],
    )],
};

static GET_TOKEN: OperationSpec = OperationSpec {
    name: "getTokenJSON",
    method: Method::Post,
    parameters: &[
        ParameterSpec {
            name: "sid",
            alias: Some("station_id"),
            required: true,
            default: None,
            kind: ValueKind::Integer,
        },
        // Purpose unknown; the web client always sends false.
        ParameterSpec {
            name: "m",
            alias: None,
            required: false,
            default: Some(DefaultValue::Bool(false)),
            kind: ValueKind::Boolean,
        },
        ParameterSpec {
            name: "pt",
            alias: Some("previous_session_token"),
            required: false,
            default: None,
            kind: ValueKind::Text,
        },
    ],
    response: Some(Projection::Object(&[
        ("session_id", "id"),
        ("group", "group"),
        ("name", "name"),
        ("station_id", "station_id"),
        ("session_token", "token"),
    ])),
    renders: &[(
        Matcher::HttpStatus(404),
        &[("code", "UnknownStationID"), ("error", "Unknown station {sid}")],
    )],
};

/// Every supported operation, closed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SetRating,
    GetStations,
    GetStationsById,
    GetStation,
    GetToken,
}

impl Operation {
    /// All catalogued operations.
    pub const ALL: [Operation; 5] = [
        Self::SetRating,
        Self::GetStations,
        Self::GetStationsById,
        Self::GetStation,
        Self::GetToken,
    ];

    /// The static descriptor for this operation.
    pub fn spec(self) -> &'static OperationSpec {
        match self {
            Self::SetRating => &SET_RATING,
            Self::GetStations => &GET_STATIONS,
            Self::GetStationsById => &GET_STATIONS_BY_ID,
            Self::GetStation => &GET_STATION,
            Self::GetToken => &GET_TOKEN,
        }
    }
}

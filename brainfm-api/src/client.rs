//! The Brain.fm connection: session establishment, request dispatch, and the
//! shared validate → dispatch → project pipeline.
//!
//! All requests follow the web client's RPC convention:
//!
//! 1. `POST /login` with `{"email", "pass"}` → `siteVisitorUUID` (the `svu`)
//! 2. `POST /post/rtecmg` with `{"svu"}` → map of wire operation name → signing key
//! 3. `POST /post/rtecm` (form-encoded) with `svu`, `cst`, and the operation's
//!    wire parameters → operation-specific JSON
//!
//! `cst` is the per-call authorization token composed from the identity and
//! the operation's signing key; see [`CstScheme`]. Steps 1 and 2 run lazily,
//! at most once per connection.

use crate::auth::Credentials;
use crate::catalogue::{Method, Operation, OperationSpec};
use crate::error::{BrainfmError, Result};
use crate::params::{CallerArgs, WireParams, validate_and_map};
use crate::render::render_if_matched;
use crate::session::SessionState;
use crate::transport::{HttpTransport, Transport, encode_form};
use crate::types::Outcome;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Default user agent identifying this client.
pub const DEFAULT_USER_AGENT: &str = concat!("brainfm-rs v", env!("CARGO_PKG_VERSION"));

/// A plausible browser user agent. If Brain.fm starts filtering on
/// user-agent, build the connection with this instead.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1) \
    AppleWebKit/537.36 (KHTML, like Gecko) \
    Chrome/41.0.2228.0 Safari/537.36";

/// Service endpoints, overridable for testing or protocol changes.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// API base, no trailing slash.
    pub base: String,
    /// Stream player base, with trailing slash.
    pub stream_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: "https://www.brain.fm".to_owned(),
            stream_base: "https://stream.brain.fm/".to_owned(),
        }
    }
}

impl Endpoints {
    fn login_url(&self) -> String {
        format!("{}/login", self.base)
    }

    fn signing_keys_url(&self) -> String {
        format!("{}/post/rtecmg", self.base)
    }

    fn operation_url(&self) -> String {
        format!("{}/post/rtecm", self.base)
    }

    /// Playable stream URL for a session token: base + fixed suffix + token.
    /// Pure concatenation; the token's shape is not validated.
    pub fn stream_url(&self, token: &str) -> String {
        format!("{}?tkn={token}", self.stream_base)
    }
}

/// Strategy composing the `cst` authorization token from the visitor
/// identity and an operation's signing key.
///
/// The scheme is a reverse-engineered guess at the web client's behavior and
/// may change without notice, which is why it is a trait rather than a fixed
/// function: swap it on the [`ConnectionBuilder`] without touching dispatch.
pub trait CstScheme: Send + Sync {
    fn compose(&self, identity: &str, signing_key: &str) -> String;
}

/// Default scheme: append the signing key to the identity.
///
/// The web client actually inserts the key's characters into the identity at
/// a `Math.random()`-derived offset; the consuming side evidently rebuilds
/// the key by stripping it back out, so a plain append is accepted.
pub struct AppendScheme;

impl CstScheme for AppendScheme {
    fn compose(&self, identity: &str, signing_key: &str) -> String {
        format!("{identity}{signing_key}")
    }
}

/// A connection to Brain.fm, shared by all operation calls.
///
/// Holds the transport, endpoints, credentials, and the lazily-established
/// session (identity + signing keys). One typed method per catalogued
/// operation lives in the `stations` / `token` / `rating` modules; they all
/// funnel through [`Connection::call`].
pub struct Connection {
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
    user_agent: String,
    credentials: Option<Credentials>,
    cst: Box<dyn CstScheme>,
    session: SessionState,
}

impl Connection {
    /// Connect with login credentials over the production HTTP transport.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder().credentials(credentials).build()
    }

    /// Connect with a pre-supplied visitor identity (e.g. cached from a
    /// previous run), skipping the login exchange.
    pub fn with_identity(svu: impl Into<String>) -> Result<Self> {
        Self::builder().identity(svu).build()
    }

    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::default()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }

    /// The visitor identity, performing the login exchange on first access.
    ///
    /// A failed login leaves the session unestablished; the next call
    /// retries. A successful login is cached for the connection's lifetime.
    pub fn identity(&self) -> Result<&str> {
        self.session.identity(|| {
            let credentials = self.credentials.as_ref().ok_or_else(|| {
                BrainfmError::Other("no credentials and no pre-supplied session identity".into())
            })?;
            let body = json!({
                "email": credentials.email,
                "pass": credentials.password,
            });
            let resp =
                self.transport
                    .post_json(&self.endpoints.login_url(), &body, &self.user_agent)?;
            resp.get("siteVisitorUUID")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| {
                    BrainfmError::Other("login response missing siteVisitorUUID".into())
                })
        })
    }

    /// The identity if already established, without triggering a login.
    /// Collaborators use this to cache the session between runs.
    pub fn cached_identity(&self) -> Option<&str> {
        self.session.cached_identity()
    }

    /// The signing key for one wire operation name, fetching the whole map
    /// on first access (which in turn establishes the identity if needed).
    fn signing_key(&self, wire_name: &str) -> Result<&str> {
        let svu = self.identity()?.to_owned();
        self.session.signing_key(wire_name, || {
            let body = json!({ "svu": svu });
            let resp = self.transport.post_json(
                &self.endpoints.signing_keys_url(),
                &body,
                &self.user_agent,
            )?;
            let map = resp.as_object().ok_or_else(|| {
                BrainfmError::Other("signing-key response is not an object".into())
            })?;
            Ok(map
                .iter()
                .filter_map(|(name, key)| key.as_str().map(|k| (name.clone(), k.to_owned())))
                .collect::<HashMap<_, _>>())
        })
    }

    /// Compose the authenticated payload: identity, `cst`, and the mapped
    /// wire parameters. Establishes the session lazily; session failures
    /// surface here, before the operation request.
    fn authenticated_form(
        &self,
        spec: &OperationSpec,
        wire: &WireParams,
    ) -> Result<Vec<(String, String)>> {
        let svu = self.identity()?.to_owned();
        let key = self.signing_key(spec.name)?.to_owned();
        let cst = self.cst.compose(&svu, &key);

        let mut form: Vec<(String, String)> =
            vec![("svu".to_owned(), svu), ("cst".to_owned(), cst)];
        for (name, value) in wire {
            form.push((name.clone(), form_value(value)));
        }
        Ok(form)
    }

    /// Issue the operation's HTTP call with the declared method.
    fn send(&self, spec: &OperationSpec, form: &[(String, String)]) -> Result<Value> {
        let url = self.endpoints.operation_url();
        match spec.method {
            Method::Post => self.transport.post_form(&url, form, &self.user_agent),
            Method::Get => {
                let url = format!("{url}?{}", encode_form(form));
                self.transport.get(&url, &self.user_agent)
            }
        }
    }

    /// The shared pipeline behind every typed operation method:
    /// validate and map the arguments, dispatch, translate matched transport
    /// failures, and project the response.
    ///
    /// The inner `Option<Value>` is `None` for fire-and-forget operations
    /// that declare no response projection.
    pub fn call(&self, op: Operation, args: &CallerArgs) -> Result<Outcome<Option<Value>>> {
        let spec = op.spec();
        let wire = validate_and_map(spec, args)?;

        // Session establishment failure is always fatal to the call; only
        // the operation request itself is eligible for error rendering.
        let form = self.authenticated_form(spec, &wire)?;

        let raw = match self.send(spec, &form) {
            Ok(raw) => raw,
            Err(error) => {
                if let Some(rendered) = render_if_matched(spec, &error, &wire) {
                    return Ok(Outcome::Failure(rendered));
                }
                return Err(error);
            }
        };

        Ok(Outcome::Success(
            spec.response.as_ref().map(|projection| projection.apply(&raw)),
        ))
    }
}

/// Render a wire value for form encoding: strings bare, everything else as
/// compact JSON (`true`, `42`, ...).
fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builder for [`Connection`] with endpoint, user-agent, transport, and
/// cst-scheme overrides.
#[derive(Default)]
pub struct ConnectionBuilder {
    credentials: Option<Credentials>,
    identity: Option<String>,
    endpoints: Option<Endpoints>,
    user_agent: Option<String>,
    transport: Option<Box<dyn Transport>>,
    cst: Option<Box<dyn CstScheme>>,
}

impl ConnectionBuilder {
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Pre-seed the visitor identity, skipping the login exchange.
    pub fn identity(mut self, svu: impl Into<String>) -> Self {
        self.identity = Some(svu.into());
        self
    }

    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn cst_scheme(mut self, scheme: Box<dyn CstScheme>) -> Self {
        self.cst = Some(scheme);
        self
    }

    pub fn build(self) -> Result<Connection> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new()?),
        };
        let session = match self.identity {
            Some(svu) => SessionState::with_identity(svu),
            None => SessionState::new(),
        };
        Ok(Connection {
            transport,
            endpoints: self.endpoints.unwrap_or_default(),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            credentials: self.credentials,
            cst: self.cst.unwrap_or_else(|| Box::new(AppendScheme)),
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory transport scripted per test: login and signing-key fetches
    /// are canned, operation responses are popped from a queue.
    #[derive(Default)]
    struct MockTransport {
        login_calls: AtomicUsize,
        key_calls: AtomicUsize,
        op_calls: AtomicUsize,
        fail_next_login: AtomicBool,
        last_form: Mutex<Vec<(String, String)>>,
        op_responses: Mutex<VecDeque<Result<Value>>>,
        key_map: Option<Value>,
    }

    impl MockTransport {
        fn push_response(&self, response: Result<Value>) {
            self.op_responses.lock().unwrap().push_back(response);
        }

        fn form_field(&self, name: &str) -> Option<String> {
            self.last_form
                .lock()
                .unwrap()
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        }
    }

    fn default_key_map() -> Value {
        json!({
            "setRating": "ksr",
            "getExploreStations": "kges",
            "getStationsByID": "kgsb",
            "getStation": "kgs",
            "getTokenJSON": "kgt",
        })
    }

    impl Transport for MockTransport {
        fn post_json(&self, url: &str, _body: &Value, _user_agent: &str) -> Result<Value> {
            if url.ends_with("/login") {
                self.login_calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_next_login.swap(false, Ordering::SeqCst) {
                    return Err(BrainfmError::Status {
                        status: 500,
                        body: String::new(),
                    });
                }
                Ok(json!({"siteVisitorUUID": "uuid-123"}))
            } else if url.ends_with("/post/rtecmg") {
                self.key_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.key_map.clone().unwrap_or_else(default_key_map))
            } else {
                panic!("unexpected JSON POST to {url}");
            }
        }

        fn post_form(
            &self,
            url: &str,
            params: &[(String, String)],
            _user_agent: &str,
        ) -> Result<Value> {
            assert!(url.ends_with("/post/rtecm"), "unexpected form POST to {url}");
            self.op_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_form.lock().unwrap() = params.to_vec();
            self.op_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({})))
        }

        fn get(&self, url: &str, _user_agent: &str) -> Result<Value> {
            panic!("unexpected GET to {url}");
        }
    }

    fn connect(transport: MockTransport) -> (Connection, &'static MockTransport) {
        let transport: &'static MockTransport = Box::leak(Box::new(transport));
        let conn = Connection::builder()
            .credentials(Credentials {
                email: "user@example.com".to_owned(),
                password: "hunter2".to_owned(),
            })
            .transport(Box::new(Borrowed(transport)))
            .build()
            .unwrap();
        (conn, transport)
    }

    /// Adapter so a test keeps a handle to the transport the connection owns.
    struct Borrowed(&'static MockTransport);

    impl Transport for Borrowed {
        fn post_json(&self, url: &str, body: &Value, user_agent: &str) -> Result<Value> {
            self.0.post_json(url, body, user_agent)
        }

        fn post_form(
            &self,
            url: &str,
            params: &[(String, String)],
            user_agent: &str,
        ) -> Result<Value> {
            self.0.post_form(url, params, user_agent)
        }

        fn get(&self, url: &str, user_agent: &str) -> Result<Value> {
            self.0.get(url, user_agent)
        }
    }

    #[test]
    fn identity_and_keys_fetched_once_across_calls() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Ok(json!({"focus": [{"id": 1}]})));
        mock.push_response(Ok(json!({"focus": [{"id": 1}]})));
        mock.push_response(Ok(json!({"id": 1})));

        conn.get_stations().unwrap();
        conn.get_stations().unwrap();
        conn.get_station(1).unwrap();

        assert_eq!(mock.login_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mock.key_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mock.op_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failed_login_propagates_and_next_call_retries() {
        let (conn, mock) = connect(MockTransport::default());
        mock.fail_next_login.store(true, Ordering::SeqCst);

        let err = conn.get_stations().unwrap_err();
        assert!(matches!(err, BrainfmError::Status { status: 500, .. }));
        assert_eq!(conn.cached_identity(), None);

        mock.push_response(Ok(json!({})));
        conn.get_stations().unwrap();
        assert_eq!(mock.login_calls.load(Ordering::SeqCst), 2);
        assert_eq!(conn.cached_identity(), Some("uuid-123"));
    }

    #[test]
    fn dispatch_composes_svu_and_cst() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Ok(json!({"id": 7})));

        conn.get_station(7).unwrap();

        assert_eq!(mock.form_field("svu").as_deref(), Some("uuid-123"));
        // cst = identity + the getStation signing key
        assert_eq!(mock.form_field("cst").as_deref(), Some("uuid-123kgs"));
        assert_eq!(mock.form_field("id").as_deref(), Some("7"));
    }

    #[test]
    fn custom_cst_scheme_is_honored() {
        struct Reversed;

        impl CstScheme for Reversed {
            fn compose(&self, identity: &str, signing_key: &str) -> String {
                format!("{signing_key}{identity}")
            }
        }

        let transport: &'static MockTransport = Box::leak(Box::new(MockTransport::default()));
        transport.push_response(Ok(json!({"id": 7})));
        let conn = Connection::builder()
            .credentials(Credentials {
                email: "user@example.com".to_owned(),
                password: "hunter2".to_owned(),
            })
            .transport(Box::new(Borrowed(transport)))
            .cst_scheme(Box::new(Reversed))
            .build()
            .unwrap();

        conn.get_station(7).unwrap();
        assert_eq!(transport.form_field("cst").as_deref(), Some("kgsuuid-123"));
    }

    #[test]
    fn preseeded_identity_skips_login() {
        let transport: &'static MockTransport = Box::leak(Box::new(MockTransport::default()));
        transport.push_response(Ok(json!({})));
        let conn = Connection::builder()
            .identity("cached-uuid")
            .transport(Box::new(Borrowed(transport)))
            .build()
            .unwrap();

        conn.get_stations().unwrap();
        assert_eq!(transport.login_calls.load(Ordering::SeqCst), 0);
        assert_eq!(transport.form_field("svu").as_deref(), Some("cached-uuid"));
    }

    #[test]
    fn missing_signing_key_is_fatal_per_call() {
        let (conn, _mock) = connect(MockTransport {
            key_map: Some(json!({"getStation": "kgs"})),
            ..MockTransport::default()
        });

        let err = conn.get_token(55, None).unwrap_err();
        match err {
            BrainfmError::UnknownSigningKey(name) => assert_eq!(name, "getTokenJSON"),
            other => panic!("expected UnknownSigningKey, got {other:?}"),
        }
    }

    #[test]
    fn station_404_renders_structured_error() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Err(BrainfmError::Status {
            status: 404,
            body: String::new(),
        }));

        match conn.get_station(999).unwrap() {
            Outcome::Failure(error) => {
                assert_eq!(error.code(), Some("UnknownStationID"));
                assert_eq!(error.message(), Some("Unknown station 999"));
            }
            Outcome::Success(detail) => panic!("expected failure, got {detail:?}"),
        }
    }

    #[test]
    fn station_500_propagates_unchanged() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Err(BrainfmError::Status {
            status: 500,
            body: "boom".to_owned(),
        }));

        let err = conn.get_station(999).unwrap_err();
        assert!(matches!(err, BrainfmError::Status { status: 500, .. }));
    }

    #[test]
    fn token_404_references_the_wire_parameter() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Err(BrainfmError::Status {
            status: 404,
            body: String::new(),
        }));

        match conn.get_token(42, None).unwrap() {
            Outcome::Failure(error) => {
                assert_eq!(error.message(), Some("Unknown station 42"));
            }
            Outcome::Success(token) => panic!("expected failure, got {token:?}"),
        }
    }

    #[test]
    fn get_token_projects_and_parses() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Ok(json!({
            "id": 31337,
            "group": "Focus",
            "name": "Focus Session",
            "station_id": 55,
            "token": "tok-abc",
            "extra": "ignored",
        })));

        let token = conn.get_token(55, None).unwrap().success().unwrap();
        assert_eq!(token.session_id, 31337);
        assert_eq!(token.station_id, 55);
        assert_eq!(token.session_token, "tok-abc");
        // previous token flows through as `pt`
        mock.push_response(Ok(json!({})));
        conn.get_token(55, Some("tok-abc")).unwrap();
        assert_eq!(mock.form_field("pt").as_deref(), Some("tok-abc"));
        assert_eq!(mock.form_field("m").as_deref(), Some("false"));
    }

    #[test]
    fn get_stations_flattens_categories() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Ok(json!({
            "focus": [
                {"id": 1, "name": "Focus", "string_id": "focus", "parent_id": null},
            ],
            "relax": [
                {"id": 2, "name": "Relax", "string_id": "relax", "parent_id": 1},
            ],
        })));

        let stations = conn.get_stations().unwrap().success().unwrap();
        assert_eq!(stations.len(), 2);
        let relax = stations.iter().find(|s| s.id == 2).unwrap();
        assert_eq!(relax.canonical_name, "relax");
        assert_eq!(relax.parent_id, Some(1));
    }

    #[test]
    fn set_rating_is_fire_and_forget() {
        let (conn, mock) = connect(MockTransport::default());
        mock.push_response(Ok(json!({"status": "ok"})));

        let outcome = conn.set_rating(31337, 5, "tok-abc", 55, "energizing").unwrap();
        assert_eq!(outcome, Outcome::Success(()));
        assert_eq!(mock.form_field("token").as_deref(), Some("tok-abc"));
        assert_eq!(mock.form_field("rating").as_deref(), Some("5"));
    }

    #[test]
    fn stream_url_is_pure_concatenation() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.stream_url("tok-abc"),
            "https://stream.brain.fm/?tkn=tok-abc"
        );
    }
}

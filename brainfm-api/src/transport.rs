//! HTTP transport seam.
//!
//! The [`Transport`] trait is the only place network I/O happens; everything
//! above it (session, dispatch, projection) is pure enough to test against an
//! in-memory implementation. [`HttpTransport`] is the production
//! implementation over [`reqwest::blocking::Client`].

use crate::error::{BrainfmError, Result};
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Blocking JSON-over-HTTP transport.
///
/// Implementations report non-2xx statuses as [`BrainfmError::Status`] and
/// unparseable 2xx bodies as [`BrainfmError::MalformedResponse`]. No retries.
pub trait Transport: Send + Sync {
    /// POST a JSON body, expecting a JSON response.
    fn post_json(&self, url: &str, body: &Value, user_agent: &str) -> Result<Value>;

    /// POST URL-encoded form parameters, expecting a JSON response.
    fn post_form(&self, url: &str, params: &[(String, String)], user_agent: &str)
    -> Result<Value>;

    /// GET, expecting a JSON response.
    fn get(&self, url: &str, user_agent: &str) -> Result<Value>;
}

/// Production transport backed by a blocking reqwest client.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http })
    }

    fn read_json(resp: Response) -> Result<Value> {
        let status = resp.status().as_u16();
        let body = resp.text()?;
        classify_response(status, body)
    }
}

/// Classify a raw response: a non-2xx status becomes [`BrainfmError::Status`]
/// carrying the status and body, a 2xx body that is not JSON becomes
/// [`BrainfmError::MalformedResponse`].
fn classify_response(status: u16, body: String) -> Result<Value> {
    if !(200..300).contains(&status) {
        return Err(BrainfmError::Status { status, body });
    }
    serde_json::from_str(&body).map_err(BrainfmError::MalformedResponse)
}

impl Transport for HttpTransport {
    fn post_json(&self, url: &str, body: &Value, user_agent: &str) -> Result<Value> {
        let resp = self
            .http
            .post(url)
            .header("User-Agent", user_agent)
            .json(body)
            .send()?;
        Self::read_json(resp)
    }

    fn post_form(
        &self,
        url: &str,
        params: &[(String, String)],
        user_agent: &str,
    ) -> Result<Value> {
        let resp = self
            .http
            .post(url)
            .header("User-Agent", user_agent)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(encode_form(params))
            .send()?;
        Self::read_json(resp)
    }

    fn get(&self, url: &str, user_agent: &str) -> Result<Value> {
        let resp = self.http.get(url).header("User-Agent", user_agent).send()?;
        Self::read_json(resp)
    }
}

/// URL-encode form parameters into a request body (or query string).
pub(crate) fn encode_form(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_2xx_becomes_status_with_body() {
        let err = classify_response(404, "not found".to_owned()).unwrap_err();
        match err {
            BrainfmError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_2xx_body_becomes_malformed_response() {
        let err = classify_response(200, "<html>busy</html>".to_owned()).unwrap_err();
        assert!(matches!(err, BrainfmError::MalformedResponse(_)));
    }

    #[test]
    fn well_formed_2xx_body_parses() {
        let value = classify_response(201, r#"{"ok": true}"#.to_owned()).unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn form_encoding_escapes_reserved_characters() {
        let params = vec![
            ("svu".to_owned(), "abc-123".to_owned()),
            ("reason".to_owned(), "too mellow & slow".to_owned()),
        ];
        assert_eq!(
            encode_form(&params),
            "svu=abc-123&reason=too%20mellow%20%26%20slow"
        );
    }
}

//! Playback token operation.
//!
//! Wire operation: `getTokenJSON` (`sid`, optional `m` and `pt`). The
//! response carries the session id, group, and the opaque token string that
//! the stream endpoint accepts. An unknown station id is a bare 404, rendered
//! as `{code: UnknownStationID, error: "Unknown station {sid}"}`.

use crate::catalogue::Operation;
use crate::client::Connection;
use crate::error::Result;
use crate::params::caller_args;
use crate::types::{Outcome, StreamToken};
use serde_json::{Value, json};

impl Connection {
    /// Fetch a playback token for a station.
    ///
    /// Pass the previous session's token to resume a long session; the
    /// service uses it to pick the next segment.
    pub fn get_token(
        &self,
        station_id: i64,
        previous_session_token: Option<&str>,
    ) -> Result<Outcome<StreamToken>> {
        let mut args = caller_args(json!({ "station_id": station_id }));
        if let Some(token) = previous_session_token {
            args.insert("previous_session_token".to_owned(), Value::from(token));
        }
        Ok(self
            .call(Operation::GetToken, &args)?
            .map(|v| parse_token(v.as_ref())))
    }

    /// The playable stream URL for a token string.
    pub fn stream_url(&self, token: &str) -> String {
        self.endpoints().stream_url(token)
    }
}

fn parse_token(projected: Option<&Value>) -> StreamToken {
    let null = Value::Null;
    let v = projected.unwrap_or(&null);
    StreamToken {
        session_id: v["session_id"].as_i64().unwrap_or(0),
        group: v["group"].as_str().unwrap_or("").to_owned(),
        name: v["name"].as_str().unwrap_or("").to_owned(),
        station_id: v["station_id"].as_i64().unwrap_or(0),
        session_token: v["session_token"].as_str().unwrap_or("").to_owned(),
    }
}

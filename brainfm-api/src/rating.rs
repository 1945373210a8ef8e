//! Session rating operation.
//!
//! Wire operation: `setRating` (`session_id`, `rating`, `token`,
//! `station_id`, `reason`). Fire-and-forget: the response body carries
//! nothing the caller needs, so the operation declares no projection.

use crate::catalogue::Operation;
use crate::client::Connection;
use crate::error::Result;
use crate::params::caller_args;
use crate::types::Outcome;
use serde_json::json;

impl Connection {
    /// Rate a playback session.
    ///
    /// `stream_token` is the token the session was played with, and `reason`
    /// is the free-text rating reason the player collects.
    pub fn set_rating(
        &self,
        session_id: i64,
        rating: i64,
        stream_token: &str,
        station_id: i64,
        reason: &str,
    ) -> Result<Outcome<()>> {
        let args = caller_args(json!({
            "session_id": session_id,
            "rating": rating,
            "stream_token": stream_token,
            "station_id": station_id,
            "reason": reason,
        }));
        Ok(self.call(Operation::SetRating, &args)?.map(|_| ()))
    }
}

//! Unofficial Brain.fm API client library.
//!
//! Brain.fm exposes no public API; this client speaks the RPC convention the
//! web player uses, reverse-engineered from browser traffic. Every operation
//! is described by a static catalogue entry (wire name, parameter contract,
//! response projection, error translations) and invoked through a shared
//! validate → dispatch → project pipeline on [`Connection`].
//!
//! # Authentication
//!
//! A connection authenticates lazily on first use: login yields the visitor
//! identity (`svu`), a second exchange yields per-operation signing keys, and
//! every call carries `svu` plus a `cst` token composed from both. Both
//! fetches happen at most once per connection.
//!
//! ```no_run
//! use brainfm_api::auth::Credentials;
//! use brainfm_api::{Connection, Outcome};
//!
//! let conn = Connection::new(Credentials {
//!     email: "you@example.com".into(),
//!     password: "...".into(),
//! }).unwrap();
//!
//! if let Outcome::Success(stations) = conn.get_stations().unwrap() {
//!     for station in stations {
//!         println!("[{}] {}", station.id, station.name);
//!     }
//! }
//! ```
//!
//! # Operation mapping
//!
//! | Method                              | Wire operation       | Result            |
//! |-------------------------------------|----------------------|-------------------|
//! | [`Connection::get_stations`]        | `getExploreStations` | `Vec<Station>`    |
//! | [`Connection::get_stations_by_id`]  | `getStationsByID`    | `Vec<Station>`    |
//! | [`Connection::get_station`]         | `getStation`         | `StationDetail`   |
//! | [`Connection::get_token`]           | `getTokenJSON`       | `StreamToken`     |
//! | [`Connection::set_rating`]          | `setRating`          | (none)            |
//!
//! # Errors
//!
//! Calls return `Result<Outcome<T>>`: contract violations and unmatched
//! transport failures raise [`BrainfmError`], while transport failures the
//! catalogue knows how to name (e.g. 404 for an unknown station) come back
//! as [`Outcome::Failure`] with a [`StructuredError`] that keeps the call's
//! context.

pub mod auth;
pub mod catalogue;
pub mod client;
pub mod error;
pub mod params;
pub mod project;
mod rating;
mod render;
mod session;
mod stations;
mod token;
pub mod transport;
pub mod types;

pub use client::{
    AppendScheme, BROWSER_USER_AGENT, Connection, ConnectionBuilder, CstScheme,
    DEFAULT_USER_AGENT, Endpoints,
};
pub use error::{BrainfmError, Result};
pub use types::{Outcome, Station, StationDetail, StreamToken, StructuredError};

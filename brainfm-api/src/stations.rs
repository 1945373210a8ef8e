//! Station listing and detail operations.
//!
//! Wire operations: `getExploreStations` (no parameters),
//! `getStationsByID` (`pid`), `getStation` (`id`).
//!
//! `getExploreStations` responds with an object keyed by category, each value
//! an array of station objects; the projection flattens it to one list.
//! `getStation` answers an unknown id with a bare 404, which the catalogue
//! renders as `{code: UnknownStationID, error: "Unknown station {id}"}`.

use crate::catalogue::Operation;
use crate::client::Connection;
use crate::error::Result;
use crate::params::{CallerArgs, caller_args};
use crate::types::{Outcome, Station, StationDetail};
use serde_json::{Value, json};

impl Connection {
    /// List every explore station, across all categories.
    pub fn get_stations(&self) -> Result<Outcome<Vec<Station>>> {
        Ok(self
            .call(Operation::GetStations, &CallerArgs::new())?
            .map(|v| parse_stations(v.as_ref())))
    }

    /// List the child stations of a parent station.
    pub fn get_stations_by_id(&self, parent_id: i64) -> Result<Outcome<Vec<Station>>> {
        let args = caller_args(json!({ "parent_id": parent_id }));
        Ok(self
            .call(Operation::GetStationsById, &args)?
            .map(|v| parse_stations(v.as_ref())))
    }

    /// Fetch one station's detail view.
    ///
    /// An unknown id yields [`Outcome::Failure`] with code `UnknownStationID`
    /// rather than an error.
    pub fn get_station(&self, station_id: i64) -> Result<Outcome<StationDetail>> {
        let args = caller_args(json!({ "station_id": station_id }));
        Ok(self
            .call(Operation::GetStation, &args)?
            .map(|v| parse_station_detail(v.as_ref())))
    }
}

fn parse_stations(projected: Option<&Value>) -> Vec<Station> {
    let Some(arr) = projected.and_then(|v| v.as_array()) else {
        return vec![];
    };
    arr.iter().map(parse_station).collect()
}

fn parse_station(v: &Value) -> Station {
    Station {
        id: v["station_id"].as_i64().unwrap_or(0),
        name: v["name"].as_str().unwrap_or("").to_owned(),
        canonical_name: v["canonical_name"].as_str().unwrap_or("").to_owned(),
        parent_id: v["parent_id"].as_i64(),
    }
}

fn parse_station_detail(projected: Option<&Value>) -> StationDetail {
    let null = Value::Null;
    let v = projected.unwrap_or(&null);
    StationDetail {
        id: v["station_id"].as_i64().unwrap_or(0),
        name: v["name"].as_str().unwrap_or("").to_owned(),
        canonical_name: v["canonical_name"].as_str().unwrap_or("").to_owned(),
        playable: v["playable"].as_bool().unwrap_or(false),
    }
}

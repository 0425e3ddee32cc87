//! Data transfer objects for web requests and responses.
//!
//! Entity responses reuse the domain types directly; only request shapes
//! and small wrappers live here.

use serde::{Deserialize, Serialize};

use crate::domain::{ClockTime, Id};

/// Body for creating or renaming a stop.
#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub name: String,
}

/// Body for creating or renumbering a line.
#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub number: String,
}

/// Body for creating or updating a type of day.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOfDayRequest {
    pub name: String,

    /// Abbreviation printed on brigade sheets
    #[serde(default)]
    pub shortage_name: Option<String>,
}

/// Body for setting a single trip time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripTimeRequest {
    pub trip_id: Id,
    pub line_stop_id: Id,

    /// Time in HH:MM or HH:MM:SS format
    pub time: ClockTime,
}

/// Id of the trip time row that was written.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripTimeResponse {
    pub trip_time_id: Id,
}

/// Filters for the trip summary list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripsQuery {
    /// Only trips of this day type
    pub type_of_day_id: Option<Id>,

    /// Only trips strictly longer than this many minutes
    pub min_duration_minutes: Option<i64>,
}

impl TripsQuery {
    /// Whether any filter is set.
    pub fn is_filtered(&self) -> bool {
        self.type_of_day_id.is_some() || self.min_duration_minutes.is_some()
    }
}

/// Highest trip id in use.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxTripIdResponse {
    pub max_trip_id: Id,
}

/// Departure board parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeparturesQuery {
    pub stop_id: Id,

    /// Look-ahead in minutes
    pub window: u32,

    pub type_of_day_id: Id,
}

/// Threshold for the brigade working time filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrigadesQuery {
    /// Only brigades working strictly less than this
    pub max_working_time: i32,
}

/// Shortage name of a type of day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortageNameResponse {
    pub shortage_name: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error category: validation, not_found, conflict or internal
    pub kind: &'static str,

    /// Human-readable message
    pub error: String,

    /// Underlying database message, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

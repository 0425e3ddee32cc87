//! Schedule entities and the typed row shapes returned by store queries.
//!
//! Every query shape has its own struct; rows are never assembled from
//! ad-hoc maps. All types serialize with camelCase field names, which is the
//! wire format of the HTTP layer.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ClockTime;

/// Primary key type of every table.
pub type Id = i64;

/// A row from the `bus_stops` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Stop {
    pub id: Id,
    pub name: String,
}

/// A row from the `lines` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Line {
    pub id: Id,
    pub number: String,
}

/// A stop on a line, joined with the stop's name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStop {
    pub id: Id,
    pub line_id: Id,
    pub stop_id: Id,
    pub stop_name: String,
    pub direction: i32,
    pub order: i32,
}

/// One entry of a line-stop batch.
///
/// Entries carrying an `id` update that row in place; entries without one
/// insert a new row on `line_id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStopEdit {
    pub id: Option<Id>,
    pub line_id: Id,
    pub stop_id: Id,
    pub direction: i32,
    pub order: i32,
}

/// A row from the `types_of_days` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeOfDay {
    pub id: Id,
    pub name: String,
    pub shortage_name: Option<String>,
}

/// A row from the `company` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Company {
    pub id: Id,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Fields of a company as submitted for create and update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyFields {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// A row from the `trips` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Id,
    pub type_of_day_id: Id,
}

/// One stop visit in a line's timetable.
///
/// `stop_id` is the line-stop id the visit belongs to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRow {
    pub stop_id: Id,
    pub line_id: Id,
    pub direction: i32,
    pub order: i32,
    pub trip_id: Id,
    pub type_of_day_id: Id,
    pub trip_time_id: Id,
    #[sqlx(try_from = "i64")]
    pub time: ClockTime,
}

/// One entry of a timetable save batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    /// Existing trip-time row to overwrite; `None` inserts a new row.
    pub trip_time_id: Option<Id>,
    pub trip_id: Id,
    /// Day type used when the trip does not exist yet.
    pub type_of_day_id: Id,
    /// The line-stop visited.
    pub stop_id: Id,
    pub arrival_departure_time: ClockTime,
}

/// A trip reduced to its first and last stop visit.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub trip_id: Id,
    pub line_number: String,
    pub start_stop: String,
    pub end_stop: String,
    #[sqlx(try_from = "i64")]
    pub start_time: ClockTime,
    #[sqlx(try_from = "i64")]
    pub end_time: ClockTime,
}

impl TripSummary {
    /// Minutes between the first and the last visit.
    pub fn duration_minutes(&self) -> i64 {
        self.start_time.minutes_until(self.end_time)
    }
}

/// A trip assigned to a brigade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrigadeTrip {
    pub brigade_trip_id: Id,
    pub trip_id: Id,
}

/// A brigade with its trips in assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brigade {
    pub brigade_id: Id,
    pub type_of_day_id: Id,
    pub name: String,
    pub working_time: i32,
    pub shortage_name: Option<String>,
    pub trips: Vec<BrigadeTrip>,
}

/// A brigade as submitted for replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrigadeDef {
    pub name: String,
    pub working_time: i32,
    /// Trip ids in duty order.
    #[serde(default)]
    pub trips: Vec<Id>,
}

/// One upcoming departure on a stop's board.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    #[sqlx(try_from = "i64")]
    pub departure_time: ClockTime,
    /// Name of the stop the trip ends at.
    pub destination: String,
    pub line_number: String,
}

//! Domain types for the transit schedule.
//!
//! Entities mirror the persisted schema; [`ClockTime`] and
//! [`DepartureWindow`] carry the time-of-day arithmetic the timetable
//! queries rely on.

mod model;
mod time;
pub mod validate;

pub use model::{
    Brigade, BrigadeDef, BrigadeTrip, Company, CompanyFields, Departure, Id, Line, LineStop,
    LineStopEdit, Stop, TimetableEntry, TimetableRow, Trip, TripSummary, TypeOfDay,
};
pub use time::{ClockTime, DepartureWindow, TimeError};

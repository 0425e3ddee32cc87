//! Transit schedule server.
//!
//! Keeps the stops, lines, timetables and crew brigades of a bus operator
//! and answers departure-board queries for a stop.

pub mod config;
pub mod domain;
pub mod error;
pub mod store;
pub mod web;

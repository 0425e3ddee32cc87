//! Web layer for the schedule server.
//!
//! JSON endpoints over the schedule store, one pooled connection per request.

mod dto;
mod extract;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;

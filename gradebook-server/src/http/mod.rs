//! HTTP layer: axum routes, error mapping, and the response-casing
//! boundary.
//!
//! The core always works in snake_case; camelCasing happens here and only
//! here. This layer also owns the "is empty a 404" decision, since the
//! repositories treat empty as a valid outcome.

pub mod casing;
pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{run_server, AppState, ServerError};

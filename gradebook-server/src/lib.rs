//! gradebook-server: HTTP surface over the exam/course warehouse.
//!
//! Read endpoints reassemble flat warehouse result sets into nested
//! attempt/question trees; a bulk path loads CSV/NDJSON files into
//! warehouse tables. Configuration and the reconstruction primitives live
//! in `gradebook-core`.

pub mod db;
pub mod http;
pub mod ingest;

pub use http::server::{run_server, AppState, ServerError};

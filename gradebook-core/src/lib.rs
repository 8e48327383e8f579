//! gradebook-core: configuration schema and relational reconstruction
//! primitives for the gradebook warehouse API.
//!
//! The server crate layers SQL generation and HTTP on top of these types;
//! everything here is pure and synchronous so it can be tested without a
//! warehouse.

pub mod config;
pub mod error;
pub mod ident;
pub mod row;

pub use config::{Config, CourseSchema, ExamSchema, ServerSection, WarehouseSection};
pub use error::ConfigError;
pub use ident::SafeIdentifier;
pub use row::{column_keys, group_by_fk, scalar_key, Row};

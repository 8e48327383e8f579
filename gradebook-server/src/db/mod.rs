//! Warehouse access: connection pool, the query-executor boundary, and the
//! repositories that reassemble flat result sets into nested trees.

pub mod executor;
pub mod pool;
pub mod repos;

pub use executor::{QueryExecutor, QueryParam, StoreError, TableRef, WarehouseClient};
pub use pool::create_pool;

//! SQLite storage for the orders table and the reference query executor.

pub mod db;
pub mod executor;
pub mod migrations;
pub mod seed;

pub use db::Database;
pub use executor::SqliteExecutor;
pub use seed::{seed_sample_data, DEFAULT_ORDER_COUNT, DEFAULT_SEED};

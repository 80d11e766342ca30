//! Shared foundation for Lumen: configuration, errors, domain types, the
//! query-plan IR and the executor seam.

pub mod config;
pub mod error;
pub mod executor;
pub mod plan;
pub mod schema;
pub mod types;

pub use config::{LumenConfig, SanitizeMode};
pub use error::{LumenError, Result};
pub use executor::{ExecutionError, QueryExecutor};
pub use plan::{
    Dialect, Direction, Expr, Key, Literal, OrderItem, PlanShape, Predicate, QueryPlan,
    SelectItem, TruncUnit,
};
pub use schema::{CategoricalField, MetricField, Schema, DATE_FIELD, ORDERS};
pub use types::{
    ChartType, DataRow, Intent, IntentCategory, IntentSubtype, Operation, Scalar,
};

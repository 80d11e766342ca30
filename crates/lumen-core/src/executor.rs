//! Query executor seam.
//!
//! The relational engine is an external collaborator. Anything that can take
//! a sanitized [`QueryPlan`] and hand back rows implements [`QueryExecutor`].

use async_trait::async_trait;

use crate::plan::{Dialect, QueryPlan};
use crate::types::DataRow;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Connection or execution failure, with the underlying cause retained.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Executes sanitized plans.
///
/// Implementations must support equality and `IN` predicates, month
/// truncation, `SUM`, ordering and `LIMIT`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the plan and return its rows in order.
    async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DataRow>, ExecutionError>;

    /// SQL flavour the executor understands.
    fn dialect(&self) -> Dialect {
        Dialect::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanShape;
    use std::error::Error;

    struct FailingExecutor;

    #[async_trait]
    impl QueryExecutor for FailingExecutor {
        async fn execute(&self, _plan: &QueryPlan) -> Result<Vec<DataRow>, ExecutionError> {
            let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            Err(ExecutionError::with_source("connection failed", cause))
        }
    }

    #[tokio::test]
    async fn test_execution_error_keeps_cause() {
        let plan = QueryPlan::new(PlanShape::Trend, "orders");
        let err = FailingExecutor.execute(&plan).await.unwrap_err();
        assert_eq!(err.to_string(), "connection failed");
        let cause = err.source().unwrap();
        assert!(cause.to_string().contains("refused"));
    }

    #[test]
    fn test_default_dialect_is_generic() {
        assert_eq!(FailingExecutor.dialect(), Dialect::Generic);
    }

    #[test]
    fn test_error_without_source() {
        let err = ExecutionError::new("timeout");
        assert!(err.source().is_none());
    }
}

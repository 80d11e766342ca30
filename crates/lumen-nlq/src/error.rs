//! Error types for question analysis.

use lumen_core::error::LumenError;
use lumen_core::ExecutionError;
use lumen_insight::ChartError;

use crate::sanitizer::PlanError;

/// Errors surfaced to the caller of `process_question`.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("question must be at least {0} characters")]
    QuestionTooShort(usize),
    #[error("question exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    #[error("question contains a disallowed pattern: {0}")]
    InjectionPattern(String),
    #[error("comparison needs at least two values, found {found}")]
    UnderspecifiedComparison { found: usize },
    #[error("plan rejected: {0}")]
    PlanRejected(#[from] PlanError),
    #[error("query execution failed: {source}")]
    Execution {
        sql: String,
        #[source]
        source: ExecutionError,
    },
    #[error("no data found")]
    NoData { sql: String },
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),
}

impl AnalysisError {
    /// Whether the question itself was rejected before any planning.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyQuestion
                | Self::QuestionTooShort(_)
                | Self::QuestionTooLong(_)
                | Self::InjectionPattern(_)
        )
    }

    /// Statement text, when the failure happened at or after execution.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } | Self::NoData { sql } => Some(sql),
            _ => None,
        }
    }
}

impl From<AnalysisError> for LumenError {
    fn from(err: AnalysisError) -> Self {
        LumenError::Analysis(err.to_string())
    }
}

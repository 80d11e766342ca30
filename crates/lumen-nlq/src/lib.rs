//! Question interpretation for Lumen: parsing, session memory, planning,
//! sanitization and the orchestrator that ties them to an executor.

pub mod context;
pub mod enrichment;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod sanitizer;
pub mod types;
pub mod validation;

pub use context::{SessionContextStore, SessionGate};
pub use enrichment::{Enricher, EnrichmentError, EnrichmentHints, EnrichmentPlan, LanguageModel};
pub use error::AnalysisError;
pub use orchestrator::Orchestrator;
pub use parser::{EntityExtractor, IntentClassifier};
pub use planner::{partition_series, QueryPlanBuilder};
pub use sanitizer::{PlanError, QueryPlanSanitizer};
pub use types::{
    AnalysisResult, ComparisonTargets, EntitySet, GeoEntity, GeoScope, HistoryEntry,
    ResolvedFilters, SessionContext, TemporalEntity, TemporalKind,
};
pub use validation::QuestionValidator;

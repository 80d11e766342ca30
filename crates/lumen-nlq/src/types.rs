//! Types for question interpretation and session memory.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use lumen_core::{CategoricalField, ChartType, DataRow, Intent, MetricField, QueryPlan};
use lumen_insight::VisualizationSpec;

// =============================================================================
// Entities
// =============================================================================

/// How a geographic entity was found, which decides the column it filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoScope {
    /// Matched against the fixed list of state names.
    State,
    /// Taken from an "in/for <Name>" phrase; filtered as a city.
    Place,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub name: String,
    pub scope: GeoScope,
}

impl GeoEntity {
    pub fn state(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: GeoScope::State,
        }
    }

    pub fn place(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: GeoScope::Place,
        }
    }

    /// Schema column this entity filters on.
    pub fn field(&self) -> CategoricalField {
        match self.scope {
            GeoScope::State => CategoricalField::State,
            GeoScope::Place => CategoricalField::City,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Absolute,
    Relative,
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalEntity {
    pub kind: TemporalKind,
    pub raw_value: String,
}

/// Values named for comparison, all from one categorical field, in the
/// order they appear in the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonTargets {
    pub field: CategoricalField,
    pub values: Vec<String>,
}

/// Everything extracted from one question. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    pub geographic: Option<GeoEntity>,
    pub temporal: Vec<TemporalEntity>,
    pub categorical: Vec<CategoricalField>,
    pub metrics: Vec<MetricField>,
    pub limit: Option<u32>,
    pub year: Option<i32>,
    /// "bottom N" asks for the smallest values first.
    pub bottom: bool,
    pub comparison: Option<ComparisonTargets>,
}

// =============================================================================
// Session memory
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub chart_type: ChartType,
}

/// Per-session memory used to resolve follow-up questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub last_state: Option<String>,
    pub last_year: Option<i32>,
    pub last_metric: String,
    pub last_limit: u32,
    pub history: VecDeque<HistoryEntry>,
}

impl SessionContext {
    pub fn new(default_metric: impl Into<String>, default_limit: u32) -> Self {
        Self {
            last_state: None,
            last_year: None,
            last_metric: default_metric.into(),
            last_limit: default_limit,
            history: VecDeque::new(),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new("sales", 5)
    }
}

/// Values a finished request contributes back to its session.
/// `None` leaves the remembered value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFilters {
    pub state: Option<String>,
    pub year: Option<i32>,
    pub metric: Option<MetricField>,
    pub limit: Option<u32>,
}

impl ResolvedFilters {
    pub fn from_entities(entities: &EntitySet) -> Self {
        Self {
            state: entities.geographic.as_ref().map(|g| g.name.clone()),
            year: entities.year,
            metric: entities.metrics.first().copied(),
            limit: entities.limit,
        }
    }
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of one analyzed question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub session_id: String,
    pub question: String,
    /// The question after context rewriting.
    pub interpreted_question: String,
    pub intent: Intent,
    pub title: String,
    pub subtitle: String,
    pub plan: QueryPlan,
    pub sql: String,
    pub visualization: VisualizationSpec,
    pub insights: String,
    pub raw_data: Vec<DataRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_context_defaults() {
        let ctx = SessionContext::default();
        assert_eq!(ctx.last_metric, "sales");
        assert_eq!(ctx.last_limit, 5);
        assert!(ctx.last_state.is_none());
        assert!(ctx.history.is_empty());
    }

    #[test]
    fn test_geo_entity_field() {
        assert_eq!(GeoEntity::state("Texas").field(), CategoricalField::State);
        assert_eq!(GeoEntity::place("Seattle").field(), CategoricalField::City);
    }

    #[test]
    fn test_resolved_filters_from_entities() {
        let entities = EntitySet {
            geographic: Some(GeoEntity::state("Ohio")),
            metrics: vec![MetricField::Profit, MetricField::Sales],
            year: Some(2016),
            ..Default::default()
        };
        let filters = ResolvedFilters::from_entities(&entities);
        assert_eq!(filters.state.as_deref(), Some("Ohio"));
        assert_eq!(filters.year, Some(2016));
        assert_eq!(filters.metric, Some(MetricField::Profit));
        assert_eq!(filters.limit, None);
    }
}

//! Optional language-model enrichment.
//!
//! A model may suggest a category, a limit, metrics or a chart type for a
//! question.
//! Suggestions are advisory: any failure falls back to the rule-based path,
//! and only hints that cannot widen the plan are applied.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use lumen_core::{ChartType, IntentCategory};

/// Failure talking to, or understanding, the model.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("malformed model response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Text-completion collaborator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError>;
}

// =============================================================================
// Response shape
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisHint {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub metrics: Vec<String>,
    pub dimensions: Vec<String>,
    pub filters: serde_json::Value,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryHint {
    pub aggregation: Option<String>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualizationHint {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub config: serde_json::Value,
}

/// What the model is asked to return.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnrichmentPlan {
    pub analysis: AnalysisHint,
    pub query: QueryHint,
    pub visualization: VisualizationHint,
}

/// The subset of a model plan the orchestrator will act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentHints {
    pub category: Option<IntentCategory>,
    pub limit: Option<u32>,
    pub chart: Option<ChartType>,
    /// Raw metric expressions; whitelisted before use.
    pub metrics: Vec<String>,
}

impl From<&EnrichmentPlan> for EnrichmentHints {
    fn from(plan: &EnrichmentPlan) -> Self {
        Self {
            category: plan
                .analysis
                .kind
                .as_deref()
                .and_then(IntentCategory::parse),
            limit: plan.analysis.limit.filter(|n| *n > 0),
            chart: plan
                .visualization
                .kind
                .as_deref()
                .and_then(ChartType::parse),
            metrics: plan.analysis.metrics.clone(),
        }
    }
}

/// Remove markdown fences and any prose around the outermost JSON object.
pub fn clean_json_response(response: &str) -> &str {
    let mut cleaned = response.trim();
    cleaned = cleaned
        .strip_prefix("```json")
        .or_else(|| cleaned.strip_prefix("```"))
        .unwrap_or(cleaned);
    cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    }
}

pub fn parse_response(response: &str) -> Result<EnrichmentPlan, EnrichmentError> {
    Ok(serde_json::from_str(clean_json_response(response))?)
}

pub fn build_prompt(question: &str) -> String {
    format!(
        "You analyze business questions about an orders table with fields \
         order_date, customer_name, segment, city, state, region, product_name, \
         category, sub_category, sales, quantity, discount and profit.\n\
         Reply with JSON only, shaped as \
         {{\"analysis\": {{\"type\", \"subtype\", \"metrics\", \"dimensions\", \"filters\", \"limit\"}}, \
         \"query\": {{\"aggregation\", \"orderBy\"}}, \
         \"visualization\": {{\"type\", \"config\"}}}}.\n\
         Question: {}",
        question
    )
}

// =============================================================================
// Enricher
// =============================================================================

/// Asks the model for hints and swallows every failure.
#[derive(Clone)]
pub struct Enricher {
    model: Arc<dyn LanguageModel>,
}

impl Enricher {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// `None` when the model fails or replies with something unparseable.
    pub async fn hints(&self, question: &str) -> Option<EnrichmentHints> {
        let response = match self.model.complete(&build_prompt(question)).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Enrichment unavailable, using rule-based plan");
                return None;
            }
        };
        match parse_response(&response) {
            Ok(plan) => {
                let hints = EnrichmentHints::from(&plan);
                debug!(?hints, "Enrichment hints");
                Some(hints)
            }
            Err(e) => {
                warn!(error = %e, "Enrichment response unparseable, using rule-based plan");
                None
            }
        }
    }
}

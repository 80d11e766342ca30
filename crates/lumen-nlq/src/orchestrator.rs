//! Analysis orchestrator: wires validation, context, parsing, planning,
//! execution, visualization and summarization for one question.

use std::sync::Arc;

use tracing::{debug, info, warn};

use lumen_core::{
    CategoricalField, Direction, Intent, IntentCategory, LumenConfig, MetricField, PlanShape,
    QueryExecutor, QueryPlan, ORDERS,
};
use lumen_insight::{ChartRequest, InsightsSummarizer, Series, VisualizationSelector};

use crate::context::SessionContextStore;
use crate::enrichment::{Enricher, EnrichmentHints, LanguageModel};
use crate::error::AnalysisError;
use crate::parser::{EntityExtractor, IntentClassifier};
use crate::planner::{partition_series, ranking_dimension, resolve_metric, QueryPlanBuilder};
use crate::sanitizer::QueryPlanSanitizer;
use crate::types::{AnalysisResult, EntitySet, ResolvedFilters};
use crate::validation::QuestionValidator;

/// Central coordinator for question analysis.
pub struct Orchestrator {
    validator: QuestionValidator,
    extractor: EntityExtractor,
    classifier: IntentClassifier,
    planner: QueryPlanBuilder,
    sanitizer: QueryPlanSanitizer,
    selector: VisualizationSelector,
    contexts: SessionContextStore,
    executor: Arc<dyn QueryExecutor>,
    enricher: Option<Enricher>,
    enrichment_enabled: bool,
}

impl Orchestrator {
    pub fn new(config: &LumenConfig, executor: Arc<dyn QueryExecutor>) -> Self {
        let analysis = &config.analysis;
        Self {
            validator: QuestionValidator::from_config(analysis),
            extractor: EntityExtractor::new(),
            classifier: IntentClassifier::new(),
            planner: QueryPlanBuilder::from_config(analysis),
            sanitizer: QueryPlanSanitizer::new(ORDERS, analysis.sanitize_mode),
            selector: VisualizationSelector::new(),
            contexts: SessionContextStore::from_config(analysis),
            executor,
            enricher: None,
            enrichment_enabled: config.enrichment.enabled,
        }
    }

    /// Attach a language model. Consulted only when enrichment is enabled.
    pub fn with_language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.enricher = Some(Enricher::new(model));
        self
    }

    pub fn contexts(&self) -> &SessionContextStore {
        &self.contexts
    }

    /// Analyze one question within a session.
    ///
    /// Requests for the same session are serialized; different sessions run
    /// independently.
    pub async fn process_question(
        &self,
        question: &str,
        session_id: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let question = self.validator.validate(question)?;
        info!(session_id, question, "Processing question");

        let gate = self.contexts.gate(session_id);
        let _turn = gate.lock().await;

        let ctx = self.contexts.get(session_id);
        let interpreted = self.contexts.enhance_question(question, &ctx);
        if interpreted != question {
            debug!(interpreted = %interpreted, "Question rewritten from context");
        }

        let mut entities = self.extractor.extract(&interpreted);
        let mut intent = self.classifier.classify(&interpreted);

        let hints = self.enrichment_hints(&interpreted).await;
        if let Some(hints) = &hints {
            let metric = self.hinted_metric(hints);
            (intent, entities) = apply_hints(hints, metric, intent, entities);
        }
        debug!(?intent, ?entities, "Interpreted question");

        let plan = self
            .planner
            .build(&intent, &entities, &ctx, &interpreted)?;
        let plan = self.sanitizer.sanitize(plan)?;
        let sql = plan.to_sql(self.executor.dialect());
        debug!(sql = %sql, "Plan ready");

        let rows = self
            .executor
            .execute(&plan)
            .await
            .map_err(|source| AnalysisError::Execution {
                sql: sql.clone(),
                source,
            })?;
        if rows.is_empty() {
            return Err(AnalysisError::NoData { sql });
        }

        let metric = resolve_metric(&entities, &ctx);
        let value_column = plan
            .measure_column()
            .map(str::to_string)
            .unwrap_or_else(|| format!("total_{}", metric.column()));

        let series: Vec<Series> = match (&plan.shape, &entities.comparison) {
            (PlanShape::Comparison, Some(targets)) => {
                partition_series(&plan, &rows, &targets.values)
            }
            _ => Vec::new(),
        };

        let (title, subtitle) = describe(&plan, &entities, metric.label());
        let category_label = match plan.shape {
            PlanShape::Ranking => ranking_dimension(&entities).label().to_string(),
            PlanShape::Trend | PlanShape::Comparison => "Month".to_string(),
        };

        let visualization = self.selector.build(&ChartRequest {
            intent,
            rows: &rows,
            series: &series,
            value_column: &value_column,
            category_label,
            value_label: format!("Total {}", metric.label()),
            title: title.clone(),
            subtitle: subtitle.clone(),
            hint: hints.and_then(|h| h.chart),
        })?;

        let summarizer = InsightsSummarizer::new(metric.is_currency());
        let insights = match plan.shape {
            PlanShape::Comparison => summarizer.summarize_series(&series, &value_column),
            PlanShape::Ranking => match plan.dimension_column() {
                Some(label) => {
                    let direction = plan
                        .order_by
                        .first()
                        .map_or(Direction::Desc, |o| o.direction);
                    summarizer.summarize_ranking(&rows, &value_column, label, direction)
                }
                None => summarizer.summarize(&rows, &value_column),
            },
            PlanShape::Trend => summarizer.summarize(&rows, &value_column),
        };

        self.contexts.update(
            session_id,
            &ResolvedFilters::from_entities(&entities),
            &title,
            visualization.chart_type,
        );

        info!(
            session_id,
            rows = rows.len(),
            chart_type = visualization.chart_type.as_str(),
            "Analysis complete"
        );

        Ok(AnalysisResult {
            session_id: session_id.to_string(),
            question: question.to_string(),
            interpreted_question: interpreted,
            intent,
            title,
            subtitle,
            plan,
            sql,
            visualization,
            insights,
            raw_data: rows,
        })
    }

    /// First suggested metric that survives the whitelist.
    fn hinted_metric(&self, hints: &EnrichmentHints) -> Option<MetricField> {
        self.sanitizer
            .sanitize_expression_strings(&hints.metrics)
            .iter()
            .find_map(|m| MetricField::parse(m))
    }

    async fn enrichment_hints(&self, question: &str) -> Option<EnrichmentHints> {
        if !self.enrichment_enabled {
            return None;
        }
        match &self.enricher {
            Some(enricher) => enricher.hints(question).await,
            None => {
                warn!("Enrichment enabled but no language model attached");
                None
            }
        }
    }
}

/// Apply only hints that fill gaps: a category for general questions, a
/// limit when none was given and a metric when none was named.
fn apply_hints(
    hints: &EnrichmentHints,
    metric: Option<MetricField>,
    intent: Intent,
    entities: EntitySet,
) -> (Intent, EntitySet) {
    let intent = match hints.category {
        Some(category)
            if intent.category == IntentCategory::General
                && category != IntentCategory::General =>
        {
            Intent::new(category, intent.subtype)
        }
        _ => intent,
    };
    let metrics = match (entities.metrics.is_empty(), metric) {
        (true, Some(metric)) => vec![metric],
        _ => entities.metrics,
    };
    let entities = EntitySet {
        limit: entities.limit.or(hints.limit),
        metrics,
        ..entities
    };
    (intent, entities)
}

/// Chart title and subtitle for a plan.
fn describe(plan: &QueryPlan, entities: &EntitySet, metric_label: &str) -> (String, String) {
    let title = match plan.shape {
        PlanShape::Ranking => {
            let dimension = plan
                .dimension_column()
                .and_then(CategoricalField::from_column)
                .unwrap_or(CategoricalField::CustomerName);
            let which = if entities.bottom { "Bottom" } else { "Top" };
            format!(
                "{} {} {} by {}",
                which,
                plan.limit.unwrap_or_default(),
                dimension.label(),
                metric_label
            )
        }
        PlanShape::Trend => format!("{} Trend", metric_label),
        PlanShape::Comparison => {
            let values = entities
                .comparison
                .as_ref()
                .map(|t| t.values.join(" vs "))
                .unwrap_or_default();
            format!("{}: {}", metric_label, values)
        }
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(geo) = &entities.geographic {
        parts.push(crate::planner::title_case(&geo.name));
    }
    if let Some(year) = entities.year {
        parts.push(year.to_string());
    }
    let subtitle = if parts.is_empty() {
        "All data".to_string()
    } else {
        parts.join(", ")
    };
    (title, subtitle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lumen_core::{ChartType, DataRow, ExecutionError, IntentSubtype};
    use std::sync::Mutex;

    /// Records executed plans and replays canned rows.
    struct MockExecutor {
        rows: Vec<DataRow>,
        fail: bool,
        seen: Mutex<Vec<QueryPlan>>,
    }

    impl MockExecutor {
        fn returning(rows: Vec<DataRow>) -> Arc<Self> {
            Arc::new(Self {
                rows,
                fail: false,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                rows: Vec::new(),
                fail: true,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QueryExecutor for MockExecutor {
        async fn execute(&self, plan: &QueryPlan) -> Result<Vec<DataRow>, ExecutionError> {
            self.seen.lock().unwrap().push(plan.clone());
            if self.fail {
                return Err(ExecutionError::new("connection refused"));
            }
            Ok(self.rows.clone())
        }
    }

    struct StaticModel(&'static str);

    #[async_trait]
    impl LanguageModel for StaticModel {
        async fn complete(
            &self,
            _prompt: &str,
        ) -> Result<String, crate::enrichment::EnrichmentError> {
            Ok(self.0.to_string())
        }
    }

    fn customer_rows() -> Vec<DataRow> {
        vec![
            DataRow::new()
                .with("customer_name", "Ann")
                .with("total_sales", 900.0),
            DataRow::new()
                .with("customer_name", "Bob")
                .with("total_sales", 400.0),
        ]
    }

    fn orchestrator(executor: Arc<MockExecutor>) -> Orchestrator {
        Orchestrator::new(&LumenConfig::default(), executor)
    }

    #[tokio::test]
    async fn test_ranking_question() {
        let exec = MockExecutor::returning(customer_rows());
        let o = orchestrator(exec.clone());
        let result = o
            .process_question("Show top 5 customers in California", "s1")
            .await
            .unwrap();
        assert_eq!(result.visualization.chart_type, ChartType::HorizontalBar);
        assert_eq!(result.title, "Top 5 Customers by Sales");
        assert_eq!(result.subtitle, "California");
        assert!(result.insights.contains("Top: Ann with $900"));
        assert_eq!(
            result.sql,
            "SELECT customer_name, SUM(sales) as total_sales FROM orders \
             WHERE state = 'California' GROUP BY customer_name \
             ORDER BY total_sales DESC LIMIT 5"
        );
        assert_eq!(exec.seen.lock().unwrap().len(), 1);
        assert_eq!(
            o.contexts().get("s1").last_state.as_deref(),
            Some("California")
        );
    }

    #[tokio::test]
    async fn test_validation_error_never_executes() {
        let exec = MockExecutor::returning(customer_rows());
        let o = orchestrator(exec.clone());
        let err = o
            .process_question("DROP TABLE orders;", "s1")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InjectionPattern(_)));
        assert!(exec.seen.lock().unwrap().is_empty());
        assert!(o.contexts().sessions().is_empty());
    }

    #[tokio::test]
    async fn test_no_rows_is_no_data() {
        let o = orchestrator(MockExecutor::returning(Vec::new()));
        let err = o.process_question("top customers", "s1").await.unwrap_err();
        match err {
            AnalysisError::NoData { sql } => assert!(sql.starts_with("SELECT")),
            other => panic!("expected NoData, got {:?}", other),
        }
        assert!(o.contexts().get("s1").history.is_empty());
    }

    #[tokio::test]
    async fn test_execution_failure_wraps_cause() {
        let o = orchestrator(MockExecutor::failing());
        let err = o.process_question("top customers", "s1").await.unwrap_err();
        match err {
            AnalysisError::Execution { sql, source } => {
                assert!(sql.contains("LIMIT 5"));
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("expected Execution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_underspecified_comparison_never_executes() {
        let exec = MockExecutor::returning(customer_rows());
        let o = orchestrator(exec.clone());
        let err = o
            .process_question("compare sales in Texas", "s1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnderspecifiedComparison { found: 1 }
        ));
        assert!(exec.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_up_uses_context() {
        let exec = MockExecutor::returning(customer_rows());
        let o = orchestrator(exec.clone());
        o.process_question("top 5 customers in Ohio", "s1")
            .await
            .unwrap();
        let result = o.process_question("top 3 products", "s1").await.unwrap();
        assert_eq!(result.interpreted_question, "top 3 products in Ohio");
        let plans = exec.seen.lock().unwrap();
        assert_eq!(plans[1].where_strings(), vec!["state = 'Ohio'"]);
    }

    #[tokio::test]
    async fn test_enrichment_fills_general_category_and_limit() {
        let exec = MockExecutor::returning(customer_rows());
        let mut config = LumenConfig::default();
        config.enrichment.enabled = true;
        let o = Orchestrator::new(&config, exec.clone()).with_language_model(Arc::new(
            StaticModel(r#"{"analysis": {"type": "ranking", "limit": 8}}"#),
        ));
        let result = o.process_question("who matters most", "s1").await.unwrap();
        assert_eq!(result.intent.category, IntentCategory::Ranking);
        assert_eq!(result.plan.limit, Some(8));
    }

    #[tokio::test]
    async fn test_enrichment_metric_passes_whitelist() {
        let exec = MockExecutor::returning(customer_rows());
        let mut config = LumenConfig::default();
        config.enrichment.enabled = true;
        let o = Orchestrator::new(&config, exec.clone()).with_language_model(Arc::new(
            StaticModel(r#"{"analysis": {"type": "ranking", "metrics": ["salary", "profit"]}}"#),
        ));
        let result = o.process_question("who matters most", "s1").await.unwrap();
        assert_eq!(
            result.plan.select_strings()[1],
            "SUM(profit) as total_profit"
        );
    }

    #[tokio::test]
    async fn test_enrichment_does_not_override_rules() {
        let exec = MockExecutor::returning(customer_rows());
        let mut config = LumenConfig::default();
        config.enrichment.enabled = true;
        let o = Orchestrator::new(&config, exec).with_language_model(Arc::new(StaticModel(
            r#"{"analysis": {"type": "trend", "limit": 8}}"#,
        )));
        let result = o.process_question("top 2 customers", "s1").await.unwrap();
        assert_eq!(result.intent.category, IntentCategory::Ranking);
        assert_eq!(result.plan.limit, Some(2));
    }

    #[tokio::test]
    async fn test_enrichment_disabled_ignores_model() {
        let exec = MockExecutor::returning(customer_rows());
        let o = orchestrator(exec).with_language_model(Arc::new(StaticModel(
            r#"{"analysis": {"type": "ranking"}}"#,
        )));
        let result = o.process_question("who matters most", "s1").await.unwrap();
        assert_eq!(result.intent, Intent::general());
    }

    #[test]
    fn test_apply_hints_keeps_subtype_and_existing_limit() {
        let hints = EnrichmentHints {
            category: Some(IntentCategory::Trend),
            limit: Some(9),
            ..Default::default()
        };
        let entities = EntitySet {
            limit: Some(4),
            metrics: vec![MetricField::Quantity],
            ..Default::default()
        };
        let comparison = Intent::new(IntentCategory::Comparison, Some(IntentSubtype::Ranking));
        let (intent, entities) =
            apply_hints(&hints, Some(MetricField::Profit), comparison, entities);
        assert_eq!(intent, comparison);
        assert_eq!(entities.limit, Some(4));
        assert_eq!(entities.metrics, vec![MetricField::Quantity]);
    }

    #[tokio::test]
    async fn test_same_session_requests_do_not_lose_updates() {
        let exec = MockExecutor::returning(customer_rows());
        let o = Arc::new(orchestrator(exec));
        let mut handles = Vec::new();
        for i in 0..5 {
            let o = o.clone();
            handles.push(tokio::spawn(async move {
                o.process_question(&format!("top {} customers", i + 1), "shared")
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(o.contexts().get("shared").history.len(), 5);
    }
}

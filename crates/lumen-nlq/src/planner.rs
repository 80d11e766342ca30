//! Query plan construction.
//!
//! Builds one of three typed plan shapes from the classified intent, the
//! extracted entities and the session context.

use std::sync::LazyLock;

use regex::Regex;

use lumen_core::config::AnalysisConfig;
use lumen_core::{
    CategoricalField, DataRow, Direction, Expr, Intent, IntentCategory, Key, MetricField,
    OrderItem, PlanShape, Predicate, QueryPlan, SelectItem, TruncUnit, DATE_FIELD, ORDERS,
};
use lumen_insight::Series;

use crate::error::AnalysisError;
use crate::types::{EntitySet, SessionContext};

static TOP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\btop\b").unwrap());

const MONTH_ALIAS: &str = "month";

/// Title-case each word: "new york" becomes "New York".
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Builds typed plans over the orders source.
#[derive(Debug, Clone)]
pub struct QueryPlanBuilder {
    default_limit: u32,
}

impl QueryPlanBuilder {
    pub fn new(default_limit: u32) -> Self {
        Self { default_limit }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.default_limit)
    }

    /// Pick a shape for the intent and build it.
    ///
    /// Distribution, composition and general questions fall back to the
    /// trend shape, or to the ranking shape when the question says "top".
    pub fn build(
        &self,
        intent: &Intent,
        entities: &EntitySet,
        ctx: &SessionContext,
        question: &str,
    ) -> Result<QueryPlan, AnalysisError> {
        match intent.category {
            IntentCategory::Comparison => self.comparison(entities, ctx),
            IntentCategory::Ranking => Ok(self.ranking(entities, ctx)),
            IntentCategory::Trend => Ok(self.trend(entities, ctx)),
            IntentCategory::Distribution
            | IntentCategory::Composition
            | IntentCategory::General => {
                if TOP_RE.is_match(question) {
                    Ok(self.ranking(entities, ctx))
                } else {
                    Ok(self.trend(entities, ctx))
                }
            }
        }
    }

    /// Top or bottom N of a dimension by the summed metric.
    pub fn ranking(&self, entities: &EntitySet, ctx: &SessionContext) -> QueryPlan {
        let metric = resolve_metric(entities, ctx);
        let dimension = ranking_dimension(entities);
        let total = total_alias(metric);

        let mut plan = QueryPlan::new(PlanShape::Ranking, ORDERS.source);
        plan.select = vec![
            SelectItem::new(Expr::column(dimension.column())),
            SelectItem::aliased(Expr::sum(Expr::column(metric.column())), total.clone()),
        ];
        plan.filters = filters(entities, None);
        plan.group_by = vec![Key::Expr(Expr::column(dimension.column()))];
        let direction = if entities.bottom {
            Direction::Asc
        } else {
            Direction::Desc
        };
        plan.order_by = vec![OrderItem::new(Key::Alias(total), direction)];
        plan.limit = Some(entities.limit.unwrap_or(self.default_limit));
        plan
    }

    /// Monthly totals of the metric.
    pub fn trend(&self, entities: &EntitySet, ctx: &SessionContext) -> QueryPlan {
        let metric = resolve_metric(entities, ctx);

        let mut plan = QueryPlan::new(PlanShape::Trend, ORDERS.source);
        plan.select = vec![
            month_select(),
            SelectItem::aliased(
                Expr::sum(Expr::column(metric.column())),
                total_alias(metric),
            ),
        ];
        plan.filters = filters(entities, None);
        plan.group_by = vec![Key::Alias(MONTH_ALIAS.to_string())];
        plan.order_by = vec![OrderItem::new(
            Key::Alias(MONTH_ALIAS.to_string()),
            Direction::Asc,
        )];
        plan
    }

    /// Monthly totals per compared value. Needs at least two values.
    pub fn comparison(
        &self,
        entities: &EntitySet,
        ctx: &SessionContext,
    ) -> Result<QueryPlan, AnalysisError> {
        let targets = match &entities.comparison {
            Some(t) if t.values.len() >= 2 => t,
            other => {
                return Err(AnalysisError::UnderspecifiedComparison {
                    found: other.as_ref().map(|t| t.values.len()).unwrap_or(0),
                })
            }
        };
        let metric = resolve_metric(entities, ctx);
        let column = targets.field.column();

        let mut plan = QueryPlan::new(PlanShape::Comparison, ORDERS.source);
        plan.select = vec![
            month_select(),
            SelectItem::new(Expr::column(column)),
            SelectItem::aliased(
                Expr::sum(Expr::column(metric.column())),
                total_alias(metric),
            ),
        ];

        let mut filters = vec![Predicate::is_in(
            Expr::column(column),
            targets.values.iter().map(|v| title_case(v)),
        )];
        filters.extend(self::filters(entities, Some(targets.field)));
        plan.filters = filters;

        plan.group_by = vec![
            Key::Alias(MONTH_ALIAS.to_string()),
            Key::Expr(Expr::column(column)),
        ];
        plan.order_by = vec![OrderItem::new(
            Key::Alias(MONTH_ALIAS.to_string()),
            Direction::Asc,
        )];
        Ok(plan)
    }
}

impl Default for QueryPlanBuilder {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// First metric named in the question, else the remembered one, else sales.
pub fn resolve_metric(entities: &EntitySet, ctx: &SessionContext) -> MetricField {
    entities
        .metrics
        .first()
        .copied()
        .or_else(|| MetricField::parse(&ctx.last_metric))
        .unwrap_or(MetricField::Sales)
}

/// First named dimension that is not the geographic filter column.
pub fn ranking_dimension(entities: &EntitySet) -> CategoricalField {
    let geo_field = entities.geographic.as_ref().map(|g| g.field());
    entities
        .categorical
        .iter()
        .copied()
        .find(|c| Some(*c) != geo_field)
        .unwrap_or(CategoricalField::CustomerName)
}

fn total_alias(metric: MetricField) -> String {
    format!("total_{}", metric.column())
}

fn month_select() -> SelectItem {
    SelectItem::aliased(
        Expr::date_trunc(TruncUnit::Month, Expr::column(DATE_FIELD)),
        MONTH_ALIAS,
    )
}

/// Geographic and year predicates. The geographic filter is skipped when it
/// targets the column already constrained by a comparison.
fn filters(entities: &EntitySet, compared: Option<CategoricalField>) -> Vec<Predicate> {
    let mut out = Vec::new();
    if let Some(geo) = &entities.geographic {
        if compared != Some(geo.field()) {
            out.push(Predicate::eq(
                Expr::column(geo.field().column()),
                title_case(&geo.name),
            ));
        }
    }
    if let Some(year) = entities.year {
        out.push(Predicate::eq(
            Expr::date_trunc(TruncUnit::Year, Expr::column(DATE_FIELD)),
            format!("{}-01-01", year),
        ));
    }
    out
}

/// Split comparison rows into one series per compared value, each sorted by
/// time ascending. Values without rows still get an (empty) series.
pub fn partition_series(plan: &QueryPlan, rows: &[DataRow], values: &[String]) -> Vec<Series> {
    let Some(dimension) = plan.dimension_column() else {
        return Vec::new();
    };
    let time = plan.time_column();

    values
        .iter()
        .map(|value| {
            let mut series_rows: Vec<DataRow> = rows
                .iter()
                .filter(|row| row.text(dimension).eq_ignore_ascii_case(value))
                .cloned()
                .collect();
            if let Some(time) = time {
                series_rows.sort_by(|a, b| {
                    let ka = a.get(time).and_then(|v| v.as_date());
                    let kb = b.get(time).and_then(|v| v.as_date());
                    ka.cmp(&kb).then_with(|| a.text(time).cmp(&b.text(time)))
                });
            }
            Series {
                name: title_case(value),
                rows: series_rows,
            }
        })
        .collect()
}

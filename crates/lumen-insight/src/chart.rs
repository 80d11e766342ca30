//! Visualization selection.
//!
//! An ordered rule table maps (intent, data characteristics) to a chart type,
//! then the rows are shaped into the matching [`ChartData`] variant. Rules are
//! evaluated top to bottom and the first match wins.

use std::collections::BTreeSet;

use tracing::debug;

use lumen_core::{ChartType, DataRow, Intent, IntentCategory, IntentSubtype, Scalar};

use crate::error::ChartError;
use crate::types::{
    Axes, Axis, AxisFormat, BarDatum, ChartData, HistogramBin, LineSeries, Orientation, PieSlice,
    ScatterPoint, Series, TimePoint, TreemapNode, VisualizationSpec,
};

const MAX_HISTOGRAM_BINS: usize = 20;
const CURRENCY_MARKERS: &[&str] = &["sales", "profit", "price", "revenue"];
const TIME_COLUMN_NAMES: &[&str] = &["month", "year", "date", "order_date", "ship_date"];

// =============================================================================
// Data characteristics
// =============================================================================

/// Shape of a result set, computed once before selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataCharacteristics {
    pub record_count: usize,
    pub unique_categories: usize,
    pub has_time_component: bool,
    pub is_hierarchical: bool,
    pub numeric_columns: usize,
    pub series_count: usize,
}

impl DataCharacteristics {
    /// Empty input yields all-zero characteristics.
    pub fn analyze(rows: &[DataRow], series: &[Series]) -> Self {
        let Some(first) = rows.first() else {
            return Self {
                series_count: series.len(),
                ..Self::default()
            };
        };

        let text_columns = text_columns(first);
        let unique_categories = text_columns
            .first()
            .map(|column| {
                rows.iter()
                    .filter_map(|row| row.get(column))
                    .map(|v| v.to_string())
                    .collect::<BTreeSet<_>>()
                    .len()
            })
            .unwrap_or(0);

        Self {
            record_count: rows.len(),
            unique_categories,
            has_time_component: time_column(rows).is_some(),
            is_hierarchical: text_columns.len() >= 2,
            numeric_columns: numeric_columns(first).len(),
            series_count: series.len(),
        }
    }
}

fn text_columns(row: &DataRow) -> Vec<String> {
    row.columns()
        .filter(|(name, value)| value.is_text() && !is_time_name(name))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn numeric_columns(row: &DataRow) -> Vec<String> {
    row.columns()
        .filter(|(_, value)| matches!(value, Scalar::Number(_)))
        .map(|(name, _)| name.to_string())
        .collect()
}

fn is_time_name(name: &str) -> bool {
    TIME_COLUMN_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

/// First column holding dates, or named like a time bucket.
fn time_column(rows: &[DataRow]) -> Option<String> {
    let first = rows.first()?;
    first
        .columns()
        .find(|(name, value)| matches!(value, Scalar::Date(_)) || is_time_name(name))
        .map(|(name, _)| name.to_string())
}

// =============================================================================
// Decision table
// =============================================================================

/// Outcome of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartChoice {
    pub chart_type: ChartType,
    pub orientation: Option<Orientation>,
    /// Bin count, set only for histograms.
    pub bins: Option<usize>,
    /// Name of the rule that fired.
    pub rule: &'static str,
}

struct Rule {
    name: &'static str,
    matches: fn(&Intent, &DataCharacteristics) -> bool,
    chart: ChartType,
}

fn is(intent: &Intent, category: IntentCategory) -> bool {
    intent.category == category
}

/// Ordered decision table; the first matching rule wins.
///
/// `comparison_time` names a plain line, but the selector promotes any line
/// over two or more series to a multi-line chart. Comparisons always carry
/// one series per compared value, so in practice the rule yields a
/// multi-line chart; the plain line only appears for single-series data.
static RULES: &[Rule] = &[
    Rule {
        name: "comparison_ranking",
        matches: |i, _| {
            is(i, IntentCategory::Comparison) && i.subtype == Some(IntentSubtype::Ranking)
        },
        chart: ChartType::HorizontalBar,
    },
    Rule {
        name: "comparison_time",
        matches: |i, _| {
            is(i, IntentCategory::Comparison) && i.subtype == Some(IntentSubtype::TimeBased)
        },
        chart: ChartType::Line,
    },
    Rule {
        name: "comparison_series",
        matches: |i, d| is(i, IntentCategory::Comparison) && d.series_count >= 2,
        chart: ChartType::MultiLine,
    },
    Rule {
        name: "ranking",
        matches: |i, _| is(i, IntentCategory::Ranking),
        chart: ChartType::HorizontalBar,
    },
    Rule {
        name: "trend",
        matches: |i, d| is(i, IntentCategory::Trend) && d.has_time_component,
        chart: ChartType::Line,
    },
    Rule {
        name: "distribution_wide",
        matches: |i, d| is(i, IntentCategory::Distribution) && d.unique_categories > 10,
        chart: ChartType::Histogram,
    },
    Rule {
        name: "distribution_narrow",
        matches: |i, _| is(i, IntentCategory::Distribution),
        chart: ChartType::BarVertical,
    },
    Rule {
        name: "composition_small",
        matches: |i, d| is(i, IntentCategory::Composition) && d.unique_categories <= 5,
        chart: ChartType::Pie,
    },
    Rule {
        name: "composition_large",
        matches: |i, _| is(i, IntentCategory::Composition),
        chart: ChartType::Treemap,
    },
];

/// `min(20, ceil(sqrt(n)))`, at least one bin.
pub fn histogram_bins(record_count: usize) -> usize {
    let root = (record_count as f64).sqrt().ceil() as usize;
    root.clamp(1, MAX_HISTOGRAM_BINS)
}

fn orientation_for(chart_type: ChartType) -> Option<Orientation> {
    match chart_type {
        ChartType::HorizontalBar => Some(Orientation::Horizontal),
        ChartType::BarVertical | ChartType::Histogram => Some(Orientation::Vertical),
        ChartType::Line
        | ChartType::MultiLine
        | ChartType::Pie
        | ChartType::Treemap
        | ChartType::Scatter => None,
    }
}

// =============================================================================
// Selector
// =============================================================================

/// Everything the selector needs to build a chart for one result.
#[derive(Debug, Clone)]
pub struct ChartRequest<'a> {
    pub intent: Intent,
    pub rows: &'a [DataRow],
    /// Named series for comparison results; empty for single-series data.
    pub series: &'a [Series],
    /// Column carrying the measure, e.g. `total_sales`.
    pub value_column: &'a str,
    pub category_label: String,
    pub value_label: String,
    pub title: String,
    pub subtitle: String,
    /// Advisory chart type from the enrichment collaborator.
    pub hint: Option<ChartType>,
}

/// Maps intent and data shape to a complete [`VisualizationSpec`].
#[derive(Debug, Clone, Default)]
pub struct VisualizationSelector;

impl VisualizationSelector {
    pub fn new() -> Self {
        Self
    }

    /// Run the decision table. Falls back to a vertical bar chart.
    pub fn select(&self, intent: &Intent, traits: &DataCharacteristics) -> ChartChoice {
        let (name, mut chart_type) = RULES
            .iter()
            .find(|rule| (rule.matches)(intent, traits))
            .map(|rule| (rule.name, rule.chart))
            .unwrap_or(("default", ChartType::BarVertical));

        // A time comparison over several series draws one line per series
        if chart_type == ChartType::Line && traits.series_count >= 2 {
            chart_type = ChartType::MultiLine;
        }

        ChartChoice {
            chart_type,
            orientation: orientation_for(chart_type),
            bins: (chart_type == ChartType::Histogram)
                .then(|| histogram_bins(traits.record_count)),
            rule: name,
        }
    }

    /// Characterize the rows, select a chart, and shape the data for it.
    pub fn build(&self, request: &ChartRequest<'_>) -> Result<VisualizationSpec, ChartError> {
        let traits = DataCharacteristics::analyze(request.rows, request.series);
        let mut choice = self.select(&request.intent, &traits);

        if request.hint == Some(ChartType::Scatter) {
            if traits.numeric_columns >= 2 {
                choice = ChartChoice {
                    chart_type: ChartType::Scatter,
                    orientation: None,
                    bins: None,
                    rule: "hint_scatter",
                };
            } else {
                debug!(
                    numeric_columns = traits.numeric_columns,
                    "Ignoring scatter hint"
                );
            }
        }

        debug!(
            rule = choice.rule,
            chart_type = choice.chart_type.as_str(),
            records = traits.record_count,
            categories = traits.unique_categories,
            "Selected visualization"
        );

        if request.rows.is_empty() {
            return Err(ChartError::EmptyData(choice.chart_type));
        }

        let value_column = resolve_value_column(request.rows, request.value_column)?;
        let chart = shape(&choice, request, &value_column)?;
        if chart.is_empty() {
            return Err(ChartError::EmptyData(choice.chart_type));
        }

        Ok(VisualizationSpec {
            chart_type: chart.chart_type(),
            orientation: choice.orientation,
            axes: axes(&choice, request, &value_column),
            chart,
            title: request.title.clone(),
            subtitle: request.subtitle.clone(),
        })
    }
}

/// The requested measure column, or the first numeric column when absent.
fn resolve_value_column(rows: &[DataRow], requested: &str) -> Result<String, ChartError> {
    if rows.iter().any(|row| row.get(requested).is_some()) {
        return Ok(requested.to_string());
    }
    rows.first()
        .and_then(|row| numeric_columns(row).into_iter().next())
        .ok_or_else(|| ChartError::MissingColumn(requested.to_string()))
}

fn row_label(row: &DataRow, label_column: Option<&str>, time: Option<&str>, index: usize) -> String {
    if let Some(column) = label_column {
        return row.text(column);
    }
    if let Some(date) = time.and_then(|c| row.get(c)).and_then(Scalar::as_date) {
        return date.format("%Y-%m").to_string();
    }
    format!("#{}", index + 1)
}

fn bars(rows: &[DataRow], value_column: &str) -> Vec<BarDatum> {
    let label_column = rows.first().and_then(|r| text_columns(r).into_iter().next());
    let time = time_column(rows);
    rows.iter()
        .enumerate()
        .map(|(i, row)| BarDatum {
            label: row_label(row, label_column.as_deref(), time.as_deref(), i),
            value: row.number(value_column),
        })
        .collect()
}

fn time_points(rows: &[DataRow], value_column: &str) -> Vec<TimePoint> {
    let Some(time) = time_column(rows) else {
        return Vec::new();
    };
    let mut points: Vec<TimePoint> = rows
        .iter()
        .filter_map(|row| {
            let date = row.get(&time)?.as_date()?;
            Some(TimePoint {
                date,
                value: row.number(value_column),
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

fn shape(
    choice: &ChartChoice,
    request: &ChartRequest<'_>,
    value_column: &str,
) -> Result<ChartData, ChartError> {
    let rows = request.rows;
    let data = match choice.chart_type {
        ChartType::HorizontalBar => {
            let mut bars = if request.series.is_empty() {
                bars(rows, value_column)
            } else {
                request
                    .series
                    .iter()
                    .map(|s| BarDatum {
                        label: s.name.clone(),
                        value: s.rows.iter().map(|r| r.number(value_column)).sum(),
                    })
                    .collect()
            };
            bars.sort_by(|a, b| b.value.total_cmp(&a.value));
            ChartData::HorizontalBar {
                bars,
                sorted: true,
                show_values: true,
            }
        }
        ChartType::BarVertical => ChartData::VerticalBar {
            bars: bars(rows, value_column),
            grouped: request.intent.category == IntentCategory::Distribution,
        },
        ChartType::Line => ChartData::Line {
            points: time_points(rows, value_column),
            show_points: true,
            tooltip: true,
        },
        ChartType::MultiLine => {
            let series = if request.series.is_empty() {
                vec![LineSeries {
                    name: request.value_label.clone(),
                    points: time_points(rows, value_column),
                }]
            } else {
                request
                    .series
                    .iter()
                    .map(|s| LineSeries {
                        name: s.name.clone(),
                        points: time_points(&s.rows, value_column),
                    })
                    .collect()
            };
            ChartData::MultiLine {
                series,
                show_points: true,
                tooltip: true,
            }
        }
        ChartType::Histogram => {
            let values: Vec<f64> = rows.iter().map(|r| r.number(value_column)).collect();
            let bins = choice.bins.unwrap_or_else(|| histogram_bins(values.len()));
            ChartData::Histogram {
                bins: histogram(&values, bins),
            }
        }
        ChartType::Pie => {
            let bars = bars(rows, value_column);
            let total: f64 = bars.iter().map(|b| b.value).sum();
            let slices = bars
                .into_iter()
                .map(|b| PieSlice {
                    percentage: if total == 0.0 {
                        0.0
                    } else {
                        (b.value / total * 1000.0).round() / 10.0
                    },
                    label: b.label,
                    value: b.value,
                })
                .collect();
            ChartData::Pie {
                slices,
                show_percentages: true,
            }
        }
        ChartType::Treemap => {
            let columns = rows.first().map(text_columns).unwrap_or_default();
            let label = columns
                .first()
                .ok_or_else(|| ChartError::MissingColumn("category".to_string()))?;
            let parent = columns.get(1);
            let nodes = rows
                .iter()
                .map(|row| TreemapNode {
                    label: row.text(label),
                    parent: parent.map(|p| row.text(p)),
                    value: row.number(value_column),
                })
                .collect();
            ChartData::Treemap { nodes }
        }
        ChartType::Scatter => {
            let x_column = rows
                .first()
                .and_then(|r| {
                    numeric_columns(r)
                        .into_iter()
                        .find(|c| c.as_str() != value_column)
                })
                .ok_or_else(|| ChartError::MissingColumn("second numeric column".to_string()))?;
            let label_column = rows.first().and_then(|r| text_columns(r).into_iter().next());
            let points = rows
                .iter()
                .map(|row| ScatterPoint {
                    label: label_column.as_deref().map(|c| row.text(c)),
                    x: row.number(&x_column),
                    y: row.number(value_column),
                })
                .collect();
            ChartData::Scatter { points }
        }
    };
    Ok(data)
}

/// Equal-width bins between the minimum and maximum value.
fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    if width == 0.0 {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

fn is_currency(rows: &[DataRow]) -> bool {
    rows.iter().any(|row| {
        row.column_names().any(|name| {
            let name = name.to_ascii_lowercase();
            CURRENCY_MARKERS.iter().any(|m| name.contains(m))
        })
    })
}

fn axes(choice: &ChartChoice, request: &ChartRequest<'_>, value_column: &str) -> Axes {
    let value_format = if is_currency(request.rows) {
        AxisFormat::Currency
    } else {
        AxisFormat::Number
    };
    let value = Axis {
        label: request.value_label.clone(),
        format: value_format,
    };
    let category = Axis {
        label: request.category_label.clone(),
        format: AxisFormat::Category,
    };

    match choice.chart_type {
        ChartType::HorizontalBar => Axes {
            x: value,
            y: category,
        },
        ChartType::Line | ChartType::MultiLine => Axes {
            x: Axis {
                label: request.category_label.clone(),
                format: AxisFormat::Date,
            },
            y: value,
        },
        ChartType::Histogram => Axes {
            x: value,
            y: Axis {
                label: "Count".to_string(),
                format: AxisFormat::Number,
            },
        },
        ChartType::Scatter => {
            let x_label = request
                .rows
                .first()
                .and_then(|r| {
                    numeric_columns(r)
                        .into_iter()
                        .find(|c| c.as_str() != value_column)
                })
                .unwrap_or_default();
            Axes {
                x: Axis {
                    label: x_label,
                    format: AxisFormat::Number,
                },
                y: value,
            }
        }
        ChartType::BarVertical | ChartType::Pie | ChartType::Treemap => Axes {
            x: category,
            y: value,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn intent(category: IntentCategory, subtype: Option<IntentSubtype>) -> Intent {
        Intent::new(category, subtype)
    }

    fn traits(unique: usize, records: usize, time: bool) -> DataCharacteristics {
        DataCharacteristics {
            record_count: records,
            unique_categories: unique,
            has_time_component: time,
            ..Default::default()
        }
    }

    fn ranking_rows() -> Vec<DataRow> {
        vec![
            DataRow::new()
                .with("customer_name", "Ann")
                .with("total_sales", 120.0),
            DataRow::new()
                .with("customer_name", "Bob")
                .with("total_sales", 480.0),
            DataRow::new()
                .with("customer_name", "Cy")
                .with("total_sales", 300.0),
        ]
    }

    fn monthly_rows(year: i32, values: &[f64]) -> Vec<DataRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                DataRow::new()
                    .with(
                        "month",
                        NaiveDate::from_ymd_opt(year, i as u32 + 1, 1).unwrap(),
                    )
                    .with("total_sales", *v)
            })
            .collect()
    }

    fn request<'a>(
        intent: Intent,
        rows: &'a [DataRow],
        series: &'a [Series],
    ) -> ChartRequest<'a> {
        ChartRequest {
            intent,
            rows,
            series,
            value_column: "total_sales",
            category_label: "Customers".to_string(),
            value_label: "Total Sales".to_string(),
            title: "Title".to_string(),
            subtitle: "Subtitle".to_string(),
            hint: None,
        }
    }

    #[test]
    fn test_distribution_histogram_bins() {
        let selector = VisualizationSelector::new();
        let choice = selector.select(
            &intent(IntentCategory::Distribution, None),
            &traits(15, 100, false),
        );
        assert_eq!(choice.chart_type, ChartType::Histogram);
        assert_eq!(choice.bins, Some(10));
    }

    #[test]
    fn test_histogram_bins_capped() {
        assert_eq!(histogram_bins(10_000), 20);
        assert_eq!(histogram_bins(2), 2);
        assert_eq!(histogram_bins(0), 1);
    }

    #[test]
    fn test_decision_table_rows() {
        let s = VisualizationSelector::new();
        let cases = [
            (
                intent(IntentCategory::Comparison, Some(IntentSubtype::Ranking)),
                traits(3, 3, false),
                ChartType::HorizontalBar,
            ),
            (
                intent(IntentCategory::Comparison, Some(IntentSubtype::TimeBased)),
                traits(0, 12, true),
                ChartType::Line,
            ),
            (
                intent(IntentCategory::Trend, None),
                traits(0, 12, true),
                ChartType::Line,
            ),
            (
                intent(IntentCategory::Distribution, None),
                traits(10, 10, false),
                ChartType::BarVertical,
            ),
            (
                intent(IntentCategory::Composition, None),
                traits(5, 5, false),
                ChartType::Pie,
            ),
            (
                intent(IntentCategory::Composition, None),
                traits(6, 6, false),
                ChartType::Treemap,
            ),
            (
                intent(IntentCategory::Ranking, None),
                traits(5, 5, false),
                ChartType::HorizontalBar,
            ),
        ];
        for (intent, traits, expected) in cases {
            assert_eq!(s.select(&intent, &traits).chart_type, expected, "{:?}", intent);
        }
    }

    #[test]
    fn test_trend_without_time_falls_back() {
        let s = VisualizationSelector::new();
        let choice = s.select(&intent(IntentCategory::Trend, None), &traits(4, 4, false));
        assert_eq!(choice.chart_type, ChartType::BarVertical);
        assert_eq!(choice.rule, "default");
    }

    #[test]
    fn test_empty_characteristics_route_to_default() {
        let t = DataCharacteristics::analyze(&[], &[]);
        assert_eq!(t, DataCharacteristics::default());
        let choice = VisualizationSelector::new().select(&Intent::general(), &t);
        assert_eq!(choice.chart_type, ChartType::BarVertical);
    }

    #[test]
    fn test_multi_series_comparison_is_multi_line() {
        let s = VisualizationSelector::new();
        let mut t = traits(2, 24, true);
        t.series_count = 2;
        let choice = s.select(&intent(IntentCategory::Comparison, None), &t);
        assert_eq!(choice.chart_type, ChartType::MultiLine);

        let timed = s.select(
            &intent(IntentCategory::Comparison, Some(IntentSubtype::TimeBased)),
            &t,
        );
        assert_eq!(timed.chart_type, ChartType::MultiLine);
    }

    #[test]
    fn test_single_series_time_comparison_stays_line() {
        let mut t = traits(1, 12, true);
        t.series_count = 1;
        let choice = VisualizationSelector::new().select(
            &intent(IntentCategory::Comparison, Some(IntentSubtype::TimeBased)),
            &t,
        );
        assert_eq!(choice.rule, "comparison_time");
        assert_eq!(choice.chart_type, ChartType::Line);
    }

    #[test]
    fn test_analyze_characteristics() {
        let rows = vec![
            DataRow::new()
                .with("region", "West")
                .with("state", "California")
                .with("total_sales", 1.0),
            DataRow::new()
                .with("region", "West")
                .with("state", "Oregon")
                .with("total_sales", 2.0),
        ];
        let t = DataCharacteristics::analyze(&rows, &[]);
        assert_eq!(t.record_count, 2);
        assert_eq!(t.unique_categories, 1);
        assert!(t.is_hierarchical);
        assert!(!t.has_time_component);
        assert_eq!(t.numeric_columns, 1);
    }

    #[test]
    fn test_build_ranking_sorted_horizontal_bar() {
        let rows = ranking_rows();
        let spec = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Ranking, None), &rows, &[]))
            .unwrap();
        assert_eq!(spec.chart_type, ChartType::HorizontalBar);
        assert_eq!(spec.orientation, Some(Orientation::Horizontal));
        assert_eq!(spec.axes.x.format, AxisFormat::Currency);
        assert_eq!(spec.axes.y.label, "Customers");
        match spec.chart {
            ChartData::HorizontalBar { bars, sorted, .. } => {
                assert!(sorted);
                let labels: Vec<_> = bars.iter().map(|b| b.label.as_str()).collect();
                assert_eq!(labels, vec!["Bob", "Cy", "Ann"]);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_build_trend_line_points_sorted() {
        let mut rows = monthly_rows(2017, &[10.0, 20.0, 30.0]);
        rows.reverse();
        let spec = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Trend, None), &rows, &[]))
            .unwrap();
        assert_eq!(spec.chart_type, ChartType::Line);
        assert_eq!(spec.axes.x.format, AxisFormat::Date);
        match spec.chart {
            ChartData::Line { points, .. } => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0].value, 10.0);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_build_multi_line_one_series_per_name() {
        let az = monthly_rows(2017, &[1.0, 2.0]);
        let tx = monthly_rows(2017, &[3.0, 4.0]);
        let all: Vec<DataRow> = az.iter().chain(tx.iter()).cloned().collect();
        let series = vec![
            Series {
                name: "Arizona".into(),
                rows: az,
            },
            Series {
                name: "Texas".into(),
                rows: tx,
            },
        ];
        let spec = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Comparison, None), &all, &series))
            .unwrap();
        match spec.chart {
            ChartData::MultiLine { series, .. } => {
                let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["Arizona", "Texas"]);
                assert_eq!(series[1].points.len(), 2);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_build_comparison_ranking_uses_series_totals() {
        let az = monthly_rows(2017, &[1.0, 2.0]);
        let tx = monthly_rows(2017, &[3.0, 4.0]);
        let all: Vec<DataRow> = az.iter().chain(tx.iter()).cloned().collect();
        let series = vec![
            Series {
                name: "Arizona".into(),
                rows: az,
            },
            Series {
                name: "Texas".into(),
                rows: tx,
            },
        ];
        let spec = VisualizationSelector::new()
            .build(&request(
                intent(IntentCategory::Comparison, Some(IntentSubtype::Ranking)),
                &all,
                &series,
            ))
            .unwrap();
        match spec.chart {
            ChartData::HorizontalBar { bars, .. } => {
                assert_eq!(bars[0].label, "Texas");
                assert_eq!(bars[0].value, 7.0);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_build_empty_rows_is_error() {
        let err = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Ranking, None), &[], &[]))
            .unwrap_err();
        assert!(matches!(err, ChartError::EmptyData(ChartType::HorizontalBar)));
    }

    #[test]
    fn test_build_line_without_dates_is_error() {
        // Named like a time column but holds no parseable dates
        let rows = vec![DataRow::new()
            .with("month", "soon")
            .with("total_sales", 1.0)];
        let err = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Trend, None), &rows, &[]))
            .unwrap_err();
        assert!(matches!(err, ChartError::EmptyData(ChartType::Line)));
    }

    #[test]
    fn test_build_pie_percentages() {
        let rows = vec![
            DataRow::new().with("segment", "Consumer").with("total_sales", 75.0),
            DataRow::new().with("segment", "Corporate").with("total_sales", 25.0),
        ];
        let spec = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Composition, None), &rows, &[]))
            .unwrap();
        match spec.chart {
            ChartData::Pie { slices, .. } => {
                assert_eq!(slices[0].percentage, 75.0);
                assert_eq!(slices[1].percentage, 25.0);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_build_histogram_counts_every_value() {
        let rows: Vec<DataRow> = (0..16)
            .map(|i| {
                DataRow::new()
                    .with("customer_name", format!("c{}", i))
                    .with("total_sales", i as f64)
            })
            .collect();
        let spec = VisualizationSelector::new()
            .build(&request(intent(IntentCategory::Distribution, None), &rows, &[]))
            .unwrap();
        match spec.chart {
            ChartData::Histogram { bins } => {
                assert_eq!(bins.len(), 4);
                assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 16);
            }
            other => panic!("unexpected chart {:?}", other),
        }
    }

    #[test]
    fn test_scatter_hint_requires_two_numeric_columns() {
        let rows = vec![
            DataRow::new()
                .with("customer_name", "Ann")
                .with("total_quantity", 3.0)
                .with("total_sales", 10.0),
            DataRow::new()
                .with("customer_name", "Bob")
                .with("total_quantity", 5.0)
                .with("total_sales", 20.0),
        ];
        let mut req = request(intent(IntentCategory::Ranking, None), &rows, &[]);
        req.hint = Some(ChartType::Scatter);
        let spec = VisualizationSelector::new().build(&req).unwrap();
        assert_eq!(spec.chart_type, ChartType::Scatter);
        assert_eq!(spec.axes.x.label, "total_quantity");

        let single = ranking_rows();
        let mut req = request(intent(IntentCategory::Ranking, None), &single, &[]);
        req.hint = Some(ChartType::Scatter);
        let spec = VisualizationSelector::new().build(&req).unwrap();
        assert_eq!(spec.chart_type, ChartType::HorizontalBar);
    }

    #[test]
    fn test_number_axis_without_currency_column() {
        let rows = vec![DataRow::new()
            .with("customer_name", "Ann")
            .with("total_quantity", 3.0)];
        let mut req = request(intent(IntentCategory::Ranking, None), &rows, &[]);
        req.value_column = "total_quantity";
        let spec = VisualizationSelector::new().build(&req).unwrap();
        assert_eq!(spec.axes.x.format, AxisFormat::Number);
    }
}

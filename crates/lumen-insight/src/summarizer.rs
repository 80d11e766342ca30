//! Deterministic insight text over result rows.

use lumen_core::{DataRow, Direction};

use crate::format::{format_currency, format_number};
use crate::types::Series;

/// Aggregates for one series of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub total: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

impl SeriesStats {
    /// Missing or unparseable cells count as zero. Empty input is all zeros.
    pub fn compute(rows: &[DataRow], column: &str) -> Self {
        if rows.is_empty() {
            return Self {
                total: 0.0,
                average: 0.0,
                max: 0.0,
                min: 0.0,
            };
        }
        let values: Vec<f64> = rows.iter().map(|r| r.number(column)).collect();
        let total: f64 = values.iter().sum();
        Self {
            total,
            average: total / values.len() as f64,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Builds currency-aware summaries for single and multi-series results.
#[derive(Debug, Clone)]
pub struct InsightsSummarizer {
    currency: bool,
}

impl InsightsSummarizer {
    /// `currency` selects "$1,234" over plain "1,234" formatting.
    pub fn new(currency: bool) -> Self {
        Self { currency }
    }

    fn fmt(&self, value: f64) -> String {
        if self.currency {
            format_currency(value)
        } else {
            format_number(value)
        }
    }

    /// Total and average of `value_column`.
    pub fn summarize(&self, rows: &[DataRow], value_column: &str) -> String {
        self.totals(rows, value_column).join("\n")
    }

    /// Totals plus the first row of a ranking, labelled by sort direction:
    /// "Top" for descending results, "Bottom" for ascending ones.
    pub fn summarize_ranking(
        &self,
        rows: &[DataRow],
        value_column: &str,
        label_column: &str,
        direction: Direction,
    ) -> String {
        let mut lines = self.totals(rows, value_column);
        if let Some(lead) = rows.first() {
            let heading = match direction {
                Direction::Desc => "Top",
                Direction::Asc => "Bottom",
            };
            lines.push(format!(
                "{heading}: {} with {}",
                lead.text(label_column),
                self.fmt(lead.number(value_column))
            ));
        }
        lines.join("\n")
    }

    fn totals(&self, rows: &[DataRow], value_column: &str) -> Vec<String> {
        let stats = SeriesStats::compute(rows, value_column);
        vec![
            format!("Total: {}", self.fmt(stats.total)),
            format!("Average: {}", self.fmt(stats.average)),
        ]
    }

    /// One block per series, separated by a blank line.
    pub fn summarize_series(&self, series: &[Series], value_column: &str) -> String {
        series
            .iter()
            .map(|s| {
                let stats = SeriesStats::compute(&s.rows, value_column);
                format!(
                    "{}\nTotal: {}\nAverage: {}\nMax: {}\nMin: {}",
                    s.name,
                    self.fmt(stats.total),
                    self.fmt(stats.average),
                    self.fmt(stats.max),
                    self.fmt(stats.min)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for InsightsSummarizer {
    fn default() -> Self {
        Self::new(true)
    }
}

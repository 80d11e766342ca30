//! Domain types shared by the interpretation and presentation crates.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Intent
// =============================================================================

/// Primary category of a business question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Ranking,
    Trend,
    Comparison,
    Distribution,
    Composition,
    General,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ranking => "ranking",
            Self::Trend => "trend",
            Self::Comparison => "comparison",
            Self::Distribution => "distribution",
            Self::Composition => "composition",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ranking" => Some(Self::Ranking),
            "trend" => Some(Self::Trend),
            "comparison" => Some(Self::Comparison),
            "distribution" => Some(Self::Distribution),
            "composition" => Some(Self::Composition),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// The operation a category implies; `General` has none.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Ranking => Some(Operation::Rank),
            Self::Trend => Some(Operation::Trend),
            Self::Comparison => Some(Operation::Compare),
            Self::Distribution | Self::Composition => Some(Operation::Aggregate),
            Self::General => None,
        }
    }
}

/// Refinement of a comparison question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSubtype {
    TimeBased,
    Ranking,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Rank,
    Trend,
    Compare,
    Aggregate,
}

/// Classified intent: exactly one category per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub category: IntentCategory,
    pub subtype: Option<IntentSubtype>,
    pub operation: Option<Operation>,
}

impl Intent {
    pub fn new(category: IntentCategory, subtype: Option<IntentSubtype>) -> Self {
        Self {
            category,
            subtype,
            operation: category.operation(),
        }
    }

    pub fn general() -> Self {
        Self::new(IntentCategory::General, None)
    }
}

// =============================================================================
// Chart type
// =============================================================================

/// Visualization families the selector can choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    HorizontalBar,
    BarVertical,
    Line,
    MultiLine,
    Histogram,
    Pie,
    Treemap,
    Scatter,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HorizontalBar => "horizontal-bar",
            Self::BarVertical => "bar-vertical",
            Self::Line => "line",
            Self::MultiLine => "multi-line",
            Self::Histogram => "histogram",
            Self::Pie => "pie",
            Self::Treemap => "treemap",
            Self::Scatter => "scatter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal-bar" | "horizontal_bar" | "hbar" => Some(Self::HorizontalBar),
            "bar-vertical" | "bar" | "vertical-bar" => Some(Self::BarVertical),
            "line" => Some(Self::Line),
            "multi-line" | "multiline" => Some(Self::MultiLine),
            "histogram" => Some(Self::Histogram),
            "pie" => Some(Self::Pie),
            "treemap" => Some(Self::Treemap),
            "scatter" => Some(Self::Scatter),
            _ => None,
        }
    }
}

// =============================================================================
// Result rows
// =============================================================================

/// A single cell value returned by the query executor.
///
/// Untagged on the wire: numbers stay numbers, ISO dates become `Date`,
/// every other string is `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Scalar {
    /// Numeric view. Text is parsed leniently; dates are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            Self::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            Self::Number(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// One result row: column name to scalar. Consumed read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow {
    columns: BTreeMap<String, Scalar>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns.get(column)
    }

    /// Numeric value of `column`; missing or unparseable cells count as 0.
    pub fn number(&self, column: &str) -> f64 {
        self.get(column).and_then(Scalar::as_f64).unwrap_or(0.0)
    }

    /// Display text of `column`, empty when missing.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

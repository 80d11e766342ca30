//! Query plan intermediate representation.
//!
//! Plans are built from typed expressions and only turned into SQL text by
//! [`QueryPlan::to_sql`], the single serialization point. `Display` on each
//! part prints the canonical textual form (`SUM(sales) as total_sales`,
//! `state = 'California'`, `total_sales DESC`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// SQL flavour used when rendering a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// ANSI-ish SQL with `DATE_TRUNC`.
    #[default]
    Generic,
    /// SQLite: date truncation through `strftime`.
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncUnit {
    Month,
    Year,
}

impl TruncUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Column {
        qualifier: Option<String>,
        name: String,
    },
    Sum(Box<Expr>),
    DateTrunc {
        unit: TruncUnit,
        column: Box<Expr>,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    pub fn sum(inner: Expr) -> Self {
        Self::Sum(Box::new(inner))
    }

    pub fn date_trunc(unit: TruncUnit, column: Expr) -> Self {
        Self::DateTrunc {
            unit,
            column: Box::new(column),
        }
    }

    /// The column name left after removing aggregate wrappers and the
    /// table-alias prefix.
    pub fn base_field(&self) -> &str {
        match self {
            Self::Column { name, .. } => name,
            Self::Sum(inner) => inner.base_field(),
            Self::DateTrunc { column, .. } => column.base_field(),
        }
    }

    /// Outermost function name, if any.
    pub fn function_name(&self) -> Option<&'static str> {
        match self {
            Self::Column { .. } => None,
            Self::Sum(_) => Some("SUM"),
            Self::DateTrunc { .. } => Some("DATE_TRUNC"),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Sum(_))
    }

    /// Parse the textual form back into an expression.
    ///
    /// Only the forms this IR can express are accepted: bare or qualified
    /// identifiers, `SUM(expr)` and `DATE_TRUNC('unit', expr)`. Anything else
    /// (other functions, operators, literals) yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(inner) = strip_call(text, "SUM") {
            return Self::parse(inner).map(Self::sum);
        }
        if let Some(args) = strip_call(text, "DATE_TRUNC") {
            let (unit, column) = args.split_once(',')?;
            let unit = TruncUnit::parse(unit.trim().trim_matches('\''))?;
            return Self::parse(column).map(|c| Self::date_trunc(unit, c));
        }
        match text.split_once('.') {
            Some((qualifier, name)) if is_identifier(qualifier) && is_identifier(name) => {
                Some(Self::qualified(qualifier, name))
            }
            None if is_identifier(text) => Some(Self::column(text)),
            _ => None,
        }
    }

    fn render(&self, dialect: Dialect) -> String {
        match self {
            Self::Column {
                qualifier: Some(q),
                name,
            } => format!("{}.{}", q, name),
            Self::Column {
                qualifier: None,
                name,
            } => name.clone(),
            Self::Sum(inner) => format!("SUM({})", inner.render(dialect)),
            Self::DateTrunc { unit, column } => match dialect {
                Dialect::Generic => {
                    format!("DATE_TRUNC('{}', {})", unit.as_str(), column.render(dialect))
                }
                Dialect::Sqlite => {
                    let pattern = match unit {
                        TruncUnit::Month => "%Y-%m-01",
                        TruncUnit::Year => "%Y-01-01",
                    };
                    format!("strftime('{}', {})", pattern, column.render(dialect))
                }
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Dialect::Generic))
    }
}

fn strip_call<'a>(text: &'a str, function: &str) -> Option<&'a str> {
    let open = text.find('(')?;
    if !text[..open].trim().eq_ignore_ascii_case(function) || !text.ends_with(')') {
        return None;
    }
    Some(&text[open + 1..text.len() - 1])
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A projected expression with an optional alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Parse `expr` or `expr as alias` (case-insensitive `AS`).
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        match lower.rfind(" as ") {
            Some(pos) => {
                let alias = text[pos + 4..].trim();
                if !is_identifier(alias) {
                    return None;
                }
                Some(Self::aliased(Expr::parse(&text[..pos])?, alias))
            }
            None => Some(Self::new(Expr::parse(text)?)),
        }
    }

    /// Name the column will carry in result rows.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.expr.base_field())
    }

    fn render(&self, dialect: Dialect) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.expr.render(dialect), alias),
            None => self.expr.render(dialect),
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Dialect::Generic))
    }
}

// =============================================================================
// Predicates
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// Row filter: equality or `IN`-list membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Eq { expr: Expr, value: Literal },
    In { expr: Expr, values: Vec<Literal> },
}

impl Predicate {
    pub fn eq(expr: Expr, value: impl Into<Literal>) -> Self {
        Self::Eq {
            expr,
            value: value.into(),
        }
    }

    pub fn is_in<L: Into<Literal>>(expr: Expr, values: impl IntoIterator<Item = L>) -> Self {
        Self::In {
            expr,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn expr(&self) -> &Expr {
        match self {
            Self::Eq { expr, .. } | Self::In { expr, .. } => expr,
        }
    }

    fn render(&self, dialect: Dialect) -> String {
        match self {
            Self::Eq { expr, value } => format!("{} = {}", expr.render(dialect), value),
            Self::In { expr, values } => {
                let list: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("{} IN ({})", expr.render(dialect), list.join(", "))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Dialect::Generic))
    }
}

// =============================================================================
// Grouping and ordering
// =============================================================================

/// Group/order key: either a plain expression or a select alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Expr(Expr),
    Alias(String),
}

impl Key {
    fn render(&self, dialect: Dialect) -> String {
        match self {
            Self::Expr(expr) => expr.render(dialect),
            Self::Alias(alias) => alias.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Dialect::Generic))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub key: Key,
    pub direction: Direction,
}

impl OrderItem {
    pub fn new(key: Key, direction: Direction) -> Self {
        Self { key, direction }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.direction.as_str())
    }
}

// =============================================================================
// QueryPlan
// =============================================================================

/// Which builder produced the plan; drives result post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanShape {
    Ranking,
    Trend,
    Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub shape: PlanShape,
    pub select: Vec<SelectItem>,
    pub from: String,
    #[serde(rename = "where")]
    pub filters: Vec<Predicate>,
    pub group_by: Vec<Key>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<u32>,
}

impl QueryPlan {
    pub fn new(shape: PlanShape, from: impl Into<String>) -> Self {
        Self {
            shape,
            select: Vec::new(),
            from: from.into(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Aliases defined by the select list.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.select.iter().filter_map(|s| s.alias.as_deref())
    }

    /// Output column holding the aggregated measure.
    pub fn measure_column(&self) -> Option<&str> {
        self.select
            .iter()
            .find(|s| s.expr.is_aggregate())
            .map(SelectItem::output_name)
    }

    /// Output column holding the time bucket.
    pub fn time_column(&self) -> Option<&str> {
        self.select
            .iter()
            .find(|s| matches!(s.expr, Expr::DateTrunc { .. }))
            .map(SelectItem::output_name)
    }

    /// Output column holding the plain categorical dimension.
    pub fn dimension_column(&self) -> Option<&str> {
        self.select
            .iter()
            .find(|s| matches!(s.expr, Expr::Column { .. }))
            .map(SelectItem::output_name)
    }

    pub fn select_strings(&self) -> Vec<String> {
        self.select.iter().map(ToString::to_string).collect()
    }

    pub fn where_strings(&self) -> Vec<String> {
        self.filters.iter().map(ToString::to_string).collect()
    }

    pub fn group_by_strings(&self) -> Vec<String> {
        self.group_by.iter().map(ToString::to_string).collect()
    }

    pub fn order_by_strings(&self) -> Vec<String> {
        self.order_by.iter().map(ToString::to_string).collect()
    }

    /// Serialize the plan to SQL text.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let select: Vec<String> = self.select.iter().map(|s| s.render(dialect)).collect();
        let mut sql = format!("SELECT {} FROM {}", select.join(", "), self.from);
        if !self.filters.is_empty() {
            let filters: Vec<String> = self.filters.iter().map(|p| p.render(dialect)).collect();
            sql.push_str(&format!(" WHERE {}", filters.join(" AND ")));
        }
        if !self.group_by.is_empty() {
            let keys: Vec<String> = self.group_by.iter().map(|k| k.render(dialect)).collect();
            sql.push_str(&format!(" GROUP BY {}", keys.join(", ")));
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|o| format!("{} {}", o.key.render(dialect), o.direction.as_str()))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", keys.join(", ")));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }
}

//! Plan whitelisting.
//!
//! Every select, filter, group and order entry must reference a schema field
//! through at most the permitted functions. Fail-open drops offending
//! entries; fail-closed rejects the whole plan.

use std::collections::HashSet;

use tracing::warn;

use lumen_core::{Expr, Key, QueryPlan, SanitizeMode, Schema, SelectItem, ORDERS};

/// Plan refused in fail-closed mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{clause} entry '{expression}' is not allowed")]
pub struct PlanError {
    pub clause: &'static str,
    pub expression: String,
}

/// Whitelist filter over [`QueryPlan`]s.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanSanitizer {
    schema: Schema,
    mode: SanitizeMode,
}

impl QueryPlanSanitizer {
    pub fn new(schema: Schema, mode: SanitizeMode) -> Self {
        Self { schema, mode }
    }

    pub fn mode(&self) -> SanitizeMode {
        self.mode
    }

    /// Base field in the whitelist and every wrapping function permitted.
    pub fn is_allowed(&self, expr: &Expr) -> bool {
        let functions_ok = match expr {
            Expr::Column { .. } => true,
            Expr::Sum(inner) => self.schema.is_function("SUM") && self.is_allowed(inner),
            Expr::DateTrunc { column, .. } => {
                self.schema.is_function("DATE_TRUNC") && self.is_allowed(column)
            }
        };
        functions_ok && self.schema.is_field(expr.base_field())
    }

    /// Strip (fail-open) or reject (fail-closed) entries outside the whitelist.
    /// Group and order keys naming an alias survive only with their select item.
    /// A plan left with nothing to select is rejected in either mode.
    pub fn sanitize(&self, plan: QueryPlan) -> Result<QueryPlan, PlanError> {
        let QueryPlan {
            shape,
            select,
            from,
            filters,
            group_by,
            order_by,
            limit,
        } = plan;

        let requested = select
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let select = self.keep("select", select, |s| self.is_allowed(&s.expr))?;
        if select.is_empty() {
            return Err(PlanError {
                clause: "select",
                expression: requested,
            });
        }
        let aliases: HashSet<String> = select.iter().filter_map(|s| s.alias.clone()).collect();
        let key_ok = |key: &Key| match key {
            Key::Expr(expr) => self.is_allowed(expr),
            Key::Alias(alias) => aliases.contains(alias),
        };

        let filters = self.keep("where", filters, |p| self.is_allowed(p.expr()))?;
        let group_by = self.keep("group by", group_by, |k| key_ok(k))?;
        let order_by = self.keep("order by", order_by, |o| key_ok(&o.key))?;

        Ok(QueryPlan {
            shape,
            select,
            from,
            filters,
            group_by,
            order_by,
            limit,
        })
    }

    fn keep<T: std::fmt::Display>(
        &self,
        clause: &'static str,
        items: Vec<T>,
        allowed: impl Fn(&T) -> bool,
    ) -> Result<Vec<T>, PlanError> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if allowed(&item) {
                kept.push(item);
                continue;
            }
            match self.mode {
                SanitizeMode::FailOpen => {
                    warn!(clause, expression = %item, "Dropping non-whitelisted plan entry");
                }
                SanitizeMode::FailClosed => {
                    return Err(PlanError {
                        clause,
                        expression: item.to_string(),
                    });
                }
            }
        }
        Ok(kept)
    }

    /// Filter textual select items, keeping the ones that parse into the
    /// plan grammar and pass the whitelist. Never fails.
    pub fn sanitize_expression_strings<S: AsRef<str>>(&self, items: &[S]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| {
                let parsed = SelectItem::parse(item.as_ref());
                match parsed {
                    Some(s) if self.is_allowed(&s.expr) => Some(s.to_string()),
                    _ => {
                        warn!(expression = item.as_ref(), "Dropping non-whitelisted expression");
                        None
                    }
                }
            })
            .collect()
    }
}

impl Default for QueryPlanSanitizer {
    fn default() -> Self {
        Self::new(ORDERS, SanitizeMode::FailOpen)
    }
}

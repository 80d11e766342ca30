//! Session memory.
//!
//! Remembers the last state, year, metric and limit per session and rewrites
//! elliptical follow-ups ("how about New York") using them.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use regex::Regex;

use lumen_core::config::AnalysisConfig;
use lumen_core::ChartType;

use crate::parser::STATES;
use crate::types::{HistoryEntry, ResolvedFilters, SessionContext};

static HOW_ABOUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*how\s+about\b").unwrap());

static IN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bin\b").unwrap());

static RANKING_OR_METRIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:top|bottom|best|worst|highest|lowest|sales|revenue|profits?|quantity|discounts?)\b",
    )
    .unwrap()
});

/// Held for the whole of one request so same-session requests run in order.
pub type SessionGate = Arc<tokio::sync::Mutex<()>>;

// =============================================================================
// SessionContextStore
// =============================================================================

/// In-memory session contexts, created lazily and kept for the process lifetime.
pub struct SessionContextStore {
    contexts: Mutex<HashMap<String, SessionContext>>,
    gates: Mutex<HashMap<String, SessionGate>>,
    history_limit: usize,
    default_metric: String,
    default_limit: u32,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionContextStore {
    pub fn new(history_limit: usize, default_metric: impl Into<String>, default_limit: u32) -> Self {
        Self {
            contexts: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            history_limit,
            default_metric: default_metric.into(),
            default_limit,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.history_limit,
            config.default_metric.clone(),
            config.default_limit,
        )
    }

    fn fresh(&self) -> SessionContext {
        SessionContext::new(self.default_metric.clone(), self.default_limit)
    }

    /// Context for `session_id`, created with defaults if absent.
    pub fn get(&self, session_id: &str) -> SessionContext {
        lock(&self.contexts)
            .entry(session_id.to_string())
            .or_insert_with(|| self.fresh())
            .clone()
    }

    /// Context for `session_id` without creating one.
    pub fn snapshot(&self, session_id: &str) -> Option<SessionContext> {
        lock(&self.contexts).get(session_id).cloned()
    }

    /// Record a finished request. Remembered values are overwritten only
    /// when the request produced a new one; history keeps the newest entries.
    pub fn update(
        &self,
        session_id: &str,
        filters: &ResolvedFilters,
        title: &str,
        chart_type: ChartType,
    ) {
        let mut contexts = lock(&self.contexts);
        let ctx = contexts
            .entry(session_id.to_string())
            .or_insert_with(|| self.fresh());

        if let Some(state) = &filters.state {
            ctx.last_state = Some(state.clone());
        }
        if let Some(year) = filters.year {
            ctx.last_year = Some(year);
        }
        if let Some(metric) = filters.metric {
            ctx.last_metric = metric.column().to_string();
        }
        if let Some(limit) = filters.limit {
            ctx.last_limit = limit;
        }

        ctx.history.push_back(HistoryEntry {
            title: title.to_string(),
            timestamp: Utc::now().timestamp(),
            chart_type,
        });
        while ctx.history.len() > self.history_limit {
            ctx.history.pop_front();
        }
    }

    /// Session ids with a context, sorted.
    pub fn sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.contexts).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Forget a session. Returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        lock(&self.gates).remove(session_id);
        lock(&self.contexts).remove(session_id).is_some()
    }

    /// The per-session request gate.
    pub fn gate(&self, session_id: &str) -> SessionGate {
        lock(&self.gates)
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Rewrite a follow-up question using remembered context.
    ///
    /// - "how about X" becomes "show {last_metric} in X" when a state is remembered.
    /// - A ranking or metric question with no location gets " in {last_state}".
    ///
    /// Anything else is returned unchanged.
    pub fn enhance_question(&self, question: &str, ctx: &SessionContext) -> String {
        let Some(last_state) = ctx.last_state.as_deref() else {
            return question.to_string();
        };

        if let Some(m) = HOW_ABOUT_RE.find(question) {
            let rest = question[m.end()..].trim();
            return format!("show {} in {}", ctx.last_metric, rest);
        }

        if !has_location(question) && RANKING_OR_METRIC_RE.is_match(question) {
            return format!("{} in {}", question.trim_end(), last_state);
        }

        question.to_string()
    }
}

impl Default for SessionContextStore {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

fn has_location(question: &str) -> bool {
    if IN_RE.is_match(question) {
        return true;
    }
    let lower = question.to_lowercase();
    STATES.iter().any(|s| lower.contains(&s.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::MetricField;

    fn store() -> SessionContextStore {
        SessionContextStore::default()
    }

    fn with_state(state: &str) -> SessionContext {
        SessionContext {
            last_state: Some(state.to_string()),
            ..SessionContext::default()
        }
    }

    fn filters_with_state(state: &str) -> ResolvedFilters {
        ResolvedFilters {
            state: Some(state.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_creates_with_defaults() {
        let s = store();
        assert!(s.snapshot("s1").is_none());
        let ctx = s.get("s1");
        assert_eq!(ctx, SessionContext::default());
        assert!(s.snapshot("s1").is_some());
    }

    #[test]
    fn test_update_sets_remembered_values() {
        let s = store();
        s.update(
            "s1",
            &ResolvedFilters {
                state: Some("California".into()),
                year: Some(2017),
                metric: Some(MetricField::Profit),
                limit: Some(10),
            },
            "Top 10 Customers",
            ChartType::HorizontalBar,
        );
        let ctx = s.get("s1");
        assert_eq!(ctx.last_state.as_deref(), Some("California"));
        assert_eq!(ctx.last_year, Some(2017));
        assert_eq!(ctx.last_metric, "profit");
        assert_eq!(ctx.last_limit, 10);
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.history[0].chart_type, ChartType::HorizontalBar);
    }

    #[test]
    fn test_absent_values_do_not_clear_memory() {
        let s = store();
        s.update("s1", &filters_with_state("Texas"), "a", ChartType::Line);
        s.update("s1", &ResolvedFilters::default(), "b", ChartType::Line);
        assert_eq!(s.get("s1").last_state.as_deref(), Some("Texas"));

        s.update("s1", &filters_with_state("Ohio"), "c", ChartType::Line);
        assert_eq!(s.get("s1").last_state.as_deref(), Some("Ohio"));
    }

    #[test]
    fn test_history_evicts_oldest_past_five() {
        let s = store();
        for i in 0..6 {
            s.update(
                "s1",
                &ResolvedFilters::default(),
                &format!("title {}", i),
                ChartType::Line,
            );
        }
        let ctx = s.get("s1");
        assert_eq!(ctx.history.len(), 5);
        assert_eq!(ctx.history[0].title, "title 1");
        assert_eq!(ctx.history[4].title, "title 5");
    }

    #[test]
    fn test_sessions_are_independent() {
        let s = store();
        s.update("a", &filters_with_state("Texas"), "t", ChartType::Line);
        assert!(s.get("b").last_state.is_none());
        assert_eq!(s.sessions(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_remove() {
        let s = store();
        s.get("a");
        assert!(s.remove("a"));
        assert!(!s.remove("a"));
        assert!(s.sessions().is_empty());
    }

    #[test]
    fn test_gate_is_shared_per_session() {
        let s = store();
        let a1 = s.gate("a");
        let a2 = s.gate("a");
        let b = s.gate("b");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn test_how_about_rewrite() {
        let s = store();
        let out = s.enhance_question("how about New York", &with_state("California"));
        assert_eq!(out, "show sales in New York");

        let ctx = SessionContext {
            last_metric: "profit".into(),
            ..with_state("Ohio")
        };
        assert_eq!(
            s.enhance_question("How about Texas?", &ctx),
            "show profit in Texas?"
        );
    }

    #[test]
    fn test_append_last_state() {
        let s = store();
        let out = s.enhance_question("top 5 customers", &with_state("California"));
        assert_eq!(out, "top 5 customers in California");
    }

    #[test]
    fn test_no_rewrite_with_explicit_location() {
        let s = store();
        let ctx = with_state("California");
        assert_eq!(
            s.enhance_question("top 5 customers in Seattle", &ctx),
            "top 5 customers in Seattle"
        );
        assert_eq!(
            s.enhance_question("Texas sales trend", &ctx),
            "Texas sales trend"
        );
    }

    #[test]
    fn test_no_rewrite_without_trigger_word() {
        let s = store();
        assert_eq!(
            s.enhance_question("show the distribution", &with_state("Ohio")),
            "show the distribution"
        );
    }

    #[test]
    fn test_no_rewrite_without_last_state() {
        let s = store();
        let ctx = SessionContext::default();
        assert_eq!(s.enhance_question("how about Texas", &ctx), "how about Texas");
        assert_eq!(s.enhance_question("top customers", &ctx), "top customers");
    }
}

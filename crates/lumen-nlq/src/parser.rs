//! Question parsing.
//!
//! [`EntityExtractor`] runs independent regex probes per entity family and
//! accumulates whatever matches. [`IntentClassifier`] walks an ordered rule
//! table and returns the first category whose trigger fires.

use std::sync::LazyLock;

use regex::Regex;

use lumen_core::{CategoricalField, Intent, IntentCategory, IntentSubtype, MetricField};

use crate::types::{ComparisonTargets, EntitySet, GeoEntity, TemporalEntity, TemporalKind};

// =============================================================================
// Vocabularies
// =============================================================================

/// State names in alphabetical order. Geographic lookup returns the first
/// entry of this list found in the question, so order is significant.
pub static STATES: &[&str] = &[
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

pub static REGIONS: &[&str] = &["Central", "East", "South", "West"];
pub static SEGMENTS: &[&str] = &["Consumer", "Corporate", "Home Office"];
pub static CATEGORIES: &[&str] = &["Furniture", "Office Supplies", "Technology"];

static MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// =============================================================================
// Compiled patterns
// =============================================================================

static METRIC_PATTERNS: LazyLock<Vec<(MetricField, Regex)>> = LazyLock::new(|| {
    [
        (MetricField::Sales, r"(?i)\b(?:sales|revenue)\b"),
        (MetricField::Profit, r"(?i)\bprofits?\b"),
        (MetricField::Quantity, r"(?i)\b(?:quantity|quantities|units)\b"),
        (MetricField::Discount, r"(?i)\bdiscounts?\b"),
    ]
    .into_iter()
    .map(|(field, p)| (field, Regex::new(p).unwrap()))
    .collect()
});

static CATEGORICAL_PATTERNS: LazyLock<Vec<(CategoricalField, Regex)>> = LazyLock::new(|| {
    [
        (CategoricalField::CustomerName, r"(?i)\bcustomers?\b"),
        (CategoricalField::Segment, r"(?i)\bsegments?\b"),
        (CategoricalField::Country, r"(?i)\b(?:country|countries)\b"),
        (CategoricalField::City, r"(?i)\b(?:city|cities)\b"),
        (CategoricalField::State, r"(?i)\bstates?\b"),
        (CategoricalField::Region, r"(?i)\bregions?\b"),
        (CategoricalField::ProductName, r"(?i)\bproducts?\b"),
        (CategoricalField::Category, r"(?i)\b(?:category|categories)\b"),
        (
            CategoricalField::SubCategory,
            r"(?i)\bsub[- ]?(?:category|categories)\b",
        ),
        (CategoricalField::ShipMode, r"(?i)\b(?:ship(?:ping)?\s+modes?)\b"),
    ]
    .into_iter()
    .map(|(field, p)| (field, Regex::new(p).unwrap()))
    .collect()
});

struct TemporalPatterns {
    absolute: Regex,
    relative: Regex,
    range: Regex,
}

static TEMPORAL_PATTERNS: LazyLock<TemporalPatterns> = LazyLock::new(|| {
    let month = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*";
    TemporalPatterns {
        absolute: Regex::new(r"\b\d{4}\b").unwrap(),
        relative: Regex::new(r"(?i)\b(?:last|this|next)\s+(?:day|week|month|quarter|year)s?\b")
            .unwrap(),
        range: Regex::new(&format!(
            r"(?i)\bbetween\s+(?:\d[\w/-]*|{m})\s+and\s+(?:\d[\w/-]*|{m})\b",
            m = month
        ))
        .unwrap(),
    }
});

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:top|bottom)\s+(\d+)\b").unwrap());

static BOTTOM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bbottom\b").unwrap());

/// "in|for" followed by one or more capitalised words.
static PLACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[Ii]n|[Ff]or)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap()
});

/// Every comparable value with its field, matched on word boundaries.
static COMPARABLE_VALUES: LazyLock<Vec<(CategoricalField, &'static str, Regex)>> =
    LazyLock::new(|| {
        let vocab: [(CategoricalField, &[&'static str]); 4] = [
            (CategoricalField::State, STATES),
            (CategoricalField::Region, REGIONS),
            (CategoricalField::Segment, SEGMENTS),
            (CategoricalField::Category, CATEGORIES),
        ];
        vocab
            .into_iter()
            .flat_map(|(field, names)| names.iter().map(move |name| (field, *name)))
            .map(|(field, name)| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))).unwrap();
                (field, name, re)
            })
            .collect()
    });

// =============================================================================
// EntityExtractor
// =============================================================================

/// A match and where it sits in the question.
#[derive(Debug, Clone, Copy)]
struct Span<T> {
    value: T,
    start: usize,
    end: usize,
}

/// Drop spans fully covered by a longer span ("West" inside "West Virginia").
fn retain_outermost<T: Copy>(spans: &mut Vec<Span<T>>) {
    let all = spans.clone();
    spans.retain(|s| {
        !all.iter().any(|o| {
            o.start <= s.start && s.end <= o.end && (o.end - o.start) > (s.end - s.start)
        })
    });
    spans.sort_by_key(|s| s.start);
}

fn first_positions<T: Copy + PartialEq>(spans: Vec<Span<T>>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for span in spans {
        if !out.contains(&span.value) {
            out.push(span.value);
        }
    }
    out
}

/// Regex-probe entity extraction.
#[derive(Debug, Clone, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Run every probe and collect the results.
    pub fn extract(&self, question: &str) -> EntitySet {
        EntitySet {
            geographic: self.extract_geographic(question),
            temporal: self.extract_temporal(question),
            categorical: self.extract_categorical(question),
            metrics: self.extract_metrics(question),
            limit: self.extract_limit(question),
            year: self.extract_year(question),
            bottom: BOTTOM_RE.is_match(question),
            comparison: self.extract_comparison(question),
        }
    }

    /// Metric nouns, ordered by first appearance.
    pub fn extract_metrics(&self, question: &str) -> Vec<MetricField> {
        let mut spans: Vec<Span<MetricField>> = METRIC_PATTERNS
            .iter()
            .flat_map(|(field, re)| {
                re.find_iter(question).map(move |m| Span {
                    value: *field,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        spans.sort_by_key(|s| s.start);
        first_positions(spans)
    }

    /// Categorical nouns, ordered by first appearance. "sub-category" does
    /// not also flag "category".
    pub fn extract_categorical(&self, question: &str) -> Vec<CategoricalField> {
        let mut spans: Vec<Span<CategoricalField>> = CATEGORICAL_PATTERNS
            .iter()
            .flat_map(|(field, re)| {
                re.find_iter(question).map(move |m| Span {
                    value: *field,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        retain_outermost(&mut spans);
        first_positions(spans)
    }

    /// Absolute, relative and range expressions with their raw text.
    pub fn extract_temporal(&self, question: &str) -> Vec<TemporalEntity> {
        let tp = &*TEMPORAL_PATTERNS;
        let mut found: Vec<(usize, TemporalEntity)> = Vec::new();
        let probes = [
            (TemporalKind::Absolute, &tp.absolute),
            (TemporalKind::Relative, &tp.relative),
            (TemporalKind::Range, &tp.range),
        ];
        for (kind, re) in probes {
            for m in re.find_iter(question) {
                found.push((
                    m.start(),
                    TemporalEntity {
                        kind,
                        raw_value: m.as_str().to_string(),
                    },
                ));
            }
        }
        found.sort_by_key(|(start, _)| *start);
        found.into_iter().map(|(_, e)| e).collect()
    }

    /// First 1900-2099 year in the text.
    pub fn extract_year(&self, question: &str) -> Option<i32> {
        YEAR_RE
            .find(question)
            .and_then(|m| m.as_str().parse::<i32>().ok())
    }

    /// The N in "top N" or "bottom N".
    pub fn extract_limit(&self, question: &str) -> Option<u32> {
        LIMIT_RE
            .captures(question)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    }

    /// State-list lookup first (list order, not text order), then the
    /// positional "in/for <Name>" phrase.
    pub fn extract_geographic(&self, question: &str) -> Option<GeoEntity> {
        let lower = question.to_lowercase();
        if let Some(state) = STATES
            .iter()
            .find(|state| lower.contains(&state.to_lowercase()))
        {
            return Some(GeoEntity::state(*state));
        }

        PLACE_RE
            .captures_iter(question)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|name| !is_reserved_name(name))
            .map(GeoEntity::place)
    }

    /// The categorical field with the most distinct named values, with the
    /// values in text order. Ties go to the earlier field in the vocabulary.
    pub fn extract_comparison(&self, question: &str) -> Option<ComparisonTargets> {
        let mut spans: Vec<Span<(CategoricalField, &'static str)>> = COMPARABLE_VALUES
            .iter()
            .flat_map(|(field, name, re)| {
                re.find_iter(question).map(move |m| Span {
                    value: (*field, *name),
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        retain_outermost(&mut spans);
        let ordered = first_positions(spans);

        let mut best: Option<ComparisonTargets> = None;
        for field in [
            CategoricalField::State,
            CategoricalField::Region,
            CategoricalField::Segment,
            CategoricalField::Category,
        ] {
            let values: Vec<String> = ordered
                .iter()
                .filter(|(f, _)| *f == field)
                .map(|(_, name)| name.to_string())
                .collect();
            let better = match &best {
                Some(b) => values.len() > b.values.len(),
                None => !values.is_empty(),
            };
            if better {
                best = Some(ComparisonTargets { field, values });
            }
        }
        best
    }
}

/// Capitalised words the positional path must not read as places.
fn is_reserved_name(name: &str) -> bool {
    let first = name.split_whitespace().next().unwrap_or(name);
    MONTHS.iter().any(|m| m.eq_ignore_ascii_case(first))
        || REGIONS
            .iter()
            .chain(SEGMENTS)
            .chain(CATEGORIES)
            .any(|v| v.eq_ignore_ascii_case(name))
}

// =============================================================================
// IntentClassifier
// =============================================================================

struct CategoryRule {
    category: IntentCategory,
    triggers: Vec<Regex>,
}

struct SubtypeRule {
    subtype: IntentSubtype,
    trigger: Regex,
}

static CATEGORY_RULES: LazyLock<Vec<CategoryRule>> = LazyLock::new(|| {
    let mk = |category, pats: &[&str]| CategoryRule {
        category,
        triggers: pats.iter().map(|p| Regex::new(p).unwrap()).collect(),
    };

    // Priority order: first rule with a matching trigger wins
    vec![
        mk(
            IntentCategory::Comparison,
            &[
                r"(?i)\b(?:compare|compared|comparing|comparison|versus|vs\.?)(?:\s|$)",
                r"(?i)\bbetween\s+[a-z]+(?:\s+[a-z]+)*\s+and\s+[a-z]",
            ],
        ),
        mk(IntentCategory::Ranking, &[r"(?i)\b(?:top|bottom)\b"]),
        mk(
            IntentCategory::Trend,
            &[
                r"(?i)\btrends?\b",
                r"(?i)\bover\s+time\b",
                r"(?i)\b(?:monthly|yearly|quarterly)\b",
                r"(?i)\bgrowth\b",
                r"(?i)\b(?:by|per|each)\s+(?:month|year|quarter)\b",
            ],
        ),
        mk(
            IntentCategory::Distribution,
            &[
                r"(?i)\bdistribut(?:ion|ed)\b",
                r"(?i)\bspread\b",
                r"(?i)\bhistogram\b",
                r"(?i)\bfrequency\b",
            ],
        ),
        mk(
            IntentCategory::Composition,
            &[
                r"(?i)\b(?:share|composition|proportion|percentage|breakdown|makeup|mix)\b",
                r"(?i)\bmade\s+up\b",
            ],
        ),
    ]
});

static SUBTYPE_RULES: LazyLock<Vec<SubtypeRule>> = LazyLock::new(|| {
    let mk = |subtype, p: &str| SubtypeRule {
        subtype,
        trigger: Regex::new(p).unwrap(),
    };
    vec![
        mk(
            IntentSubtype::TimeBased,
            r"(?i)\b(?:trends?|monthly|yearly|quarterly|over\s+time|by\s+(?:month|year))\b",
        ),
        mk(
            IntentSubtype::Ranking,
            r"(?i)\b(?:top|bottom|best|worst|highest|lowest|most|least)\b",
        ),
        mk(IntentSubtype::Categorical, r"(?i)\b(?:by|per|across)\b"),
    ]
});

/// Ordered rule-table intent classification. Never fails.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, question: &str) -> Intent {
        let category = CATEGORY_RULES
            .iter()
            .find(|rule| rule.triggers.iter().any(|re| re.is_match(question)))
            .map(|rule| rule.category)
            .unwrap_or(IntentCategory::General);

        let subtype = match category {
            IntentCategory::Comparison => self.classify_subtype(question),
            IntentCategory::Ranking
            | IntentCategory::Trend
            | IntentCategory::Distribution
            | IntentCategory::Composition
            | IntentCategory::General => None,
        };

        Intent::new(category, subtype)
    }

    /// Comparison refinement: time-based, then ranking, then categorical.
    pub fn classify_subtype(&self, question: &str) -> Option<IntentSubtype> {
        SUBTYPE_RULES
            .iter()
            .find(|rule| rule.trigger.is_match(question))
            .map(|rule| rule.subtype)
    }
}

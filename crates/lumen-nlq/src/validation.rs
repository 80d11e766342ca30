//! Question validation, run before any extraction.
//!
//! The injection check is textual. It narrows what reaches the planner; the
//! sanitizer still whitelists every plan expression.

use std::sync::LazyLock;

use regex::Regex;

use lumen_core::config::AnalysisConfig;

use crate::error::AnalysisError;

static INJECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i);|\b(?:DROP|DELETE|UPDATE|INSERT)\b").unwrap());

/// Length and pattern checks for incoming questions.
#[derive(Debug, Clone)]
pub struct QuestionValidator {
    min_chars: usize,
    max_chars: usize,
}

impl QuestionValidator {
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            max_chars,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.min_question_chars, config.max_question_chars)
    }

    /// Returns the trimmed question when it passes every check.
    pub fn validate<'a>(&self, question: &'a str) -> Result<&'a str, AnalysisError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::EmptyQuestion);
        }

        let chars = trimmed.chars().count();
        if chars > self.max_chars {
            return Err(AnalysisError::QuestionTooLong(self.max_chars));
        }
        if chars < self.min_chars {
            return Err(AnalysisError::QuestionTooShort(self.min_chars));
        }

        if let Some(m) = INJECTION_RE.find(trimmed) {
            return Err(AnalysisError::InjectionPattern(m.as_str().to_uppercase()));
        }

        Ok(trimmed)
    }
}

impl Default for QuestionValidator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> QuestionValidator {
        QuestionValidator::default()
    }

    #[test]
    fn test_valid_question_is_trimmed() {
        assert_eq!(
            validator().validate("  top 5 customers  ").unwrap(),
            "top 5 customers"
        );
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert!(matches!(
            validator().validate(""),
            Err(AnalysisError::EmptyQuestion)
        ));
        assert!(matches!(
            validator().validate("   \n\t"),
            Err(AnalysisError::EmptyQuestion)
        ));
    }

    #[test]
    fn test_too_short_rejected() {
        assert!(matches!(
            validator().validate("ab"),
            Err(AnalysisError::QuestionTooShort(3))
        ));
        assert!(validator().validate("abc").is_ok());
    }

    #[test]
    fn test_length_boundary() {
        let at_max = "a".repeat(500);
        assert!(validator().validate(&at_max).is_ok());
        let over = "a".repeat(501);
        assert!(matches!(
            validator().validate(&over),
            Err(AnalysisError::QuestionTooLong(500))
        ));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let accented = "é".repeat(400);
        assert!(validator().validate(&accented).is_ok());
    }

    #[test]
    fn test_injection_tokens_rejected() {
        match validator().validate("DROP TABLE orders;") {
            Err(AnalysisError::InjectionPattern(token)) => assert_eq!(token, "DROP"),
            other => panic!("expected injection error, got {:?}", other),
        }
        for q in [
            "show sales; select 1",
            "delete everything",
            "please Update the totals",
            "insert a row",
        ] {
            assert!(
                matches!(validator().validate(q), Err(AnalysisError::InjectionPattern(_))),
                "{}",
                q
            );
        }
    }

    #[test]
    fn test_injection_words_inside_other_words_allowed() {
        assert!(validator().validate("show updated sales by region").is_ok());
        assert!(validator().validate("top dropshipping customers").is_ok());
    }
}

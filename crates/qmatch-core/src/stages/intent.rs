//! Regex intent patterns.
//!
//! Patterns are compiled case-insensitively and tried in descending
//! priority order. Patterns with equal priority keep declaration order.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::errors::QmatchError;

/// An intent pattern as written in a knowledge pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentPatternDef {
    /// Regular expression tested against the normalized query.
    pub pattern: String,
    /// Category whose answer is returned on a match.
    pub category: String,
    /// Higher runs first.
    #[serde(default)]
    pub priority: i32,
}

/// A compiled intent pattern.
#[derive(Debug, Clone)]
pub struct IntentPattern {
    regex: Regex,
    category: String,
    priority: i32,
}

impl IntentPattern {
    /// Source text of the regex.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Target category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Priority (higher runs first).
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// True if the pattern matches anywhere in `query`.
    pub fn is_match(&self, query: &str) -> bool {
        self.regex.is_match(query)
    }
}

/// Intent patterns sorted by descending priority.
#[derive(Debug, Clone, Default)]
pub struct IntentMatcher {
    patterns: Vec<IntentPattern>,
}

impl IntentMatcher {
    /// Compile and order `defs`.
    ///
    /// # Errors
    ///
    /// Returns [`QmatchError::InvalidPattern`] for the first regex that fails to compile.
    pub fn new(defs: &[IntentPatternDef]) -> Result<Self, QmatchError> {
        let mut patterns = defs
            .iter()
            .map(|def| {
                let regex = RegexBuilder::new(&def.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| QmatchError::InvalidPattern {
                        pattern: def.pattern.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(IntentPattern {
                    regex,
                    category: def.category.clone(),
                    priority: def.priority,
                })
            })
            .collect::<Result<Vec<_>, QmatchError>>()?;

        // sort_by is stable, so equal priorities keep declaration order
        patterns.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(Self { patterns })
    }

    /// Patterns in evaluation order.
    pub fn patterns(&self) -> &[IntentPattern] {
        &self.patterns
    }

    /// Patterns matching `query`, in evaluation order.
    pub fn matching<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a IntentPattern> + 'a {
        self.patterns.iter().filter(move |p| p.is_match(query))
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(pattern: &str, category: &str, priority: i32) -> IntentPatternDef {
        IntentPatternDef {
            pattern: pattern.to_string(),
            category: category.to_string(),
            priority,
        }
    }

    #[test]
    fn test_descending_priority() {
        let m = IntentMatcher::new(&[
            def("skills", "low", 1),
            def("skills", "high", 10),
            def("skills", "mid", 5),
        ])
        .unwrap();
        let order: Vec<&str> = m.matching("your skills").map(|p| p.category()).collect();
        assert_eq!(order, ["high", "mid", "low"]);
    }

    #[test]
    fn test_equal_priority_keeps_declaration_order() {
        let m = IntentMatcher::new(&[def("a", "first", 3), def("a", "second", 3)]).unwrap();
        assert_eq!(m.matching("a").next().map(|p| p.category()), Some("first"));
    }

    #[test]
    fn test_case_insensitive() {
        let m = IntentMatcher::new(&[def(r"what (is|are) your (\d+)? ?skills", "skills", 1)])
            .unwrap();
        assert!(m.patterns()[0].is_match("WHAT ARE YOUR 3 SKILLS"));
        assert!(m.patterns()[0].is_match("so what is your skills"));
        assert!(!m.patterns()[0].is_match("skills?"));
    }

    #[test]
    fn test_invalid_regex_is_error() {
        let err = IntentMatcher::new(&[def("what (are", "x", 1)]).unwrap_err();
        match err {
            QmatchError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "what (are"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_priority_defaults_to_zero() {
        let def: IntentPatternDef =
            serde_json::from_str(r#"{"pattern": "x", "category": "y"}"#).unwrap();
        assert_eq!(def.priority, 0);
    }
}

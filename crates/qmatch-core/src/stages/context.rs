//! Contextual rules: ordered boolean predicates over substring containment.
//!
//! A rule maps a [`Condition`] to a category. Conditions are written in
//! packs as plain JSON/YAML:
//!
//! ```json
//! { "category": "strengths", "when": { "any": ["strength", "strong", { "all": ["good", "at"] }] } }
//! ```
//!
//! A bare string tests containment, `all` is AND, `any` is OR. Terms are
//! matched as raw substrings of the normalized query, so `"3"` matches
//! "top 3 qualities" and `"at"` matches "what".

use serde::{Deserialize, Serialize};

/// A boolean condition over the query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// The query contains this substring.
    Contains(String),
    /// Every sub-condition holds.
    All { all: Vec<Condition> },
    /// At least one sub-condition holds.
    Any { any: Vec<Condition> },
}

impl Condition {
    /// Evaluate against a lowercased query.
    pub fn evaluate(&self, query: &str) -> bool {
        match self {
            Condition::Contains(term) => query.contains(term.as_str()),
            Condition::All { all } => all.iter().all(|c| c.evaluate(query)),
            Condition::Any { any } => any.iter().any(|c| c.evaluate(query)),
        }
    }

    /// True if any clause is empty (blank term or empty `all`/`any` list).
    ///
    /// An empty term matches every query and an empty `all` is always true,
    /// so packs containing either are rejected.
    pub fn has_empty_clause(&self) -> bool {
        match self {
            Condition::Contains(term) => term.trim().is_empty(),
            Condition::All { all: items } | Condition::Any { any: items } => {
                items.is_empty() || items.iter().any(Condition::has_empty_clause)
            }
        }
    }

    /// Copy with every term lowercased.
    pub fn lowercased(&self) -> Condition {
        match self {
            Condition::Contains(term) => Condition::Contains(term.to_lowercase()),
            Condition::All { all } => Condition::All {
                all: all.iter().map(Condition::lowercased).collect(),
            },
            Condition::Any { any } => Condition::Any {
                any: any.iter().map(Condition::lowercased).collect(),
            },
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |f: &mut std::fmt::Formatter<'_>, items: &[Condition], op: &str| {
            write!(f, "(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", item)?;
            }
            write!(f, ")")
        };
        match self {
            Condition::Contains(term) => write!(f, "\"{}\"", term),
            Condition::All { all } => join(f, all, "&"),
            Condition::Any { any } => join(f, any, "|"),
        }
    }
}

/// A condition and the category it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRule {
    pub category: String,
    pub when: Condition,
}

/// Ordered contextual rules.
#[derive(Debug, Clone, Default)]
pub struct ContextMatcher {
    rules: Vec<ContextRule>,
}

impl ContextMatcher {
    /// Keep `rules` in order, lowercasing every term.
    pub fn new(rules: &[ContextRule]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|r| ContextRule {
                    category: r.category.clone(),
                    when: r.when.lowercased(),
                })
                .collect(),
        }
    }

    /// Rules that fire for `query`, top to bottom.
    pub fn matching<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a ContextRule> + 'a {
        self.rules.iter().filter(move |r| r.when.evaluate(query))
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[ContextRule] {
        &self.rules
    }
}

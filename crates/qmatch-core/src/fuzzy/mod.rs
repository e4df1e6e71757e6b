//! Weighted fuzzy search over the corpus.
//!
//! Every entry is indexed as a set of fields: its question, each keyword as
//! a separate field value, and its answer. Field text is folded through the
//! same correction table as queries, so a question written as "CI/CD" is
//! indexed the way a user's "ci/cd" is normalized.
//!
//! A search scores the query against every field (see [`scorer`]), keeps the
//! fields at or under the configured threshold, combines them per entry and
//! ranks entries ascending. Entries without a single matching field are not
//! returned.

pub mod scorer;

use serde::{Deserialize, Serialize};

use crate::config::{FieldWeights, FuzzyConfig};
use crate::corpus::CorpusEntry;
use crate::normalize::Normalizer;

use self::scorer::{combine, field_norm, field_score};

// ============================================================================
// Types
// ============================================================================

/// Which part of an entry a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Question,
    Keyword,
    Answer,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Question => write!(f, "question"),
            Self::Keyword => write!(f, "keyword"),
            Self::Answer => write!(f, "answer"),
        }
    }
}

/// One field that matched within the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub kind: FieldKind,
    /// Indexed (normalized) field text.
    pub text: String,
    pub score: f64,
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyHit {
    /// Position of the entry in the corpus.
    pub index: usize,
    /// Combined score; lower is better.
    pub score: f64,
    /// Fields that matched, in index order.
    pub matches: Vec<FieldMatch>,
}

#[derive(Debug, Clone)]
struct IndexedField {
    kind: FieldKind,
    text: String,
    chars: Vec<char>,
    norm: f64,
}

// ============================================================================
// FuzzyIndex
// ============================================================================

/// Precomputed searchable fields for a corpus.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    entries: Vec<Vec<IndexedField>>,
    weights: FieldWeights,
    threshold: f64,
}

impl FuzzyIndex {
    /// Index `entries`, folding field text through `normalizer`'s corrections.
    pub fn build(entries: &[CorpusEntry], normalizer: &Normalizer, config: &FuzzyConfig) -> Self {
        let field = |kind: FieldKind, raw: &str| {
            let text = normalizer.correct(raw);
            IndexedField {
                kind,
                chars: text.chars().collect(),
                norm: field_norm(&text),
                text,
            }
        };

        let entries = entries
            .iter()
            .map(|entry| {
                let mut fields = Vec::with_capacity(entry.keywords.len() + 2);
                fields.push(field(FieldKind::Question, &entry.question));
                fields.extend(entry.keywords.iter().map(|k| field(FieldKind::Keyword, k)));
                fields.push(field(FieldKind::Answer, &entry.answer));
                fields
            })
            .collect();

        Self {
            entries,
            weights: config.weights.normalized(),
            threshold: config.threshold,
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn weight(&self, kind: FieldKind) -> f64 {
        match kind {
            FieldKind::Question => self.weights.question,
            FieldKind::Keyword => self.weights.keywords,
            FieldKind::Answer => self.weights.answer,
        }
    }

    /// Rank every entry with at least one matching field.
    ///
    /// `query` should already be lowercased and corrected. Ties keep corpus
    /// order. A blank query returns nothing.
    pub fn search(&self, query: &str) -> Vec<FuzzyHit> {
        let pattern: Vec<char> = query.trim().chars().collect();
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<FuzzyHit> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, fields)| {
                let mut matches = Vec::new();
                let mut parts = Vec::new();
                for f in fields.iter().filter(|f| self.weight(f.kind) > 0.0) {
                    let score = field_score(&pattern, &f.chars);
                    if score <= self.threshold {
                        parts.push((score, self.weight(f.kind), f.norm));
                        matches.push(FieldMatch {
                            kind: f.kind,
                            text: f.text.clone(),
                            score,
                        });
                    }
                }

                if matches.is_empty() {
                    return None;
                }

                Some(FuzzyHit {
                    index,
                    score: combine(parts),
                    matches,
                })
            })
            .collect();

        // stable: equal scores keep corpus order
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        hits
    }

    /// The top-ranked hit, if any.
    pub fn best(&self, query: &str) -> Option<FuzzyHit> {
        self.search(query).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(id: u32, question: &str, keywords: &[&str], answer: &str) -> CorpusEntry {
        CorpusEntry {
            id,
            question: question.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            answer: answer.to_string(),
            category: format!("c{}", id),
        }
    }

    fn corpus() -> Vec<CorpusEntry> {
        vec![
            entry(
                1,
                "What is your Kubernetes experience?",
                &["kubernetes", "helm"],
                "Four years running clusters.",
            ),
            entry(
                2,
                "Do you have Terraform experience?",
                &["terraform", "iac"],
                "Modules for every environment.",
            ),
            entry(
                3,
                "How do you build CI/CD pipelines?",
                &["pipelines", "ci cd"],
                "Canary rollouts.",
            ),
        ]
    }

    fn index() -> FuzzyIndex {
        let corrections: BTreeMap<String, String> =
            [("ci/cd".to_string(), "ci cd".to_string())].into_iter().collect();
        let normalizer = Normalizer::new(&corrections, &BTreeMap::new()).unwrap();
        FuzzyIndex::build(&corpus(), &normalizer, &FuzzyConfig::default())
    }

    #[test]
    fn test_exact_question_ranks_first() {
        let idx = index();
        let best = idx.best("do you have terraform experience?").unwrap();
        assert_eq!(best.index, 1);
        assert!(best.score < 0.3);
        assert!(best.matches.iter().any(|m| m.kind == FieldKind::Question));
    }

    #[test]
    fn test_typo_still_matches_keyword() {
        let idx = index();
        let best = idx.best("kubernetse").unwrap();
        assert_eq!(best.index, 0);
        assert!(best
            .matches
            .iter()
            .any(|m| m.kind == FieldKind::Keyword && m.text == "kubernetes"));
    }

    #[test]
    fn test_fields_are_corrected_at_index_time() {
        let idx = index();
        let best = idx.best("how do you build ci cd pipelines?").unwrap();
        assert_eq!(best.index, 2);
        assert!(best.score < 0.01);
    }

    #[test]
    fn test_no_match_returns_nothing() {
        let idx = index();
        assert!(idx.search("qqqqqqqqqq").is_empty());
        assert!(idx.search("   ").is_empty());
    }

    #[test]
    fn test_results_are_sorted_ascending() {
        let idx = index();
        let hits = idx.search("experience");
        assert!(hits.len() >= 2);
        for pair in hits.windows(2) {
            assert!(pair[0].score <= pair[1].score);
        }
    }

    #[test]
    fn test_zero_weight_field_is_ignored() {
        let config = FuzzyConfig {
            weights: FieldWeights {
                question: 0.5,
                keywords: 0.5,
                answer: 0.0,
            },
            ..Default::default()
        };
        let idx = FuzzyIndex::build(&corpus(), &Normalizer::identity(), &config);
        assert!(idx.search("canary rollouts").is_empty());
        assert_eq!(idx.len(), 3);
    }
}

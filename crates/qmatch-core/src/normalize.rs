//! Query normalization: case folding, spelling corrections and synonym expansion.
//!
//! Normalization runs in two phases:
//!
//! 1. **Correction**: lowercase, trim, then replace whole-word misspellings
//!    from the correction table in a single left-to-right pass.
//! 2. **Expansion**: for every canonical term whose synonym appears as a word
//!    (or word sequence) in the corrected text, append the canonical term.
//!    Expansion is additive; the user's own words are never removed.
//!
//! ## Example
//!
//! ```ignore
//! let n = Normalizer::new(&corrections, &synonyms)?;
//! let q = n.normalize("Tel me about UR aws experiance");
//! assert_eq!(q.corrected, "tell me about your aws experience");
//! ```

use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::QmatchError;

/// The result of normalizing one raw query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedQuery {
    /// Input as received.
    pub original: String,
    /// Lowercased, trimmed, spelling-corrected text.
    pub corrected: String,
    /// `corrected` followed by every appended canonical term.
    pub expanded: String,
    /// Canonical terms appended during expansion, in append order.
    pub expansions: Vec<String>,
}

impl NormalizedQuery {
    /// True if the query has no content after trimming.
    pub fn is_blank(&self) -> bool {
        self.corrected.is_empty()
    }
}

/// A canonical term and the word sequences that trigger it.
#[derive(Debug, Clone)]
struct SynonymGroup {
    canonical: String,
    canonical_words: Vec<String>,
    triggers: Vec<Vec<String>>,
}

/// Compiled correction and synonym tables.
#[derive(Debug, Clone)]
pub struct Normalizer {
    corrections: Option<Regex>,
    replacements: HashMap<String, String>,
    synonyms: Vec<SynonymGroup>,
}

impl Normalizer {
    /// Compile the correction and synonym tables.
    ///
    /// Correction keys are matched case-insensitively on word boundaries.
    /// Longer keys win over shorter ones starting at the same position.
    ///
    /// # Errors
    ///
    /// Returns [`QmatchError::InvalidPattern`] if the combined correction
    /// pattern cannot be compiled (e.g. it exceeds the regex size limit).
    pub fn new(
        corrections: &BTreeMap<String, String>,
        synonyms: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, QmatchError> {
        let replacements: HashMap<String, String> = corrections
            .iter()
            .map(|(wrong, right)| (wrong.trim().to_lowercase(), right.trim().to_lowercase()))
            .filter(|(wrong, _)| !wrong.is_empty())
            .collect();

        let corrections = if replacements.is_empty() {
            None
        } else {
            let mut keys: Vec<&str> = replacements.keys().map(String::as_str).collect();
            keys.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{})\b", alternation);
            let re = Regex::new(&pattern).map_err(|e| QmatchError::InvalidPattern {
                pattern: "<corrections>".to_string(),
                reason: e.to_string(),
            })?;
            Some(re)
        };

        let synonyms = synonyms
            .iter()
            .map(|(canonical, words)| {
                let canonical = canonical.trim().to_lowercase();
                SynonymGroup {
                    canonical_words: words_of(&canonical),
                    triggers: words
                        .iter()
                        .map(|w| words_of(&w.to_lowercase()))
                        .filter(|seq| !seq.is_empty())
                        .collect(),
                    canonical,
                }
            })
            .filter(|g| !g.canonical_words.is_empty())
            .collect();

        Ok(Self {
            corrections,
            replacements,
            synonyms,
        })
    }

    /// A normalizer with no corrections and no synonyms.
    pub fn identity() -> Self {
        Self {
            corrections: None,
            replacements: HashMap::new(),
            synonyms: Vec::new(),
        }
    }

    /// Lowercase, trim and apply spelling corrections.
    pub fn correct(&self, raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();
        match &self.corrections {
            Some(re) => re
                .replace_all(&lowered, |caps: &Captures| {
                    let found = &caps[0];
                    self.replacements
                        .get(&found.to_lowercase())
                        .cloned()
                        .unwrap_or_else(|| found.to_string())
                })
                .into_owned(),
            None => lowered,
        }
    }

    /// Canonical terms triggered by `corrected`, in table order.
    ///
    /// Runs until no new canonical term is added, so appended terms that are
    /// themselves synonyms are expanded too. A canonical term already present
    /// in the text is never appended again.
    pub fn expansions(&self, corrected: &str) -> Vec<String> {
        let mut words = words_of(corrected);
        let mut added = Vec::new();

        loop {
            let mut changed = false;
            for group in &self.synonyms {
                if contains_sequence(&words, &group.canonical_words) {
                    continue;
                }
                if group
                    .triggers
                    .iter()
                    .any(|t| contains_sequence(&words, t))
                {
                    words.extend(group.canonical_words.iter().cloned());
                    added.push(group.canonical.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        added
    }

    /// Full normalization of a raw query.
    pub fn normalize(&self, raw: &str) -> NormalizedQuery {
        let corrected = self.correct(raw);
        let expansions = self.expansions(&corrected);
        let expanded = if expansions.is_empty() {
            corrected.clone()
        } else {
            format!("{} {}", corrected, expansions.join(" "))
        };

        NormalizedQuery {
            original: raw.to_string(),
            corrected,
            expanded,
            expansions,
        }
    }

    /// Number of correction entries.
    pub fn correction_count(&self) -> usize {
        self.replacements.len()
    }

    /// Number of synonym groups.
    pub fn synonym_group_count(&self) -> usize {
        self.synonyms.len()
    }
}

/// Unicode words of `text`, lowercased.
fn words_of(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// True if `needle` occurs contiguously in `haystack`.
fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

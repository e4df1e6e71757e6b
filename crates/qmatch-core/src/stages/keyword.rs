//! Keyword overlap and partial keyword matching.
//!
//! Both stages split the normalized query on whitespace. The overlap stage
//! scores every entry and keeps the best; the partial stage returns the
//! first keyword that contains a long-enough query word.

use serde::{Deserialize, Serialize};

use crate::config::{KeywordConfig, PartialConfig};
use crate::corpus::CorpusEntry;

/// Whitespace-separated words of `query` with at least `min_len` chars.
pub fn query_words(query: &str, min_len: usize) -> Vec<&str> {
    query
        .split_whitespace()
        .filter(|w| w.chars().count() >= min_len)
        .collect()
}

/// Best entry of the overlap stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapHit {
    pub index: usize,
    pub score: usize,
}

/// First hit of the partial stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialHit {
    pub index: usize,
    /// The entry keyword that contained the word.
    pub keyword: String,
    /// The query word.
    pub word: String,
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    /// lowercased `question + keywords + answer`
    haystack: String,
    /// lowercased keywords with their char lengths
    keywords: Vec<(String, usize)>,
}

/// Precomputed text for the overlap and partial stages.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    entries: Vec<KeywordEntry>,
    keyword: KeywordConfig,
    partial: PartialConfig,
}

impl KeywordMatcher {
    pub fn build(entries: &[CorpusEntry], keyword: &KeywordConfig, partial: &PartialConfig) -> Self {
        let entries = entries
            .iter()
            .map(|e| KeywordEntry {
                haystack: format!("{} {} {}", e.question, e.keywords.join(" "), e.answer)
                    .to_lowercase(),
                keywords: e
                    .keywords
                    .iter()
                    .map(|k| {
                        let k = k.to_lowercase();
                        let len = k.chars().count();
                        (k, len)
                    })
                    .collect(),
            })
            .collect();

        Self {
            entries,
            keyword: keyword.clone(),
            partial: partial.clone(),
        }
    }

    /// Overlap score of one entry.
    ///
    /// Each query word found in the entry text adds its length; each entry
    /// keyword found verbatim in the query adds twice its length.
    pub fn overlap_score(&self, index: usize, query: &str) -> usize {
        let Some(entry) = self.entries.get(index) else {
            return 0;
        };

        let word_score: usize = query_words(query, self.keyword.min_word_length)
            .into_iter()
            .filter(|w| entry.haystack.contains(w))
            .map(|w| w.chars().count())
            .sum();

        let keyword_bonus: usize = entry
            .keywords
            .iter()
            .filter(|(k, _)| query.contains(k.as_str()))
            .map(|(_, len)| len * 2)
            .sum();

        word_score + keyword_bonus
    }

    /// The highest-scoring entry, if its score exceeds the configured minimum.
    ///
    /// Ties go to the earlier entry.
    pub fn best_overlap(&self, query: &str) -> Option<OverlapHit> {
        let mut best: Option<OverlapHit> = None;
        for index in 0..self.entries.len() {
            let score = self.overlap_score(index, query);
            if score > 0 && best.map_or(true, |b| score > b.score) {
                best = Some(OverlapHit { index, score });
            }
        }

        match best {
            Some(hit) if hit.score > self.keyword.min_score => Some(hit),
            Some(hit) => {
                tracing::debug!(
                    "keyword overlap best score {} does not exceed {}",
                    hit.score,
                    self.keyword.min_score
                );
                None
            }
            None => None,
        }
    }

    /// First (entry, keyword, word) where the keyword contains the query word.
    pub fn partial(&self, query: &str) -> Option<PartialHit> {
        let words = query_words(query, self.partial.min_word_length);
        if words.is_empty() {
            return None;
        }

        for (index, entry) in self.entries.iter().enumerate() {
            for (keyword, _) in &entry.keywords {
                if let Some(word) = words.iter().find(|w| keyword.contains(*w)) {
                    return Some(PartialHit {
                        index,
                        keyword: keyword.clone(),
                        word: word.to_string(),
                    });
                }
            }
        }
        None
    }
}

//! Category-grouped browsing of the corpus.

use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, CorpusEntry};

/// Filter applied by [`browse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseFilter {
    /// Case-insensitive substring over question and answer.
    pub search: Option<String>,
    /// Exact category (case-insensitive).
    pub category: Option<String>,
}

impl BrowseFilter {
    /// Filter by search text only.
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            category: None,
        }
    }

    fn accepts(&self, entry: &CorpusEntry, needle: Option<&str>) -> bool {
        if let Some(category) = &self.category {
            if !entry.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        match needle {
            Some(n) => {
                entry.question.to_lowercase().contains(n) || entry.answer.to_lowercase().contains(n)
            }
            None => true,
        }
    }
}

/// Entries sharing a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub entries: Vec<CorpusEntry>,
}

/// Group the corpus by category in first-appearance order, keeping only
/// entries accepted by `filter`. Empty groups are dropped.
pub fn browse(corpus: &Corpus, filter: &BrowseFilter) -> Vec<CategoryGroup> {
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut groups: Vec<CategoryGroup> = Vec::new();
    for entry in corpus.entries() {
        if !filter.accepts(entry, needle.as_deref()) {
            continue;
        }
        match groups.iter_mut().find(|g| g.category == entry.category) {
            Some(group) => group.entries.push(entry.clone()),
            None => groups.push(CategoryGroup {
                category: entry.category.clone(),
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}

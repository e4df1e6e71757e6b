//! Match engine: the entry point that turns free text into an answer.
//!
//! The [`MatchEngine`] owns a validated corpus and every compiled stage.
//! It is built once by the caller and shared by reference; all query
//! methods take `&self`.

use anyhow::Context;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::browse::{self, BrowseFilter, CategoryGroup};
use crate::config::{GlobalConfig, MatcherConfig};
use crate::corpus::{Corpus, CorpusEntry, KnowledgePack};
use crate::errors::QmatchError;
use crate::fuzzy::FuzzyIndex;
use crate::normalize::{NormalizedQuery, Normalizer};
use crate::stages::context::ContextMatcher;
use crate::stages::fallback::FallbackGenerator;
use crate::stages::intent::IntentMatcher;
use crate::stages::keyword::KeywordMatcher;
use crate::stages::Stage;

// ============================================================================
// MatchOutcome
// ============================================================================

/// The full result of one query: the answer plus how it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    /// The query as received.
    pub query: String,
    /// Normalization details.
    pub normalized: NormalizedQuery,
    /// Stage that produced the answer.
    pub stage: Stage,
    /// Selected corpus entry, `None` for fallbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<u32>,
    /// Category of the selected entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Stage score: fuzzy combined score (lower is better) or keyword overlap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// What fired: the intent pattern, rule condition, keyword or fallback topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The reply text. Never empty.
    pub answer: String,
}

// ============================================================================
// MatchEngine
// ============================================================================

/// Multi-stage question matcher over an immutable corpus.
///
/// # Construction
///
/// Use [`MatchEngine::from_global_config`] for typical usage, or
/// [`MatchEngine::new`] with any [`KnowledgePack`] for tests and embedding.
///
/// # Example
///
/// ```ignore
/// let engine = MatchEngine::builtin()?.with_seed(7);
/// println!("{}", engine.greeting());
/// println!("{}", engine.find_answer("what are your strengths?"));
/// ```
pub struct MatchEngine {
    corpus: Corpus,
    normalizer: Normalizer,
    intents: IntentMatcher,
    fuzzy: FuzzyIndex,
    context: ContextMatcher,
    keywords: KeywordMatcher,
    fallback: FallbackGenerator,
    config: MatcherConfig,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("entries", &self.corpus.len())
            .field("intents", &self.intents.len())
            .field("rules", &self.context.rules().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MatchEngine {
    /// Validate `pack` and `config` and compile every stage.
    ///
    /// Warnings from validation are logged. The random source is seeded from
    /// OS entropy; use [`MatchEngine::with_seed`] for reproducible output.
    ///
    /// # Errors
    ///
    /// Any configuration or pack problem: invalid thresholds, duplicate ids,
    /// empty fields, categories referenced but missing, malformed regexes,
    /// fallback templates without the contact address.
    pub fn new(pack: &KnowledgePack, config: MatcherConfig) -> Result<Self, QmatchError> {
        for warning in config.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }
        for warning in pack.validate()? {
            tracing::warn!("Knowledge pack warning: {}", warning);
        }

        let corpus = Corpus::from_pack(pack);
        let normalizer = Normalizer::new(&pack.corrections, &pack.synonyms)?;
        let intents = IntentMatcher::new(&pack.intents)?;
        let fuzzy = FuzzyIndex::build(corpus.entries(), &normalizer, &config.fuzzy);
        let context = ContextMatcher::new(&pack.rules);
        let keywords = KeywordMatcher::build(corpus.entries(), &config.keyword, &config.partial);
        let fallback = FallbackGenerator::new(&pack.fallback)?;

        tracing::debug!(
            "Match engine ready: {} entries, {} intents, {} rules, {} corrections, {} synonym groups",
            corpus.len(),
            intents.len(),
            context.rules().len(),
            normalizer.correction_count(),
            normalizer.synonym_group_count()
        );

        Ok(Self {
            corpus,
            normalizer,
            intents,
            fuzzy,
            context,
            keywords,
            fallback,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Engine over the compiled-in pack with default tunables.
    pub fn builtin() -> Result<Self, QmatchError> {
        Self::new(&KnowledgePack::builtin()?, MatcherConfig::default())
    }

    /// Replace the random source with one seeded from `seed`.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    /// Create an engine from a loaded global configuration.
    ///
    /// Loads `config.corpus` if set, otherwise the built-in pack, and applies
    /// `config.seed` if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the pack cannot be loaded or fails validation.
    pub fn from_global_config(config: GlobalConfig) -> anyhow::Result<Self> {
        let pack = match config.corpus.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => KnowledgePack::from_path(path)
                .with_context(|| format!("Failed to load knowledge pack {}", path.display()))?,
            _ => KnowledgePack::builtin().context("Built-in knowledge pack is malformed")?,
        };

        let engine = Self::new(&pack, config.matcher)?;
        Ok(match config.seed {
            Some(seed) => engine.with_seed(seed),
            None => engine,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The read-only corpus.
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Active matcher tunables.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Contact address used by fallbacks.
    pub fn contact(&self) -> &str {
        self.fallback.contact()
    }

    /// First entry with `category`.
    pub fn entry_by_category(&self, category: &str) -> Option<&CorpusEntry> {
        self.corpus.by_category(category)
    }

    // -------------------------------------------------------------------------
    // Conversation helpers
    // -------------------------------------------------------------------------

    /// One opening line, chosen uniformly at random.
    pub fn greeting(&self) -> String {
        let mut rng = self.rng.lock();
        self.corpus
            .greetings()
            .choose(&mut *rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Example questions, verbatim.
    pub fn suggestions(&self) -> &[String] {
        self.corpus.suggestions()
    }

    /// Corpus entries grouped by category and filtered.
    pub fn browse(&self, filter: &BrowseFilter) -> Vec<CategoryGroup> {
        browse::browse(&self.corpus, filter)
    }

    // -------------------------------------------------------------------------
    // Matching
    // -------------------------------------------------------------------------

    /// Normalized query text (corrected, then expanded).
    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(raw).expanded
    }

    /// Normalization with every intermediate form.
    pub fn normalize_query(&self, raw: &str) -> NormalizedQuery {
        self.normalizer.normalize(raw)
    }

    /// The answer for `raw`. Never empty, never fails.
    pub fn find_answer(&self, raw: &str) -> String {
        self.find_match(raw).answer
    }

    /// Run the pipeline and report which stage answered.
    pub fn find_match(&self, raw: &str) -> MatchOutcome {
        let normalized = self.normalizer.normalize(raw);

        if normalized.is_blank() {
            tracing::debug!("blank query, going straight to fallback");
            return self.fallback_outcome(raw, normalized);
        }

        if let Some(outcome) = self.match_intent(raw, &normalized) {
            return outcome;
        }
        if let Some(outcome) = self.match_fuzzy(raw, &normalized) {
            return outcome;
        }
        if let Some(outcome) = self.match_context(raw, &normalized) {
            return outcome;
        }
        if let Some(outcome) = self.match_keyword(raw, &normalized) {
            return outcome;
        }
        if let Some(outcome) = self.match_partial(raw, &normalized) {
            return outcome;
        }
        self.fallback_outcome(raw, normalized)
    }

    fn outcome(
        &self,
        raw: &str,
        normalized: &NormalizedQuery,
        stage: Stage,
        entry: &CorpusEntry,
        score: Option<f64>,
        detail: String,
    ) -> MatchOutcome {
        tracing::debug!(
            "{} stage matched entry {} ({}) via {}",
            stage,
            entry.id,
            entry.category,
            detail
        );
        MatchOutcome {
            query: raw.to_string(),
            normalized: normalized.clone(),
            stage,
            entry_id: Some(entry.id),
            category: Some(entry.category.clone()),
            score,
            detail: Some(detail),
            answer: entry.answer.clone(),
        }
    }

    fn match_intent(&self, raw: &str, q: &NormalizedQuery) -> Option<MatchOutcome> {
        for pattern in self.intents.matching(&q.expanded) {
            match self.corpus.by_category(pattern.category()) {
                Some(entry) => {
                    return Some(self.outcome(
                        raw,
                        q,
                        Stage::Intent,
                        entry,
                        None,
                        pattern.pattern().to_string(),
                    ))
                }
                None => tracing::debug!(
                    "intent `{}` matched but category `{}` has no entry",
                    pattern.pattern(),
                    pattern.category()
                ),
            }
        }
        None
    }

    fn match_fuzzy(&self, raw: &str, q: &NormalizedQuery) -> Option<MatchOutcome> {
        let hit = self.fuzzy.best(&q.corrected)?;
        if hit.score >= self.config.fuzzy.max_score {
            tracing::debug!(
                "fuzzy best score {:.4} is not below {}",
                hit.score,
                self.config.fuzzy.max_score
            );
            return None;
        }

        let entry = self.corpus.entries().get(hit.index)?;
        let detail = hit
            .matches
            .iter()
            .map(|m| format!("{} {:.3}", m.kind, m.score))
            .collect::<Vec<_>>()
            .join(", ");
        Some(self.outcome(raw, q, Stage::Fuzzy, entry, Some(hit.score), detail))
    }

    fn match_context(&self, raw: &str, q: &NormalizedQuery) -> Option<MatchOutcome> {
        for rule in self.context.matching(&q.expanded) {
            match self.corpus.by_category(&rule.category) {
                Some(entry) => {
                    return Some(self.outcome(
                        raw,
                        q,
                        Stage::Context,
                        entry,
                        None,
                        rule.when.to_string(),
                    ))
                }
                None => tracing::debug!(
                    "rule for `{}` fired but the category has no entry",
                    rule.category
                ),
            }
        }
        None
    }

    fn match_keyword(&self, raw: &str, q: &NormalizedQuery) -> Option<MatchOutcome> {
        let hit = self.keywords.best_overlap(&q.expanded)?;
        let entry = self.corpus.entries().get(hit.index)?;
        Some(self.outcome(
            raw,
            q,
            Stage::Keyword,
            entry,
            Some(hit.score as f64),
            format!("overlap {}", hit.score),
        ))
    }

    fn match_partial(&self, raw: &str, q: &NormalizedQuery) -> Option<MatchOutcome> {
        let hit = self.keywords.partial(&q.expanded)?;
        let entry = self.corpus.entries().get(hit.index)?;
        Some(self.outcome(
            raw,
            q,
            Stage::Partial,
            entry,
            None,
            format!("`{}` in keyword `{}`", hit.word, hit.keyword),
        ))
    }

    fn fallback_outcome(&self, raw: &str, normalized: NormalizedQuery) -> MatchOutcome {
        let fallback = {
            let mut rng = self.rng.lock();
            self.fallback.generate(&normalized.expanded, &mut *rng)
        };
        tracing::debug!(
            "no stage matched, fallback topic: {}",
            fallback.topic.as_deref().unwrap_or("generic")
        );

        MatchOutcome {
            query: raw.to_string(),
            normalized,
            stage: Stage::Fallback,
            entry_id: None,
            category: None,
            score: None,
            detail: Some(fallback.topic.unwrap_or_else(|| "generic".to_string())),
            answer: fallback.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_send_and_sync() {
        assert_send_sync::<MatchEngine>();
    }

    #[test]
    fn test_builtin_engine_builds() {
        let engine = MatchEngine::builtin().unwrap();
        assert_eq!(engine.corpus().len(), 24);
        assert!(engine.contact().contains('@'));
    }

    #[test]
    fn test_entry_by_category() {
        let engine = MatchEngine::builtin().unwrap();
        assert_eq!(engine.entry_by_category("aws").map(|e| e.id), Some(2));
        assert_eq!(engine.entry_by_category("current-work").map(|e| e.id), Some(4));
        assert!(engine.entry_by_category("nope").is_none());
    }

    #[test]
    fn test_blank_query_falls_back() {
        let engine = MatchEngine::builtin().unwrap().with_seed(1);
        let outcome = engine.find_match("   ");
        assert_eq!(outcome.stage, Stage::Fallback);
        assert!(outcome.answer.contains(engine.contact()));
    }

    #[test]
    fn test_seeded_greetings_repeat() {
        let a = MatchEngine::builtin().unwrap().with_seed(3);
        let b = MatchEngine::builtin().unwrap().with_seed(3);
        let ga: Vec<String> = (0..5).map(|_| a.greeting()).collect();
        let gb: Vec<String> = (0..5).map(|_| b.greeting()).collect();
        assert_eq!(ga, gb);
        assert!(ga.iter().all(|g| a.corpus().greetings().contains(g)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pack = KnowledgePack::builtin().unwrap();
        let mut config = MatcherConfig::default();
        config.fuzzy.max_score = 2.0;
        assert!(matches!(
            MatchEngine::new(&pack, config),
            Err(QmatchError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_missing_category_rejected() {
        let mut pack = KnowledgePack::builtin().unwrap();
        pack.qna.retain(|e| e.category != "aws" && e.category != "stress");
        match MatchEngine::new(&pack, MatcherConfig::default()) {
            Err(QmatchError::MissingCategories { references }) => {
                assert!(references.iter().any(|r| r.contains("`aws`")));
                assert!(references.iter().any(|r| r.contains("`stress`")));
            }
            other => panic!("expected MissingCategories, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_global_config_uses_corpus_and_seed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pack.json");
        std::fs::write(&path, crate::constants::BUILTIN_PACK_JSON).unwrap();

        let config = GlobalConfig {
            corpus: Some(path),
            seed: Some(9),
            ..Default::default()
        };
        let engine = MatchEngine::from_global_config(config).unwrap();
        assert_eq!(engine.corpus().len(), 24);

        let missing = GlobalConfig {
            corpus: Some(tmp.path().join("missing.json")),
            ..Default::default()
        };
        let err = MatchEngine::from_global_config(missing).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.json"));
    }
}

//! Knowledge pack and corpus types.
//!
//! A knowledge pack is the single document an engine is built from: the
//! question/answer corpus plus every table the matcher stages read
//! (corrections, synonyms, intent patterns, contextual rules and fallback
//! templates). Packs are JSON or YAML; the built-in pack is compiled in.
//!
//! [`KnowledgePack`] is the raw, deserialized document. [`Corpus`] is the
//! read-only view the engine keeps after validation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{is_pack_extension, BUILTIN_PACK_JSON};
use crate::errors::QmatchError;
use crate::stages::context::ContextRule;
use crate::stages::fallback::FallbackTemplates;
use crate::stages::intent::IntentPatternDef;

// ============================================================================
// CorpusEntry
// ============================================================================

/// One pre-authored question/answer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Unique id within the corpus.
    pub id: u32,
    /// Canonical phrasing; searched and shown as a label.
    pub question: String,
    /// Ordered keywords used by the fuzzy, keyword and partial stages.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Text returned when this entry is selected.
    pub answer: String,
    /// Category tag used by the intent and contextual stages.
    pub category: String,
}

// ============================================================================
// KnowledgePack
// ============================================================================

/// A complete knowledge pack as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgePack {
    /// The question/answer corpus, in priority order.
    pub qna: Vec<CorpusEntry>,

    /// Legacy canned fallback lines. Kept for pack compatibility; the
    /// generated fallback supersedes them.
    #[serde(default)]
    pub fallbacks: Vec<String>,

    /// Example questions offered as quick replies.
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Opening lines; one is picked at random per conversation.
    pub greetings: Vec<String>,

    /// Misspelled word -> corrected text, applied as whole-word replacements.
    #[serde(default)]
    pub corrections: BTreeMap<String, String>,

    /// Canonical term -> synonyms that cause the canonical term to be appended.
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,

    /// Regex intent patterns (highest precedence stage).
    #[serde(default)]
    pub intents: Vec<IntentPatternDef>,

    /// Ordered contextual rules.
    #[serde(default)]
    pub rules: Vec<ContextRule>,

    /// Fallback generator templates.
    pub fallback: FallbackTemplates,
}

impl KnowledgePack {
    /// The compiled-in portfolio pack.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded JSON is malformed, which the test suite guards.
    pub fn builtin() -> Result<Self, QmatchError> {
        Self::from_json_str(BUILTIN_PACK_JSON)
    }

    /// Parse a pack from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, QmatchError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a pack from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self, QmatchError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a pack from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// - [`QmatchError::UnsupportedPackFormat`] for any other extension
    /// - [`QmatchError::PackIo`] if the file cannot be read
    /// - [`QmatchError::PackParse`] if the content does not deserialize
    pub fn from_path(path: &Path) -> Result<Self, QmatchError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !is_pack_extension(&ext) {
            return Err(QmatchError::UnsupportedPackFormat {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| QmatchError::PackIo {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let parsed = if ext == "json" {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };

        let pack: Self = parsed.map_err(|message| QmatchError::PackParse {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::info!(
            "Loaded knowledge pack from {} ({} entries)",
            path.display(),
            pack.qna.len()
        );
        Ok(pack)
    }

    /// Validate the pack's structure and cross references.
    ///
    /// Critical problems are returned as errors. Category references are
    /// checked together so a single error lists every dangling reference.
    /// Regex syntax is checked when the stages are compiled.
    ///
    /// # Warnings
    /// - more than one entry shares a category (the first one wins)
    /// - no suggestions
    /// - a correction produces another correction key (normalization would not be stable)
    /// - the legacy `fallbacks` list is non-empty but unused
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        let mut warnings = Vec::new();

        if self.qna.is_empty() {
            return Err(QmatchError::InvalidPack(
                "the corpus (`qna`) has no entries".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        let mut categories: HashMap<&str, u32> = HashMap::new();
        for entry in &self.qna {
            if !ids.insert(entry.id) {
                return Err(QmatchError::DuplicateEntryId(entry.id));
            }
            for (field, value) in [
                ("question", &entry.question),
                ("answer", &entry.answer),
                ("category", &entry.category),
            ] {
                if value.trim().is_empty() {
                    return Err(QmatchError::InvalidEntry {
                        id: entry.id,
                        reason: format!("`{}` is empty", field),
                    });
                }
            }
            if entry.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(QmatchError::InvalidEntry {
                    id: entry.id,
                    reason: "contains an empty keyword".to_string(),
                });
            }
            if let Some(first) = categories.get(entry.category.as_str()) {
                warnings.push(format!(
                    "category `{}` is used by entries {} and {}; entry {} wins lookups",
                    entry.category, first, entry.id, first
                ));
            } else {
                categories.insert(entry.category.as_str(), entry.id);
            }
        }

        if self.greetings.iter().all(|g| g.trim().is_empty()) {
            return Err(QmatchError::InvalidPack(
                "at least one non-empty greeting is required".to_string(),
            ));
        }

        let mut missing = Vec::new();
        for (i, intent) in self.intents.iter().enumerate() {
            if !categories.contains_key(intent.category.as_str()) {
                missing.push(format!(
                    "intent #{} (`{}`) -> `{}`",
                    i + 1,
                    intent.pattern,
                    intent.category
                ));
            }
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if !categories.contains_key(rule.category.as_str()) {
                missing.push(format!("rule #{} -> `{}`", i + 1, rule.category));
            }
        }
        if !missing.is_empty() {
            return Err(QmatchError::MissingCategories {
                references: missing,
            });
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if rule.when.has_empty_clause() {
                return Err(QmatchError::InvalidPack(format!(
                    "rule #{} (`{}`) has an empty condition",
                    i + 1,
                    rule.category
                )));
            }
        }

        for (wrong, right) in &self.corrections {
            if wrong.trim().is_empty() {
                return Err(QmatchError::InvalidPack(
                    "corrections contain an empty key".to_string(),
                ));
            }
            let produces_key = right
                .split_whitespace()
                .any(|w| self.corrections.contains_key(w) && w != wrong);
            if produces_key {
                warnings.push(format!(
                    "correction `{}` -> `{}` produces another correction key",
                    wrong, right
                ));
            }
        }

        warnings.extend(self.fallback.validate()?);

        if self.suggestions.is_empty() {
            warnings.push("pack has no suggestions".to_string());
        }
        if !self.fallbacks.is_empty() {
            tracing::debug!(
                "{} legacy fallback lines present; generated fallbacks are used instead",
                self.fallbacks.len()
            );
        }

        Ok(warnings)
    }
}

// ============================================================================
// Corpus
// ============================================================================

/// Read-only corpus view held by the engine.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
    fallbacks: Vec<String>,
    suggestions: Vec<String>,
    greetings: Vec<String>,
    /// category -> index of the first entry carrying it
    by_category: HashMap<String, usize>,
}

impl Corpus {
    /// Build the corpus view from a validated pack.
    pub fn from_pack(pack: &KnowledgePack) -> Self {
        let mut by_category = HashMap::new();
        for (idx, entry) in pack.qna.iter().enumerate() {
            by_category.entry(entry.category.clone()).or_insert(idx);
        }

        Self {
            entries: pack.qna.clone(),
            fallbacks: pack.fallbacks.clone(),
            suggestions: pack.suggestions.clone(),
            greetings: pack
                .greetings
                .iter()
                .filter(|g| !g.trim().is_empty())
                .cloned()
                .collect(),
            by_category,
        }
    }

    /// All entries in corpus order.
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the corpus has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by id.
    pub fn get(&self, id: u32) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// First entry carrying `category`.
    pub fn by_category(&self, category: &str) -> Option<&CorpusEntry> {
        self.by_category
            .get(category)
            .and_then(|&idx| self.entries.get(idx))
    }

    /// Distinct categories in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.category.as_str()))
            .map(|e| e.category.as_str())
            .collect()
    }

    /// Example questions, verbatim.
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Opening lines.
    pub fn greetings(&self) -> &[String] {
        &self.greetings
    }

    /// Legacy fallback lines.
    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tiny_pack_json() -> &'static str {
        r#"{
            "qna": [
                {"id": 1, "question": "What is Rust?", "keywords": ["rust"], "answer": "A language.", "category": "rust"},
                {"id": 2, "question": "What is Go?", "keywords": ["go"], "answer": "Another language.", "category": "go"}
            ],
            "greetings": ["Hi!"],
            "intents": [{"pattern": "rust", "category": "rust", "priority": 1}],
            "rules": [{"category": "go", "when": "golang"}],
            "fallback": {
                "contact": "me@example.com",
                "prompts": ["Ask about Rust"],
                "generic": "No idea. {prompt} Write to {contact}."
            }
        }"#
    }

    #[test]
    fn test_builtin_pack_is_valid() {
        let pack = KnowledgePack::builtin().unwrap();
        let warnings = pack.validate().unwrap();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        assert_eq!(pack.qna.len(), 24);
        assert!(!pack.greetings.is_empty());
        assert!(pack.suggestions.len() >= 4);
    }

    #[test]
    fn test_optional_sections_default() {
        let pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        assert!(pack.corrections.is_empty());
        assert!(pack.synonyms.is_empty());
        assert!(pack.suggestions.is_empty());
        let warnings = pack.validate().unwrap();
        assert_eq!(warnings, vec!["pack has no suggestions".to_string()]);
    }

    #[test]
    fn test_duplicate_id_is_error() {
        let mut pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        pack.qna[1].id = 1;
        assert!(matches!(
            pack.validate(),
            Err(QmatchError::DuplicateEntryId(1))
        ));
    }

    #[test]
    fn test_empty_category_is_error() {
        let mut pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        pack.qna[0].category = "  ".into();
        assert!(matches!(
            pack.validate(),
            Err(QmatchError::InvalidEntry { id: 1, .. })
        ));
    }

    #[test]
    fn test_missing_categories_are_all_listed() {
        let mut pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        pack.qna.retain(|e| e.id == 2);
        pack.intents[0].category = "python".into();
        let err = pack.validate().unwrap_err();
        match err {
            QmatchError::MissingCategories { references } => {
                assert_eq!(references.len(), 1);
                assert!(references[0].contains("python"));
            }
            other => panic!("unexpected error: {other}"),
        }

        pack.rules[0].category = "java".into();
        match pack.validate().unwrap_err() {
            QmatchError::MissingCategories { references } => assert_eq!(references.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_category_warns() {
        let mut pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        pack.qna[1].category = "rust".into();
        pack.rules.clear();
        let warnings = pack.validate().unwrap();
        assert!(warnings.iter().any(|w| w.contains("category `rust`")));

        let corpus = Corpus::from_pack(&pack);
        assert_eq!(corpus.by_category("rust").map(|e| e.id), Some(1));
        assert_eq!(corpus.categories(), vec!["rust"]);
    }

    #[test]
    fn test_empty_greetings_is_error() {
        let mut pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        pack.greetings = vec![" ".into()];
        assert!(matches!(pack.validate(), Err(QmatchError::InvalidPack(_))));
    }

    #[test]
    fn test_correction_chain_warns() {
        let mut pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        pack.suggestions = vec!["What is Rust?".into()];
        pack.corrections.insert("rsut".into(), "rustt".into());
        pack.corrections.insert("rustt".into(), "rust".into());
        let warnings = pack.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("`rsut`"));
    }

    #[test]
    fn test_from_path_yaml_and_unsupported() {
        let tmp = TempDir::new().unwrap();
        let pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();

        let yaml_path = tmp.path().join("pack.yaml");
        fs::write(&yaml_path, serde_yaml::to_string(&pack).unwrap()).unwrap();
        let loaded = KnowledgePack::from_path(&yaml_path).unwrap();
        assert_eq!(loaded.qna, pack.qna);

        let toml_path = tmp.path().join("pack.toml");
        fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            KnowledgePack::from_path(&toml_path),
            Err(QmatchError::UnsupportedPackFormat { .. })
        ));

        let missing = tmp.path().join("missing.json");
        assert!(matches!(
            KnowledgePack::from_path(&missing),
            Err(QmatchError::PackIo { .. })
        ));

        let broken = tmp.path().join("broken.json");
        fs::write(&broken, "{\"qna\": [").unwrap();
        assert!(matches!(
            KnowledgePack::from_path(&broken),
            Err(QmatchError::PackParse { .. })
        ));
    }

    #[test]
    fn test_corpus_lookups() {
        let pack = KnowledgePack::from_json_str(tiny_pack_json()).unwrap();
        let corpus = Corpus::from_pack(&pack);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(2).map(|e| e.category.as_str()), Some("go"));
        assert!(corpus.get(9).is_none());
        assert!(corpus.by_category("python").is_none());
        assert_eq!(corpus.greetings(), ["Hi!".to_string()]);
    }
}

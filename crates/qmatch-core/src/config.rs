//! Configuration types for qmatch.
//!
//! This module provides the configuration structures used by the matching engine:
//! - [`GlobalConfig`]: User-level configuration stored in `~/.qmatch/config.yaml`
//! - [`MatcherConfig`]: Tunables for the matcher pipeline stages
//! - [`FuzzyConfig`]: Weighted fuzzy-search thresholds and field weights
//! - [`KeywordConfig`] / [`PartialConfig`]: Keyword overlap and partial-match limits

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{GLOBAL_CONFIG_FILENAME, QMATCH_HOME_DIR};
use crate::errors::QmatchError;

// ======================================================================
// Matcher Defaults
// ======================================================================

/// Default per-field fuzzy threshold (0.0 = exact, 1.0 = anything).
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.2;

/// Default cutoff for accepting the top fuzzy result (strictly below).
pub const DEFAULT_FUZZY_MAX_SCORE: f64 = 0.3;

/// Default weight of the `question` field.
pub const DEFAULT_QUESTION_WEIGHT: f64 = 0.4;

/// Default weight of the `keywords` field.
pub const DEFAULT_KEYWORDS_WEIGHT: f64 = 0.4;

/// Default weight of the `answer` field.
pub const DEFAULT_ANSWER_WEIGHT: f64 = 0.2;

/// Query words shorter than this are ignored by keyword overlap.
pub const DEFAULT_KEYWORD_MIN_WORD_LENGTH: usize = 3;

/// Keyword overlap score must exceed this to be accepted.
pub const DEFAULT_KEYWORD_MIN_SCORE: usize = 8;

/// Query words shorter than this are ignored by partial matching.
pub const DEFAULT_PARTIAL_MIN_WORD_LENGTH: usize = 4;

// ============================================================================
// GlobalConfig
// ============================================================================

/// Global user configuration, loaded from `~/.qmatch/config.yaml`.
///
/// Every field is optional; a missing file behaves like an empty one.
///
/// # Example YAML
///
/// ```yaml
/// corpus: ~/packs/portfolio.yaml
/// seed: 42
/// matcher:
///   fuzzy:
///     threshold: 0.2
///     maxScore: 0.3
///     weights:
///       question: 0.4
///       keywords: 0.4
///       answer: 0.2
///   keyword:
///     minWordLength: 3
///     minScore: 8
///   partial:
///     minWordLength: 4
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Knowledge pack to load instead of the built-in one.
    ///
    /// When read from a file, `~` is expanded and relative paths are taken
    /// from the file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,

    /// Seed for greeting/fallback selection. Unset means OS entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Matcher pipeline tunables.
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl GlobalConfig {
    /// Load the global configuration from the default location (`~/.qmatch/config.yaml`).
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QmatchError::InvalidGlobalConfig`] if the file exists but cannot be parsed.
    pub fn load_default() -> Result<Self, QmatchError> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the global configuration from a specific path.
    ///
    /// If the file does not exist, returns the default configuration. A
    /// relative or `~`-prefixed `corpus` is resolved against the file.
    ///
    /// # Errors
    ///
    /// Returns [`QmatchError::InvalidGlobalConfig`] if the file exists but cannot be parsed.
    /// Returns [`QmatchError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, QmatchError> {
        if !path.exists() {
            tracing::debug!(
                "Global config not found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            QmatchError::InvalidGlobalConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml_str(&content).map_err(|e| match e {
            QmatchError::InvalidGlobalConfig(msg) => {
                QmatchError::InvalidGlobalConfig(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })?;

        // Corpus paths are relative to the file that names them
        if let Some(corpus) = config.corpus.take() {
            let home = dirs::home_dir();
            config.corpus = Some(resolve_corpus_path(
                &corpus,
                home.as_deref(),
                path.parent(),
            ));
        }

        Ok(config)
    }

    /// Parse and validate a configuration from YAML text.
    ///
    /// Empty input yields the default configuration. Warnings are logged.
    pub fn from_yaml_str(content: &str) -> Result<Self, QmatchError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                QmatchError::InvalidGlobalConfig(format!("Failed to parse config: {}", e))
            })?
        };

        let warnings = config.validate()?;
        for warning in warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Get the default global config directory (`~/.qmatch`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(QMATCH_HOME_DIR))
    }

    /// Get the default global config file path (`~/.qmatch/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(GLOBAL_CONFIG_FILENAME))
    }

    /// Validate the configuration.
    ///
    /// Returns the first critical error encountered as
    /// `QmatchError::InvalidConfiguration`. Non-fatal issues are returned as
    /// warning strings; callers log them and proceed.
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        let mut warnings = self.matcher.validate()?;

        if let Some(corpus) = &self.corpus {
            if corpus.as_os_str().is_empty() {
                warnings.push("corpus is set to an empty path; the built-in pack will be used".into());
            }
        }

        Ok(warnings)
    }
}

// ============================================================================
// MatcherConfig
// ============================================================================

/// Tunables for the matcher pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherConfig {
    /// Weighted fuzzy-search stage.
    #[serde(default)]
    pub fuzzy: FuzzyConfig,

    /// Multi-keyword overlap stage.
    #[serde(default)]
    pub keyword: KeywordConfig,

    /// Partial substring stage.
    #[serde(default)]
    pub partial: PartialConfig,
}

impl MatcherConfig {
    /// Validate every stage section, collecting warnings.
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        let mut warnings = self.fuzzy.validate()?;
        warnings.extend(self.keyword.validate()?);
        warnings.extend(self.partial.validate()?);
        Ok(warnings)
    }
}

// ============================================================================
// FuzzyConfig
// ============================================================================

/// Weighted fuzzy-search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyConfig {
    /// Maximum per-field score (edit errors / query length) for a field to match.
    #[serde(default = "default_fuzzy_threshold")]
    pub threshold: f64,

    /// The top result is accepted only if its combined score is below this.
    #[serde(default = "default_fuzzy_max_score")]
    pub max_score: f64,

    /// Relative importance of each indexed field.
    #[serde(default)]
    pub weights: FieldWeights,
}

/// Expand a leading `~` against `home`, then join a still-relative path
/// onto `base`.
///
/// `~user` forms are left alone.
fn resolve_corpus_path(corpus: &Path, home: Option<&Path>, base: Option<&Path>) -> PathBuf {
    let expanded = match (corpus.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => corpus.to_path_buf(),
    };

    match base {
        Some(base) if expanded.is_relative() && !expanded.as_os_str().is_empty() => {
            base.join(expanded)
        }
        _ => expanded,
    }
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}
fn default_fuzzy_max_score() -> f64 {
    DEFAULT_FUZZY_MAX_SCORE
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FUZZY_THRESHOLD,
            max_score: DEFAULT_FUZZY_MAX_SCORE,
            weights: FieldWeights::default(),
        }
    }
}

impl FuzzyConfig {
    /// Validates thresholds and weights.
    ///
    /// # Errors
    /// - `threshold` or `maxScore` outside `0.0..=1.0`
    /// - any weight negative or non-finite, or all weights zero
    ///
    /// # Warnings
    /// - weights that do not sum to 1.0 (they are normalized at index time)
    /// - `threshold > 0.6`: almost any field will match
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        let mut warnings = Vec::new();

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(QmatchError::InvalidConfiguration {
                message: format!(
                    "matcher.fuzzy.threshold={} must be within 0.0..=1.0",
                    self.threshold
                ),
                hint: format!("Set threshold to a small value (default: {})", DEFAULT_FUZZY_THRESHOLD),
            });
        }

        if !(0.0..=1.0).contains(&self.max_score) {
            return Err(QmatchError::InvalidConfiguration {
                message: format!(
                    "matcher.fuzzy.maxScore={} must be within 0.0..=1.0",
                    self.max_score
                ),
                hint: format!("Set maxScore to a value below 1.0 (default: {})", DEFAULT_FUZZY_MAX_SCORE),
            });
        }

        let w = &self.weights;
        for (name, value) in [
            ("question", w.question),
            ("keywords", w.keywords),
            ("answer", w.answer),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(QmatchError::InvalidConfiguration {
                    message: format!("matcher.fuzzy.weights.{}={} must be >= 0.0", name, value),
                    hint: "Use non-negative weights, e.g. question 0.4, keywords 0.4, answer 0.2"
                        .to_string(),
                });
            }
        }

        let sum = w.sum();
        if sum <= 0.0 {
            return Err(QmatchError::InvalidConfiguration {
                message: "matcher.fuzzy.weights are all zero".to_string(),
                hint: "Give at least one field a positive weight".to_string(),
            });
        }

        if (sum - 1.0).abs() > 1e-6 {
            warnings.push(format!(
                "matcher.fuzzy.weights sum to {:.3}, not 1.0; they will be normalized",
                sum
            ));
        }

        if self.threshold > 0.6 {
            warnings.push(format!(
                "matcher.fuzzy.threshold={} is very permissive; unrelated entries will match",
                self.threshold
            ));
        }

        Ok(warnings)
    }
}

/// Per-field weights for the fuzzy index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldWeights {
    /// Weight of the canonical question.
    #[serde(default = "default_question_weight")]
    pub question: f64,

    /// Weight of each keyword.
    #[serde(default = "default_keywords_weight")]
    pub keywords: f64,

    /// Weight of the answer text.
    #[serde(default = "default_answer_weight")]
    pub answer: f64,
}

fn default_question_weight() -> f64 {
    DEFAULT_QUESTION_WEIGHT
}
fn default_keywords_weight() -> f64 {
    DEFAULT_KEYWORDS_WEIGHT
}
fn default_answer_weight() -> f64 {
    DEFAULT_ANSWER_WEIGHT
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            question: DEFAULT_QUESTION_WEIGHT,
            keywords: DEFAULT_KEYWORDS_WEIGHT,
            answer: DEFAULT_ANSWER_WEIGHT,
        }
    }
}

impl FieldWeights {
    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.question + self.keywords + self.answer
    }

    /// Weights scaled so they sum to 1.0. Callers must validate first.
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            question: self.question / sum,
            keywords: self.keywords / sum,
            answer: self.answer / sum,
        }
    }
}

// ============================================================================
// KeywordConfig / PartialConfig
// ============================================================================

/// Multi-keyword overlap configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordConfig {
    /// Minimum query word length (in chars) to be scored.
    #[serde(default = "default_keyword_min_word_length")]
    pub min_word_length: usize,

    /// The best entry's score must exceed this.
    #[serde(default = "default_keyword_min_score")]
    pub min_score: usize,
}

fn default_keyword_min_word_length() -> usize {
    DEFAULT_KEYWORD_MIN_WORD_LENGTH
}
fn default_keyword_min_score() -> usize {
    DEFAULT_KEYWORD_MIN_SCORE
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_word_length: DEFAULT_KEYWORD_MIN_WORD_LENGTH,
            min_score: DEFAULT_KEYWORD_MIN_SCORE,
        }
    }
}

impl KeywordConfig {
    /// Validates the keyword stage configuration.
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        if self.min_word_length == 0 {
            return Err(QmatchError::InvalidConfiguration {
                message: "matcher.keyword.minWordLength cannot be 0".to_string(),
                hint: format!(
                    "Set minWordLength to at least 1 (default: {})",
                    DEFAULT_KEYWORD_MIN_WORD_LENGTH
                ),
            });
        }

        let mut warnings = Vec::new();
        if self.min_score == 0 {
            warnings.push(
                "matcher.keyword.minScore=0 accepts any single overlapping word".to_string(),
            );
        }
        Ok(warnings)
    }
}

/// Partial substring stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    /// Minimum query word length (in chars) to be tried.
    #[serde(default = "default_partial_min_word_length")]
    pub min_word_length: usize,
}

fn default_partial_min_word_length() -> usize {
    DEFAULT_PARTIAL_MIN_WORD_LENGTH
}

impl Default for PartialConfig {
    fn default() -> Self {
        Self {
            min_word_length: DEFAULT_PARTIAL_MIN_WORD_LENGTH,
        }
    }
}

impl PartialConfig {
    /// Validates the partial stage configuration.
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        if self.min_word_length == 0 {
            return Err(QmatchError::InvalidConfiguration {
                message: "matcher.partial.minWordLength cannot be 0".to_string(),
                hint: format!(
                    "Set minWordLength to at least 1 (default: {})",
                    DEFAULT_PARTIAL_MIN_WORD_LENGTH
                ),
            });
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert!(config.corpus.is_none());
        assert!(config.seed.is_none());
        assert_eq!(config.matcher.fuzzy.threshold, 0.2);
        assert_eq!(config.matcher.fuzzy.max_score, 0.3);
        assert_eq!(config.matcher.keyword.min_score, 8);
        assert_eq!(config.matcher.partial.min_word_length, 4);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = GlobalConfig::from_path(&tmp.path().join("nope.yaml")).unwrap();
        assert_eq!(config.matcher, MatcherConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
seed: 7
matcher:
  fuzzy:
    maxScore: 0.25
  keyword:
    minScore: 10
"#;
        let config = GlobalConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.matcher.fuzzy.max_score, 0.25);
        assert_eq!(config.matcher.fuzzy.threshold, DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(config.matcher.fuzzy.weights, FieldWeights::default());
        assert_eq!(config.matcher.keyword.min_score, 10);
        assert_eq!(config.matcher.keyword.min_word_length, 3);
    }

    #[test]
    fn test_from_path_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "corpus: /tmp/pack.json\n").unwrap();
        let config = GlobalConfig::from_path(&path).unwrap();
        assert_eq!(config.corpus, Some(PathBuf::from("/tmp/pack.json")));
    }

    #[test]
    fn test_from_path_resolves_relative_corpus() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "corpus: packs/faq.yaml\n").unwrap();
        let config = GlobalConfig::from_path(&path).unwrap();
        assert_eq!(config.corpus, Some(tmp.path().join("packs/faq.yaml")));
    }

    #[test]
    fn test_from_path_expands_home_in_corpus() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "corpus: ~/packs/portfolio.yaml\n").unwrap();
        let config = GlobalConfig::from_path(&path).unwrap();
        assert_eq!(config.corpus, Some(home.join("packs/portfolio.yaml")));
    }

    #[test]
    fn test_resolve_corpus_path() {
        let home = Path::new("/home/ada");
        let base = Path::new("/etc/qmatch");

        assert_eq!(
            resolve_corpus_path(Path::new("~/faq.yaml"), Some(home), Some(base)),
            PathBuf::from("/home/ada/faq.yaml")
        );
        assert_eq!(
            resolve_corpus_path(Path::new("~"), Some(home), Some(base)),
            PathBuf::from("/home/ada")
        );
        assert_eq!(
            resolve_corpus_path(Path::new("faq.yaml"), Some(home), Some(base)),
            PathBuf::from("/etc/qmatch/faq.yaml")
        );
        assert_eq!(
            resolve_corpus_path(Path::new("/srv/faq.yaml"), Some(home), Some(base)),
            PathBuf::from("/srv/faq.yaml")
        );
        // no home directory: the tilde stays literal and is treated as relative
        assert_eq!(
            resolve_corpus_path(Path::new("~/faq.yaml"), None, Some(base)),
            PathBuf::from("/etc/qmatch/~/faq.yaml")
        );
        assert_eq!(
            resolve_corpus_path(Path::new("~bob/faq.yaml"), Some(home), None),
            PathBuf::from("~bob/faq.yaml")
        );
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let err = GlobalConfig::from_yaml_str("matcher: [1, 2").unwrap_err();
        assert!(matches!(err, QmatchError::InvalidGlobalConfig(_)));
    }

    #[test]
    fn test_threshold_out_of_range_is_error() {
        let err = GlobalConfig::from_yaml_str("matcher:\n  fuzzy:\n    threshold: 1.5\n")
            .unwrap_err();
        assert!(matches!(err, QmatchError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_zero_weights_is_error() {
        let config = FuzzyConfig {
            weights: FieldWeights {
                question: 0.0,
                keywords: 0.0,
                answer: 0.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_weight_is_error() {
        let config = FuzzyConfig {
            weights: FieldWeights {
                question: -0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unnormalized_weights_warn_and_normalize() {
        let config = FuzzyConfig {
            weights: FieldWeights {
                question: 2.0,
                keywords: 2.0,
                answer: 1.0,
            },
            ..Default::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        let n = config.weights.normalized();
        assert!((n.question - 0.4).abs() < 1e-9);
        assert!((n.answer - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_word_length_is_error() {
        let keyword = KeywordConfig {
            min_word_length: 0,
            ..Default::default()
        };
        assert!(keyword.validate().is_err());
        let partial = PartialConfig { min_word_length: 0 };
        assert!(partial.validate().is_err());
    }
}

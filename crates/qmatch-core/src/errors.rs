//! Error types for qmatch-core.
//!
//! Matching itself never fails: every query ends in an answer or a fallback.
//! These errors are raised while loading configuration and knowledge packs,
//! i.e. before an engine exists.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for qmatch operations.
#[derive(Error, Debug)]
pub enum QmatchError {
    /// Global configuration file is invalid.
    #[error("Global config invalid: {0}")]
    InvalidGlobalConfig(String),

    /// A configuration value is invalid.
    ///
    /// Used for validation errors detected at load time (e.g., threshold > 1.0).
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    // =========================================================================
    // Knowledge Pack Errors
    // =========================================================================
    /// Failed to read a knowledge pack file.
    #[error("Knowledge pack I/O error at `{path}`: {message}")]
    PackIo {
        /// Path to the pack file.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// Failed to parse a knowledge pack file.
    #[error("Knowledge pack parse error at `{path}`: {message}")]
    PackParse {
        /// Path to the pack file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// The pack file extension is not one of json/yaml/yml.
    #[error("Unsupported knowledge pack format `{path}`. Use a .json, .yaml or .yml file.")]
    UnsupportedPackFormat {
        /// Path to the pack file.
        path: PathBuf,
    },

    /// Two corpus entries share the same id.
    #[error("Duplicate corpus entry id {0}.")]
    DuplicateEntryId(u32),

    /// A corpus entry is malformed (empty question, answer or category).
    #[error("Corpus entry {id} is invalid: {reason}")]
    InvalidEntry {
        /// The offending entry id.
        id: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// Intent patterns or contextual rules point at categories the corpus does not have.
    #[error("Unknown categories referenced: {}", .references.join(", "))]
    MissingCategories {
        /// One line per dangling reference, e.g. "intent #3 -> `aws`".
        references: Vec<String>,
    },

    /// An intent or fallback topic regex does not compile.
    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The regex source.
        pattern: String,
        /// Compiler error message.
        reason: String,
    },

    /// The fallback templates are unusable.
    #[error("Invalid fallback templates: {0}")]
    InvalidFallback(String),

    /// The pack is structurally incomplete (no entries, no greetings, ...).
    #[error("Invalid knowledge pack: {0}")]
    InvalidPack(String),

    // =========================================================================
    // Transcript Errors
    // =========================================================================
    /// Failed to write a conversation transcript.
    #[error("Failed to write transcript at `{path}`: {message}")]
    TranscriptWrite {
        /// Destination path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

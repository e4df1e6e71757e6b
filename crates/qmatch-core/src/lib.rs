//! # qmatch-core
//!
//! **Query matcher** – core engine library.
//!
//! This crate turns free-text questions into the best pre-authored answer
//! from a small FAQ corpus. Matching runs as a cascade of stages, from the
//! most specific to the most forgiving, and always ends with an answer.
//! It is designed to be consumed by the `qmatch` CLI and other Rust tools.
//!
//! ## Main Types
//!
//! - [`MatchEngine`] – the entry point; owns the corpus and compiled stages
//! - [`KnowledgePack`] – the on-disk document an engine is built from
//! - [`Conversation`] – a chat transcript driven by an engine
//! - [`QmatchError`] – domain-specific error type (load time only)
//!
//! ## Modules
//!
//! - [`config`] – configuration types (GlobalConfig, MatcherConfig)
//! - [`corpus`] – knowledge pack loading and validation
//! - [`normalize`] – corrections and synonym expansion
//! - [`fuzzy`] – weighted approximate-substring search
//! - [`stages`] – intent, context, keyword, partial and fallback stages
//! - [`engine`] – the MatchEngine pipeline
//!
//! ## Example
//!
//! ```ignore
//! use qmatch_core::{Conversation, MatchEngine};
//!
//! let engine = MatchEngine::builtin()?;
//! let mut chat = Conversation::open(&engine);
//! if let Some(reply) = chat.ask(&engine, "tel me about ur aws experiance") {
//!     println!("{}", reply.text);
//! }
//! ```

// Modules
pub mod browse;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod fuzzy;
pub mod normalize;
pub mod stages;

// Re-exports for convenience
pub use browse::{BrowseFilter, CategoryGroup};
pub use config::{FieldWeights, FuzzyConfig, GlobalConfig, KeywordConfig, MatcherConfig, PartialConfig};
pub use conversation::{ChatMessage, Conversation};
pub use corpus::{Corpus, CorpusEntry, KnowledgePack};
pub use engine::{MatchEngine, MatchOutcome};
pub use errors::QmatchError;
pub use normalize::{NormalizedQuery, Normalizer};
pub use stages::Stage;

//! Matcher pipeline stages.
//!
//! Each stage is a small, independently testable matcher. The engine runs
//! them in precedence order and stops at the first confident result:
//!
//! 1. [`intent`]: regex intent patterns, highest priority first
//! 2. weighted fuzzy search (see [`crate::fuzzy`])
//! 3. [`context`]: ordered boolean containment rules
//! 4. [`keyword`]: multi-keyword overlap scoring
//! 5. [`keyword`]: partial keyword substring match
//! 6. [`fallback`]: topic-aware canned reply, never fails

pub mod context;
pub mod fallback;
pub mod intent;
pub mod keyword;

use serde::{Deserialize, Serialize};

/// The stage that produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Intent,
    Fuzzy,
    Context,
    Keyword,
    Partial,
    Fallback,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 6] = [
        Stage::Intent,
        Stage::Fuzzy,
        Stage::Context,
        Stage::Keyword,
        Stage::Partial,
        Stage::Fallback,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intent => "intent",
            Stage::Fuzzy => "fuzzy",
            Stage::Context => "context",
            Stage::Keyword => "keyword",
            Stage::Partial => "partial",
            Stage::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Fallback reply generation.
//!
//! The last pipeline stage. It classifies the query against a few topic
//! regexes and returns that topic's canned message, or else a generic
//! "didn't understand" message with one randomly chosen example prompt.
//! Every message carries the contact address, so a user who reaches this
//! stage always has somewhere to go.

use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::constants::{CONTACT_PLACEHOLDER, PROMPT_PLACEHOLDER};
use crate::errors::QmatchError;

// ============================================================================
// Templates (pack format)
// ============================================================================

/// A topic-specific fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackTopic {
    /// Short label, reported in match explanations.
    pub name: String,
    /// Case-insensitive regex tested against the normalized query.
    pub pattern: String,
    /// Reply text; `{contact}` is substituted.
    pub message: String,
}

/// Fallback templates as written in a knowledge pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackTemplates {
    /// Contact address included in every fallback.
    pub contact: String,
    /// Topic fallbacks, tried in order.
    #[serde(default)]
    pub topics: Vec<FallbackTopic>,
    /// Example prompts substituted for `{prompt}` in the generic message.
    #[serde(default)]
    pub prompts: Vec<String>,
    /// Generic reply; `{prompt}` and `{contact}` are substituted.
    pub generic: String,
}

impl FallbackTemplates {
    /// Check that every rendered message will include the contact address.
    ///
    /// # Errors
    /// - empty contact, topic name or topic pattern
    /// - a topic or generic message that neither uses `{contact}` nor spells the address out
    /// - a generic message using `{prompt}` with no prompts to choose from
    ///
    /// # Warnings
    /// - prompts are defined but the generic message has no `{prompt}`
    pub fn validate(&self) -> Result<Vec<String>, QmatchError> {
        let mut warnings = Vec::new();
        let contact = self.contact.trim();

        if contact.is_empty() {
            return Err(QmatchError::InvalidFallback(
                "`contact` is empty".to_string(),
            ));
        }

        let carries_contact =
            |text: &str| text.contains(CONTACT_PLACEHOLDER) || text.contains(contact);

        for (i, topic) in self.topics.iter().enumerate() {
            if topic.name.trim().is_empty() || topic.pattern.trim().is_empty() {
                return Err(QmatchError::InvalidFallback(format!(
                    "topic #{} needs both a name and a pattern",
                    i + 1
                )));
            }
            if !carries_contact(&topic.message) {
                return Err(QmatchError::InvalidFallback(format!(
                    "topic `{}` message does not include {} or the contact address",
                    topic.name, CONTACT_PLACEHOLDER
                )));
            }
        }

        if !carries_contact(&self.generic) {
            return Err(QmatchError::InvalidFallback(format!(
                "generic message does not include {} or the contact address",
                CONTACT_PLACEHOLDER
            )));
        }

        let uses_prompt = self.generic.contains(PROMPT_PLACEHOLDER);
        let has_prompts = self.prompts.iter().any(|p| !p.trim().is_empty());
        if uses_prompt && !has_prompts {
            return Err(QmatchError::InvalidFallback(format!(
                "generic message uses {} but no prompts are defined",
                PROMPT_PLACEHOLDER
            )));
        }
        if !uses_prompt && has_prompts {
            warnings.push(format!(
                "fallback prompts are defined but the generic message has no {}",
                PROMPT_PLACEHOLDER
            ));
        }

        Ok(warnings)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// A generated fallback reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallback {
    /// Topic that matched, or `None` for the generic message.
    pub topic: Option<String>,
    /// Prompt substituted into the generic message.
    pub prompt: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
struct CompiledTopic {
    name: String,
    regex: Regex,
    message: String,
}

/// Compiled fallback templates.
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    contact: String,
    topics: Vec<CompiledTopic>,
    prompts: Vec<String>,
    generic: String,
}

impl FallbackGenerator {
    /// Compile topic regexes and pre-render the contact address.
    ///
    /// # Errors
    ///
    /// Returns [`QmatchError::InvalidPattern`] for a topic regex that does not compile.
    pub fn new(templates: &FallbackTemplates) -> Result<Self, QmatchError> {
        let contact = templates.contact.trim().to_string();

        let topics = templates
            .topics
            .iter()
            .map(|t| {
                let regex = RegexBuilder::new(&t.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| QmatchError::InvalidPattern {
                        pattern: t.pattern.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(CompiledTopic {
                    name: t.name.clone(),
                    regex,
                    message: t.message.replace(CONTACT_PLACEHOLDER, &contact),
                })
            })
            .collect::<Result<Vec<_>, QmatchError>>()?;

        Ok(Self {
            topics,
            prompts: templates
                .prompts
                .iter()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .collect(),
            generic: templates.generic.replace(CONTACT_PLACEHOLDER, &contact),
            contact,
        })
    }

    /// The contact address every message carries.
    pub fn contact(&self) -> &str {
        &self.contact
    }

    /// Example prompts for the generic message.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Name of the first topic whose regex matches `query`.
    pub fn classify(&self, query: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.regex.is_match(query))
            .map(|t| t.name.as_str())
    }

    /// Produce the fallback for `query`, drawing from `rng` only for the generic message.
    pub fn generate<R: Rng + ?Sized>(&self, query: &str, rng: &mut R) -> Fallback {
        if let Some(topic) = self.topics.iter().find(|t| t.regex.is_match(query)) {
            return Fallback {
                topic: Some(topic.name.clone()),
                prompt: None,
                message: topic.message.clone(),
            };
        }

        let prompt = self.prompts.choose(rng).cloned();
        let message = self
            .generic
            .replace(PROMPT_PLACEHOLDER, prompt.as_deref().unwrap_or_default());

        Fallback {
            topic: None,
            prompt,
            message,
        }
    }
}

//! Conversation transcript.
//!
//! A [`Conversation`] is the message list a chat front end renders: it
//! opens with a greeting and then alternates user messages and replies.
//! Transcripts export as JSON lines, one [`ChatMessage`] per line.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::MatchEngine;
use crate::errors::QmatchError;

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    /// `true` for the user's messages, `false` for replies.
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A message typed by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    /// A reply from the engine.
    pub fn reply(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    fn new(text: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            is_user,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered message history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// An empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation seeded with one greeting from `engine`.
    pub fn open(engine: &MatchEngine) -> Self {
        Self {
            messages: vec![ChatMessage::reply(engine.greeting())],
        }
    }

    /// Record `text` and the engine's reply; returns the reply.
    ///
    /// Blank input is ignored and returns `None`.
    pub fn ask(&mut self, engine: &MatchEngine, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(text));
        self.messages.push(ChatMessage::reply(engine.find_answer(text)));
        self.messages.last()
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if nothing has been said.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize as JSON lines.
    pub fn to_jsonl(&self) -> Result<String, QmatchError> {
        let mut out = String::new();
        for message in &self.messages {
            out.push_str(&serde_json::to_string(message)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the transcript as JSON lines to `path`, replacing any existing file.
    pub fn write_jsonl(&self, path: &Path) -> Result<(), QmatchError> {
        let content = self.to_jsonl()?;
        let to_err = |e: std::io::Error| QmatchError::TranscriptWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_err)?;
        }
        let mut file = fs::File::create(path).map_err(to_err)?;
        file.write_all(content.as_bytes()).map_err(to_err)?;
        tracing::debug!(
            "Wrote {} messages to {}",
            self.messages.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine() -> MatchEngine {
        MatchEngine::builtin().unwrap().with_seed(11)
    }

    #[test]
    fn test_open_starts_with_greeting() {
        let e = engine();
        let convo = Conversation::open(&e);
        assert_eq!(convo.len(), 1);
        let first = &convo.messages()[0];
        assert!(!first.is_user);
        assert!(e.corpus().greetings().contains(&first.text));
    }

    #[test]
    fn test_ask_appends_user_and_reply() {
        let e = engine();
        let mut convo = Conversation::open(&e);
        let reply = convo.ask(&e, "What are your strengths?").unwrap().clone();
        assert!(!reply.is_user);
        assert_eq!(reply.text, e.find_answer("What are your strengths?"));
        assert_eq!(convo.len(), 3);
        assert!(convo.messages()[1].is_user);
        assert_eq!(convo.messages()[1].text, "What are your strengths?");
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let e = engine();
        let mut convo = Conversation::new();
        assert!(convo.ask(&e, "  \n").is_none());
        assert!(convo.is_empty());
    }

    #[test]
    fn test_jsonl_export() {
        let e = engine();
        let mut convo = Conversation::open(&e);
        convo.ask(&e, "how can i contact you?");

        let jsonl = convo.to_jsonl().unwrap();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 3);
        let parsed: ChatMessage = serde_json::from_str(lines[1]).unwrap();
        assert!(parsed.is_user);
        assert!(lines[1].contains("\"isUser\":true"));

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("chat.jsonl");
        convo.write_jsonl(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), jsonl);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = ChatMessage::user("x");
        let b = ChatMessage::user("x");
        assert_ne!(a.id, b.id);
    }
}

//! Message styling for CLI output.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[hint]` | Suggestion | Cyan |

use owo_colors::OwoColorize;

use qmatch_core::Stage;

use super::color::ColorMode;

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Ok,
    Err,
    Warn,
    Info,
    Hint,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Hint => "[hint]",
        }
    }
}

/// Main styling interface for CLI output.
///
/// # Example
///
/// ```
/// use qmatch_cli::ui::{Style, MessageType, ColorMode};
///
/// let style = Style::new(ColorMode::Never);
/// println!("{}", style.message(MessageType::Ok, "Knowledge pack is valid"));
/// ```
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Default for Style {
    fn default() -> Self {
        Self::new(ColorMode::Auto)
    }
}

impl Style {
    /// Create a Style instance with an explicit color mode.
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// Format a simple message with a type prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use qmatch_cli::ui::{Style, MessageType, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// assert_eq!(style.message(MessageType::Ok, "Done"), "[ok] Done");
    /// ```
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Hint => prefix.cyan().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Format a section header.
    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format a structured error with optional cause and hint.
    ///
    /// # Example
    ///
    /// ```
    /// use qmatch_cli::ui::{Style, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// let output = style.error_with_context(
    ///     "Failed to load knowledge pack",
    ///     Some("expected value at line 1 column 1"),
    ///     Some("Check the file passed to --corpus"),
    /// );
    /// assert!(output.contains("[err] Failed to load knowledge pack"));
    /// assert!(output.contains("Cause: expected value"));
    /// assert!(output.contains("Hint: Check the file"));
    /// ```
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);

        if let Some(cause_text) = cause {
            output.push('\n');
            output.push_str(&format!("      Cause: {}", cause_text));
        }

        if let Some(hint_text) = hint {
            output.push('\n');
            output.push_str(&format!("      Hint: {}", hint_text));
        }

        output
    }

    /// Format a list item with a prefix marker.
    pub fn list_item(&self, prefix: &str, text: &str) -> String {
        let styled_prefix = if self.colors_enabled() {
            prefix.dimmed().to_string()
        } else {
            prefix.to_string()
        };
        format!("  {} {}", styled_prefix, text)
    }

    /// Format a key-value pair with a dimmed key.
    ///
    /// ```
    /// use qmatch_cli::ui::{Style, ColorMode};
    ///
    /// let style = Style::new(ColorMode::Never);
    /// assert_eq!(style.key_value("Stage", "fuzzy"), "Stage: fuzzy");
    /// ```
    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.colors_enabled() {
            format!("{}: {}", key.dimmed(), value)
        } else {
            format!("{}: {}", key, value)
        }
    }

    /// Stage name, colored by how specific the stage is.
    ///
    /// Rule-based stages are green, scored stages yellow, fallback red.
    pub fn stage(&self, stage: Stage) -> String {
        let name = stage.as_str();
        if !self.colors_enabled() {
            return name.to_string();
        }
        match stage {
            Stage::Intent | Stage::Context => name.green().to_string(),
            Stage::Fuzzy | Stage::Keyword | Stage::Partial => name.yellow().to_string(),
            Stage::Fallback => name.red().to_string(),
        }
    }

    /// Category name (cyan).
    pub fn category(&self, category: &str) -> String {
        if self.colors_enabled() {
            category.cyan().to_string()
        } else {
            category.to_string()
        }
    }

    /// File path (cyan).
    pub fn file_path(&self, path: &str) -> String {
        if self.colors_enabled() {
            path.cyan().to_string()
        } else {
            path.to_string()
        }
    }

    /// Chat speaker label: `you>` for the user, `bot>` for replies.
    pub fn speaker(&self, is_user: bool) -> String {
        let label = if is_user { "you>" } else { "bot>" };
        if !self.colors_enabled() {
            return label.to_string();
        }
        if is_user {
            label.bold().to_string()
        } else {
            label.magenta().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_prefix() {
        assert_eq!(MessageType::Ok.prefix(), "[ok]");
        assert_eq!(MessageType::Err.prefix(), "[err]");
        assert_eq!(MessageType::Warn.prefix(), "[warn]");
        assert_eq!(MessageType::Info.prefix(), "[info]");
        assert_eq!(MessageType::Hint.prefix(), "[hint]");
    }

    #[test]
    fn test_message_no_color() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.message(MessageType::Ok, "Success"), "[ok] Success");
        assert_eq!(style.message(MessageType::Warn, "Careful"), "[warn] Careful");
    }

    #[test]
    fn test_error_with_context() {
        let style = Style::new(ColorMode::Never);
        let output = style.error_with_context("Bad pack", Some("duplicate id 3"), None);
        assert_eq!(output, "[err] Bad pack\n      Cause: duplicate id 3");
    }

    #[test]
    fn test_stage_plain() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.stage(Stage::Context), "context");
        assert_eq!(style.stage(Stage::Fallback), "fallback");
    }

    #[test]
    fn test_stage_colored_keeps_name() {
        let style = Style::new(ColorMode::Always);
        let styled = style.stage(Stage::Fuzzy);
        assert!(styled.contains("fuzzy"));
        assert_ne!(styled, "fuzzy");
    }

    #[test]
    fn test_speaker_labels() {
        let style = Style::new(ColorMode::Never);
        assert_eq!(style.speaker(true), "you>");
        assert_eq!(style.speaker(false), "bot>");
        assert_eq!(style.list_item("-", "Who are you?"), "  - Who are you?");
    }
}

//! Formatting utilities for CLI output.
//!
//! Provides word wrapping for answers, truncation for table cells and
//! score formatting.

/// Truncate a string to at most `max_len` characters, ending with `...`.
///
/// # Examples
///
/// ```
/// use qmatch_cli::ui::format::truncate_str;
///
/// assert_eq!(truncate_str("hello", 10), "hello");
/// assert_eq!(truncate_str("hello world", 8), "hello...");
/// ```
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{}...", kept)
}

/// Greedy word wrap of `text` to `width` columns.
///
/// Each output line is prefixed with `indent`. Words longer than the
/// available width are placed on their own line unbroken. Existing line
/// breaks are kept.
pub fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let available = width.saturating_sub(indent.chars().count()).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > available {
                lines.push(format!("{}{}", indent, line));
                line.clear();
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.push_str(word);
            line_len += word_len;
        }

        lines.push(format!("{}{}", indent, line));
    }

    lines.join("\n")
}

/// Match score with three decimals, or `-` for stages that do not score.
///
/// Fuzzy scores are distances (lower is better); keyword scores are
/// overlap totals (higher is better).
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.3}", s),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hello world", 5), "he...");
        assert_eq!(truncate_str("hello", 3), "...");
    }

    #[test]
    fn test_truncate_str_unicode() {
        assert_eq!(truncate_str("naïve café olé", 8), "naïve...");
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("one two three four five", 10, "");
        assert_eq!(wrapped, "one two\nthree four\nfive");
    }

    #[test]
    fn test_wrap_text_indent_and_long_word() {
        let wrapped = wrap_text("a supercalifragilistic b", 10, "  ");
        assert_eq!(wrapped, "  a\n  supercalifragilistic\n  b");
    }

    #[test]
    fn test_wrap_text_keeps_paragraphs() {
        assert_eq!(wrap_text("first\nsecond", 80, ""), "first\nsecond");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(0.04321)), "0.043");
        assert_eq!(format_score(Some(50.0)), "50.000");
        assert_eq!(format_score(None), "-");
    }
}

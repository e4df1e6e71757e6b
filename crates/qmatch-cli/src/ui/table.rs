//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `qmatch corpus show` | `render_entries_table()` |
//! | `qmatch corpus check` | `render_pack_summary()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use qmatch_core::CorpusEntry;

use super::format::truncate_str;

/// One labelled count in a pack summary.
#[derive(Debug, Clone)]
pub struct CountRow {
    pub label: &'static str,
    pub count: usize,
}

impl CountRow {
    pub fn new(label: &'static str, count: usize) -> Self {
        Self { label, count }
    }
}

/// Render the corpus as a table for `qmatch corpus show`.
///
/// Questions are truncated to fit `width`; keywords are comma-joined and
/// truncated after the question column is sized.
///
/// # Example Output
///
/// ```text
/// ID  CATEGORY      QUESTION                              KEYWORDS
///  1  introduction  Who are you?                          about, who, introduction
///  2  skills        What are your technical skills?       skills, technologies
/// ```
pub fn render_entries_table(entries: &[CorpusEntry], width: usize) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("ID").set_alignment(CellAlignment::Right),
        Cell::new("CATEGORY"),
        Cell::new("QUESTION"),
        Cell::new("KEYWORDS"),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(4)),  // ID
        ColumnConstraint::LowerBoundary(Width::Fixed(10)), // CATEGORY
        ColumnConstraint::LowerBoundary(Width::Fixed(20)), // QUESTION
        ColumnConstraint::LowerBoundary(Width::Fixed(10)), // KEYWORDS
    ]);

    // Split what is left after ID and CATEGORY between the two text columns
    let text_width = width.saturating_sub(4 + 18 + 6).max(30);
    let question_width = text_width * 3 / 5;
    let keywords_width = text_width - question_width;

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.id).set_alignment(CellAlignment::Right),
            Cell::new(truncate_str(&entry.category, 16)),
            Cell::new(truncate_str(&entry.question, question_width)),
            Cell::new(truncate_str(&entry.keywords.join(", "), keywords_width)),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render labelled counts for `qmatch corpus check`.
///
/// # Example Output
///
/// ```text
/// ENTRIES        24
/// CATEGORIES     24
/// INTENTS        19
/// ```
pub fn render_pack_summary(rows: &[CountRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(14)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.label),
            Cell::new(row.count).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

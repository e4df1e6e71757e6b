//! # CLI UI Module
//!
//! Styling and formatting layer for `qmatch` output.
//!
//! Human output is meant to be read at a glance; every command that prints
//! data also accepts `--json` for scripting. Colors honor `NO_COLOR` and are
//! disabled when stdout is not a terminal.
//!
//! ## Module Structure
//!
//! - `color`: Color mode detection and terminal width
//! - `style`: Message prefixes, stage labels and chat lines
//! - `format`: Text wrapping, truncation and score formatting
//! - `table`: Corpus and pack summary tables with comfy-table

pub mod color;
pub mod format;
pub mod style;
pub mod table;

pub use color::ColorMode;
pub use style::{MessageType, Style};

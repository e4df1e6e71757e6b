//! Color mode detection for CLI output.
//!
//! Respects the `NO_COLOR` environment variable and TTY detection.
//! See https://no-color.org/ for the NO_COLOR standard.

use std::io::IsTerminal;

use clap::ValueEnum;

/// Color output mode, selected with `--color` / `QMATCH_COLOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Always use colors, even when output is not a TTY.
    Always,
    /// Never use colors.
    Never,
    /// Use colors when stdout is a TTY and `NO_COLOR` is unset.
    #[default]
    Auto,
}

impl ColorMode {
    /// Check if colors should be used based on current mode.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => Self::should_auto_colorize(),
        }
    }

    fn should_auto_colorize() -> bool {
        // Any value of NO_COLOR disables colors, even an empty one
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }
        std::io::stdout().is_terminal()
    }
}

/// Width available for wrapped answer text.
///
/// Falls back to 80 columns when stdout is not a terminal, and never goes
/// below 40 so narrow panes still get readable lines.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
        .max(40)
}

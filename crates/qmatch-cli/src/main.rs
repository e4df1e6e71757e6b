//! # qmatch CLI
//!
//! Command-line interface for the query matcher.
//!
//! This binary answers questions against a knowledge pack using
//! `qmatch-core`, either one at a time (`qmatch ask`) or as a chat session
//! over stdin (`qmatch chat`). Run `qmatch --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}

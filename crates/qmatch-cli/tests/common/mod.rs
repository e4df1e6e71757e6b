//! Shared test utilities for qmatch-cli integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// A config path that never exists, so tests ignore `~/.qmatch/config.yaml`.
pub const NO_CONFIG: &str = "/nonexistent/qmatch/config.yaml";

/// A small valid knowledge pack.
pub const SMALL_PACK_YAML: &str = r#"
qna:
  - id: 1
    question: What is your favourite colour?
    keywords: [colour, blue]
    answer: Blue, always blue.
    category: colour
  - id: 2
    question: Do you like football?
    keywords: [football, weekend]
    answer: I play every Sunday.
    category: sport
greetings: [Hello!]
suggestions: ["Do you like football?"]
fallback:
  contact: owner@example.com
  generic: "Not sure. Mail {contact}."
"#;

/// Get a Command for the qmatch binary with a clean environment.
///
/// # Panics
///
/// Panics if the qmatch binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn qmatch_cmd() -> Command {
    let mut cmd = Command::cargo_bin("qmatch").expect("qmatch binary should exist");
    cmd.env("QMATCH_CONFIG", NO_CONFIG)
        .env("QMATCH_COLOR", "never")
        .env_remove("QMATCH_CORPUS")
        .env_remove("QMATCH_SEED")
        .env_remove("QMATCH_VERBOSE")
        .env_remove("QMATCH_QUIET");
    cmd
}

/// Write `content` to `dir/name` and return the full path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

//! Integration tests for `qmatch corpus` and `qmatch config`.

mod common;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{qmatch_cmd, write_file, SMALL_PACK_YAML};

const DUPLICATE_ID_PACK_JSON: &str = r#"{
  "qna": [
    {"id": 1, "question": "One?", "keywords": ["one"], "answer": "First.", "category": "a"},
    {"id": 1, "question": "Two?", "keywords": ["two"], "answer": "Second.", "category": "b"}
  ],
  "greetings": ["Hi"],
  "suggestions": ["One?"],
  "fallback": {"contact": "x@example.com", "generic": "Write to {contact}."}
}"#;

// ============================================================================
// corpus check / show
// ============================================================================

#[test]
fn test_corpus_check_builtin() {
    qmatch_cmd()
        .args(["corpus", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("builtin:portfolio"))
        .stdout(predicate::str::contains("ENTRIES"))
        .stdout(predicate::str::contains("24"))
        .stdout(predicate::str::contains("[ok] Knowledge pack is valid"));
}

#[test]
fn test_corpus_check_json() {
    let temp = TempDir::new().expect("create temp dir");
    let pack = write_file(temp.path(), "pack.yaml", SMALL_PACK_YAML);

    let output = qmatch_cmd()
        .args(["corpus", "check", "--json"])
        .arg(&pack)
        .output()
        .expect("run qmatch");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["valid"], true);
    assert_eq!(report["counts"]["entries"], 2);
    assert_eq!(report["counts"]["categories"], 2);
    assert_eq!(report["counts"]["greetings"], 1);
    assert_eq!(report["errors"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_corpus_check_reports_errors() {
    let temp = TempDir::new().expect("create temp dir");
    let pack = write_file(temp.path(), "dup.json", DUPLICATE_ID_PACK_JSON);

    qmatch_cmd()
        .args(["corpus", "check"])
        .arg(&pack)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Duplicate corpus entry id 1"))
        .stdout(predicate::str::contains("Knowledge pack has errors"))
        .stderr(predicate::str::contains("1 error(s) found"));
}

#[test]
fn test_corpus_check_unsupported_extension() {
    let temp = TempDir::new().expect("create temp dir");
    let pack = write_file(temp.path(), "pack.txt", SMALL_PACK_YAML);

    qmatch_cmd()
        .args(["corpus", "check"])
        .arg(&pack)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported knowledge pack format"));
}

#[test]
fn test_corpus_check_uses_corpus_flag() {
    let temp = TempDir::new().expect("create temp dir");
    let pack = write_file(temp.path(), "pack.yaml", SMALL_PACK_YAML);

    qmatch_cmd()
        .arg("--corpus")
        .arg(&pack)
        .args(["corpus", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pack.yaml"));
}

#[test]
fn test_corpus_show_table() {
    qmatch_cmd()
        .args(["corpus", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CATEGORY"))
        .stdout(predicate::str::contains("current-work"))
        .stdout(predicate::str::contains("24 entries in 24 categories"));
}

#[test]
fn test_corpus_show_refuses_invalid_pack() {
    let temp = TempDir::new().expect("create temp dir");
    let pack = write_file(temp.path(), "dup.json", DUPLICATE_ID_PACK_JSON);

    qmatch_cmd()
        .arg("--corpus")
        .arg(&pack)
        .args(["corpus", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[err]"));
}

// ============================================================================
// config check / show
// ============================================================================

#[test]
fn test_config_check_missing_file_uses_defaults() {
    qmatch_cmd()
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found, using defaults"))
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_check_valid_file() {
    let temp = TempDir::new().expect("create temp dir");
    let config = write_file(
        temp.path(),
        "config.yaml",
        "seed: 7\nmatcher:\n  fuzzy:\n    threshold: 0.25\n",
    );

    qmatch_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "check", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""exists": true"#))
        .stdout(predicate::str::contains(r#""valid": true"#));
}

#[test]
fn test_config_check_out_of_range_threshold() {
    let temp = TempDir::new().expect("create temp dir");
    let config = write_file(
        temp.path(),
        "config.yaml",
        "matcher:\n  fuzzy:\n    threshold: 2.0\n",
    );

    qmatch_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration has errors"))
        .stderr(predicate::str::contains("1 configuration error(s) found"));
}

#[test]
fn test_config_check_missing_corpus_file() {
    let temp = TempDir::new().expect("create temp dir");
    let config = write_file(temp.path(), "config.yaml", "corpus: /nonexistent/faq.yaml\n");

    qmatch_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("does not exist"));
}

#[test]
fn test_config_show_applies_overrides() {
    let temp = TempDir::new().expect("create temp dir");
    let config = write_file(
        temp.path(),
        "config.yaml",
        "seed: 7\nmatcher:\n  keyword:\n    minScore: 12\n",
    );

    let output = qmatch_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--seed", "42", "config", "show", "--json"])
        .output()
        .expect("run qmatch");
    assert!(output.status.success());

    let resolved: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(resolved["seed"], 42);
    assert_eq!(resolved["matcher"]["keyword"]["minScore"], 12);
    assert_eq!(resolved["matcher"]["keyword"]["minWordLength"], 3);
}

#[test]
fn test_config_invalid_yaml_blocks_ask() {
    let temp = TempDir::new().expect("create temp dir");
    let config = write_file(temp.path(), "config.yaml", "matcher: [not, a, map]\n");

    qmatch_cmd()
        .arg("--config")
        .arg(&config)
        .args(["ask", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Global config invalid"));
}

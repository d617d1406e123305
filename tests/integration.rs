use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_shmigrate")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Run against the fixtures and return the written output.
fn run_fixture(extra: &[&str]) -> (String, String) {
    let outfile = NamedTempFile::new().unwrap();
    let assert = cmd()
        .arg(fixture_path("nightly.sh"))
        .arg(fixture_path("keywords.txt"))
        .args(["-o", outfile.path().to_str().unwrap()])
        .args(extra)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    (std::fs::read_to_string(outfile.path()).unwrap(), stdout)
}

// -- editing --

#[test]
fn collapses_and_renumbers() {
    let (output, stdout) = run_fixture(&[]);
    assert!(output.contains("# if JobStep \"Section 4: Legacy extract\"; then"), "Got: {output}");
    assert!(output.contains("  # SubStep \"Section 4.2: Transfer\""), "Got: {output}");
    assert!(output.contains("if JobStep \"Section 1: Load staging\"; then"), "Got: {output}");
    assert!(output.contains("  SubStep \"Section 1.1: Prepare\""), "Got: {output}");
    assert!(output.contains("  SubStep \"Section 1.2: Load\""), "Got: {output}");
    assert!(output.contains("if JobStep \"Section 2: Publish\"; then"), "Got: {output}");
    assert!(output.contains("    # legacy_transfer \"$table\""), "Got: {output}");
    assert!(output.contains("  case \"$MODE\" in"), "Got: {output}");
    assert!(stdout.is_empty(), "Got: {stdout}");
}

#[test]
fn substitution_applies_to_commented_lines() {
    let (output, _) = run_fixture(&["--changelog", "off"]);
    assert!(output.contains("# load_war_extract() {"), "Got: {output}");
    assert!(!output.contains("bdi"), "Got: {output}");
}

#[test]
fn changelog_embedded_after_doc_block() {
    let (output, _) = run_fixture(&[]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "# ===== CHANGELOG SUMMARY =====");
    assert!(output.contains("# Keywords: legacy_export, legacy_transfer, legacy_publish"));
    assert!(output.contains("#   - Original Section 4 (line 13): Legacy extract"));
    assert!(output.contains("#   - Section 7 -> 1"));
    assert!(output.contains("#   - Section 9 -> 2"));
    assert!(output.contains("# Other blocks fully commented-out:"));
    assert!(output.contains("#   - function load_bdi_extract (line 8)"));
}

#[test]
fn changelog_print_mode() {
    let (output, stdout) = run_fixture(&["--changelog", "print"]);
    assert!(!output.contains("CHANGELOG SUMMARY"));
    assert!(stdout.starts_with("# ===== CHANGELOG SUMMARY ====="), "Got: {stdout}");
    assert!(stdout.contains("# ===== END OF CHANGELOG ====="));
}

#[test]
fn changelog_off() {
    let (output, stdout) = run_fixture(&["--changelog", "off"]);
    assert!(!output.contains("CHANGELOG"));
    assert!(stdout.is_empty());
}

#[test]
fn note_is_appended() {
    let (output, _) = run_fixture(&["--note", "migrated"]);
    assert!(output.contains("  # legacy_export --all -> migrated"), "Got: {output}");
}

#[test]
fn json_summary() {
    let (_, stdout) = run_fixture(&["--json", "--changelog", "off"]);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["lines_modified"], 6);
    assert_eq!(summary["sections_collapsed"], 1);
    assert_eq!(summary["sections_renumbered"], 2);
    assert_eq!(summary["substitutions"], 1);
}

#[test]
fn reindent_normalises_block_bodies() {
    let script = temp_file("if JobStep \"Section 1: A\"; then\nrun_a\nfi\n");
    let keywords = temp_file("nothing_matches\n");
    let outfile = NamedTempFile::new().unwrap();

    cmd()
        .arg(script.path())
        .arg(keywords.path())
        .args(["-o", outfile.path().to_str().unwrap()])
        .args(["--changelog", "off", "--reindent", "--indent-width", "2"])
        .assert()
        .success();

    let result = std::fs::read_to_string(outfile.path()).unwrap();
    assert_eq!(result, "if JobStep \"Section 1: A\"; then\n  run_a\nfi\n");
}

#[test]
fn default_output_path() {
    let dir = TempDir::new().unwrap();
    cmd()
        .current_dir(dir.path())
        .arg(fixture_path("nightly.sh"))
        .arg(fixture_path("keywords.txt"))
        .assert()
        .success();
    assert!(dir.path().join("modified.sh").exists());
}

// -- errors --

#[test]
fn missing_script_fails() {
    cmd()
        .arg("/nonexistent/job.sh")
        .arg(fixture_path("keywords.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn missing_keywords_file_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.sh");
    cmd()
        .arg(fixture_path("nightly.sh"))
        .arg("/nonexistent/keywords.txt")
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
    assert!(!out.exists());
}

#[test]
fn empty_keywords_fails() {
    let keywords = temp_file(" ,\n\n");
    cmd()
        .arg(fixture_path("nightly.sh"))
        .arg(keywords.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no keywords found"));
}

#[test]
fn unstructured_script_fails() {
    let script = temp_file("#!/bin/bash\necho hello\n");
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.sh");
    cmd()
        .arg(script.path())
        .arg(fixture_path("keywords.txt"))
        .args(["-o", out.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no structural blocks found"));
    assert!(!out.exists());
}

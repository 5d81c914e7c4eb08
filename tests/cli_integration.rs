#![cfg(unix)]

use assert_cmd::Command;
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const FIXTURE: &str = "tests/fixtures/compare_unit";

/// A `cargo` stand-in that fails the test suite whenever the `==` in
/// `same` has been flipped, and passes otherwise.
fn make_fake_cargo_dir() -> TempDir {
    use std::os::unix::fs::PermissionsExt;

    let td = TempDir::new().expect("TempDir should create");
    let cargo_path = td.path().join("cargo");
    let script = r#"#!/usr/bin/env bash
set -euo pipefail

if [[ "${1-}" != "test" ]]; then
  echo "fake cargo: only 'test' supported" >&2
  exit 2
fi

if [[ "${2-}" == "--break" ]]; then
  echo "error: could not compile \`compare_unit\` (lib test) due to 1 previous error" >&2
  exit 101
fi

if grep -q "a != b" lib.rs; then
  echo "test tests::same_values ... FAILED"
  echo "test result: FAILED. 0 passed; 1 failed"
  echo "error: test failed, to rerun pass \`--lib\`"
  exit 101
fi

echo "test result: ok. 1 passed; 0 failed"
exit 0
"#;

    fs::write(&cargo_path, script).expect("write fake cargo");
    let mut perms = fs::metadata(&cargo_path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&cargo_path, perms).unwrap();

    td
}

fn prepend_path(dir: &Path) -> OsString {
    let old = std::env::var_os("PATH").unwrap_or_default();

    std::env::join_paths(std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&old)))
        .expect("join PATH")
}

struct Run {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

fn run_op_mutant(args: &[&str]) -> Run {
    let fake_cargo = make_fake_cargo_dir();
    let new_path = prepend_path(fake_cargo.path());

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("op-mutant"));
    cmd.args(args)
        .env("PATH", new_path)
        .env("NO_COLOR", "1")
        .env("RUST_BACKTRACE", "0");

    let output = cmd.output().expect("command should run");
    Run {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn fixture_text() -> String {
    fs::read_to_string(Path::new(FIXTURE).join("lib.rs")).expect("read fixture")
}

#[test]
fn help_lists_subcommands() {
    let out = run_op_mutant(&["--help"]);

    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("scan"));
    assert!(out.stdout.contains("run"));
}

#[test]
fn run_reports_killed_and_surviving_mutants() {
    let before = fixture_text();
    let out = run_op_mutant(&["run", FIXTURE]);

    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    let tmp = Regex::new(r"(?m)^using .+ as a temporary directory$").unwrap();
    assert!(tmp.is_match(&out.stderr), "stderr: {}", out.stderr);
    assert!(out.stderr.contains("lib.rs has 2 mutation sites"));
    assert!(
        out.stderr.contains("lib.rs:2:7 killed"),
        "stderr: {}",
        out.stderr
    );
    assert!(out.stderr.contains("lib.rs:6:7 survived"));

    assert!(out.stdout.contains("mutants killed:   1"));
    assert!(out.stdout.contains("mutants survived: 1"));
    assert!(out.stdout.contains("--- surviving mutants (1 of 2) ---"));

    assert!(!out.stderr.contains("no Cargo.toml"));

    assert_eq!(fixture_text(), before, "original sources must not change");
}

#[test]
fn unit_without_manifest_is_flagged_for_cargo() {
    let unit = TempDir::new().unwrap();
    fs::write(unit.path().join("lib.rs"), fixture_text()).unwrap();
    let unit_path = unit.path().to_str().unwrap();

    let out = run_op_mutant(&["run", "--limit", "0", unit_path]);
    assert!(out.stderr.contains("no Cargo.toml in"), "stderr: {}", out.stderr);

    let out = run_op_mutant(&["run", "--limit", "0", "--program", "cargo-like", unit_path]);
    assert!(!out.stderr.contains("no Cargo.toml"));
}

#[test]
fn fail_on_survivors_exits_with_two() {
    let out = run_op_mutant(&["run", "--fail-on-survivors", FIXTURE]);

    assert_eq!(out.code, Some(2));
    assert!(out.stderr.contains("1 mutant(s) survived"));
}

#[test]
fn category_filter_limits_sites() {
    let out = run_op_mutant(&["run", "--categories", "logical,arithmetic", FIXTURE]);

    assert_eq!(out.code, Some(0));
    assert!(out.stderr.contains("lib.rs has 0 mutation sites"));
    assert!(out.stdout.contains("mutants run:      0"));
}

#[test]
fn passthrough_args_reach_the_verifier() {
    let out = run_op_mutant(&["run", "--no-baseline", FIXTURE, "--", "--break"]);

    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);
    let errored = Regex::new(r"lib\.rs:\d+:\d+ errored: error: could not compile").unwrap();
    assert_eq!(errored.find_iter(&out.stderr).count(), 2, "stderr: {}", out.stderr);
}

#[test]
fn failing_baseline_stops_before_mutating() {
    let out = run_op_mutant(&["run", FIXTURE, "--", "--break"]);

    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("baseline"), "stderr: {}", out.stderr);
    assert!(!out.stderr.contains("mutation sites"));
}

#[test]
fn limit_zero_runs_nothing() {
    let out = run_op_mutant(&["run", "--limit", "0", FIXTURE]);

    assert_eq!(out.code, Some(0));
    assert!(!out.stderr.contains("killed"));
    assert!(out.stdout.contains("mutants not run:  2"));
}

#[test]
fn json_report_is_machine_readable() {
    let out = run_op_mutant(&["run", "--json", FIXTURE]);

    assert_eq!(out.code, Some(0), "stderr: {}", out.stderr);

    let report: serde_json::Value = serde_json::from_str(&out.stdout).expect("stdout is JSON");
    assert_eq!(report["tool"], "op-mutant");
    assert_eq!(report["summary"]["killed"], 1);
    assert_eq!(report["summary"]["survived"], 1);
    assert_eq!(report["baseline"]["success"], true);

    let mutants = report["files"][0]["mutants"].as_array().unwrap();
    assert_eq!(mutants[0]["id"], "lib.rs:2:7");
    assert_eq!(mutants[0]["outcome"]["kind"], "killed");
    assert_eq!(mutants[1]["id"], "lib.rs:6:7");
    assert_eq!(mutants[1]["outcome"]["kind"], "survived");
}

#[test]
fn missing_unit_is_an_error() {
    let out = run_op_mutant(&["run", "tests/fixtures/does_not_exist"]);

    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("does_not_exist"), "stderr: {}", out.stderr);
}

#[test]
fn missing_unit_in_json_mode_still_prints_a_report() {
    let out = run_op_mutant(&["run", "--json", "tests/fixtures/does_not_exist"]);

    assert_eq!(out.code, Some(1));
    let report: serde_json::Value = serde_json::from_str(&out.stdout).expect("stdout is JSON");
    assert!(report["error"].as_str().unwrap().contains("does_not_exist"));
}

#[test]
fn scan_lists_sites_without_running() {
    let out = run_op_mutant(&["scan", FIXTURE]);

    assert_eq!(out.code, Some(0));
    assert!(out.stdout.contains("lib.rs has 2 mutation sites"));

    let site = Regex::new(r#"lib\.rs:2:7 \[\d+\.\.\d+\] comparison: "==" -> "!=""#).unwrap();
    assert!(site.is_match(&out.stdout), "stdout: {}", out.stdout);
    assert!(out.stdout.contains(r#"lib.rs:6:7"#));
    assert!(!out.stderr.contains("temporary directory"));
}

//! CLI integration tests for the `egs` binary.
//!
//! These tests exercise the command-line interface using `assert_cmd`,
//! which spawns the compiled binary as a subprocess and asserts on exit
//! code, stdout, and stderr. Two tiers:
//!
//! - **Validation tests**: help text, argument parsing, domain and ratio
//!   envelope enforcement. Exit codes must be nonzero for parse or domain
//!   errors and zero otherwise — including runs whose bound fails, which
//!   are reported outcomes, not errors.
//! - **End-to-end tests**: small single runs (proved and failed), log
//!   verification, dump output, searches, and a hint-file round trip
//!   through a temporary directory.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test cli_tests
//! ```

use assert_cmd::Command;
use predicates::prelude::*;

/// Constructs a `Command` targeting the compiled `egs` binary.
#[allow(deprecated)]
fn egs() -> Command {
    Command::cargo_bin("egs").unwrap()
}

// == Help and argument validation =============================================

#[test]
fn help_documents_the_surface() {
    egs().arg("--help").assert().success().stdout(
        predicate::str::contains("--ratio")
            .and(predicate::str::contains("--fast"))
            .and(predicate::str::contains("--exhaustive"))
            .and(predicate::str::contains("--hints"))
            .and(predicate::str::contains("--create-hints"))
            .and(predicate::str::contains("--cutoff"))
            .and(predicate::str::contains("--dump")),
    );
}

#[test]
fn rejects_non_numeric_n() {
    egs().arg("fourteen").assert().failure().code(2);
}

#[test]
fn rejects_target_outside_the_envelope() {
    // t = N/2 and t = N/4 are both excluded; domain errors exit with 2.
    egs().args(["100", "50"]).assert().failure().code(2);
    egs().args(["100", "25"]).assert().failure().code(2);
    // N below the supported minimum.
    egs().args(["13", "5"]).assert().failure().code(2);
}

#[test]
fn rejects_ratio_outside_the_envelope() {
    egs()
        .args(["1000", "--ratio", "1/2"])
        .assert()
        .failure()
        .code(2);
    egs()
        .args(["1000", "--ratio", "1/5"])
        .assert()
        .failure()
        .code(2);
    egs()
        .args(["1000", "--ratio", "nonsense"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn rejects_cutoff_outside_the_envelope() {
    egs()
        .args(["1000", "300", "--cutoff", "0.19"])
        .assert()
        .failure()
        .code(2);
    egs()
        .args(["1000", "300", "--cutoff", "0.35"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn rejects_explicit_t_for_a_range() {
    egs().args(["100..200", "30"]).assert().failure().code(2);
}

#[test]
fn runtime_errors_exit_with_one() {
    // A missing hint file is a runtime failure, not an argument error.
    egs()
        .args(["300..400", "--ratio", "1/4", "--hints", "/nonexistent.hints"])
        .assert()
        .failure()
        .code(1);
}

// == Single runs ==============================================================

#[test]
fn proves_a_small_bound() {
    egs()
        .args(["14", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proved"));
}

#[test]
fn reports_failure_with_exit_zero() {
    // A target far above t(100); the run completes and reports the deficit.
    egs()
        .args(["100", "39"])
        .assert()
        .success()
        .stdout(predicate::str::contains("failed to prove"));
}

#[test]
fn verify_flag_replays_the_log() {
    egs()
        .args(["1000", "280", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verification passed"));
}

#[test]
fn fast_variant_agrees_on_small_runs() {
    egs()
        .args(["1000", "280", "--fast", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verification passed"));
}

#[test]
fn dump_writes_one_line_per_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("factors.dump");
    egs()
        .args(["1000", "280", "--dump"])
        .arg(&path)
        .assert()
        .success();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.is_empty());
    for line in text.lines() {
        assert_eq!(
            line.split(',').count(),
            4,
            "dump line {:?} is not n,m,p,q",
            line
        );
    }
}

#[test]
fn json_output_is_parseable() {
    let out = egs()
        .args(["1000", "300", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let json_line = text
        .lines()
        .find(|l| l.starts_with('{'))
        .expect("a JSON line");
    let v: serde_json::Value = serde_json::from_str(json_line).unwrap();
    assert_eq!(v["n"], 1000);
    assert_eq!(v["t"], 300);
    assert!(v["count"].is_u64());
}

// == Search and batch =========================================================

#[test]
fn search_reports_the_largest_bound() {
    egs()
        .args(["1000", "--ratio", "1/4", "--fast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("largest proved bound"));
}

#[test]
fn hint_round_trip_through_a_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("range.hints");

    egs()
        .args(["300..900", "--ratio", "1/4", "--fast", "--create-hints"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hint file written"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.lines().count() >= 1);
    for line in text.lines() {
        assert!(line.split_once(':').is_some(), "bad hint line {:?}", line);
    }

    egs()
        .args(["300..900", "--ratio", "1/4", "--fast", "--hints"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("verified"));
}

#[test]
fn corrupted_hints_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.hints");
    // A gap: the first record covers up to 4·80 = 320, the next starts at 400.
    std::fs::write(&path, "300:80\n400:110\n").unwrap();
    egs()
        .args(["300..440", "--ratio", "1/4", "--fast", "--hints"])
        .arg(&path)
        .assert()
        .failure()
        .code(1);
}

//! Integration tests for the `visits` CLI binary.
//!
//! These use `assert_cmd` and `predicates` to drive the sessions, available
//! and capacity subcommands through the actual binary against a scenario
//! fixture: one Monday template (open 2 / closed 1), a full slot on Jan 8,
//! and a non-association whose counterpart visits on Jan 15.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the scenario.json fixture.
fn scenario_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/scenario.json")
}

fn visits() -> Command {
    Command::cargo_bin("visits").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sessions_lists_every_monday() {
    visits()
        .args([
            "sessions",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--today",
            "2024-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-01"))
        .stdout(predicate::str::contains("2024-01-29"))
        .stdout(predicate::str::contains("MON-AFT"));
}

#[test]
fn sessions_flag_the_non_association_day_for_the_prisoner() {
    visits()
        .args([
            "sessions",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--prisoner",
            "A1234BC",
            "--today",
            "2024-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("NON_ASSOCIATION"))
        .stdout(predicate::str::contains("2024-01-15"));
}

#[test]
fn sessions_for_an_unknown_prison_fail() {
    visits()
        .args([
            "sessions",
            "-s",
            scenario_path(),
            "--prison",
            "XYZ",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("prison not found"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Available subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn available_drops_full_and_conflicted_days() {
    visits()
        .args([
            "available",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--prisoner",
            "A1234BC",
            "--restriction",
            "open",
            "--today",
            "2024-01-01",
        ])
        .assert()
        .success()
        // Jan 8 is full, Jan 15 is blocked by the non-association.
        .stdout(predicate::str::contains("2024-01-08").not())
        .stdout(predicate::str::contains("2024-01-15").not())
        .stdout(predicate::str::contains("2024-01-22"));
}

#[test]
fn available_rejects_an_unknown_restriction() {
    visits()
        .args([
            "available",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--prisoner",
            "A1234BC",
            "--restriction",
            "secret",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown restriction"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Capacity subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn capacity_reports_both_channels() {
    visits()
        .args([
            "capacity",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--date",
            "2024-01-08",
            "--start",
            "14:00:00",
            "--end",
            "15:00:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"open\": 2"))
        .stdout(predicate::str::contains("\"closed\": 1"));
}

#[test]
fn capacity_for_a_slot_nobody_runs_fails() {
    visits()
        .args([
            "capacity",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--date",
            "2024-01-09",
            "--start",
            "14:00:00",
            "--end",
            "15:00:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session slot not found"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Input handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn a_missing_scenario_file_fails_with_context() {
    visits()
        .args([
            "sessions",
            "-s",
            "/no/such/file.json",
            "--prison",
            "HEI",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading scenario file"));
}

#[test]
fn an_unknown_client_type_fails() {
    visits()
        .args([
            "sessions",
            "-s",
            scenario_path(),
            "--prison",
            "HEI",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--client",
            "robot",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown client type"));
}

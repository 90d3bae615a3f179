//! End-to-end tests for the timetable binary
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | Auto-fill exhausted, collisions found, or an edit was rejected |

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn timetable_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_timetable"))
}

fn run(data: &Path, args: &[&str]) -> Output {
    Command::new(timetable_binary())
        .arg("--data")
        .arg(data)
        .args(args)
        .env_remove("TIMETABLE_DATA")
        .env_remove("TIMETABLE_SEED")
        .env_remove("TIMETABLE_MAX_ATTEMPTS")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute timetable")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// The progress line for `label` in a class view, with the alignment
/// padding collapsed
fn progress_line(text: &str, label: &str) -> String {
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with(label) && !l.contains('|'))
        .unwrap_or_else(|| panic!("no progress line for {label} in:\n{text}"));
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn initialized() -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data/school_data.json");
    let output = run(&data, &["init"]);
    assert!(output.status.success(), "init failed: {}", stderr(&output));
    (dir, data)
}

// =============================================================================
// init / show / progress
// =============================================================================

#[test]
fn init_writes_starter_file() {
    let (_dir, data) = initialized();
    assert!(data.exists());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&data).unwrap()).unwrap();
    assert_eq!(json["setup"]["periods_per_day"], 6);
    assert!(json["grid"]["10A"]["Mon"].is_array());
}

#[test]
fn init_refuses_to_overwrite() {
    let (_dir, data) = initialized();
    let output = run(&data, &["init"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));

    assert!(run(&data, &["init", "--force"]).status.success());
}

#[test]
fn unconfigured_file_is_reported() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("missing.json");

    let output = run(&data, &["autofill"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Not yet configured"));
}

#[test]
fn show_class_and_progress() {
    let (_dir, data) = initialized();

    let output = run(&data, &["show", "--class", "10A"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("Class 10A\n"));
    assert!(progress_line(&text, "Math (Khan)").ends_with(" 0/5"));
    assert!(progress_line(&text, "Physics (Novak)").ends_with(" 0/3"));

    let output = run(&data, &["progress", "10A"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Math (Khan): 0/5 (0%)"));

    let output = run(&data, &["progress", "12Z"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Class not found: 12Z"));
}

// =============================================================================
// autofill / check
// =============================================================================

#[test]
fn autofill_then_check_is_clean() {
    let (_dir, data) = initialized();

    let output = run(&data, &["autofill", "--seed", "3"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Auto-filled successfully (Attempt"));

    let output = run(&data, &["check"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("No collisions found!"));

    let output = run(&data, &["progress", "10B", "--json"]);
    let progress: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for entry in progress.as_array().unwrap() {
        assert_eq!(entry["periods_placed"], entry["periods_required"]);
    }

    let output = run(&data, &["autofill"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Schedule is already full!"));
}

#[test]
fn autofill_dry_run_does_not_save() {
    let (_dir, data) = initialized();
    let before = fs::read_to_string(&data).unwrap();

    let output = run(&data, &["autofill", "--seed", "1", "--dry-run"]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&data).unwrap(), before);
}

#[test]
fn exhausted_autofill_exits_1_and_keeps_file() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("tight.json");
    fs::write(
        &data,
        r#"{
            "setup": {"days": ["Mon"], "periods_per_day": 2},
            "allocations": [
                {"class_name": "A", "subjects": [{"subject": "Math", "teacher": "T1", "periods": 1}]},
                {"class_name": "B", "subjects": [{"subject": "Physics", "teacher": "T1", "periods": 1}]},
                {"class_name": "C", "subjects": [{"subject": "Chemistry", "teacher": "T1", "periods": 1}]}
            ]
        }"#,
    )
    .unwrap();
    let before = fs::read_to_string(&data).unwrap();

    let output = run(&data, &["autofill", "--attempts", "5", "--seed", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("after 5 attempts"));
    assert_eq!(fs::read_to_string(&data).unwrap(), before);
}

#[test]
fn check_reports_collisions_with_exit_1() {
    let (_dir, data) = initialized();

    assert!(run(&data, &["set", "10A", "Mon", "1", "Physics", "Novak"]).status.success());
    assert!(run(&data, &["set", "10B", "Mon", "1", "Chemistry", "Novak"]).status.success());

    let output = run(&data, &["check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Novak: Physics(10A) vs Chemistry(10B) on Mon Pd 1"));

    let output = run(&data, &["check", "--json"]);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["teacher"], "Novak");
    assert_eq!(report[0]["period"], 1);
}

// =============================================================================
// set / clear
// =============================================================================

#[test]
fn set_rejects_over_capacity() {
    let (_dir, data) = initialized();

    for (day, period) in [("Mon", "1"), ("Tue", "1")] {
        assert!(run(&data, &["set", "10A", day, period, "PE", "Silva"]).status.success());
    }

    let output = run(&data, &["set", "10A", "Wed", "1", "PE", "Silva"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Limit reached"));

    // Freeing a slot makes room again
    assert!(run(&data, &["clear", "10A", "Mon", "1"]).status.success());
    assert!(run(&data, &["set", "10A", "Wed", "1", "PE", "Silva"]).status.success());
}

#[test]
fn set_rejects_bad_coordinates() {
    let (_dir, data) = initialized();

    let output = run(&data, &["set", "10A", "Sun", "1", "PE", "Silva"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Day not found: Sun"));

    let output = run(&data, &["set", "10A", "Mon", "7", "PE", "Silva"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Period 7 out of range"));

    let output = run(&data, &["clear", "10A", "Mon", "0"]);
    assert_eq!(output.status.code(), Some(1));
}

// =============================================================================
// Legacy data / export
// =============================================================================

#[test]
fn legacy_labels_load_with_warning() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("legacy.json");
    fs::write(
        &data,
        r#"{
            "setup": {"days": ["Mon", "Tue"], "periods_per_day": 2},
            "allocations": [{"class_name": "A", "subjects": [{"subject": "Math", "teacher": "T1", "periods": 2}]}],
            "grid": {"A": {"Mon": ["Math (T1)", "garbage"], "Tue": [null, ""]}}
        }"#,
    )
    .unwrap();

    let output = run(&data, &["progress", "A"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Math (T1): 1/2 (50%)"));
    assert!(stderr(&output).contains("Skipped malformed label \"garbage\""));

    let exported = dir.path().join("out/export.json");
    assert!(run(&data, &["export", exported.to_str().unwrap()]).status.success());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&exported).unwrap()).unwrap();
    assert_eq!(json["grid"]["A"]["Mon"][0]["subject"], "Math");
    assert!(json["grid"]["A"]["Mon"][1].is_null());
}

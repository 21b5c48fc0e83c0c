//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own throwaway data directory.

use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_studygo"))
        .args(args)
        .env("STUDYGO_DATA_DIR", data_dir)
        .env("STUDYGO_LOG", "off")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

#[test]
fn test_subject_list_is_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let subjects = run_json(dir.path(), &["subject", "list"]);
    let names: Vec<&str> = subjects
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Mathematics", "Physics", "Literature", "Computer Science"]);
}

#[test]
fn test_subject_and_topic_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let subject = run_json(dir.path(), &["subject", "add", "Chemistry", "--color", "#ef4444"]);
    let id = subject["id"].as_str().unwrap().to_string();

    let topic = run_json(dir.path(), &["topic", "add", &id, "Organic", "--target", "2.5"]);
    assert_eq!(topic["target_hours"], 2.5);

    let (_, stderr, code) = run_cli(dir.path(), &["topic", "add", &id, "Inorganic", "--target", "lots"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid target hours"), "stderr: {stderr}");

    let (_, _, code) = run_cli(dir.path(), &["subject", "delete", &id]);
    assert_eq!(code, 0);
    let subjects = run_json(dir.path(), &["subject", "list"]);
    assert!(subjects.as_array().unwrap().iter().all(|s| s["id"] != id.as_str()));
}

#[test]
fn test_timer_run_saves_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.tick_interval_ms", "1"]);
    assert_eq!(code, 0);

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["timer", "run", "--subject", "sub_1", "--topic", "t_1", "--minutes", "1"],
    );
    assert_eq!(code, 0, "timer run failed: {stderr}");
    assert!(stdout.contains("\"type\":\"TimerStarted\""));
    assert!(stdout.contains("\"type\":\"SessionSaved\""));

    let sessions = run_json(dir.path(), &["session", "list"]);
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["duration"], 60);
    assert_eq!(sessions[0]["topic_id"], "t_1");

    let weekly = run_json(dir.path(), &["stats", "weekly"]);
    assert_eq!(weekly["goal_hours"], 10.0);
    assert!(weekly["hours_done"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_timer_run_rejects_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "--subject", "sub_1", "--minutes", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Please set a duration"), "stderr: {stderr}");

    let (_, stderr, code) = run_cli(dir.path(), &["timer", "run", "--subject", "sub_404", "--minutes", "5"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown subject"), "stderr: {stderr}");
}

#[test]
fn test_settings_goal_validation() {
    let dir = tempfile::tempdir().unwrap();
    let settings = run_json(dir.path(), &["settings", "set-goal", "15"]);
    assert_eq!(settings["weekly_goal"], 15.0);

    let (_, _, code) = run_cli(dir.path(), &["settings", "set-goal", "200"]);
    assert_ne!(code, 0);

    let settings = run_json(dir.path(), &["settings", "dark-mode", "off"]);
    assert_eq!(settings["dark_mode"], false);
    assert_eq!(settings["weekly_goal"], 15.0);
}

#[test]
fn test_stats_dashboard_shapes() {
    let dir = tempfile::tempdir().unwrap();
    let trend = run_json(dir.path(), &["stats", "trend", "--days", "30"]);
    assert_eq!(trend.as_array().unwrap().len(), 30);

    let dashboard = run_json(dir.path(), &["stats", "dashboard", "--year", "2024"]);
    assert_eq!(dashboard["year"], 2024);
    assert_eq!(dashboard["trend"].as_array().unwrap().len(), 7);
    assert!(dashboard["daily"].is_null());
    assert_eq!(dashboard["subjects"].as_array().unwrap().len(), 4);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.default_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "dashboard.trend_days", "30"]);
    assert_eq!(code, 0);
    let trend = run_json(dir.path(), &["stats", "trend"]);
    assert_eq!(trend.as_array().unwrap().len(), 30);

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "nope.nothing"]);
    assert_ne!(code, 0);
}

#[test]
fn test_completions_script() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("studygo"));
}

#[test]
fn test_stats_rejects_unsupported_window_and_year() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["stats", "trend", "--days", "14"]);
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("7 or 30"), "stderr: {stderr}");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "dashboard.trend_days", "14"]);
    assert_ne!(code, 0);

    let (_, stderr, code) = run_cli(dir.path(), &["stats", "heatmap", "--year=-262143"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("out of range"), "stderr: {stderr}");
}

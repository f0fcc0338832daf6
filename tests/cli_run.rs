//! CLI integration tests for full runs of both strategies.

use std::path::Path;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_bounded_buffer");
    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to run bounded_buffer binary")
}

fn summary_value<'a>(stdout: &'a str, key: &str) -> &'a str {
    let prefix = format!("{key}=");
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .unwrap_or_else(|| panic!("{key} line missing from output"))
        .trim()
}

fn consumed_ids(trace: &Path) -> Vec<i64> {
    let text = std::fs::read_to_string(trace).expect("trace file missing");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp_ns,thread_index,role,event,item_id")
    );
    lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            (fields[3] == "C_DONE").then(|| fields[4].parse().expect("item id"))
        })
        .collect()
}

#[test]
fn default_shaped_run_delivers_target_for_both_modes() {
    let dir = tempfile::tempdir().expect("temp dir");
    for mode in ["monitor", "semaphore"] {
        let trace = dir.path().join(format!("{mode}.csv"));
        let output = run_cli(&[
            mode,
            "2",
            "2",
            "50",
            "--jitter-ms",
            "3",
            "--seed",
            "7",
            "--validate",
            "--output",
            trace.to_str().expect("utf8 path"),
        ]);

        // Run should exit cleanly.
        assert!(
            output.status.success(),
            "{mode} exited with non-zero status: {:?}",
            output.status
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("RUN SUMMARY"), "run summary missing");
        assert_eq!(summary_value(&stdout, "mode"), mode);
        assert_eq!(summary_value(&stdout, "delivered"), "50");
        assert_eq!(summary_value(&stdout, "residual_items"), "0");
        assert_eq!(summary_value(&stdout, "audit_passed"), "true");

        let mut ids = consumed_ids(&trace);
        ids.sort_unstable();
        assert_eq!(ids, (0..50).collect::<Vec<i64>>());
    }
}

#[test]
fn single_pair_trace_is_in_production_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let trace = dir.path().join("fifo.csv");
    let output = run_cli(&[
        "semaphore",
        "1",
        "1",
        "20",
        "--capacity",
        "2",
        "--jitter-ms",
        "0",
        "--output",
        trace.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success());
    assert_eq!(consumed_ids(&trace), (0..20).collect::<Vec<i64>>());
}

#[test]
fn unknown_mode_fails_without_writing_a_trace() {
    let dir = tempfile::tempdir().expect("temp dir");
    let trace = dir.path().join("never.csv");
    let output = run_cli(&["spinlock", "--output", trace.to_str().expect("utf8 path")]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Use: monitor | semaphore"));
    assert!(!trace.exists());
}

#[test]
fn zero_consumers_is_a_configuration_error() {
    let output = run_cli(&["monitor", "2", "0", "10"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("consumers must be > 0"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("RUN SUMMARY"));
}

#[test]
fn zero_capacity_is_rejected() {
    let output = run_cli(&["semaphore", "--capacity", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("capacity must be > 0"));
}

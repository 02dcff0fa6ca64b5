//! Wait-timeout boundary spec (seed scenario 6).

use crate::prelude::*;

/// Fabricate a `running` run on disk with no worker behind it.
fn fabricate_running_run(temp: &Project, run_id: &str) {
    let run_dir = temp.runs_dir().join(run_id);
    std::fs::create_dir_all(&run_dir).expect("create run dir");
    let doc = serde_json::json!({
        "id": run_id,
        "status": "running",
        "driver": "pi",
        "executor": "direct",
        "programPath": "demo.toml",
        "createdAt": "2026-08-01T00:00:00Z",
        "updatedAt": "2026-08-01T00:00:01Z",
        "paths": {
            "runDir": run_dir,
            "runFile": run_dir.join("run.json"),
            "eventsFile": run_dir.join("events.ndjson"),
            "resultFile": run_dir.join("result.json"),
        },
    });
    std::fs::write(
        run_dir.join("run.json"),
        serde_json::to_string_pretty(&doc).expect("serialize run.json"),
    )
    .expect("write run.json");
}

#[test]
fn wait_exits_two_on_timeout() {
    let temp = Project::empty();
    fabricate_running_run(&temp, "run_1722520000_stuck");

    let started = std::time::Instant::now();
    let out = temp
        .mill()
        .args(&["wait", "run_1722520000_stuck", "--timeout", "1", "--json"])
        .exits(2);
    assert!(started.elapsed() >= std::time::Duration::from_secs(1));

    // The non-terminal status is still reported.
    assert_eq!(out.json()["status"], "running");

    // Timeouts never mutate run state.
    let doc: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp.runs_dir().join("run_1722520000_stuck/run.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(doc["status"], "running");
}

#[test]
fn wait_timeout_human_output_also_exits_two() {
    let temp = Project::empty();
    fabricate_running_run(&temp, "run_1722520000_stuck");
    temp.mill()
        .args(&["wait", "run_1722520000_stuck", "--timeout", "1"])
        .exits(2)
        .stdout_has("running");
}

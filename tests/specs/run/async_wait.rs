//! Async submit + wait specs (seed scenario 2) and worker idempotence.

use crate::prelude::*;

#[test]
fn async_submit_then_wait_reaches_complete() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 150\n");

    let envelope = temp.mill().args(&["run", program.to_str().unwrap(), "--json"]).passes().json();
    let run_id = envelope["runId"].as_str().expect("runId in envelope").to_string();
    assert!(!run_id.is_empty());
    let status = envelope["status"].as_str().unwrap();
    assert!(
        status == "pending" || status == "running",
        "submit status must be pending|running, got {status}"
    );
    for key in ["runDir", "runFile", "eventsFile", "resultFile"] {
        assert!(envelope["paths"][key].is_string(), "paths.{key} missing");
    }

    let wait =
        temp.mill().args(&["wait", &run_id, "--timeout", "5", "--json"]).passes().json();
    assert_eq!(wait["status"], "complete");

    // Exactly one terminal event line in events.ndjson.
    let terminal: Vec<String> = read_events(&temp, &run_id)
        .iter()
        .filter_map(|e| e["type"].as_str().map(str::to_string))
        .filter(|t| matches!(t.as_str(), "run:complete" | "run:failed" | "run:cancelled"))
        .collect();
    assert_eq!(terminal, vec!["run:complete"]);

    assert_run_invariants(&temp, &run_id);
}

#[test]
fn worker_reentry_on_terminal_run_is_a_noop() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 20\n");

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .passes()
        .json();
    let run_id = envelope["run"]["id"].as_str().unwrap().to_string();
    let run_dir = temp.runs_dir().join(&run_id);

    let before_run = std::fs::read(run_dir.join("run.json")).unwrap();
    let before_events = std::fs::read(run_dir.join("events.ndjson")).unwrap();
    let before_result = std::fs::read(run_dir.join("result.json")).unwrap();

    // Re-invoking the worker against a terminal run exits 0 and changes nothing.
    temp.mill()
        .args(&[
            "_worker",
            "--run-id",
            &run_id,
            "--program",
            program.to_str().unwrap(),
            "--runs-dir",
            temp.runs_dir().to_str().unwrap(),
        ])
        .passes();

    similar_asserts::assert_eq!(
        std::fs::read(run_dir.join("run.json")).unwrap(),
        before_run
    );
    similar_asserts::assert_eq!(
        std::fs::read(run_dir.join("events.ndjson")).unwrap(),
        before_events
    );
    similar_asserts::assert_eq!(
        std::fs::read(run_dir.join("result.json")).unwrap(),
        before_result
    );
}

#[test]
fn failing_program_ends_failed_with_error_message() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nfail = \"expected breakage\"\n");

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .passes()
        .json();
    let run_id = envelope["run"]["id"].as_str().unwrap().to_string();
    assert_eq!(envelope["run"]["status"], "failed");
    assert_eq!(envelope["result"]["status"], "failed");
    assert_eq!(envelope["result"]["errorMessage"], "expected breakage");

    let events = read_events(&temp, &run_id);
    let last = events.last().unwrap();
    assert_eq!(last["type"], "run:failed");
    assert_eq!(last["payload"]["errorMessage"], "expected breakage");
    assert_run_invariants(&temp, &run_id);
}

#[test]
fn wait_on_unknown_run_exits_one() {
    let temp = Project::empty();
    temp.mill().args(&["wait", "run_404_nope", "--timeout", "1"]).exits(1);
}

#[test]
fn status_on_unknown_run_exits_one() {
    let temp = Project::empty();
    temp.mill().args(&["status", "run_404_nope"]).exits(1);
}

//! Synchronous run specs (seed scenarios 1 and 4).

use crate::prelude::*;

#[test]
fn sync_run_with_default_driver_completes() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 160\n");

    let out = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .passes();
    let envelope = out.json();

    assert_eq!(envelope["run"]["status"], "complete");
    assert_eq!(envelope["run"]["driver"], "pi");
    assert_eq!(envelope["run"]["executor"], "direct");
    assert_eq!(envelope["result"]["spawns"].as_array().unwrap().len(), 0);
    let run_id = envelope["run"]["id"].as_str().unwrap().to_string();
    assert!(run_id.starts_with("run_"), "run id shape: {run_id}");

    // status agrees
    let status = temp.mill().args(&["status", &run_id, "--json"]).passes().json();
    assert_eq!(status["id"], run_id.as_str());
    assert_eq!(status["status"], "complete");

    // wait on a terminal run returns immediately with exit 0
    let wait = temp.mill().args(&["wait", &run_id, "--timeout", "2", "--json"]).passes().json();
    assert_eq!(wait["status"], "complete");

    assert_run_invariants(&temp, &run_id);
}

#[test]
fn explicit_driver_and_executor_are_carried() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 10\n");

    let envelope = temp
        .mill()
        .args(&[
            "run",
            program.to_str().unwrap(),
            "--sync",
            "--json",
            "--driver",
            "pi",
            "--executor",
            "direct",
        ])
        .passes()
        .json();
    assert_eq!(envelope["run"]["driver"], "pi");
    assert_eq!(envelope["run"]["executor"], "direct");
}

#[test]
fn unknown_driver_is_rejected_at_submit() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 10\n");
    temp.mill()
        .args(&["run", program.to_str().unwrap(), "--driver", "discovery"])
        .exits(1)
        .stderr_has("INVALID_INPUT");
}

#[test]
fn unknown_executor_is_rejected_at_submit() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 10\n");
    temp.mill()
        .args(&["run", program.to_str().unwrap(), "--executor", "sandboxed"])
        .exits(1)
        .stderr_has("INVALID_INPUT");
}

#[test]
fn missing_program_is_rejected_at_submit() {
    let temp = Project::empty();
    temp.mill().args(&["run", "nope.toml"]).exits(1).stderr_has("INVALID_INPUT");
}

#[test]
fn sync_run_copies_the_program_into_the_run_dir() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 10\n");

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .passes()
        .json();
    let run_id = envelope["run"]["id"].as_str().unwrap();

    let copy = temp.runs_dir().join(run_id).join("program.ts");
    assert!(copy.is_file(), "program copy must land at program.ts");
    similar_asserts::assert_eq!(
        std::fs::read_to_string(&copy).unwrap(),
        std::fs::read_to_string(&program).unwrap()
    );
}

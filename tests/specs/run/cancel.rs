//! Cancellation matrix specs (seed scenario 3).

use crate::prelude::*;

#[test]
fn cancel_matrix() {
    let temp = Project::empty();
    let fast = temp.file("fast.toml", "[[step]]\nsleep_ms = 150\n");
    let slow = temp.file("slow.toml", "[[step]]\nsleep_ms = 3000\n");

    let a = temp.mill().args(&["run", fast.to_str().unwrap(), "--json"]).passes().json();
    let b = temp.mill().args(&["run", slow.to_str().unwrap(), "--json"]).passes().json();
    let a_id = a["runId"].as_str().unwrap().to_string();
    let b_id = b["runId"].as_str().unwrap().to_string();

    // Cancel B while it sleeps.
    let receipt = temp.mill().args(&["cancel", &b_id, "--json"]).passes().json();
    assert_eq!(receipt["runId"], b_id.as_str());
    assert_eq!(receipt["status"], "cancelled");
    assert_eq!(receipt["alreadyTerminal"], false);

    let b_wait = temp.mill().args(&["wait", &b_id, "--timeout", "8", "--json"]).passes().json();
    assert_eq!(b_wait["status"], "cancelled");

    let a_wait = temp.mill().args(&["wait", &a_id, "--timeout", "8", "--json"]).passes().json();
    assert_eq!(a_wait["status"], "complete");

    // watch on the finished run A emits at least one envelope and exactly
    // one terminal event, then closes.
    let a_watch = temp
        .mill()
        .args(&["watch", "--run", &a_id, "--channel", "all", "--json"])
        .passes()
        .json_lines();
    assert!(!a_watch.is_empty());
    let terminals = a_watch
        .iter()
        .filter(|l| {
            l["kind"] == "event"
                && matches!(
                    l["event"]["type"].as_str(),
                    Some("run:complete") | Some("run:failed") | Some("run:cancelled")
                )
        })
        .count();
    assert_eq!(terminals, 1);

    // watch on B's events channel shows the cancellation lifecycle.
    let b_watch = temp
        .mill()
        .args(&["watch", "--run", &b_id, "--channel", "events", "--json"])
        .passes()
        .json_lines();
    assert!(
        b_watch.iter().any(|l| l["event"]["type"] == "run:cancelled"),
        "expected run:cancelled in {b_watch:?}"
    );
    assert!(b_watch.iter().any(|l| l["event"]["type"] == "run:cancelRequested"));

    // ls shows both runs with their terminal statuses.
    let listed = temp.mill().args(&["ls", "--json"]).passes().json();
    let entries = listed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let status_of = |id: &str| {
        entries
            .iter()
            .find(|e| e["id"] == id)
            .unwrap_or_else(|| panic!("{id} missing from ls"))["status"]
            .as_str()
            .unwrap()
            .to_string()
    };
    assert_eq!(status_of(&a_id), "complete");
    assert_eq!(status_of(&b_id), "cancelled");

    assert_run_invariants(&temp, &a_id);
    assert_run_invariants(&temp, &b_id);
}

#[test]
fn cancel_on_terminal_run_reports_already_terminal() {
    let temp = Project::empty();
    let program = temp.file("demo.toml", "[[step]]\nsleep_ms = 10\n");

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .passes()
        .json();
    let run_id = envelope["run"]["id"].as_str().unwrap().to_string();

    let receipt = temp.mill().args(&["cancel", &run_id, "--json"]).passes().json();
    assert_eq!(receipt["alreadyTerminal"], true);
    assert_eq!(receipt["status"], "complete");

    // Still exactly one terminal event, and no cancelRequested.
    let events = read_events(&temp, &run_id);
    assert!(!events.iter().any(|e| e["type"] == "run:cancelRequested"));
    assert_run_invariants(&temp, &run_id);
}

#[test]
fn cancel_unknown_run_exits_one() {
    let temp = Project::empty();
    temp.mill().args(&["cancel", "run_404_nope"]).exits(1);
}

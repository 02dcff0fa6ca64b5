//! End-to-end spawn flow against a stub PI driver binary.

use crate::prelude::*;

/// A stand-in driver speaking the PI line protocol. Ignores its argv.
const PI_STUB: &str = r#"echo '{"type":"session","id":"stub-session"}'
echo '{"type":"agent_start"}'
echo '{"type":"tool_execution_start","toolName":"read_file"}'
echo '{"type":"message_end","message":{"content":[{"type":"text","text":"stub answer"}]},"stopReason":"stop"}'"#;

const SPAWN_PROGRAM: &str = r#"
[[step]]
log = "spawning"

[[step]]
[step.spawn]
agent = "researcher"
system_prompt = "be terse"
prompt = "summarize the repo"
model = "stub-model"
"#;

#[test]
fn spawn_flow_records_events_result_and_transcript() {
    let temp = Project::empty();
    let driver = temp.script("bin/pi-stub", PI_STUB);
    let program = temp.file("demo.toml", SPAWN_PROGRAM);

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .env("MILL_DRIVER_CMD_PI", driver.to_str().unwrap())
        .passes()
        .json();

    assert_eq!(envelope["run"]["status"], "complete");
    let run_id = envelope["run"]["id"].as_str().unwrap().to_string();

    let spawns = envelope["result"]["spawns"].as_array().unwrap();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0]["text"], "stub answer");
    assert_eq!(spawns[0]["agent"], "researcher");
    assert_eq!(spawns[0]["model"], "stub-model");
    assert_eq!(spawns[0]["driver"], "pi");
    assert_eq!(spawns[0]["exitCode"], 0);
    let session_ref = spawns[0]["sessionRef"].as_str().unwrap();
    assert!(
        session_ref.ends_with(".jsonl") && session_ref.contains("sessions"),
        "pi sessionRef should be a transcript path, got {session_ref}"
    );

    // The event trail includes the spawn lifecycle and normalized events.
    let events = read_events(&temp, &run_id);
    let types: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert!(types.contains(&"spawn:start"));
    assert!(types.contains(&"spawn:event"));
    assert!(types.contains(&"spawn:result"));
    assert!(types.contains(&"io"));
    let tool_calls: Vec<&serde_json::Value> = events
        .iter()
        .filter(|e| e["type"] == "spawn:event" && e["payload"]["event"]["type"] == "tool_call")
        .collect();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0]["payload"]["event"]["toolName"], "read_file");

    // Raw transcript mirrored under sessions/.
    let spawn_id = events
        .iter()
        .find(|e| e["type"] == "spawn:start")
        .and_then(|e| e["payload"]["spawnId"].as_str())
        .unwrap();
    let transcript = temp.runs_dir().join(&run_id).join(format!("sessions/{spawn_id}.jsonl"));
    let content = std::fs::read_to_string(&transcript).unwrap();
    assert!(content.lines().count() >= 4, "transcript keeps raw driver lines");

    // watch --channel io carries the driver lines.
    let io_lines = temp
        .mill()
        .args(&["watch", "--run", &run_id, "--channel", "io", "--json"])
        .passes()
        .json_lines();
    assert!(io_lines.iter().all(|l| l["kind"] == "io"));
    assert!(io_lines.iter().any(|l| l["source"] == "driver"));
    assert!(io_lines.iter().any(|l| l["source"] == "program"));

    assert_run_invariants(&temp, &run_id);
}

#[test]
fn crashing_driver_fails_the_spawn_but_not_the_run() {
    let temp = Project::empty();
    let driver = temp.script("bin/pi-crash", "echo 'boom' >&2\nexit 9");
    let program = temp.file("demo.toml", SPAWN_PROGRAM);

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .env("MILL_DRIVER_CMD_PI", driver.to_str().unwrap())
        .passes()
        .json();

    assert_eq!(envelope["run"]["status"], "complete");
    let spawns = envelope["result"]["spawns"].as_array().unwrap();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0]["exitCode"], 1);
    let message = spawns[0]["errorMessage"].as_str().unwrap();
    assert!(message.starts_with("[RUNTIME]"), "tagged error, got {message}");

    let run_id = envelope["run"]["id"].as_str().unwrap();
    assert_run_invariants(&temp, run_id);
}

#[test]
fn duplicate_terminal_from_driver_is_a_codec_failure() {
    let temp = Project::empty();
    // Claude dialect is strict: two result lines must be rejected.
    let driver = temp.script(
        "bin/claude-stub",
        r#"echo '{"type":"result","result":"one"}'
echo '{"type":"result","result":"two"}'"#,
    );
    let program = temp.file(
        "demo.toml",
        r#"
[[step]]
[step.spawn]
agent = "a"
prompt = "p"
model = "anthropic/claude-stub"
"#,
    );

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json", "--driver", "claude"])
        .env("MILL_DRIVER_CMD_CLAUDE", driver.to_str().unwrap())
        .passes()
        .json();

    let spawns = envelope["result"]["spawns"].as_array().unwrap();
    assert_eq!(spawns[0]["exitCode"], 1);
    let message = spawns[0]["errorMessage"].as_str().unwrap();
    assert!(message.contains("duplicate terminal"), "got {message}");
}

#[test]
fn pi_retry_terminal_replaces_the_earlier_one() {
    let temp = Project::empty();
    let driver = temp.script(
        "bin/pi-retry",
        r#"echo '{"type":"message_end","message":{"content":[{"type":"text","text":"first"}]}}'
echo '{"type":"agent_end","messages":[{"content":[{"type":"text","text":"second"}]}]}'"#,
    );
    let program = temp.file("demo.toml", SPAWN_PROGRAM);

    let envelope = temp
        .mill()
        .args(&["run", program.to_str().unwrap(), "--sync", "--json"])
        .env("MILL_DRIVER_CMD_PI", driver.to_str().unwrap())
        .passes()
        .json();

    let spawns = envelope["result"]["spawns"].as_array().unwrap();
    assert_eq!(spawns[0]["exitCode"], 0);
    assert_eq!(spawns[0]["text"], "second");
}

//! Shared spec harness.
//!
//! `Project` is a scratch directory acting as both `$HOME` and the parent of
//! the runs root; `mill()` builds an invocation of the real binary against
//! it. Poll intervals are tightened so specs settle quickly.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

/// Upper bound for wait_for loops.
pub const SPEC_WAIT_MAX_MS: u64 = 15_000;

/// Poll until `condition` holds or `max_ms` elapses. Returns whether it held.
pub fn wait_for(max_ms: u64, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// Scratch project: isolated HOME + runs root.
pub struct Project {
    temp: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { temp: tempfile::tempdir().expect("create scratch dir") }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.path().join("runs")
    }

    /// Write a file under the project, creating parent dirs.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Write an executable script under the project.
    pub fn script(&self, rel: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.file(rel, &format!("#!/bin/sh\n{body}\n"));
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        path
    }

    /// Build a `mill` invocation against this project.
    pub fn mill(&self) -> Mill {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin("mill"));
        cmd.current_dir(self.path())
            .env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .env("HOME", self.path())
            .env("MILL_RUNS_DIR", self.runs_dir())
            .env("MILL_WAIT_POLL_MS", "10")
            .env("MILL_WATCH_POLL_MS", "10")
            .env("NO_COLOR", "1");
        Mill { cmd }
    }
}

/// Builder for one `mill` invocation.
pub struct Mill {
    cmd: Command,
}

impl Mill {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Run and return output without asserting on the exit code.
    pub fn output(mut self) -> SpecOutput {
        let output = self.cmd.output().expect("spawn mill");
        SpecOutput { output }
    }

    /// Run and assert exit code 0.
    pub fn passes(self) -> SpecOutput {
        self.output().expecting_code(0)
    }

    /// Run and assert a non-zero exit.
    pub fn fails(self) -> SpecOutput {
        let out = self.output();
        assert!(
            !out.output.status.success(),
            "expected failure, got success\nstdout: {}\nstderr: {}",
            out.stdout(),
            out.stderr()
        );
        out
    }

    /// Run and assert a specific exit code.
    pub fn exits(self, code: i32) -> SpecOutput {
        self.output().expecting_code(code)
    }
}

pub struct SpecOutput {
    output: Output,
}

impl SpecOutput {
    fn expecting_code(self, code: i32) -> Self {
        assert_eq!(
            self.output.status.code(),
            Some(code),
            "expected exit {code}\nstdout: {}\nstderr: {}",
            self.stdout(),
            self.stderr()
        );
        self
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout().contains(needle),
            "stdout missing {needle:?}\nstdout: {}",
            self.stdout()
        );
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(
            !self.stdout().contains(needle),
            "stdout must not contain {needle:?}\nstdout: {}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr().contains(needle),
            "stderr missing {needle:?}\nstderr: {}",
            self.stderr()
        );
        self
    }

    /// Parse the first stdout line as JSON.
    pub fn json(&self) -> serde_json::Value {
        let stdout = self.stdout();
        let line = stdout.lines().next().unwrap_or_default();
        serde_json::from_str(line)
            .unwrap_or_else(|e| panic!("stdout is not a JSON line ({e}): {stdout}"))
    }

    /// Parse every stdout line as JSON.
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.stdout()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line ({e}): {l}")))
            .collect()
    }
}

/// Events currently in a run's log.
pub fn read_events(project: &Project, run_id: &str) -> Vec<serde_json::Value> {
    let path = project.runs_dir().join(run_id).join("events.ndjson");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("event line is JSON"))
        .collect()
}

/// Assert the on-disk invariants that must hold for every terminal run.
pub fn assert_run_invariants(project: &Project, run_id: &str) {
    let run_dir = project.runs_dir().join(run_id);
    let run: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run_dir.join("run.json")).expect("run.json"))
            .expect("run.json parses");
    let events = read_events(project, run_id);

    // Sequences strictly increasing, gap-free from 1.
    for (idx, event) in events.iter().enumerate() {
        assert_eq!(event["sequence"], (idx + 1) as u64, "sequence gap at {idx}");
        assert_eq!(event["runId"], run_id);
        assert_eq!(event["schemaVersion"], 1);
    }

    let terminal: Vec<&serde_json::Value> = events
        .iter()
        .filter(|e| {
            matches!(
                e["type"].as_str(),
                Some("run:complete") | Some("run:failed") | Some("run:cancelled")
            )
        })
        .collect();
    let status = run["status"].as_str().expect("status");
    let is_terminal = matches!(status, "complete" | "failed" | "cancelled");
    if is_terminal {
        assert_eq!(terminal.len(), 1, "exactly one terminal event: {events:?}");
        assert!(
            matches!(
                events.last().expect("nonempty")["type"].as_str(),
                Some("run:complete") | Some("run:failed") | Some("run:cancelled")
            ),
            "terminal event must be last"
        );
        assert!(run_dir.join("result.json").is_file(), "result.json exists iff terminal");
    } else {
        assert!(terminal.is_empty());
        assert!(!run_dir.join("result.json").exists());
    }

    // paths resolve inside runDir
    let run_dir_str = run["paths"]["runDir"].as_str().expect("runDir");
    for key in ["runFile", "eventsFile", "resultFile"] {
        let path = run["paths"][key].as_str().expect(key);
        assert!(path.starts_with(run_dir_str), "{key} escapes runDir");
    }

    // every spawn:result is preceded by a spawn:start with the same spawnId
    let mut started: Vec<String> = Vec::new();
    for event in &events {
        match event["type"].as_str() {
            Some("spawn:start") => {
                started.push(event["payload"]["spawnId"].as_str().expect("spawnId").to_string());
            }
            Some("spawn:result") => {
                let id = event["payload"]["spawnId"].as_str().expect("spawnId");
                assert!(started.iter().any(|s| s == id), "spawn:result without spawn:start");
            }
            _ => {}
        }
    }
}

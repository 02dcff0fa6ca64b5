// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles shared by engine tests.

use async_trait::async_trait;
use mill_adapters::{DriverError, NormalizedEvent, SpawnOutput, SpawnRuntime};
use mill_core::{SpawnInput, SpawnResult};
use parking_lot::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a [`StubRuntime`] does for every spawn.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Return a successful result after an optional delay.
    Succeed { text: String, delay_ms: u64 },
    /// Fail like a driver that crashed without a terminal line.
    Fail,
    /// Block until cancelled.
    Hang,
}

/// In-process [`SpawnRuntime`] double; records every input it sees.
pub struct StubRuntime {
    pub behavior: StubBehavior,
    pub inputs: Mutex<Vec<SpawnInput>>,
}

impl StubRuntime {
    pub fn new(behavior: StubBehavior) -> Self {
        Self { behavior, inputs: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl SpawnRuntime for StubRuntime {
    fn driver(&self) -> &str {
        "pi"
    }

    async fn spawn(
        &self,
        input: &SpawnInput,
        cancel: CancellationToken,
    ) -> Result<SpawnOutput, DriverError> {
        self.inputs.lock().push(input.clone());
        match &self.behavior {
            StubBehavior::Succeed { text, delay_ms } => {
                if *delay_ms > 0 {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(*delay_ms)) => {}
                        _ = cancel.cancelled() => return Err(DriverError::Cancelled),
                    }
                }
                Ok(SpawnOutput {
                    events: vec![
                        NormalizedEvent::milestone("session:start"),
                        NormalizedEvent::tool_call("stub_tool"),
                    ],
                    result: SpawnResult {
                        text: text.clone(),
                        session_ref: Some("stub-session".to_string()),
                        agent: input.agent.clone(),
                        model: input.model.clone(),
                        driver: self.driver().to_string(),
                        exit_code: 0,
                        stop_reason: Some("stop".to_string()),
                        error_message: None,
                    },
                    raw: vec![
                        r#"{"type":"session","id":"stub"}"#.to_string(),
                        r#"{"type":"message_end"}"#.to_string(),
                    ],
                    stderr: Vec::new(),
                })
            }
            StubBehavior::Fail => Err(DriverError::ExitedWithoutTerminal {
                code: "1".to_string(),
                stderr_tail: ": stub driver crash".to_string(),
            }),
            StubBehavior::Hang => {
                cancel.cancelled().await;
                Err(DriverError::Cancelled)
            }
        }
    }
}

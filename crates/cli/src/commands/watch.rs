// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mill watch` - stream a run's events until terminal

use crate::error::CliError;
use crate::output::{dim, OutputFormat};
use clap::Args;
use mill_engine::{Supervisor, WatchChannel, WatchEnvelope};
use std::path::Path;

#[derive(Args)]
pub struct WatchArgs {
    /// Run to watch
    #[arg(long = "run", value_name = "runId")]
    pub run_id: String,

    /// Event subset: events, io, or all
    #[arg(long, value_name = "channel", default_value = "events")]
    pub channel: String,
}

pub async fn watch(args: WatchArgs, format: OutputFormat, runs_root: &Path) -> Result<(), CliError> {
    let Some(channel) = WatchChannel::parse(&args.channel) else {
        return Err(CliError::invalid(format!(
            "unknown channel: {} (expected events|io|all)",
            args.channel
        )));
    };

    let supervisor = Supervisor::new(runs_root);
    supervisor
        .watch(&args.run_id, channel, |envelope| match format {
            OutputFormat::Json => {
                if let Ok(line) = serde_json::to_string(&envelope) {
                    println!("{line}");
                }
            }
            OutputFormat::Text => print_envelope(&envelope),
        })
        .await?;
    Ok(())
}

fn print_envelope(envelope: &WatchEnvelope) {
    match envelope {
        WatchEnvelope::Event { event, .. } => {
            println!("{} {}", dim(&event.sequence.to_string()), event.kind);
        }
        WatchEnvelope::Io { source, line, .. } => {
            println!("{} {}", dim(&format!("[{source:?}]").to_lowercase()), line);
        }
    }
}

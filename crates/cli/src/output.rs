// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output rendering: format selection, JSON lines, and status styling.
//!
//! Styling keys off the run status rather than a generic palette: terminal
//! statuses read green/red/yellow at a glance, live ones cyan. Colors drop
//! out under `NO_COLOR`, come back under `MILL_COLOR=1`, and otherwise
//! follow the TTY check.

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use mill_core::RunStatus;
use serde::Serialize;
use std::io::IsTerminal;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Print one complete JSON document on one line (the `--json` contract).
pub fn json_line<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Format-branch helper: JSON line when requested, otherwise `text_fn`.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => json_line(data),
        OutputFormat::Text => {
            text_fn();
            Ok(())
        }
    }
}

/// Whether human output may use color. `NO_COLOR` (any value) wins,
/// `MILL_COLOR=1` forces color for non-TTY consumers, otherwise stdout must
/// be a terminal.
pub fn color_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("MILL_COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Help styling for clap: bold headers, cyan literals.
pub fn help_styles() -> Styles {
    if !color_enabled() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().bold())
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .placeholder(Style::new().dimmed())
}

fn sgr(code: &str, text: &str) -> String {
    if color_enabled() {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

/// A run status, colored by what it means: green for complete, red for
/// failed, yellow for cancelled, cyan for still-moving states.
pub fn paint_status(status: RunStatus) -> String {
    let code = match status {
        RunStatus::Complete => "32",
        RunStatus::Failed => "31",
        RunStatus::Cancelled => "33",
        RunStatus::Running => "36",
        RunStatus::Pending => "2",
    };
    sgr(code, &status.to_string())
}

/// Secondary detail: paths, sequence numbers, stream labels.
pub fn dim(text: &str) -> String {
    sgr("2", text)
}

//! CLI help and argument-boundary specs.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_zero() {
    let temp = Project::empty();
    temp.mill().passes().stdout_has("Usage: mill <command>");
}

#[test]
fn help_lists_the_command_surface() {
    let temp = Project::empty();
    temp.mill()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage: mill <command>")
        .stdout_has("run <program.ts>")
        .stdout_has("status")
        .stdout_has("wait")
        .stdout_has("cancel")
        .stdout_has("watch")
        .stdout_has("ls");
}

#[test]
fn help_does_not_mention_retired_subcommands() {
    let temp = Project::empty();
    temp.mill()
        .args(&["--help"])
        .passes()
        .stdout_lacks("discovery")
        .stdout_lacks("inspect")
        .stdout_lacks("_worker");
}

#[test]
fn unknown_command_exits_one() {
    let temp = Project::empty();
    temp.mill().args(&["discovery"]).exits(1);
    temp.mill().args(&["inspect", "run_1_a"]).exits(1);
}

#[test]
fn unknown_flag_exits_one() {
    let temp = Project::empty();
    temp.mill().args(&["ls", "--frobnicate"]).exits(1);
}

#[test]
fn run_help_shows_usage() {
    let temp = Project::empty();
    temp.mill().args(&["run", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn version_shows_version() {
    let temp = Project::empty();
    temp.mill().args(&["--version"]).passes().stdout_has("0.1");
}

//! CLI help/usage output specs.
//!
//! `conduit` is a thin control-plane client (spec.md §1 Non-goals: no
//! full CLI/TUI), so these only cover argument parsing and help text —
//! nothing here talks to a daemon.

use crate::prelude::*;

#[test]
fn no_args_exits_nonzero_with_usage_on_stderr() {
    conduit().fails().stderr_has("Usage:");
}

#[test]
fn help_shows_usage_and_all_three_verbs() {
    conduit()
        .arg("--help")
        .passes()
        .stdout_has("Usage:")
        .stdout_has("reload")
        .stdout_has("restart-service")
        .stdout_has("get-state");
}

#[test]
fn reload_help_shows_usage() {
    conduit().args(["reload", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn restart_service_help_names_its_argument() {
    conduit().args(["restart-service", "--help"]).passes().stdout_has("Usage:").stdout_has("NAME");
}

#[test]
fn get_state_help_shows_usage() {
    conduit().args(["get-state", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn unknown_subcommand_fails() {
    conduit().arg("not-a-real-command").fails().stderr_has("error");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text/JSON rendering for command results, grounded on oj-cli's
//! `output.rs` dual-format convention but reduced to the three verbs
//! this crate exposes.

use crate::client::{ReloadSummary, StateSnapshot};
use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_reload(summary: &ReloadSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary).unwrap_or_default());
        }
        OutputFormat::Text => {
            print_names("added", &summary.added);
            print_names("removed", &summary.removed);
            print_names("restarted", &summary.restarted);
            print_names("unchanged", &summary.unchanged);
        }
    }
}

fn print_names(label: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!("{label}: {}", names.join(", "));
}

pub fn print_state(state: &StateSnapshot, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(state).unwrap_or_default());
        }
        OutputFormat::Text => {
            println!("{:<24} {:<10} {:<10} {:<10} {:<6} last_error", "NAME", "KIND", "STATE", "HEALTH", "EPOCH");
            for service in &state.services {
                println!(
                    "{:<24} {:<10} {:<10} {:<10} {:<6} {}",
                    service.name,
                    format!("{:?}", service.kind),
                    service.state,
                    service.health,
                    service.epoch,
                    service.last_error.as_deref().unwrap_or("-"),
                );
            }
            println!("\n{} tool(s) in the aggregated catalog", state.catalog_tool_count);
        }
    }
}

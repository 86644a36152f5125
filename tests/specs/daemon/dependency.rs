//! Dependency-ordered startup (spec.md §8 scenario S2): a Service with a
//! `dependsOn` entry only starts once its dependency is Running.
//!
//! The initial start sweep runs to completion before the aggregator's
//! HTTP listener even binds (`conduitd::main` awaits `Supervisor::bootstrap`
//! before serving), so there's no control-plane window to observe an
//! in-between state. Instead this proves the gate held by timing: each
//! fixture server sleeps before reporting ready, so an ungated (parallel)
//! start would take about one delay's worth of wall time, while a
//! correctly gated one takes the sum of both.

use crate::prelude::*;
use std::time::Instant;

#[test]
fn dependent_service_waits_for_its_dependency_before_starting() {
    let project = Project::empty().config(
        r#"
aggregator:
  port: {port}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{stub}", "--tool", "hello", "--delay-ms", "700"]
  - name: beta
    type: localCommand
    command: ["{stub}", "--tool", "world", "--delay-ms", "700"]
    dependsOn: ["alpha"]
"#,
    );

    let start = Instant::now();
    let daemon = project.daemon();
    let elapsed = start.elapsed();

    assert!(
        elapsed >= std::time::Duration::from_millis(1300),
        "boot took only {elapsed:?}; beta appears to have started concurrently with alpha instead of waiting on it"
    );

    assert_eq!(daemon.service_state("alpha").as_deref(), Some("Running"));
    assert_eq!(daemon.service_state("beta").as_deref(), Some("Running"));
}

#[test]
fn dependency_on_an_always_failing_service_leaves_dependent_blocked() {
    let project = Project::empty().config(
        r#"
aggregator:
  port: {port}
mcpServers:
  - name: broken
    type: localCommand
    command: ["false"]
  - name: dependent
    type: localCommand
    command: ["{stub}", "--tool", "hello"]
    dependsOn: ["broken"]
"#,
    );
    let daemon = project.daemon();

    assert_eq!(daemon.service_state("broken").as_deref(), Some("Failed"));
    // `dependent`'s wave never comes up, so it never leaves its initial
    // Unknown state (spec §4.7 step 5 "dependents remain Blocked").
    assert_eq!(daemon.service_state("dependent").as_deref(), Some("Unknown"));
}

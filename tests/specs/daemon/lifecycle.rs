//! Two independent `mcpServers` both reach Running, each exposing one
//! tool through the aggregated catalog (spec.md §8 scenario S1).

use crate::prelude::*;

#[test]
fn two_independent_services_both_reach_running() {
    let project = Project::empty().config(
        r#"
aggregator:
  port: {port}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{stub}", "--tool", "hello"]
  - name: beta
    type: localCommand
    command: ["{stub}", "--tool", "world"]
"#,
    );
    let daemon = project.daemon();

    assert!(daemon.wait_for_state("alpha", "Running"), "alpha never reached Running");
    assert!(daemon.wait_for_state("beta", "Running"), "beta never reached Running");

    let state = daemon.state_json();
    let services = state["services"].as_array().expect("services array");
    assert_eq!(services.len(), 2);
    for service in services {
        assert_eq!(service["health"], "Unknown", "no health check configured, so health stays Unknown");
    }

    // Each service exposes exactly one tool, so the aggregated catalog
    // has two entries total (spec §4.8 namespaced re-exposure).
    assert_eq!(daemon.catalog_tool_count(), 2);
}

#[test]
fn restart_service_bumps_its_epoch() {
    let project = Project::empty().config(
        r#"
aggregator:
  port: {port}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{stub}", "--tool", "hello"]
"#,
    );
    let daemon = project.daemon();
    assert!(daemon.wait_for_state("alpha", "Running"));

    let before = daemon.state_json();
    let epoch_before = before["services"][0]["epoch"].as_u64().expect("epoch is a number");

    daemon.cli().args(["restart-service", "alpha"]).passes();
    assert!(daemon.wait_for_state("alpha", "Running"), "alpha never came back up after restart");

    let after = daemon.state_json();
    let epoch_after = after["services"][0]["epoch"].as_u64().expect("epoch is a number");
    assert!(epoch_after > epoch_before, "epoch {epoch_after} did not advance past {epoch_before}");
}

/// A Service that crashes *after* a `restart-service` call must still be
/// caught: crash detection is bound to the attempt's own scope, not the
/// whole-Service scope `stop()` used to cancel, so it stays alive across
/// the restart instead of going permanently dark.
#[test]
fn restart_service_keeps_crash_detection_alive() {
    let project = Project::empty().config(
        r#"
aggregator:
  port: {port}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{stub}", "--tool", "hello", "--exit-after-ms", "1500"]
"#,
    );
    let daemon = project.daemon();
    assert!(daemon.wait_for_state("alpha", "Running"));

    daemon.cli().args(["restart-service", "alpha"]).passes();
    assert!(daemon.wait_for_state("alpha", "Running"), "alpha never came back up after restart");

    // The post-restart process carries the same `--exit-after-ms` and
    // will exit unprompted in 1.5s; if crash detection survived the
    // restart, the Service leaves Running for it (Retrying, since the
    // default retry policy is enabled). A dead `watch_exit` would leave
    // it stuck reporting Running forever.
    let left_running = wait_for(SPEC_WAIT_MAX_MS, || daemon.service_state("alpha").as_deref() != Some("Running"));
    assert!(left_running, "alpha stayed Running after its process exited, crash detection is dead post-restart");
}

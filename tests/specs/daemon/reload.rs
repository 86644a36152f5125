//! `Reload` diffing (spec.md §8 scenario S6): adding a service after
//! boot shows up as `added`, and removing one on a later reload shows up
//! as `removed`.

use crate::prelude::*;

#[test]
fn reload_reports_added_then_removed_services() {
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

    std::fs::write(
        project.config_dir().join("conduit.yaml"),
        format!(
            r#"
aggregator:
  port: {}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{}", "--tool", "hello"]
  - name: beta
    type: localCommand
    command: ["{}", "--tool", "world"]
"#,
            project.port(),
            mcp_stub_path().display(),
            mcp_stub_path().display(),
        ),
    )
    .expect("rewrite conduit.yaml with beta added");

    let added = daemon.cli().args(["--format", "json", "reload"]).passes();
    let summary: serde_json::Value = serde_json::from_str(&added.stdout).expect("reload printed JSON");
    assert_eq!(summary["added"].as_array().map(|a| a.iter().map(|v| v.as_str()).collect::<Vec<_>>()), Some(vec![Some("beta")]));
    assert!(daemon.wait_for_state("beta", "Running"));

    std::fs::write(
        project.config_dir().join("conduit.yaml"),
        format!(
            r#"
aggregator:
  port: {}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{}", "--tool", "hello"]
"#,
            project.port(),
            mcp_stub_path().display(),
        ),
    )
    .expect("rewrite conduit.yaml with beta removed");

    let removed = daemon.cli().args(["--format", "json", "reload"]).passes();
    let summary: serde_json::Value = serde_json::from_str(&removed.stdout).expect("reload printed JSON");
    assert_eq!(
        summary["removed"].as_array().map(|a| a.iter().map(|v| v.as_str()).collect::<Vec<_>>()),
        Some(vec![Some("beta")])
    );

    let state = daemon.state_json();
    assert_eq!(state["services"].as_array().map(Vec::len), Some(1));
}

/// A mutated-but-not-removed `mcpServer` definition is reported as
/// `restarted`, and the old subprocess is actually stopped before the
/// new one starts: its epoch advances exactly once and the catalog
/// reflects only the new command's tool, never both old and new at
/// once (which would happen if the old process were leaked rather than
/// stopped before respawning).
#[test]
fn reload_restarts_mutated_service_definition() {
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
    assert_eq!(daemon.catalog_tool_count(), 1);

    let epoch_before = daemon.state_json()["services"][0]["epoch"].as_u64().expect("epoch is a number");

    std::fs::write(
        project.config_dir().join("conduit.yaml"),
        format!(
            r#"
aggregator:
  port: {}
mcpServers:
  - name: alpha
    type: localCommand
    command: ["{}", "--tool", "hello-v2"]
"#,
            project.port(),
            mcp_stub_path().display(),
        ),
    )
    .expect("rewrite conduit.yaml with alpha's command mutated");

    let reloaded = daemon.cli().args(["--format", "json", "reload"]).passes();
    let summary: serde_json::Value = serde_json::from_str(&reloaded.stdout).expect("reload printed JSON");
    assert_eq!(
        summary["restarted"].as_array().map(|a| a.iter().map(|v| v.as_str()).collect::<Vec<_>>()),
        Some(vec![Some("alpha")])
    );

    assert!(daemon.wait_for_state("alpha", "Running"), "alpha never came back up after the mutated reload");

    let state = daemon.state_json();
    assert_eq!(state["services"].as_array().map(Vec::len), Some(1), "the old alpha must not linger alongside a new one");
    let epoch_after = state["services"][0]["epoch"].as_u64().expect("epoch is a number");
    assert_eq!(epoch_after, epoch_before + 1, "a leaked old process would start a second runtimeHandle instead of replacing the first");

    // Only the new command's tool is exposed: if the old subprocess had
    // leaked instead of being stopped, the aggregator would still be
    // talking to it too and "hello" would still resolve.
    assert_eq!(daemon.catalog_tool_count(), 1);
}

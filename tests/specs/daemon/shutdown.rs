//! Graceful shutdown (spec.md §6: "responds to SIGTERM/SIGINT by
//! stopping every Service before exiting", §8 scenario S5).

use crate::prelude::*;

#[test]
fn sigterm_stops_services_and_exits_cleanly() {
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
    let mut daemon = project.daemon();
    assert!(daemon.wait_for_state("alpha", "Running"));

    let code = daemon.terminate();
    assert_eq!(code, Some(0), "conduitd did not exit cleanly on SIGTERM");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box integration specs driving the built `conduitd`/`conduit`
//! binaries as real subprocesses.


#[path = "specs/cli/help.rs"]
mod cli_help;

#[path = "specs/daemon/control_plane.rs"]
mod daemon_control_plane;
#[path = "specs/daemon/dependency.rs"]
mod daemon_dependency;
#[path = "specs/daemon/lifecycle.rs"]
mod daemon_lifecycle;
#[path = "specs/daemon/reload.rs"]
mod daemon_reload;
#[path = "specs/daemon/shutdown.rs"]
mod daemon_shutdown;

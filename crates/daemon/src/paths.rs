// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the user-layer and project-layer configuration directories
//! (spec §4.9 "user directory then project directory") and the state
//! directory logs/rolling files are written under.

use std::path::PathBuf;

/// `$XDG_CONFIG_HOME/conduit` (or the platform equivalent via `dirs`),
/// the user layer's home. `None` if the platform has no config dir
/// (the user layer is simply empty in that case, per
/// `DefinitionStore::reload`'s tolerant handling of a missing layer).
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("conduit"))
}

/// The project layer directory: `$PWD/.conduit` unless overridden.
pub fn project_config_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| PathBuf::from(".conduit"))
}

/// Where the daemon writes its rolling log and any other runtime state.
/// Defaults to `$XDG_STATE_HOME/conduit` (falling back to the config
/// dir's parent when no state dir is reported, matching `oj-daemon`'s
/// fallback chain).
pub fn state_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .map(|dir| dir.join("conduit"))
            .unwrap_or_else(|| PathBuf::from(".conduit-state"))
    })
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level daemon error taxonomy (SPEC_FULL.md §10.2): wraps the
//! lower crates' errors the way `oj-daemon`'s `LifecycleError` wraps
//! `AgentAdapterError`/`WalError` without re-deriving their variants.

use conduit_definitions::DefinitionError;
use conduit_engine::OrchestratorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("loading definitions: {0}")]
    Definitions(#[from] DefinitionError),
    #[error("starting services: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("binding container runtime: {0}")]
    Binding(#[from] conduit_engine::BindingError),
    #[error("binding aggregator listener: {0}")]
    Io(#[from] std::io::Error),
}

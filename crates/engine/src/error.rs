// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Registry and Orchestrator (spec §7). Runner/
//! Client failures are folded into `ServiceError::StartFailed`/
//! `InitializeFailed` and recorded on the Service itself rather than
//! raised through these types (spec §7: "not raised through the
//! Orchestrator API, which reports only aggregate outcomes").

use conduit_core::ServiceName;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("service '{0}' already registered")]
    DuplicateName(ServiceName),
    #[error("service '{0}' not found")]
    NotFound(ServiceName),
}

#[derive(Debug, Error, Clone)]
pub enum ServiceError {
    #[error("start already in progress")]
    AlreadyRunning,
    #[error("start failed: {0}")]
    StartFailed(String),
    #[error("stop timed out after {0:?}")]
    StopTimeout(std::time::Duration),
    #[error("initialize failed: {0}")]
    InitializeFailed(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    #[error("cyclic dependency among services: {0:?}")]
    CyclicDependencies(Vec<ServiceName>),
    #[error("service '{0}' depends on '{1}' which is not running")]
    DependencyNotRunning(ServiceName, ServiceName),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

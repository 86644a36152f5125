// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Aggregator (spec §4.8, §7).

use conduit_core::ServiceName;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum AggregatorError {
    #[error("tool '{0}' not found in the aggregated catalog")]
    NotFound(String),
    #[error("service '{0}' unavailable: left Running before dispatch")]
    ServiceUnavailable(ServiceName),
    #[error("tool call failed: {0}")]
    CallFailed(String),
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Registry(#[from] conduit_engine::RegistryError),
}

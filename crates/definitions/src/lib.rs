// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Configuration surface and Definition Store (spec §4.9, §6).
//!
//! Grounded on `oj-runbook`'s layered-import merge idiom
//! (`import::merge::merge_map`), generalized from HCL run-directives to
//! the YAML `mcpServers`/`workflows`/`serviceClasses` shape this system
//! uses, and inverted to let the project layer win over the user layer
//! (SPEC_FULL.md §10.3).

pub mod config;
pub mod factory;
pub mod merge;
pub mod store;
pub mod validate;

pub use config::{
    AggregatorConfig, ConfigDocument, ContainerRuntimeKind, GlobalSettings, LifecycleTools, McpServerDef,
    McpServerType, ServiceClassDef, ServiceClassHealthCheck, ServiceClassTimeouts, TransportKind, WorkflowDef,
    WorkflowStep,
};
pub use factory::{ServiceClassDefinition, ServiceDefinition};
pub use merge::MergeWarning;
pub use store::{DefinitionError, DefinitionRevision, DefinitionStore};
pub use validate::ValidationError;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conduit-adapters: the capability set a live Service is built from.
//!
//! Per SPEC_FULL.md §9 "Dynamic dispatch on runners": a Service holds a
//! `Runner` (`{start, stop, is_running, handle_metadata}`) and an
//! `McpClient` (`{initialize, list_tools, call_tool, close}`) behind small
//! trait objects, not an inheritance hierarchy. This crate owns both
//! capability sets and their concrete implementations:
//!
//! - [`runner`]: the `Runner` trait + shared types (`ReadySignal`,
//!   `RunnerError`, `RuntimeHandle`).
//! - [`process`]: the Process Runner (spec §4.2) — subprocess, process
//!   group, stdout/stderr scraping, readiness-sentinel detection.
//! - [`container`]: the Container Runner (spec §4.3) over a narrow
//!   `ContainerRuntime` capability, with CLI (`docker`) and Kubernetes
//!   (`kube`) backends.
//! - [`client`]: the MCP `Client` trait (spec §4.4) plus stdio and
//!   HTTP/SSE bindings.
//! - [`log_scraper`]: shared output-line classification/re-emission (spec
//!   §4.2), used by both runners.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod container;
pub mod log_scraper;
pub mod process;
pub mod runner;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{ClientError, McpClient};
pub use container::{ContainerRunner, ContainerRuntime, ContainerRuntimeError};
pub use log_scraper::{classify_and_emit, READY_SENTINELS};
pub use process::ProcessRunner;
pub use runner::{Runner, RunnerError, RuntimeHandle};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire formats for the Service Orchestration Core.
//!
//! Two transports share one JSON-RPC payload shape (spec §4.4, §4.8, §6):
//!
//! - `framing`: a 4-byte length-prefix + JSON payload codec, used for the
//!   stdio JSON-RPC child transport (spec §4.4 "bound to the child's
//!   stream"). A byte-stream child process needs explicit message
//!   boundaries, so this keeps the length-prefixed approach the daemon's
//!   Unix-socket IPC already used for the same reason.
//! - `sse`: Server-Sent-Event framing for the aggregator's inbound
//!   streamable-HTTP/SSE transport (spec §4.8, §6 `transport`).
//!
//! `jsonrpc` and `mcp` are shared by both: the JSON-RPC envelope and the
//! MCP-specific method names/payload shapes (`initialize`, `tools/list`,
//! `tools/call`) are identical whether the bytes arrive framed-over-stdio or
//! chunked-over-SSE.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod framing;
pub mod jsonrpc;
pub mod mcp;
pub mod sse;

pub use framing::{decode, encode, read_message, write_message, FramingError};
pub use jsonrpc::{Id, JsonRpcError, Notification, Request, Response, JSONRPC_VERSION};
pub use mcp::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ToolContent,
    ToolDescriptor, ToolsListResult, METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
pub use sse::{encode_event, SseEvent};

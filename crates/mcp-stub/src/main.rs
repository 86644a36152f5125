// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A minimal stdio MCP server, used only as a test fixture for the
//! black-box daemon specs under `tests/`. Speaks exactly the framing and
//! JSON-RPC shapes `conduit-wire` defines so it can stand in for a real
//! `localCommand` tool server without a network dependency.
//!
//! `--tool NAME` (repeatable) advertises a tool by that name from
//! `tools/list`. `--delay-ms N` sleeps before emitting the readiness
//! sentinel, to let specs exercise dependency ordering. `--exit-after-ms
//! N` kills the process unprompted N milliseconds after startup, to let
//! specs exercise crash detection.

use conduit_wire::jsonrpc::{JsonRpcError, Request, Response};
use conduit_wire::mcp::{
    CallToolResult, InitializeResult, ToolContent, ToolDescriptor, ToolsListResult,
    METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use conduit_wire::{decode, encode, read_message, write_message};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let mut tools = Vec::new();
    let mut delay_ms: u64 = 0;
    let mut exit_after_ms: u64 = 0;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tool" => tools.extend(args.next()),
            "--delay-ms" => delay_ms = args.next().and_then(|v| v.parse().ok()).unwrap_or(0),
            "--exit-after-ms" => exit_after_ms = args.next().and_then(|v| v.parse().ok()).unwrap_or(0),
            _ => {}
        }
    }

    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
    eprintln!("Application startup complete.");

    if exit_after_ms > 0 {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(exit_after_ms)).await;
            std::process::exit(1);
        });
    }

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();

    loop {
        let bytes = match read_message(&mut stdin).await {
            Ok(bytes) => bytes,
            Err(_) => break,
        };
        let Ok(request) = decode::<Request>(&bytes) else { continue };
        let response = handle(&request, &tools);
        let Ok(payload) = encode(&response) else { continue };
        if write_message(&mut stdout, &payload).await.is_err() {
            break;
        }
    }
}

fn handle(request: &Request, tools: &[String]) -> Response {
    match request.method.as_str() {
        METHOD_INITIALIZE => {
            let result = InitializeResult {
                protocol_version: "2024-11-05".to_string(),
                capabilities: serde_json::json!({}),
                server_info: None,
            };
            Response::success(request.id.clone(), to_value(&result))
        }
        METHOD_TOOLS_LIST => {
            let descriptors = tools
                .iter()
                .map(|name| ToolDescriptor {
                    name: name.clone(),
                    description: None,
                    input_schema: serde_json::json!({"type": "object"}),
                })
                .collect();
            let result = ToolsListResult { tools: descriptors };
            Response::success(request.id.clone(), to_value(&result))
        }
        METHOD_TOOLS_CALL => {
            let result = CallToolResult {
                content: vec![ToolContent { kind: "text".to_string(), body: serde_json::json!({"text": "ok"}) }],
                is_error: false,
            };
            Response::success(request.id.clone(), to_value(&result))
        }
        other => Response::failure(
            request.id.clone(),
            JsonRpcError::new(JsonRpcError::METHOD_NOT_FOUND, format!("unknown method {other}")),
        ),
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared JSON-RPC method dispatch (spec §6 "Required methods:
//! initialize, tools/list, tools/call"), used by both the
//! streamable-HTTP and SSE transport bindings so the two differ only in
//! framing, never in semantics.

use crate::aggregator::Aggregator;
use crate::error::AggregatorError;
use conduit_wire::jsonrpc::{JsonRpcError, Request, Response};
use conduit_wire::mcp::{
    CallToolParams, ClientInfo, InitializeResult, ToolDescriptor, ToolsListResult, METHOD_INITIALIZE,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use std::sync::Arc;

/// Handle one decoded JSON-RPC `Request`, returning the `Response` to
/// frame back to the caller (as a bare JSON body over streamable-HTTP, or
/// as an SSE `data:` event — see `crate::transport`).
pub async fn dispatch(aggregator: &Arc<Aggregator>, request: Request) -> Response {
    let id = request.id.clone();
    match request.method.as_str() {
        METHOD_INITIALIZE => {
            let result = InitializeResult {
                protocol_version: "2024-11-05".to_string(),
                capabilities: serde_json::json!({ "tools": {} }),
                server_info: Some(ClientInfo { name: "conduit-aggregator".to_string(), version: env!("CARGO_PKG_VERSION").to_string() }),
            };
            match serde_json::to_value(result) {
                Ok(value) => Response::success(id, value),
                Err(err) => Response::failure(id, JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, err.to_string())),
            }
        }
        METHOD_TOOLS_LIST => {
            let snapshot = aggregator.list_tools();
            let tools: Vec<ToolDescriptor> = snapshot
                .iter()
                .map(|entry| ToolDescriptor {
                    name: entry.exposed_name.clone(),
                    description: None,
                    input_schema: entry.schema.clone(),
                })
                .collect();
            match serde_json::to_value(ToolsListResult { tools }) {
                Ok(value) => Response::success(id, value),
                Err(err) => Response::failure(id, JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, err.to_string())),
            }
        }
        METHOD_TOOLS_CALL => {
            let Some(params) = request.params else {
                return Response::failure(id, JsonRpcError::new(JsonRpcError::INVALID_PARAMS, "missing params"));
            };
            let params: CallToolParams = match serde_json::from_value(params) {
                Ok(p) => p,
                Err(err) => {
                    return Response::failure(id, JsonRpcError::new(JsonRpcError::INVALID_PARAMS, err.to_string()))
                }
            };
            match aggregator.call_tool(&params.name, params.arguments).await {
                Ok(result) => match serde_json::to_value(result) {
                    Ok(value) => Response::success(id, value),
                    Err(err) => Response::failure(id, JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, err.to_string())),
                },
                Err(err) => Response::failure(id, to_jsonrpc_error(err)),
            }
        }
        other => Response::failure(id, JsonRpcError::new(JsonRpcError::METHOD_NOT_FOUND, format!("unknown method '{other}'"))),
    }
}

fn to_jsonrpc_error(err: AggregatorError) -> JsonRpcError {
    match err {
        AggregatorError::NotFound(name) => {
            JsonRpcError::new(JsonRpcError::METHOD_NOT_FOUND, format!("tool '{name}' not found"))
        }
        AggregatorError::ServiceUnavailable(name) => {
            JsonRpcError::new(-32001, format!("service '{name}' unavailable")).with_data(serde_json::json!({ "kind": "ServiceUnavailable" }))
        }
        AggregatorError::Cancelled => {
            JsonRpcError::new(-32002, "cancelled").with_data(serde_json::json!({ "kind": "Cancelled" }))
        }
        other => JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use conduit_engine::ServiceRegistry;
    use conduit_wire::jsonrpc::Id;

    #[tokio::test]
    async fn tools_list_on_empty_catalog_returns_empty_array() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(registry, "x");
        let request = Request::new(Id::Number(1), METHOD_TOOLS_LIST, None);
        let response = dispatch(&aggregator, request).await;
        let result = response.into_result().expect("ok");
        let parsed: ToolsListResult = serde_json::from_value(result).expect("decode");
        assert!(parsed.tools.is_empty());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(registry, "x");
        let request = Request::new(Id::Number(1), "bogus/method", None);
        let response = dispatch(&aggregator, request).await;
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_call_for_unknown_tool_returns_method_not_found_error() {
        let registry = ServiceRegistry::new();
        let aggregator = Aggregator::new(registry, "x");
        let params = serde_json::to_value(CallToolParams { name: "xghost_nope".to_string(), arguments: serde_json::json!({}) }).expect("encode");
        let request = Request::new(Id::Number(1), METHOD_TOOLS_CALL, Some(params));
        let response = dispatch(&aggregator, request).await;
        let err = response.into_result().unwrap_err();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
    }
}

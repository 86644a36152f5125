// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSE transport (spec §6 `aggregator.transport: sse`): each JSON-RPC
//! request still arrives as a POST body, but the response is framed as a
//! single `text/event-stream` event instead of a bare JSON body, for
//! clients that only speak the SSE half of MCP's streamable transport.

use crate::aggregator::Aggregator;
use crate::rpc::dispatch;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::post;
use axum::{Json, Router};
use conduit_wire::jsonrpc::Request as RpcRequest;
use conduit_wire::sse::{encode_event, SseEvent};
use std::sync::Arc;

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new().route("/", post(handle)).with_state(aggregator)
}

async fn handle(State(aggregator): State<Arc<Aggregator>>, Json(request): Json<RpcRequest>) -> HttpResponse {
    let id = request.id.clone();
    let response = dispatch(&aggregator, request).await;
    let body = match serde_json::to_string(&response) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(%err, "failed to encode SSE response body");
            String::new()
        }
    };
    let event = SseEvent::message(id.to_string(), body);
    let framed = encode_event(&event);
    ([(header::CONTENT_TYPE, "text/event-stream")], framed).into_response()
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streamable-HTTP transport (spec §6 `aggregator.transport:
//! streamable-http`, the default): one JSON-RPC request per POST body,
//! one JSON-RPC response per response body.

use crate::aggregator::Aggregator;
use crate::rpc::dispatch;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use conduit_wire::jsonrpc::Request as RpcRequest;
use std::sync::Arc;

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new().route("/", post(handle)).route("/healthz", get(healthz)).with_state(aggregator)
}

async fn handle(State(aggregator): State<Arc<Aggregator>>, Json(request): Json<RpcRequest>) -> HttpResponse {
    let response = dispatch(&aggregator, request).await;
    Json(response).into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

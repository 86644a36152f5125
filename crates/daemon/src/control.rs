// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane HTTP endpoints (spec §6: `Reload`, `RestartService`,
//! `GetState`). Mounted under `/control` alongside the Aggregator's own
//! JSON-RPC router so a single listener serves both the tool surface and
//! the embedding-process's control operations, the way `oj-daemon`
//! serves its wire protocol and its query/mutation endpoints off the one
//! Unix socket listener.

use crate::supervisor::Supervisor;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use conduit_core::{ServiceName, ServiceSnapshot};
use serde::Serialize;
use std::sync::Arc;

pub fn router(supervisor: Arc<Supervisor>) -> Router {
    Router::new()
        .route("/reload", post(reload))
        .route("/services/:name/restart", post(restart_service))
        .route("/state", get(get_state))
        .with_state(supervisor)
}

async fn reload(State(supervisor): State<Arc<Supervisor>>) -> Response {
    match supervisor.reload().await {
        Ok(summary) => Json(summary_to_json(&summary)).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn restart_service(State(supervisor): State<Arc<Supervisor>>, Path(name): Path<String>) -> Response {
    match supervisor.orchestrator().restart_service(&ServiceName::new(name)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(conduit_engine::OrchestratorError::Registry(conduit_engine::RegistryError::NotFound(_))) => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct StateResponse {
    services: Vec<ServiceSnapshot>,
    catalog_tool_count: usize,
}

async fn get_state(State(supervisor): State<Arc<Supervisor>>) -> Json<StateResponse> {
    let services = supervisor.orchestrator().get_state();
    let catalog_tool_count = supervisor.aggregator().list_tools().len();
    Json(StateResponse { services, catalog_tool_count })
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    added: Vec<String>,
    removed: Vec<String>,
    restarted: Vec<String>,
    unchanged: Vec<String>,
}

fn summary_to_json(summary: &conduit_engine::ReloadSummary) -> ReloadResponse {
    let names = |list: &[ServiceName]| list.iter().map(|n| n.to_string()).collect();
    ReloadResponse {
        added: names(&summary.added),
        removed: names(&summary.removed),
        restarted: names(&summary.restarted),
        unchanged: names(&summary.unchanged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use conduit_definitions::DefinitionStore;
    use conduit_engine::{ContainerRuntimes, Orchestrator};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn empty_supervisor() -> (Arc<Supervisor>, TempDir) {
        let project = TempDir::new().expect("tempdir");
        let store = DefinitionStore::new(None, project.path().to_path_buf());
        let orchestrator = Orchestrator::new(ContainerRuntimes::docker_only());
        let aggregator = Aggregator::new(Arc::clone(orchestrator.registry()), "x");
        (Arc::new(Supervisor::new(store, orchestrator, aggregator)), project)
    }

    use conduit_aggregator::Aggregator;

    #[tokio::test]
    async fn get_state_on_empty_registry_returns_empty_list() {
        let (supervisor, _project) = empty_supervisor();
        let app = router(supervisor);
        let response = app
            .oneshot(Request::builder().method("GET").uri("/state").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn restart_unknown_service_is_not_found() {
        let (supervisor, _project) = empty_supervisor();
        let app = router(supervisor);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/services/ghost/restart")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reload_on_empty_project_dir_succeeds() {
        let (supervisor, _project) = empty_supervisor();
        let app = router(supervisor);
        let response = app
            .oneshot(Request::builder().method("POST").uri("/reload").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for the daemon's control plane, grounded on oj-cli's
//! `client_queries.rs` request/response shape but issuing plain JSON
//! requests over HTTP instead of the oj wire protocol over a Unix
//! socket — the aggregator serves its control plane as an HTTP API
//! (spec §6), so there is no socket framing to replicate here.

use crate::error::ExitError;
use conduit_core::ServiceSnapshot;
use serde::{Deserialize, Serialize};

pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub restarted: Vec<String>,
    pub unchanged: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub services: Vec<ServiceSnapshot>,
    pub catalog_tool_count: usize,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::Client::new() }
    }

    pub async fn reload(&self) -> Result<ReloadSummary, ExitError> {
        let url = format!("{}/control/reload", self.base_url);
        let response = self.http.post(url).send().await?;
        Self::into_json(response).await
    }

    pub async fn restart_service(&self, name: &str) -> Result<(), ExitError> {
        let url = format!("{}/control/services/{}/restart", self.base_url, name);
        let response = self.http.post(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            Ok(())
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(ExitError::new(1, format!("no such service: {name}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ExitError::new(1, format!("restart failed ({status}): {body}")))
        }
    }

    pub async fn get_state(&self) -> Result<StateSnapshot, ExitError> {
        let url = format!("{}/control/state", self.base_url);
        let response = self.http.get(url).send().await?;
        Self::into_json(response).await
    }

    async fn into_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, ExitError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExitError::new(1, format!("daemon returned {status}: {body}")));
        }
        response.json::<T>().await.map_err(|err| ExitError::new(1, format!("malformed response from daemon: {err}")))
    }
}

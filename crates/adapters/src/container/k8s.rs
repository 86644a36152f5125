// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes `ContainerRuntime` backend via `kube`/`k8s-openapi`, grounded
//! on the teacher's `KubernetesAdapter` pod lifecycle (one Pod per
//! container-kind Service instead of one per agent).

use super::{ContainerRuntime, ContainerRuntimeError, ContainerSpec};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, ContainerPort, EnvVar, Pod, PodSpec};
use kube::api::{Api, DeleteParams, LogParams, PostParams};
use kube::Client;

pub struct KubePods {
    client: Client,
    namespace: String,
}

impl KubePods {
    pub async fn new(namespace: impl Into<String>) -> Result<Self, ContainerRuntimeError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ContainerRuntimeError::StartFailed(format!("kube client: {e}")))?;
        Ok(Self { client, namespace: namespace.into() })
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn build_pod(name: &str, spec: &ContainerSpec) -> Pod {
        Pod {
            metadata: kube::api::ObjectMeta { name: Some(name.to_string()), ..Default::default() },
            spec: Some(PodSpec {
                restart_policy: Some("Never".to_string()),
                containers: vec![Container {
                    name: name.to_string(),
                    image: Some(spec.image.clone()),
                    ports: Some(
                        spec.ports
                            .iter()
                            .map(|&p| ContainerPort { container_port: p as i32, ..Default::default() })
                            .collect(),
                    ),
                    env: Some(
                        spec.env
                            .iter()
                            .map(|(k, v)| EnvVar {
                                name: k.clone(),
                                value: Some(v.clone()),
                                ..Default::default()
                            })
                            .collect(),
                    ),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContainerRuntime for KubePods {
    async fn pull_image(&self, _image: &str) -> Result<(), ContainerRuntimeError> {
        // Kubernetes pulls the image as part of scheduling the pod; there
        // is no separate pull step to perform up front.
        Ok(())
    }

    async fn start_container(
        &self,
        spec: &ContainerSpec,
        name: &str,
    ) -> Result<String, ContainerRuntimeError> {
        let pod = Self::build_pod(name, spec);
        self.pods()
            .create(&PostParams::default(), &pod)
            .await
            .map_err(|e| ContainerRuntimeError::StartFailed(e.to_string()))?;
        Ok(name.to_string())
    }

    async fn stop_container(&self, id: &str) -> Result<(), ContainerRuntimeError> {
        self.pods()
            .delete(id, &DeleteParams::default())
            .await
            .map_err(|e| ContainerRuntimeError::StopFailed(e.to_string()))?;
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<(), ContainerRuntimeError> {
        let _ = self.pods().delete(id, &DeleteParams::background()).await;
        Ok(())
    }

    async fn is_running(&self, id: &str) -> Result<bool, ContainerRuntimeError> {
        match self.pods().get_status(id).await {
            Ok(pod) => Ok(pod
                .status
                .and_then(|s| s.phase)
                .map(|phase| phase == "Running")
                .unwrap_or(false)),
            Err(_) => Ok(false),
        }
    }

    async fn get_container_logs(&self, id: &str) -> Result<String, ContainerRuntimeError> {
        self.pods()
            .logs(id, &LogParams::default())
            .await
            .map_err(|_| ContainerRuntimeError::NotFound(id.to_string()))
    }

    async fn get_container_port(
        &self,
        id: &str,
        internal_port: u16,
    ) -> Result<Option<u16>, ContainerRuntimeError> {
        // Pods are addressed by cluster IP + container port directly — no
        // host-port remapping exists in the Kubernetes backend, unlike the
        // Docker CLI backend's `-P` publish. The "host port" the Container
        // Runner's generic contract asks for is simply the container port
        // once the pod is confirmed Running.
        if self.is_running(id).await? {
            Ok(Some(internal_port))
        } else {
            Ok(None)
        }
    }
}

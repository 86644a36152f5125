// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `docker` CLI-shelling `ContainerRuntime` backend, grounded on the
//! teacher's `run_docker` subprocess-shelling helper.

use super::{ContainerRuntime, ContainerRuntimeError, ContainerSpec};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str]) -> Result<String, String> {
        let output = tokio::process::Command::new("docker")
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to exec docker: {e}"))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn pull_image(&self, image: &str) -> Result<(), ContainerRuntimeError> {
        self.run(&["pull", image])
            .await
            .map(|_| ())
            .map_err(|cause| ContainerRuntimeError::PullFailed { image: image.to_string(), cause })
    }

    async fn start_container(
        &self,
        spec: &ContainerSpec,
        name: &str,
    ) -> Result<String, ContainerRuntimeError> {
        let mut args: Vec<String> = vec!["run".into(), "-d".into(), "--name".into(), name.into()];
        for port in &spec.ports {
            args.push("-P".into()); // publish all exposed ports to random host ports
            let _ = port; // port number itself is read back via `get_container_port`
        }
        for (key, value) in &spec.env {
            args.push("-e".into());
            args.push(format!("{key}={value}"));
        }
        for volume in &spec.volumes {
            args.push("-v".into());
            args.push(volume.clone());
        }
        args.push(spec.image.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&arg_refs).await.map_err(ContainerRuntimeError::StartFailed)
    }

    async fn stop_container(&self, id: &str) -> Result<(), ContainerRuntimeError> {
        self.run(&["stop", id]).await.map(|_| ()).map_err(ContainerRuntimeError::StopFailed)
    }

    async fn remove_container(&self, id: &str) -> Result<(), ContainerRuntimeError> {
        let _ = self.run(&["rm", "-f", id]).await;
        Ok(())
    }

    async fn is_running(&self, id: &str) -> Result<bool, ContainerRuntimeError> {
        match self.run(&["inspect", "-f", "{{.State.Running}}", id]).await {
            Ok(out) => Ok(out.trim() == "true"),
            Err(_) => Ok(false),
        }
    }

    async fn get_container_logs(&self, id: &str) -> Result<String, ContainerRuntimeError> {
        self.run(&["logs", id]).await.map_err(|_| ContainerRuntimeError::NotFound(id.to_string()))
    }

    async fn get_container_port(
        &self,
        id: &str,
        internal_port: u16,
    ) -> Result<Option<u16>, ContainerRuntimeError> {
        let spec = format!("{internal_port}/tcp");
        match self.run(&["port", id, &spec]).await {
            Ok(out) => Ok(parse_docker_port_output(&out)),
            Err(_) => Ok(None),
        }
    }
}

/// Parse `docker port <id> <port>` output, e.g. `0.0.0.0:9100` or
/// `:::9100`, into the host port number.
fn parse_docker_port_output(out: &str) -> Option<u16> {
    let line = out.lines().next()?;
    let port_str = line.rsplit(':').next()?;
    port_str.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_and_ipv6_docker_port_output() {
        assert_eq!(parse_docker_port_output("0.0.0.0:9100"), Some(9100));
        assert_eq!(parse_docker_port_output(":::9100"), Some(9100));
        assert_eq!(parse_docker_port_output(""), None);
    }
}

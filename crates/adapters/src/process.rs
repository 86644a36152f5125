// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process Runner (spec §4.2): launches a command as a subprocess, puts it
//! in its own process group so termination can be broadcast, scrapes
//! output into classified log lines, detects the readiness sentinel, and
//! reaps the child on stop.
//!
//! Design decision (not pinned by spec §4.2, which asks for both stdout
//! and stderr to be scraped as line streams): stdout is reserved for the
//! length-prefixed MCP JSON-RPC protocol the `McpClient` stdio binding
//! speaks (spec §4.4), so only stderr is scraped for log classification
//! and readiness-sentinel detection here — the two encodings cannot share
//! one file descriptor. See DESIGN.md.

use crate::log_scraper::{classify_and_emit, is_ready_sentinel};
use crate::runner::{Runner, RunnerError, RunnerSignal, RuntimeHandle};
use async_trait::async_trait;
use conduit_core::{Epoch, ServiceName};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How long after the soft signal to wait before escalating to a hard
/// kill (spec §4.2: "escalating after 2s to hard kill").
const ESCALATION_DELAY: Duration = Duration::from_secs(2);

/// What to launch. Carried on the Service's `localCommand` definition
/// (spec §6 `command[]`, `env{}`).
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub command: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<std::path::PathBuf>,
}

pub struct ProcessRunner {
    name: ServiceName,
    spec: ProcessSpec,
    /// Live children keyed by pid, so `stop` can find the handle without
    /// the caller needing to keep a `Child` around — the Service only
    /// ever sees the opaque `RuntimeHandle::Pid`.
    children: parking_lot::Mutex<std::collections::HashMap<u32, Child>>,
}

impl ProcessRunner {
    pub fn new(name: ServiceName, spec: ProcessSpec) -> Self {
        Self { name, spec, children: parking_lot::Mutex::new(std::collections::HashMap::new()) }
    }

    /// Hand the child's stdin/stdout to the caller exactly once, for
    /// wiring into a stdio `McpClient` (spec §4.4). Returns `None` if
    /// already taken or the handle is unknown.
    pub fn take_stdio(&self, handle: &RuntimeHandle) -> Option<(ChildStdin, ChildStdout)> {
        let RuntimeHandle::Pid(pid) = handle else { return None };
        let mut children = self.children.lock();
        let child = children.get_mut(pid)?;
        Some((child.stdin.take()?, child.stdout.take()?))
    }
}

#[async_trait]
impl Runner for ProcessRunner {
    async fn start(
        &self,
        _epoch: Epoch,
        signals: mpsc::Sender<RunnerSignal>,
        cancel: CancellationToken,
    ) -> Result<RuntimeHandle, RunnerError> {
        let (program, args) = self
            .spec
            .command
            .split_first()
            .ok_or_else(|| RunnerError::SpawnFailed("empty command".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(self.spec.env.iter().cloned())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            // Own process group: `pid == pgid`, so `killpg` reaches every
            // descendant the command spawns (spec §4.2 "broadcast").
            .process_group(0);
        if let Some(cwd) = &self.spec.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| RunnerError::SpawnFailed(e.to_string()))?;
        let pid = child.id().ok_or_else(|| RunnerError::SpawnFailed("no pid".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            spawn_scraper(self.name.clone(), stderr, signals.clone());
        }

        tokio::spawn(watch_exit(pid, signals, cancel));

        self.children.lock().insert(pid, child);
        Ok(RuntimeHandle::Pid(pid))
    }

    async fn stop(
        &self,
        handle: &RuntimeHandle,
        timeout: Duration,
    ) -> Result<(), RunnerError> {
        let RuntimeHandle::Pid(pid) = handle else {
            return Err(RunnerError::HandleNotFound(handle.to_string()));
        };
        let mut child = {
            let mut children = self.children.lock();
            match children.remove(pid) {
                Some(child) => child,
                None => return Ok(()), // already reaped
            }
        };

        let pgid = Pid::from_raw(*pid as i32);
        let _ = killpg(pgid, Signal::SIGTERM);

        let reaped = tokio::time::timeout(ESCALATION_DELAY, child.wait()).await;
        if reaped.is_ok() {
            return Ok(());
        }

        let _ = killpg(pgid, Signal::SIGKILL);
        match tokio::time::timeout(timeout.saturating_sub(ESCALATION_DELAY), child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => Err(RunnerError::StopTimeout(timeout)),
        }
    }

    async fn is_running(&self, handle: &RuntimeHandle) -> bool {
        let RuntimeHandle::Pid(pid) = handle else { return false };
        matches!(
            self.children.lock().get_mut(pid).map(|c| c.try_wait()),
            Some(Ok(None))
        )
    }

    fn service_name(&self) -> &ServiceName {
        &self.name
    }
}

/// Poll a child's liveness out-of-band via a signal-0 probe rather than
/// consuming the real `Child::wait` (the `Child` itself stays owned by
/// `self.children` so `stop` can still reap it). When it exits on its own,
/// signal `Exited` (spec §4.1: "A Running service whose runtimeHandle
/// exits unexpectedly transitions to Failed").
async fn watch_exit(pid: u32, signals: mpsc::Sender<RunnerSignal>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                // SAFETY-free liveness probe: signal 0 reports existence only.
                if nix::sys::signal::kill(Pid::from_raw(pid as i32), None).is_err() {
                    let _ = signals.send(RunnerSignal::Exited { code: None, error: Some(
                        "process exited unexpectedly".to_string(),
                    ) }).await;
                    return;
                }
            }
        }
    }
}

fn spawn_scraper(
    name: ServiceName,
    stream: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    signals: mpsc::Sender<RunnerSignal>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let level = classify_and_emit(&name, &line);
            let _ = signals.send(RunnerSignal::Log { level, line: line.clone() }).await;
            if is_ready_sentinel(&line) {
                let _ = signals.send(RunnerSignal::Ready).await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn start_emits_ready_on_sentinel_and_reports_pid() {
        let spec = ProcessSpec {
            command: vec![
                "sh".into(),
                "-c".into(),
                "echo 'Application startup complete.' >&2; sleep 5".into(),
            ],
            env: vec![],
            cwd: None,
        };
        let runner = ProcessRunner::new(ServiceName::new("alpha"), spec);
        let (tx, mut rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = runner.start(Epoch::ZERO, tx, cancel.clone()).await.expect("start");
        assert!(matches!(handle, RuntimeHandle::Pid(_)));

        let mut saw_ready = false;
        for _ in 0..20 {
            match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
                Ok(Some(RunnerSignal::Ready)) => {
                    saw_ready = true;
                    break;
                }
                Ok(Some(_)) => continue,
                _ => break,
            }
        }
        assert!(saw_ready, "expected a Ready signal from the sentinel line");

        cancel.cancel();
        runner.stop(&handle, Duration::from_secs(5)).await.expect("stop");
        assert!(!runner.is_running(&handle).await);
    }

    #[tokio::test]
    async fn take_stdio_hands_over_stdin_and_stdout_exactly_once() {
        let spec = ProcessSpec { command: vec!["cat".into()], env: vec![], cwd: None };
        let runner = ProcessRunner::new(ServiceName::new("gamma"), spec);
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let handle = runner.start(Epoch::ZERO, tx, cancel.clone()).await.expect("start");

        assert!(runner.take_stdio(&handle).is_some());
        assert!(runner.take_stdio(&handle).is_none(), "second take must yield nothing");

        cancel.cancel();
        runner.stop(&handle, Duration::from_secs(5)).await.expect("stop");
    }

    #[tokio::test]
    async fn stop_on_unknown_handle_is_a_noop() {
        let spec = ProcessSpec { command: vec!["true".into()], env: vec![], cwd: None };
        let runner = ProcessRunner::new(ServiceName::new("beta"), spec);
        runner
            .stop(&RuntimeHandle::Pid(999_999), Duration::from_secs(1))
            .await
            .expect("stop on missing handle is ok");
    }
}

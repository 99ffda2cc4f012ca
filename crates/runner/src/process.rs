// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution: spawn, stream stdout/stderr line-by-line, enforce a
//! timeout, and support two-stage kill escalation (SIGTERM → SIGKILL).
//!
//! Generalizes the gate-command helper pattern (a single blocking
//! run-with-timeout check) into a long-running, cancellable, streamed
//! command — the shape `nf-agent` needs for dispatched ops.

use crate::error::RunnerError;
use crate::signal::send_signal;
use nf_core::op::OpId;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct OutputLine {
    pub op_id: OpId,
    pub stream: OutputStream,
    pub line: String,
}

/// Outcome of waiting on a spawned command.
#[derive(Debug)]
pub enum RunOutcome {
    Exited(i32),
    TimedOut,
}

/// A running (or just-finished) subprocess, tracked for kill escalation.
pub struct RunningProcess {
    child: Child,
    op_id: OpId,
}

impl RunningProcess {
    /// Spawns `program` with `args`, streaming each stdout/stderr line onto
    /// `output_tx` as it arrives. The caller awaits [`Self::wait_with_timeout`]
    /// to learn whether the process finished or hit its deadline.
    pub fn spawn(
        op_id: OpId,
        program: &str,
        args: &[String],
        cwd: Option<&std::path::Path>,
        output_tx: mpsc::UnboundedSender<OutputLine>,
    ) -> Result<Self, RunnerError> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            command: program.to_string(),
            source,
        })?;

        if let Some(stdout) = child.stdout.take() {
            spawn_line_relay(op_id, OutputStream::Stdout, stdout, output_tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_relay(op_id, OutputStream::Stderr, stderr, output_tx);
        }

        tracing::info!(op_id = %op_id, command = program, "spawned subprocess");
        Ok(Self { child, op_id })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Waits for the child to exit, or returns `TimedOut` once `timeout`
    /// elapses. The child keeps running on timeout — the caller is expected
    /// to drive kill escalation via [`Self::kill`] from here.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> RunOutcome {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => RunOutcome::Exited(status.code().unwrap_or(-1)),
            Ok(Err(e)) => {
                tracing::warn!(op_id = %self.op_id, error = %e, "wait() failed, treating as timeout");
                RunOutcome::TimedOut
            }
            Err(_) => RunOutcome::TimedOut,
        }
    }

    /// Sends SIGTERM (or SIGKILL) to the child. Platform-portable on Unix via
    /// `nix::sys::signal::kill`, which forbids us from needing an `unsafe`
    /// `libc::kill` call under the workspace's `unsafe_code = "forbid"` lint.
    pub fn kill(&self, signal: KillSignal) -> Result<(), RunnerError> {
        let pid = self.pid().ok_or(RunnerError::NoPid)?;
        send_signal(pid, signal)
    }

    /// Polls whether the child has already exited without blocking.
    pub fn try_wait(&mut self) -> Option<i32> {
        self.child.try_wait().ok().flatten().map(|s| s.code().unwrap_or(-1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSignal {
    Sigterm,
    Sigkill,
}

fn spawn_line_relay<R>(
    op_id: OpId,
    stream: OutputStream,
    reader: R,
    tx: mpsc::UnboundedSender<OutputLine>,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(OutputLine { op_id, stream, line }).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(op_id = %op_id, error = %e, "error reading subprocess output");
                    break;
                }
            }
        }
    });
}

/// Drives the SIGTERM → (5s) → SIGKILL → (5s) → give-up escalation from
/// §4.2's "Kill escalation". Returns `true` if the process exited during
/// either wait window, `false` if it never responded (caller should surface
/// `KILL_FAILED`).
pub async fn escalate_kill(process: &mut RunningProcess, stage_wait: Duration) -> bool {
    if process.kill(KillSignal::Sigterm).is_ok() {
        if matches!(process.wait_with_timeout(stage_wait).await, RunOutcome::Exited(_)) {
            return true;
        }
    }
    if process.kill(KillSignal::Sigkill).is_ok() {
        if matches!(process.wait_with_timeout(stage_wait).await, RunOutcome::Exited(_)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch execution (§4.1): runs the subprocess for a dispatched op kind,
//! streams output, and drives the exit-101 self-restart contract for a
//! successful `switch`/`pull-switch` on NixOS.

use nf_core::{OpId, OpKind, Platform};
use nf_protocol::{AgentMessage, OutputStream as WireStream};
use nf_runner::{OutputLine, OutputStream, RunnerError, RunningProcess};
use std::time::Duration;
use tokio::sync::mpsc;

/// `nixos-rebuild switch`/`darwin-rebuild switch`/`home-manager switch`
/// completed with exit 0 — the caller must run the exit-101 contract rather
/// than send a normal `command_complete`.
pub const UNRECOGNIZED_DISPATCH_EXIT_CODE: i32 = 127;

/// How long to wait for the write queue to drain before exiting 101,
/// per §4.1 step 2 ("wait ≥ 500 ms to drain the write queue").
pub const EXIT_101_DRAIN: Duration = Duration::from_millis(500);

/// Resolves an `OpKind` + platform into the subprocess invocation. `Kill`
/// and `Reboot` never reach here — they're distinct envelope variants, not
/// `Dispatch` kinds — so they fall through to `None` and surface as an
/// unrecognized dispatch per §4.1's failure-mode policy. `PullSwitch` also
/// returns `None` here: it isn't a single subprocess, it's the two-step
/// sequence `pull_switch_steps` builds, run by `run()` below.
pub fn command_for(kind: OpKind, platform: Platform, args: &[String]) -> Option<(String, Vec<String>)> {
    match kind {
        OpKind::Pull => Some(("git".into(), prepend("pull", args))),
        OpKind::RefreshLock => Some(("nix".into(), prepend2("flake", "update", args))),
        OpKind::Switch => switch_command(platform, args),
        OpKind::Test => match platform {
            Platform::Nixos => Some(("nixos-rebuild".into(), prepend("test", args))),
            Platform::DarwinSystem => Some(("darwin-rebuild".into(), prepend("check", args))),
            Platform::DarwinHome => Some(("home-manager".into(), prepend("build", args))),
        },
        OpKind::PullSwitch | OpKind::Kill | OpKind::Reboot => None,
    }
}

/// The `pull-switch` step sequence (§4.1: "for a switch (and pull-switch)
/// op"): a plain `git pull` followed by the same per-platform switch
/// invocation `command_for(Switch, ..)` builds. Dispatch args apply to the
/// switch step; the pull step is always bare.
fn pull_switch_steps(platform: Platform, args: &[String]) -> ((String, Vec<String>), (String, Vec<String>)) {
    let pull = ("git".to_string(), prepend("pull", &[]));
    let switch = switch_command(platform, args).expect("switch_command is total over Platform");
    (pull, switch)
}

fn switch_command(platform: Platform, args: &[String]) -> Option<(String, Vec<String>)> {
    match platform {
        Platform::Nixos => Some(("nixos-rebuild".into(), prepend("switch", args))),
        Platform::DarwinSystem => Some(("darwin-rebuild".into(), prepend("switch", args))),
        // home-manager under launchd: the switch must survive the agent's
        // own death, so it's wrapped in a new session via the real `setsid`
        // binary (nf_runner::wrap_detached documents the same argv shape
        // for callers that build their own tokio::process::Command).
        Platform::DarwinHome => {
            let mut full = vec!["home-manager".to_string(), "switch".to_string()];
            full.extend(args.iter().cloned());
            Some(("setsid".into(), full))
        }
    }
}

fn prepend(first: &str, rest: &[String]) -> Vec<String> {
    let mut v = Vec::with_capacity(rest.len() + 1);
    v.push(first.to_string());
    v.extend(rest.iter().cloned());
    v
}

fn prepend2(first: &str, second: &str, rest: &[String]) -> Vec<String> {
    let mut v = Vec::with_capacity(rest.len() + 2);
    v.push(first.to_string());
    v.push(second.to_string());
    v.extend(rest.iter().cloned());
    v
}

/// Whether a successful run of `kind` ends in the exit-101 self-restart
/// rather than a normal `command_complete`, per §4.1's rationale: after a
/// successful switch the op's value isn't its exit code, it's that the
/// running binary changed.
pub fn completes_via_self_restart(kind: OpKind) -> bool {
    matches!(kind, OpKind::Switch | OpKind::PullSwitch)
}

/// Runs one dispatched op to completion, relaying output lines onto
/// `wire_tx` as `AgentMessage::Output` and returning the final exit code
/// (or an unrecognized-kind 127) for the caller to turn into either a
/// `command_complete` or the exit-101 sequence. `pull-switch` runs as two
/// sequential subprocesses, stopping after `pull` if it exits nonzero.
pub async fn run(
    op_id: OpId,
    kind: OpKind,
    platform: Platform,
    args: &[String],
    timeout: Duration,
    wire_tx: mpsc::UnboundedSender<AgentMessage>,
) -> Result<i32, RunnerError> {
    if kind == OpKind::PullSwitch {
        let (pull, switch) = pull_switch_steps(platform, args);
        let pull_exit = run_one(op_id, &pull.0, &pull.1, timeout, wire_tx.clone()).await?;
        if pull_exit != 0 {
            return Ok(pull_exit);
        }
        return run_one(op_id, &switch.0, &switch.1, timeout, wire_tx).await;
    }

    let Some((program, cmd_args)) = command_for(kind, platform, args) else {
        tracing::warn!(op_id = %op_id, kind = %kind, "unrecognized dispatch kind, ignoring");
        return Ok(UNRECOGNIZED_DISPATCH_EXIT_CODE);
    };
    run_one(op_id, &program, &cmd_args, timeout, wire_tx).await
}

/// Spawns and awaits a single subprocess, relaying its output onto
/// `wire_tx` as it runs. Shared by every single-step `OpKind` and by each
/// half of `pull-switch`.
async fn run_one(
    op_id: OpId,
    program: &str,
    cmd_args: &[String],
    timeout: Duration,
    wire_tx: mpsc::UnboundedSender<AgentMessage>,
) -> Result<i32, RunnerError> {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<OutputLine>();
    let relay = tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            let stream = match line.stream {
                OutputStream::Stdout => WireStream::Stdout,
                OutputStream::Stderr => WireStream::Stderr,
            };
            let _ = wire_tx.send(AgentMessage::Output { op_id: line.op_id, stream, line: line.line });
        }
    });

    let mut process = RunningProcess::spawn(op_id, program, cmd_args, None, line_tx)?;
    let exit_code = match process.wait_with_timeout(timeout).await {
        nf_runner::RunOutcome::Exited(code) => code,
        nf_runner::RunOutcome::TimedOut => {
            // The watchdog and kill escalation live on the dashboard side;
            // the agent just keeps streaming until a `kill` arrives or the
            // process exits on its own.
            match process.wait_with_timeout(Duration::from_secs(365 * 24 * 3600)).await {
                nf_runner::RunOutcome::Exited(code) => code,
                nf_runner::RunOutcome::TimedOut => UNRECOGNIZED_DISPATCH_EXIT_CODE,
            }
        }
    };
    drop(process);
    relay.abort();
    Ok(exit_code)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

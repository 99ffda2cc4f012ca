// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! macOS home-manager detachment: wrap the switch subprocess in the real
//! `setsid(1)` binary so it's reparented outside the agent's process group
//! before launchd kills the agent.
//!
//! `CommandExt::pre_exec` would do this with an `unsafe` closure; the
//! workspace forbids `unsafe_code`, so we spawn the actual `setsid` binary
//! as a wrapper process instead — one extra fork, no unsafe.

use tokio::process::Command;

/// Builds the `setsid <program> <args...>` command line for a detached
/// home-manager switch. The caller spawns this exactly like any other
/// [`tokio::process::Command`].
pub fn wrap_detached(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new("setsid");
    cmd.arg(program);
    cmd.args(args);
    cmd
}

#[cfg(test)]
#[path = "setsid_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pre- and post-validators for each `OpKind` (§4.2). Pure functions: atomic,
//! idempotent, side-effect-free. Composition within a kind is conjunctive
//! and short-circuits on the first failure.

use nf_core::{CompartmentKind, CompartmentValue, Host, HostSnapshot, OpKind, ValidationResult};

/// `CanExecute(host) = online ∧ pending_command is empty`.
fn can_execute(host: &Host) -> ValidationResult {
    if host.status != nf_core::HostStatus::Online {
        return ValidationResult::fail("host_offline", "host is not online");
    }
    if host.pending_command.is_some() {
        return ValidationResult::fail("command_pending", "an op is already active on this host");
    }
    ValidationResult::ok("can_execute", "host is online and idle")
}

fn compartment(host: &Host, kind: CompartmentKind) -> CompartmentValue {
    host.update_status.get(&kind).map(|s| s.value).unwrap_or_default()
}

/// Runs the pre-validator chain for `kind` against `host`, short-circuiting
/// on the first failure.
pub fn pre_validate(host: &Host, kind: OpKind) -> ValidationResult {
    let base = can_execute(host);
    if !base.valid {
        return base;
    }

    match kind {
        OpKind::Pull => {
            if compartment(host, CompartmentKind::Git) == CompartmentValue::Ok {
                return ValidationResult::fail("already_current", "git is already up to date");
            }
            ValidationResult::ok("can_execute", "pull may proceed")
        }
        OpKind::Switch => {
            if compartment(host, CompartmentKind::Git) == CompartmentValue::Outdated {
                return ValidationResult::fail("git_outdated", "pull before switching");
            }
            let agent_outdated = compartment(host, CompartmentKind::Agent) == CompartmentValue::Outdated;
            if compartment(host, CompartmentKind::System) == CompartmentValue::Ok && !agent_outdated {
                return ValidationResult::fail("already_current", "system is already current");
            }
            ValidationResult::ok("can_execute", "switch may proceed")
        }
        OpKind::Test => ValidationResult::ok("can_execute", "test may proceed"),
        OpKind::PullSwitch => {
            let agent_outdated = compartment(host, CompartmentKind::Agent) == CompartmentValue::Outdated;
            if compartment(host, CompartmentKind::Git) == CompartmentValue::Ok
                && compartment(host, CompartmentKind::System) == CompartmentValue::Ok
                && !agent_outdated
            {
                return ValidationResult::fail("already_current", "git and system are already current");
            }
            ValidationResult::ok("can_execute", "pull-switch may proceed")
        }
        OpKind::Kill | OpKind::Reboot | OpKind::RefreshLock => base,
    }
}

/// Post-validators for the kinds that complete synchronously on
/// `command_complete` (`switch` is deferred to `AWAITING_RECONNECT`, §4.2).
pub fn post_validate(before: &HostSnapshot, after: &Host, exit_code: i32, kind: OpKind) -> ValidationResult {
    match kind {
        OpKind::Pull => {
            if exit_code != 0 {
                return ValidationResult::fail("exit_nonzero", "pull subprocess exited nonzero");
            }
            if compartment(after, CompartmentKind::Git) == CompartmentValue::Ok {
                return ValidationResult::ok("goal_achieved", "git is now up to date");
            }
            if before.generation != after.generation {
                return ValidationResult::fail("partial", "generation changed but git did not converge");
            }
            ValidationResult::fail("goal_not_achieved", "git is still not up to date after pull")
        }
        OpKind::Test => {
            if exit_code == 0 {
                ValidationResult::ok("test_passed", "test subprocess exited zero")
            } else {
                ValidationResult::fail("test_failed", "test subprocess exited nonzero")
            }
        }
        OpKind::PullSwitch => {
            let git_ok = compartment(after, CompartmentKind::Git) == CompartmentValue::Ok;
            let system_ok = compartment(after, CompartmentKind::System) == CompartmentValue::Ok;
            match (git_ok, system_ok) {
                (true, true) => ValidationResult::ok("goal_achieved", "git and system both current"),
                (true, false) => ValidationResult::fail("partial_git_only", "git updated, system did not converge"),
                (false, true) => {
                    ValidationResult::fail("partial_system_only", "system converged, git did not update")
                }
                (false, false) => ValidationResult::fail("goal_not_achieved", "neither git nor system converged"),
            }
        }
        // switch's real outcome is decided in AWAITING_RECONNECT by the
        // FreshnessVerifier; this kind never reaches VALIDATING_POST.
        OpKind::Switch | OpKind::Kill | OpKind::Reboot | OpKind::RefreshLock => {
            ValidationResult::ok("goal_achieved", "exit code accepted")
        }
    }
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;

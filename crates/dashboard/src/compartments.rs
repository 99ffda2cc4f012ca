// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System-compartment inference (§6). Unlike `agent`, `git`, `lock`, and
//! `tests` — which are reported or directly computed — `system` is never
//! measured on the host. It is inferred here from the outcome of whatever
//! op just ran against it.

use nf_core::{CompartmentKind, CompartmentMap, CompartmentStatus, CompartmentValue, OpKind};

/// Outcome of an op, as far as the `system` inference rules care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Success,
    Failure,
}

/// Applies the system-compartment inference rules to `compartments` after
/// an op of `kind` finished with `outcome`, then applies the lock-outdated
/// override. Mutates `compartments["system"]` in place; a no-op for op
/// kinds the rules don't mention (`test`, `kill`, `reboot`).
pub fn infer_system(compartments: &mut CompartmentMap, kind: OpKind, outcome: OpOutcome, now_ms: u64) {
    let inferred = match (kind, outcome) {
        (OpKind::Switch | OpKind::PullSwitch, OpOutcome::Success) => Some((CompartmentValue::Ok, "switch succeeded")),
        (OpKind::Switch | OpKind::PullSwitch, OpOutcome::Failure) => Some((CompartmentValue::Error, "switch failed")),
        (OpKind::Pull, OpOutcome::Success) if git_changed(compartments) => {
            Some((CompartmentValue::Outdated, "pull advanced git, switch needed"))
        }
        _ => None,
    };

    if let Some((value, message)) = inferred {
        compartments.insert(CompartmentKind::System, CompartmentStatus::new(value, message, now_ms));
    }

    apply_lock_override(compartments, now_ms);
}

/// `lock = outdated` always forces `system = outdated`, regardless of what
/// the rules above just decided. Run this any time either slot changes.
pub fn apply_lock_override(compartments: &mut CompartmentMap, now_ms: u64) {
    let lock_outdated = compartments
        .get(&CompartmentKind::Lock)
        .is_some_and(|s| s.value == CompartmentValue::Outdated);
    if lock_outdated {
        compartments.insert(
            CompartmentKind::System,
            CompartmentStatus::new(CompartmentValue::Outdated, "lock file outdated", now_ms),
        );
    }
}

fn git_changed(compartments: &CompartmentMap) -> bool {
    compartments.get(&CompartmentKind::Git).is_some_and(|s| s.value == CompartmentValue::Outdated)
}

/// Sets every compartment to `unknown`, the first-contact rule.
pub fn first_contact(now_ms: u64) -> CompartmentMap {
    nf_core::compartment::unknown_compartments(now_ms)
}

#[cfg(test)]
#[path = "compartments_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LifecycleManager's narrow `PendingCommandStore` capability (§4.6):
//! `Host.pending_command` has exactly one legitimate writer, the `OpEngine`.
//! Heartbeat/registration code paths must go through `update_status`/
//! `identity`/`metrics` only — never this module — so routing every write
//! through these two functions is what makes that invariant checkable by
//! reading call sites instead of by convention alone.

use nf_core::{Host, OpId};

pub struct PendingCommandStore;

impl PendingCommandStore {
    pub fn claim(host: &mut Host, op_id: OpId) {
        host.pending_command = Some(op_id);
    }

    pub fn release(host: &mut Host) {
        host.pending_command = None;
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

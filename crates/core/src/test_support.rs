// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::compartment::{CompartmentKind, CompartmentStatus, CompartmentValue};
use crate::host::{Host, HostId, Platform};
use crate::identity::AgentIdentity;

/// Proptest strategies for core state machine types.
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::op::OpState;
    use proptest::prelude::*;

    pub fn arb_op_state() -> impl Strategy<Value = OpState> {
        prop_oneof![
            Just(OpState::Idle),
            Just(OpState::ValidatingPre),
            Just(OpState::Blocked),
            Just(OpState::Queued),
            Just(OpState::Running),
            Just(OpState::RunningWarning),
            Just(OpState::TimeoutPending),
            Just(OpState::Killing),
            Just(OpState::Killed),
            Just(OpState::KillFailed),
            Just(OpState::AbortedByReboot),
            Just(OpState::PostRebootRecovery),
            Just(OpState::ValidatingPost),
            Just(OpState::AwaitingReconnect),
            Just(OpState::Success),
            Just(OpState::Partial),
            Just(OpState::Failed),
            Just(OpState::StaleBinary),
            Just(OpState::Suspicious),
            Just(OpState::TimedOut),
            Just(OpState::Ignored),
        ]
    }
}

/// A freshly-registered host with every compartment `ok` and a given
/// identity, the common starting fixture for OpEngine tests.
pub fn fresh_host(id: &str, identity: AgentIdentity) -> Host {
    let mut host = Host::builder()
        .id(HostId::parse(id).expect("test id"))
        .hostname(format!("{id}.lan"))
        .platform(Platform::Nixos)
        .status(crate::host::HostStatus::Online)
        .identity(identity)
        .build();
    for (_, status) in host.update_status.iter_mut() {
        *status = CompartmentStatus::new(CompartmentValue::Ok, "", 0);
    }
    host
}

/// Sets a single compartment slot on a host fixture.
pub fn with_compartment(mut host: Host, kind: CompartmentKind, value: CompartmentValue) -> Host {
    host.update_status.insert(kind, CompartmentStatus::new(value, "", 0));
    host
}

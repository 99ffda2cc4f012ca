// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nf-core: domain types shared by every NixFleet crate — hosts, ops, the
//! change log, log entries, IDs, clock abstraction, and the declarative
//! macros used to build test fixtures.

pub mod macros;

pub mod change;
pub mod clock;
pub mod compartment;
pub mod error_code;
pub mod host;
pub mod id;
pub mod identity;
pub mod log_entry;
pub mod op;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use change::{Change, ChangeKind, ChangeTarget};
pub use clock::{Clock, FakeClock, SystemClock};
pub use compartment::{CompartmentKind, CompartmentMap, CompartmentStatus, CompartmentValue};
pub use error_code::ErrorCode;
pub use host::{Host, HostId, HostStatus, InvalidHostId, Metrics, Platform};
pub use id::short;
pub use identity::AgentIdentity;
pub use log_entry::{LogEntry, LogLevel, MAX_IN_MEMORY_LOG_ENTRIES};
pub use op::{HostSnapshot, Op, OpId, OpKind, OpState, TimeoutPolicy, ValidationResult};

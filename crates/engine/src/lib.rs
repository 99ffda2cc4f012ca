// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nf-engine: `OpEngine`'s state-machine transitions, the `FreshnessVerifier`,
//! pre/post validators, the watchdog tick, kill escalation, reboot recovery,
//! the self-healing sweeper, and the `PendingCommandStore` sole-writer
//! capability (§4.2, §4.3, §4.6).

mod engine;
mod error;
mod freshness;
mod lifecycle;
mod sweeper;
mod validation;

pub use engine::{OpEngine, WatchdogOutcome};
pub use error::OpEngineError;
pub use freshness::{verify as verify_freshness, Freshness};
pub use lifecycle::PendingCommandStore;
pub use sweeper::sweep;
pub use validation::{post_validate, pre_validate};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nf-agent: the per-host process that registers with the dashboard, runs
//! dispatched ops, and self-restarts via exit code 101 after a successful
//! switch (§4.1).

mod connection;
pub mod dispatch;
pub mod env;
pub mod identity;

pub use connection::{run_forever, RuntimeConfig};

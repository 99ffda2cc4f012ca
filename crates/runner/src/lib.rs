// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nf-runner: subprocess execution for dispatched ops — line-by-line output
//! streaming, timeout enforcement, and two-stage kill escalation.

mod error;
mod process;
mod setsid;
mod signal;

pub use error::RunnerError;
pub use process::{escalate_kill, KillSignal, OutputLine, OutputStream, RunOutcome, RunningProcess};
pub use setsid::wrap_detached;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Wire protocol for both WebSocket channels: `{ "type": <string>, "payload":
//! <object> }` JSON frames, one per message, modeled as tagged sums so the
//! closed sets of message kinds stay exhaustive at the type level.

mod agent_channel;
mod browser_channel;
mod envelope;

pub use agent_channel::{AgentMessage, DashboardToAgent, KillSignal, OutputStream};
pub use browser_channel::{BrowserToDashboard, DashboardToBrowser, FullState};
pub use envelope::{DecodeError, Envelope};

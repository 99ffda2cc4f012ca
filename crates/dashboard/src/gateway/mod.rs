// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two WebSocket gateways: the agent channel (§4.1) and the browser
//! channel (§4.4). Both are thin axum `ws` handlers that decode one
//! `Envelope` at a time and hand the inner message to the `StateStore`.

pub mod agent;
pub mod browser;

use crate::auth::SessionStore;
use crate::store::StateStore;
use std::sync::Arc;

/// Shared application state threaded through every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StateStore>,
    pub sessions: Arc<SessionStore>,
    pub agents: Arc<agent::AgentRegistry>,
    pub expected_agent_token: Option<String>,
}

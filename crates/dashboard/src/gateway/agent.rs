// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent WebSocket channel (§4.1): register, heartbeat, status, output,
//! command_complete, kill_ack/kill_nack inbound; dispatch/kill/reboot
//! outbound.

use super::AppState;
use crate::auth;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use nf_core::clock::{Clock, SystemClock};
use nf_core::HostId;
use nf_protocol::{AgentMessage, DashboardToAgent, Envelope};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;

#[derive(serde::Deserialize)]
pub struct AgentQuery {
    pub token: Option<String>,
}

struct Slot {
    generation: u64,
    tx: mpsc::Sender<DashboardToAgent>,
}

/// Tracks the one live connection per host. A fresh `register` always
/// wins the slot; the connection it displaces notices on its next read
/// and closes itself (§ duplicate-registration supersede rule).
pub struct AgentRegistry {
    slots: Mutex<HashMap<HostId, Slot>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    fn claim(&self, host_id: HostId, tx: mpsc::Sender<DashboardToAgent>) -> u64 {
        let mut slots = self.slots.lock();
        let generation = slots.get(&host_id).map(|s| s.generation + 1).unwrap_or(0);
        slots.insert(host_id, Slot { generation, tx });
        generation
    }

    fn is_current(&self, host_id: &HostId, generation: u64) -> bool {
        self.slots.lock().get(host_id).is_some_and(|s| s.generation == generation)
    }

    fn release(&self, host_id: &HostId, generation: u64) {
        let mut slots = self.slots.lock();
        if slots.get(host_id).is_some_and(|s| s.generation == generation) {
            slots.remove(host_id);
        }
    }

    /// Forwards a dashboard->agent message to whichever connection
    /// currently holds `host_id`'s slot. Returns `false` (host offline or
    /// its queue is full) so the HTTP layer can report the op as blocked.
    pub fn send(&self, host_id: &HostId, msg: DashboardToAgent) -> bool {
        let tx = self.slots.lock().get(host_id).map(|s| s.tx.clone());
        tx.is_some_and(|tx| tx.try_send(msg).is_ok())
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn upgrade(ws: WebSocketUpgrade, Query(query): Query<AgentQuery>, State(app): State<AppState>) -> impl IntoResponse {
    if !auth::agent_token_ok(app.expected_agent_token.as_deref(), query.token.as_deref()) {
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| handle(socket, app)).into_response()
}

async fn handle(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<DashboardToAgent>(64);

    let Some(Ok(Message::Text(text))) = stream.next().await else { return };
    let Ok(envelope) = Envelope::from_text(&text) else { return };
    let Ok(AgentMessage::Register { host_id, hostname, platform, identity, update_status }) = envelope.unwrap::<AgentMessage>() else {
        return;
    };

    let now_ms = SystemClock.epoch_ms();
    if app.store.register_host(host_id.clone(), hostname, platform, identity, update_status, now_ms).is_err() {
        return;
    }
    let generation = app.agents.claim(host_id.clone(), tx);

    let writer = async {
        while let Some(msg) = rx.recv().await {
            let Ok(envelope) = Envelope::wrap(&msg) else { continue };
            if sink.send(Message::Text(envelope.to_text())).await.is_err() {
                break;
            }
        }
    };

    let reader = async {
        while let Some(Ok(Message::Text(text))) = stream.next().await {
            if !app.agents.is_current(&host_id, generation) {
                break;
            }
            let Ok(envelope) = Envelope::from_text(&text) else { continue };
            let Ok(message) = envelope.unwrap::<AgentMessage>() else { continue };
            handle_message(&app, &host_id, message);
        }
    };

    tokio::select! {
        _ = writer => {},
        _ = reader => {},
    }

    app.agents.release(&host_id, generation);
    let _ = app.store.mark_offline(&host_id, SystemClock.epoch_ms());
}

fn handle_message(app: &AppState, host_id: &HostId, message: AgentMessage) {
    let now_ms = SystemClock.epoch_ms();
    match message {
        AgentMessage::Register { .. } => {
            // Re-registration mid-connection never happens in practice —
            // a fresh connect always replaces the socket first.
        }
        AgentMessage::Heartbeat { metrics, update_status, identity } => {
            if let Err(err) = app.store.heartbeat(host_id, metrics, update_status, identity, now_ms) {
                tracing::warn!(%err, %host_id, "heartbeat rejected");
            }
        }
        AgentMessage::Status { update_status } => {
            if let Some(host) = app.store.host(host_id) {
                if let Err(err) = app.store.heartbeat(host_id, host.metrics, update_status, host.identity, now_ms) {
                    tracing::warn!(%err, %host_id, "status update rejected");
                }
            }
        }
        AgentMessage::Output { op_id, stream, line } => {
            app.store.append_output(op_id, stream, line);
        }
        AgentMessage::CommandComplete { op_id, exit_code, fresh_status } => {
            if let Err(err) = app.store.command_complete(op_id, exit_code, fresh_status, now_ms) {
                tracing::warn!(%err, %op_id, "command_complete rejected");
            }
        }
        AgentMessage::KillAck { op_id, .. } => {
            let _ = app.store.resolve_kill(op_id, true, now_ms);
        }
        AgentMessage::KillNack { op_id, .. } => {
            let _ = app.store.resolve_kill(op_id, false, now_ms);
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

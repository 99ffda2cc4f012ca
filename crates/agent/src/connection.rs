// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle (§4.1): one outbound WebSocket to the dashboard,
//! reconnected with exponential backoff on loss. Runs until the process
//! exits (exit-101 on a successful switch, or a signal from the OS).

use crate::dispatch;
use futures_util::{SinkExt, StreamExt};
use nf_core::clock::{Clock, SystemClock};
use nf_core::compartment::unknown_compartments;
use nf_core::{AgentIdentity, CompartmentKind, CompartmentMap, CompartmentValue, HostId, OpId, Platform};
use nf_protocol::{AgentMessage, DashboardToAgent, DecodeError, Envelope};
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

pub struct RuntimeConfig {
    pub dashboard_url: String,
    pub host_id: HostId,
    pub hostname: String,
    pub platform: Platform,
    pub token: Option<String>,
    pub identity: AgentIdentity,
    pub heartbeat_interval: Duration,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl RuntimeConfig {
    fn connect_url(&self) -> String {
        match &self.token {
            Some(token) => format!("{}?token={}", self.dashboard_url, token),
            None => self.dashboard_url.clone(),
        }
    }
}

/// Runs the connect/serve/backoff loop until the process exits.
pub async fn run_forever(cfg: RuntimeConfig) {
    let mut attempt: u32 = 0;
    loop {
        match connect_and_serve(&cfg).await {
            Ok(()) => {
                tracing::info!("dashboard connection closed, reconnecting");
                attempt = 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "dashboard connection failed");
                attempt = attempt.saturating_add(1);
            }
        }
        let delay = backoff_delay(attempt, cfg.backoff_min, cfg.backoff_max);
        tokio::time::sleep(delay).await;
    }
}

/// Exponential backoff with cap and ±20% jitter (§4.1's failure-mode policy).
fn backoff_delay(attempt: u32, min: Duration, max: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
    let base = min.saturating_mul(factor).min(max);
    let jitter_pct = rand::thread_rng().gen_range(-20..=20i64);
    let jittered_ms = (base.as_millis() as i64 * (100 + jitter_pct) / 100).max(0) as u64;
    Duration::from_millis(jittered_ms).min(max)
}

#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error(transparent)]
    Ws(#[from] WsError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

async fn connect_and_serve(cfg: &RuntimeConfig) -> Result<(), SessionError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(cfg.connect_url()).await?;
    let (mut write, mut read) = ws_stream.split();

    let clock = SystemClock;
    let status = Arc::new(Mutex::new(unknown_compartments(clock.epoch_ms())));

    let register = Envelope::wrap(&AgentMessage::Register {
        host_id: cfg.host_id.clone(),
        hostname: cfg.hostname.clone(),
        platform: cfg.platform,
        identity: cfg.identity.clone(),
        update_status: status.lock().clone(),
    })?;
    write.send(Message::Text(register.to_text())).await?;

    let (wire_tx, mut wire_rx) = mpsc::unbounded_channel::<AgentMessage>();
    let mut heartbeat = tokio::time::interval(cfg.heartbeat_interval);
    heartbeat.tick().await; // first tick fires immediately; register already covered it

    loop {
        tokio::select! {
            outgoing = wire_rx.recv() => {
                let Some(msg) = outgoing else { return Ok(()) };
                let envelope = Envelope::wrap(&msg)?;
                write.send(Message::Text(envelope.to_text())).await?;
            }
            _ = heartbeat.tick() => {
                let msg = AgentMessage::Heartbeat {
                    metrics: Default::default(),
                    update_status: status.lock().clone(),
                    identity: cfg.identity.clone(),
                };
                let envelope = Envelope::wrap(&msg)?;
                write.send(Message::Text(envelope.to_text())).await?;
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_incoming(&text, cfg, &wire_tx, &status);
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        }
    }
}

fn handle_incoming(
    text: &str,
    cfg: &RuntimeConfig,
    wire_tx: &mpsc::UnboundedSender<AgentMessage>,
    status: &Arc<Mutex<CompartmentMap>>,
) {
    let envelope = match Envelope::from_text(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, "malformed frame from dashboard, dropping");
            return;
        }
    };

    let message: DashboardToAgent = match envelope.unwrap() {
        Ok(m) => m,
        Err(e) => {
            // Either a malformed known kind, or a kind this build doesn't
            // recognize yet — either way, logged and dropped (§6).
            tracing::debug!(error = %e, kind = %envelope.kind, "ignoring unrecognized dashboard message");
            return;
        }
    };

    match message {
        DashboardToAgent::Dispatch { op_id, kind, args, timeout_ms } => {
            spawn_dispatch(op_id, kind, cfg.platform, args, timeout_ms, wire_tx.clone(), status.clone());
        }
        DashboardToAgent::Kill { op_id, signal, .. } => {
            // This minimal agent runs one dispatch at a time and does not
            // keep a process table keyed by op id, so an out-of-band kill
            // for an op it isn't currently running is nacked.
            let _ = wire_tx.send(AgentMessage::KillNack { op_id, signal, success: false });
        }
        DashboardToAgent::Reboot { reason } => {
            tracing::warn!(reason, "reboot requested by dashboard");
            reboot_host(cfg.platform);
        }
    }
}

fn spawn_dispatch(
    op_id: OpId,
    kind: nf_core::OpKind,
    platform: Platform,
    args: Vec<String>,
    timeout_ms: u64,
    wire_tx: mpsc::UnboundedSender<AgentMessage>,
    status: Arc<Mutex<CompartmentMap>>,
) {
    let self_restart = dispatch::completes_via_self_restart(kind);
    tokio::spawn(async move {
        let timeout = Duration::from_millis(timeout_ms);
        let exit_code = match dispatch::run(op_id, kind, platform, &args, timeout, wire_tx.clone()).await {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(op_id = %op_id, error = %e, "dispatch failed to run");
                dispatch::UNRECOGNIZED_DISPATCH_EXIT_CODE
            }
        };

        let fresh_status = record_outcome(&status, kind, exit_code);

        if self_restart && exit_code == 0 {
            let _ = wire_tx.send(AgentMessage::Status { update_status: fresh_status });
            tokio::time::sleep(dispatch::EXIT_101_DRAIN).await;
            tracing::info!(op_id = %op_id, "switch succeeded, exiting 101 for supervisor restart");
            std::process::exit(101);
        }

        let _ = wire_tx.send(AgentMessage::CommandComplete { op_id, exit_code, fresh_status });
    });
}

/// Updates the compartment this op kind speaks to (§6's inference table,
/// applied agent-side as a best-effort hint; the dashboard is the
/// authority and may override it from op history).
fn record_outcome(status: &Arc<Mutex<CompartmentMap>>, kind: nf_core::OpKind, exit_code: i32) -> CompartmentMap {
    let slot = match kind {
        nf_core::OpKind::Pull => Some(CompartmentKind::Git),
        nf_core::OpKind::RefreshLock => Some(CompartmentKind::Lock),
        nf_core::OpKind::Switch | nf_core::OpKind::PullSwitch => Some(CompartmentKind::System),
        nf_core::OpKind::Test => Some(CompartmentKind::Tests),
        nf_core::OpKind::Kill | nf_core::OpKind::Reboot => None,
    };
    let mut guard = status.lock();
    if let Some(slot) = slot {
        let value = if exit_code == 0 { CompartmentValue::Ok } else { CompartmentValue::Error };
        let now_ms = SystemClock.epoch_ms();
        guard.insert(slot, nf_core::CompartmentStatus::new(value, "", now_ms));
    }
    guard.clone()
}

fn reboot_host(platform: Platform) {
    let (program, args): (&str, &[&str]) = match platform {
        Platform::Nixos => ("systemctl", &["reboot"]),
        Platform::DarwinSystem | Platform::DarwinHome => ("shutdown", &["-r", "now"]),
    };
    if let Err(e) = std::process::Command::new(program).args(args).spawn() {
        tracing::error!(error = %e, "failed to spawn reboot command");
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

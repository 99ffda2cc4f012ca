// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane HTTP surface (§6): dispatch/kill/refresh/reboot, admin
//! host create/remove, and the two read-only routes that mirror the
//! browser WebSocket channel for clients that don't hold it open.

use crate::auth;
use crate::gateway::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use nf_core::clock::{Clock, SystemClock};
use nf_core::{HostId, OpId, OpKind};
use nf_protocol::{DashboardToAgent, KillSignal};
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dispatch", post(dispatch))
        .route("/api/op/:op_id/kill", post(kill))
        .route("/api/op/:op_id/extend", post(extend))
        .route("/api/op/:op_id/ignore", post(ignore))
        .route("/api/hosts/:id/refresh", post(refresh))
        .route("/api/hosts/:id/reboot", post(reboot))
        .route("/api/hosts", post(create_host))
        .route("/api/hosts/:id", delete(remove_host))
        .route("/api/state", get(get_state))
        .route("/api/hosts/:id/output", get(host_output))
}

/// Pulls the `nf_session` cookie out of a raw `Cookie` header; there's no
/// cookie-jar extractor in the dependency set, and a control plane this
/// size doesn't need one.
fn session_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    raw.split(';').map(str::trim).find_map(|kv| kv.strip_prefix(&format!("{}=", auth::SESSION_COOKIE))).map(str::to_string)
}

fn csrf_header(headers: &HeaderMap) -> Option<String> {
    headers.get(auth::CSRF_HEADER)?.to_str().ok().map(str::to_string)
}

/// Every mutating route requires the session cookie and a matching CSRF
/// header (§6, "All POST routes require the browser session cookie and a
/// CSRF token header").
fn require_session(app: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let session = session_id(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let csrf = csrf_header(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    if app.sessions.validate(&session, &csrf) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[derive(Debug, Deserialize)]
struct DispatchRequest {
    op: OpKind,
    hosts: Vec<HostId>,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum DispatchOutcome {
    Accepted { op_id: OpId, accepted: bool },
    Blocked { blocked: bool, code: String, message: String },
}

async fn dispatch(State(app): State<AppState>, headers: HeaderMap, Json(body): Json<DispatchRequest>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    let now_ms = SystemClock.epoch_ms();
    let mut results = Vec::with_capacity(body.hosts.len());
    for host_id in body.hosts {
        let outcome = match app.store.dispatch(host_id.clone(), body.op, now_ms) {
            Ok(op) if op.state == nf_core::OpState::Queued => {
                let timeout_ms = op.timeout_policy.hard_at_ms;
                app.agents.send(
                    &host_id,
                    DashboardToAgent::Dispatch { op_id: op.op_id, kind: op.kind, args: body.options.clone(), timeout_ms },
                );
                DispatchOutcome::Accepted { op_id: op.op_id, accepted: true }
            }
            Ok(op) => {
                let check = op.pre_check.unwrap_or_else(|| nf_core::ValidationResult::fail("unknown_state", "blocked"));
                DispatchOutcome::Blocked { blocked: true, code: check.code, message: check.message }
            }
            Err(err) => DispatchOutcome::Blocked { blocked: true, code: "unknown_host".into(), message: err.to_string() },
        };
        results.push(outcome);
    }
    Json(results).into_response()
}

async fn kill(State(app): State<AppState>, headers: HeaderMap, Path(op_id): Path<String>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    // A manual kill always starts at SIGTERM; the escalation to SIGKILL
    // after 5s, and the KILL_FAILED give-up after another 5s, is owned by
    // the watchdog (`watchdog::tick_once`), not this handler.
    let op_id = OpId::from_string(op_id);
    let now_ms = SystemClock.epoch_ms();

    let Some(op) = app.store.op(op_id) else { return StatusCode::NOT_FOUND.into_response() };
    if let Err(err) = app.store.begin_kill(op_id, now_ms) {
        return (StatusCode::CONFLICT, err.to_string()).into_response();
    }
    app.agents.send(&op.host_id, DashboardToAgent::Kill { op_id, signal: KillSignal::Sigterm, target_pid: None });
    StatusCode::ACCEPTED.into_response()
}

/// `TIMEOUT_PENDING -> RUNNING`: the operator judges the op is still making
/// progress and gives it a fresh running clock instead of killing it.
async fn extend(State(app): State<AppState>, headers: HeaderMap, Path(op_id): Path<String>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    let op_id = OpId::from_string(op_id);
    let now_ms = SystemClock.epoch_ms();
    if app.store.op(op_id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Err(err) = app.store.extend_timeout(op_id, now_ms) {
        return (StatusCode::CONFLICT, err.to_string()).into_response();
    }
    StatusCode::ACCEPTED.into_response()
}

/// `TIMEOUT_PENDING -> IGNORED`: the operator accepts the op is hung but
/// declines to kill it.
async fn ignore(State(app): State<AppState>, headers: HeaderMap, Path(op_id): Path<String>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    let op_id = OpId::from_string(op_id);
    let now_ms = SystemClock.epoch_ms();
    if app.store.op(op_id).is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Err(err) = app.store.ignore_timeout(op_id, now_ms) {
        return (StatusCode::CONFLICT, err.to_string()).into_response();
    }
    StatusCode::ACCEPTED.into_response()
}

async fn refresh(State(app): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    let Ok(host_id) = HostId::parse(id) else { return StatusCode::BAD_REQUEST.into_response() };
    match app.store.host(&host_id) {
        Some(host) => Json(host.update_status).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct RebootRequest {
    totp: String,
}

async fn reboot(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RebootRequest>,
) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    match crate::env::expected_reboot_totp() {
        Some(expected) if auth::constant_time_eq(&expected, &body.totp) => {}
        Some(_) => return StatusCode::UNAUTHORIZED.into_response(),
        None => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
    let Ok(host_id) = HostId::parse(id) else { return StatusCode::BAD_REQUEST.into_response() };
    let now_ms = SystemClock.epoch_ms();
    if let Err(err) = app.store.initiate_reboot(&host_id, now_ms) {
        return (StatusCode::CONFLICT, err.to_string()).into_response();
    }
    app.agents.send(&host_id, DashboardToAgent::Reboot { reason: "operator-initiated".into() });
    StatusCode::ACCEPTED.into_response()
}

#[derive(Debug, Deserialize)]
struct CreateHostRequest {
    id: String,
    hostname: String,
}

async fn create_host(State(app): State<AppState>, headers: HeaderMap, Json(body): Json<CreateHostRequest>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    let Ok(host_id) = HostId::parse(body.id) else { return StatusCode::BAD_REQUEST.into_response() };
    let now_ms = SystemClock.epoch_ms();
    match app.store.create_host(host_id, body.hostname, now_ms) {
        Ok(host) => (StatusCode::CREATED, Json(host)).into_response(),
        Err(err) => (StatusCode::CONFLICT, err.to_string()).into_response(),
    }
}

async fn remove_host(State(app): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> impl IntoResponse {
    if let Err(status) = require_session(&app, &headers) {
        return status.into_response();
    }
    let Ok(host_id) = HostId::parse(id) else { return StatusCode::BAD_REQUEST.into_response() };
    let now_ms = SystemClock.epoch_ms();
    match app.store.remove_host(&host_id, now_ms) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct StatePayload {
    version: u64,
    full_state: nf_protocol::FullState,
}

async fn get_state(State(app): State<AppState>) -> impl IntoResponse {
    Json(StatePayload { version: app.store.version(), full_state: app.store.full_state() })
}

#[derive(Debug, Serialize)]
struct OutputLine {
    stream: nf_protocol::OutputStream,
    line: String,
}

async fn host_output(State(app): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Ok(host_id) = HostId::parse(id) else { return StatusCode::BAD_REQUEST.into_response() };
    let Some(host) = app.store.host(&host_id) else { return StatusCode::NOT_FOUND.into_response() };
    let Some(op_id) = host.pending_command else { return Json(Vec::<OutputLine>::new()).into_response() };
    let lines = app.store.output_log(op_id).into_iter().map(|(stream, line)| OutputLine { stream, line }).collect::<Vec<_>>();
    Json(lines).into_response()
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;

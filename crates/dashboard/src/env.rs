// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the dashboard crate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve a state directory: set NF_STATE_DIR or HOME")]
    NoStateDir,
    #[error("NF_BIND_ADDR is not a valid socket address: {0}")]
    BadBindAddr(String),
}

/// Resolve state directory: `NF_STATE_DIR` > the platform state dir (via
/// `dirs::state_dir`, falling back to `$HOME/.local/state`) > `/tmp`.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("NF_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
        .ok_or(ConfigError::NoStateDir)?;
    Ok(base.join("nixfleet"))
}

/// Address the Gateway/HTTP router binds to, default `127.0.0.1:7878`.
pub fn bind_addr() -> Result<SocketAddr, ConfigError> {
    let raw = std::env::var("NF_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:7878".to_string());
    raw.parse().map_err(|_| ConfigError::BadBindAddr(raw))
}

/// Shared bearer secret the agent channel expects, if set. Absent means the
/// agent channel accepts any connection (development mode only).
pub fn expected_agent_token() -> Option<String> {
    std::env::var("NF_AGENT_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Default heartbeat interval agents are told to use; purely informational
/// on this side (the agent owns its own timer), kept for symmetry with
/// `nf-agent`'s `NF_HEARTBEAT_SECS`.
pub fn heartbeat_interval() -> Duration {
    std::env::var("NF_HEARTBEAT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(10))
}

/// How often the PRSource poller runs, default 10 minutes.
pub fn pr_source_poll_interval() -> Duration {
    std::env::var("NF_PR_POLL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(600))
}

/// Expected second-factor code for `POST /api/hosts/{id}/reboot`. The TOTP
/// algorithm itself is out of scope (§ Non-goals) — this crate only checks
/// the presented code against a configured shared value.
pub fn expected_reboot_totp() -> Option<String> {
    std::env::var("NF_REBOOT_TOTP").ok().filter(|s| !s.is_empty())
}

/// Per-subscriber bounded outgoing queue depth (§4.5).
pub fn subscriber_queue_depth() -> usize {
    std::env::var("NF_SUBSCRIBER_QUEUE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(256)
}

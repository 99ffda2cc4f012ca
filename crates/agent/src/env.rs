// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the agent binary.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NF_DASHBOARD_URL is not set")]
    NoDashboardUrl,
    #[error("NF_HOST_ID is not set")]
    NoHostId,
}

/// WebSocket URL of the dashboard's agent channel, e.g.
/// `ws://dashboard.internal:7878/ws/agent`.
pub fn dashboard_url() -> Result<String, ConfigError> {
    std::env::var("NF_DASHBOARD_URL").map_err(|_| ConfigError::NoDashboardUrl)
}

/// This host's slug id, self-reported on `register`.
pub fn host_id() -> Result<String, ConfigError> {
    std::env::var("NF_HOST_ID").map_err(|_| ConfigError::NoHostId)
}

/// Bearer token presented to the dashboard's agent channel.
pub fn agent_token() -> Option<String> {
    std::env::var("NF_AGENT_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Heartbeat interval, default 10s per §4.1.
pub fn heartbeat_interval() -> Duration {
    std::env::var("NF_HEARTBEAT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(10))
}

/// Minimum/maximum reconnect backoff per §4.1's failure-mode policy.
pub fn backoff_min() -> Duration {
    Duration::from_secs(1)
}

pub fn backoff_max() -> Duration {
    Duration::from_secs(60)
}

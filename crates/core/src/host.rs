// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host entity: a machine under management, and its identifying slug.

use crate::compartment::CompartmentMap;
use crate::identity::AgentIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host IDs are admin- or agent-chosen slugs, not generated IDs, so they get
/// their own newtype instead of riding on [`crate::define_id!`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

/// Error returned when a candidate host id fails the slug rule.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid host id {0:?}: must match ^[a-z0-9][a-z0-9-]{{0,62}}$")]
pub struct InvalidHostId(pub String);

impl HostId {
    /// Validates `s` against the host-id regex (`^[a-z0-9][a-z0-9-]{0,62}$`)
    /// used both for agent self-registration and the admin-create API.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidHostId> {
        let s = s.into();
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(InvalidHostId(s))
        }
    }

    fn is_valid(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 63 {
            return false;
        }
        let first_ok = matches!(bytes[0], b'a'..=b'z' | b'0'..=b'9');
        first_ok && bytes.iter().all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for HostId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Management platform a host is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Nixos,
    DarwinSystem,
    DarwinHome,
}

crate::simple_display! {
    Platform {
        Nixos => "nixos",
        DarwinSystem => "darwin-system",
        DarwinHome => "darwin-home",
    }
}

/// Connection status of a host as tracked by the Gateway/StateStore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

crate::simple_display! {
    HostStatus {
        Unknown => "unknown",
        Online => "online",
        Offline => "offline",
    }
}

/// Opaque latest metrics sample reported by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Metrics {
    pub cpu_pct: f64,
    pub ram_pct: f64,
    pub swap_pct: f64,
    pub load1: f64,
}

/// A machine under management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub hostname: String,
    pub platform: Platform,
    pub status: HostStatus,
    pub last_seen_ms: u64,
    pub identity: AgentIdentity,
    /// Current system generation number, as last reported by the agent.
    /// Bumped on a successful `switch`; compared before/after a `pull` to
    /// catch drift the pull op itself shouldn't take credit for (§4.2).
    pub generation: u64,
    pub update_status: CompartmentMap,
    pub theme_color: String,
    pub metrics: Metrics,
    pub pending_command: Option<crate::op::OpId>,
    pub created_at_ms: u64,
    pub removed_at_ms: Option<u64>,
}

impl Host {
    /// A freshly registered host with no history: unknown status everywhere,
    /// per the "First-contact with no history" compartment inference rule.
    pub fn new(id: HostId, hostname: String, platform: Platform, now_ms: u64) -> Self {
        Self {
            id,
            hostname,
            platform,
            status: HostStatus::Unknown,
            last_seen_ms: now_ms,
            identity: AgentIdentity::default(),
            generation: 0,
            update_status: crate::compartment::unknown_compartments(now_ms),
            theme_color: String::new(),
            metrics: Metrics::default(),
            pending_command: None,
            created_at_ms: now_ms,
            removed_at_ms: None,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at_ms.is_some()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct HostBuilder => Host {
        set { id: HostId = HostId::parse("host0").expect("literal id") }
        into { hostname: String = "host0" }
        set { platform: Platform = Platform::Nixos }
        set { status: HostStatus = HostStatus::Unknown }
        set { last_seen_ms: u64 = 0 }
        set { identity: AgentIdentity = AgentIdentity::default() }
        set { generation: u64 = 0 }
        set { update_status: CompartmentMap = crate::compartment::unknown_compartments(0) }
        into { theme_color: String = "" }
        set { metrics: Metrics = Metrics::default() }
        option { pending_command: crate::op::OpId = None }
        set { created_at_ms: u64 = 0 }
        option { removed_at_ms: u64 = None }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;

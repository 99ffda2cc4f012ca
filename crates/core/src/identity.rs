// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AgentIdentity: the 3-layer freshness fingerprint captured once at agent
//! startup and reported verbatim in every heartbeat.

use serde::{Deserialize, Serialize};

/// Identity of a running agent binary, used by `FreshnessVerifier` to decide
/// whether a post-switch reconnection is actually running new code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentIdentity {
    /// Semver-ish version string set at build.
    pub version: String,
    /// Git SHA bound at build time (`"unknown"` if unset).
    pub source_commit: String,
    /// Resolved absolute path of the running executable.
    pub store_path: String,
    /// SHA-256 (hex) of the executable bytes.
    pub binary_hash: String,
}

impl AgentIdentity {
    /// Missing/empty fields collapse to "not changed" for that layer, per
    /// the truth table's authoritative note on absent data.
    fn present(s: &str) -> Option<&str> {
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }

    /// `true` only when both sides are present and differ; either side
    /// missing is "not changed" for that layer, never a change.
    fn layer_changed(a: &str, b: &str) -> bool {
        match (Self::present(a), Self::present(b)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    pub fn commit_changed(&self, other: &Self) -> bool {
        Self::layer_changed(&self.source_commit, &other.source_commit)
    }

    pub fn path_changed(&self, other: &Self) -> bool {
        Self::layer_changed(&self.store_path, &other.store_path)
    }

    pub fn hash_changed(&self, other: &Self) -> bool {
        Self::layer_changed(&self.binary_hash, &other.binary_hash)
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct AgentIdentityBuilder => AgentIdentity {
        into { version: String = "0.0.0" }
        into { source_commit: String = "abc123" }
        into { store_path: String = "/nix/store/p1" }
        into { binary_hash: String = "h1" }
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

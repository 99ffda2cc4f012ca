// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compartment status: five named status slots per host (`agent`, `git`,
//! `lock`, `system`, `tests`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the five compartment slots a host reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompartmentKind {
    Agent,
    Git,
    Lock,
    System,
    Tests,
}

crate::simple_display! {
    CompartmentKind {
        Agent => "agent",
        Git => "git",
        Lock => "lock",
        System => "system",
        Tests => "tests",
    }
}

/// Value of a compartment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompartmentValue {
    #[default]
    Unknown,
    Ok,
    Outdated,
    /// Only ever set by the OpEngine around an op; transient.
    Working,
    Error,
}

crate::simple_display! {
    CompartmentValue {
        Unknown => "unknown",
        Ok => "ok",
        Outdated => "outdated",
        Working => "working",
        Error => "error",
    }
}

/// A single compartment slot: value, message, and last-checked timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentStatus {
    pub value: CompartmentValue,
    pub message: String,
    pub checked_at_ms: u64,
}

impl Default for CompartmentStatus {
    fn default() -> Self {
        Self { value: CompartmentValue::Unknown, message: String::new(), checked_at_ms: 0 }
    }
}

impl CompartmentStatus {
    pub fn new(value: CompartmentValue, message: impl Into<String>, checked_at_ms: u64) -> Self {
        Self { value, message: message.into(), checked_at_ms }
    }
}

/// All five compartment slots for a host.
pub type CompartmentMap = BTreeMap<CompartmentKind, CompartmentStatus>;

/// Builds a fresh compartment map with every slot `unknown`, matching the
/// first-contact inference rule.
pub fn unknown_compartments(now_ms: u64) -> CompartmentMap {
    [
        CompartmentKind::Agent,
        CompartmentKind::Git,
        CompartmentKind::Lock,
        CompartmentKind::System,
        CompartmentKind::Tests,
    ]
    .into_iter()
    .map(|k| (k, CompartmentStatus::new(CompartmentValue::Unknown, "", now_ms)))
    .collect()
}

#[cfg(test)]
#[path = "compartment_tests.rs"]
mod tests;

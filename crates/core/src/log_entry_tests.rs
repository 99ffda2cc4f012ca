// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_entry_has_no_host_id() {
    let entry = LogEntry::system(1000, LogLevel::Info, "sweeper tick");
    assert!(entry.host_id.is_none());
}

#[test]
fn host_entry_carries_host_id() {
    let entry = LogEntry::for_host(1000, LogLevel::Warning, "hsb1", "git outdated");
    assert_eq!(entry.host_id.as_deref(), Some("hsb1"));
}

#[test]
fn builder_chain_sets_code_state_details() {
    let entry = LogEntry::for_host(1000, LogLevel::Error, "hsb1", "stale binary")
        .with_code("stale_binary")
        .with_state("stale_binary")
        .with_details(serde_json::json!({"remediation": "nix-collect-garbage -d"}));
    assert_eq!(entry.code.as_deref(), Some("stale_binary"));
    assert_eq!(entry.state.as_deref(), Some("stale_binary"));
    assert!(entry.details.is_some());
}

#[test]
fn serialize_roundtrip() {
    let entry = LogEntry::system(1000, LogLevel::Success, "goal achieved");
    let json = serde_json::to_string(&entry).unwrap();
    let back: LogEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(entry, back);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn identical_identities_show_no_deltas() {
    let a = AgentIdentity::builder().build();
    let b = a.clone();
    assert!(!a.commit_changed(&b));
    assert!(!a.path_changed(&b));
    assert!(!a.hash_changed(&b));
}

#[test]
fn changed_path_and_hash_detected() {
    let a = AgentIdentity::builder().build();
    let b = AgentIdentity::builder().store_path("/nix/store/p2").binary_hash("h2").build();
    assert!(!a.commit_changed(&b));
    assert!(a.path_changed(&b));
    assert!(a.hash_changed(&b));
}

#[test]
fn missing_fields_collapse_to_unchanged() {
    let a = AgentIdentity::default();
    let b = AgentIdentity::default();
    assert!(!a.commit_changed(&b));
    assert!(!a.path_changed(&b));
    assert!(!a.hash_changed(&b));
}

#[test]
fn one_missing_one_present_collapses_to_unchanged() {
    let a = AgentIdentity::default();
    let b = AgentIdentity::builder().build();
    assert!(!a.commit_changed(&b));
}

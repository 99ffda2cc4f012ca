// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unknown_compartments_covers_all_five_slots() {
    let map = unknown_compartments(42);
    assert_eq!(map.len(), 5);
    assert!(map.contains_key(&CompartmentKind::Agent));
    assert!(map.contains_key(&CompartmentKind::Git));
    assert!(map.contains_key(&CompartmentKind::Lock));
    assert!(map.contains_key(&CompartmentKind::System));
    assert!(map.contains_key(&CompartmentKind::Tests));
    for status in map.values() {
        assert_eq!(status.value, CompartmentValue::Unknown);
        assert_eq!(status.checked_at_ms, 42);
    }
}

#[test]
fn display_matches_wire_strings() {
    assert_eq!(CompartmentKind::Git.to_string(), "git");
    assert_eq!(CompartmentValue::Outdated.to_string(), "outdated");
}

#[test]
fn default_status_is_unknown() {
    let status = CompartmentStatus::default();
    assert_eq!(status.value, CompartmentValue::Unknown);
    assert!(status.message.is_empty());
}

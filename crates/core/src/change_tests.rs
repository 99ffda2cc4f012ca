// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn change_serialize_roundtrip() {
    let change = Change::new(
        1,
        1000,
        ChangeKind::HostRegistered,
        ChangeTarget::Host("hsb1".into()),
        serde_json::json!({"hostname": "hsb1.lan"}),
    );
    let json = serde_json::to_string(&change).unwrap();
    let back: Change = serde_json::from_str(&json).unwrap();
    assert_eq!(change, back);
}

#[test]
fn every_change_kind_roundtrips() {
    let kinds = [
        ChangeKind::HostRegistered,
        ChangeKind::HostUnregistered,
        ChangeKind::HostStatusUpdated,
        ChangeKind::HostMetricsUpdated,
        ChangeKind::CompartmentUpdated,
        ChangeKind::OpCreated,
        ChangeKind::OpStateChanged,
        ChangeKind::OpOutputAppended,
        ChangeKind::PendingPrUpdated,
        ChangeKind::LogEntryAppended,
    ];
    for kind in kinds {
        let json = serde_json::to_string(&kind).unwrap();
        let back: ChangeKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }
}

#[test]
fn change_kind_display_is_snake_case() {
    assert_eq!(ChangeKind::OpStateChanged.to_string(), "op_state_changed");
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_op_starts_in_validating_pre() {
    let op = Op::new(OpId::new(), HostId::parse("hsb1").unwrap(), OpKind::Switch, 1000);
    assert_eq!(op.state, OpState::ValidatingPre);
    assert!(op.snapshot.is_none());
    assert!(op.started_at_ms.is_none());
}

#[test]
fn non_terminal_states_match_pending_command_table() {
    // P2's exact list of states that hold `pending_command`.
    for state in [
        OpState::Queued,
        OpState::Running,
        OpState::RunningWarning,
        OpState::TimeoutPending,
        OpState::Killing,
        OpState::AwaitingReconnect,
    ] {
        assert!(state.holds_pending_command(), "{state:?} should hold pending_command");
        assert!(state.is_non_terminal());
    }
}

#[test]
fn terminal_states_do_not_hold_pending_command() {
    for state in [OpState::Success, OpState::Failed, OpState::Blocked, OpState::StaleBinary] {
        assert!(!state.holds_pending_command());
        assert!(state.is_terminal());
    }
}

#[test]
fn idle_is_non_terminal_but_does_not_hold_pending_command() {
    assert!(OpState::Idle.is_non_terminal());
    assert!(!OpState::Idle.holds_pending_command());
}

#[test]
fn timeout_policy_matches_table() {
    let switch = TimeoutPolicy::for_kind(OpKind::Switch);
    assert_eq!(switch.warn_at_ms, 10 * 60_000);
    assert_eq!(switch.hard_at_ms, 30 * 60_000);

    let pull_switch = TimeoutPolicy::for_kind(OpKind::PullSwitch);
    assert_eq!(pull_switch.warn_at_ms, 12 * 60_000);
    assert_eq!(pull_switch.hard_at_ms, 35 * 60_000);
}

#[test]
fn reconnect_timeout_is_30s_warn_90s_hard() {
    let reconnect = TimeoutPolicy::reconnect();
    assert_eq!(reconnect.warn_at_ms, 30_000);
    assert_eq!(reconnect.hard_at_ms, 90_000);
}

#[test]
fn snapshot_captures_identity_and_compartments() {
    let host = crate::test_support::fresh_host("hsb1", AgentIdentity::builder().build());
    let snap = HostSnapshot::capture(&host);
    assert_eq!(snap.identity, host.identity);
    assert_eq!(snap.update_status, host.update_status);
}

#[test]
fn validation_result_ok_and_fail() {
    let ok = ValidationResult::ok("goal_achieved", "done");
    assert!(ok.valid);
    let fail = ValidationResult::fail("git_outdated", "pull first");
    assert!(!fail.valid);
    assert_eq!(fail.code, "git_outdated");
}

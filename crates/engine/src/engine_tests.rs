use super::*;
use nf_core::test_support::{fresh_host, with_compartment};
use nf_core::{AgentIdentity, CompartmentKind, CompartmentValue, HostId};

fn engine() -> OpEngine {
    OpEngine::new()
}

fn state_with_host(id: &str) -> (MaterializedState, HostId) {
    let mut state = MaterializedState::default();
    let host = fresh_host(id, AgentIdentity {
        version: "1.0.0".into(),
        source_commit: "abc123".into(),
        store_path: "/nix/store/p1".into(),
        binary_hash: "h1".into(),
    });
    let host_id = host.id.clone();
    state.hosts.insert(host_id.clone(), host);
    (state, host_id)
}

#[test]
fn dispatch_blocks_when_pre_validation_fails() {
    let (mut state, host_id) = state_with_host("web-1");
    // fresh_host already has git=ok, system=ok, so switch is already_current.
    let op = engine().dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();

    assert_eq!(op.state, OpState::Blocked);
    assert_eq!(op.pre_check.unwrap().code, "already_current");
    assert_eq!(state.hosts[&host_id].pending_command, None);
}

#[test]
fn dispatch_queues_and_claims_pending_command() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);

    let op = engine().dispatch(&mut state, host_id.clone(), OpKind::Switch, 100).unwrap();

    assert_eq!(op.state, OpState::Queued);
    assert!(op.snapshot.is_some());
    assert_eq!(state.hosts[&host_id].pending_command, Some(op.op_id));
}

#[test]
fn dispatch_twice_blocks_the_second_with_command_pending() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let first = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    assert_eq!(first.state, OpState::Queued);

    let second = eng.dispatch(&mut state, host_id.clone(), OpKind::Test, 1).unwrap();
    assert_eq!(second.state, OpState::Blocked);
    assert_eq!(second.pre_check.unwrap().code, "command_pending");
}

#[test]
fn happy_switch_end_to_end_via_reconnect() {
    let (mut state, host_id) = state_with_host("hsb1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 10).unwrap();
    let disconnected = eng.handle_disconnect(&mut state, &host_id, 20).unwrap();
    assert_eq!(disconnected, Some(op.op_id));
    assert_eq!(state.ops[&op.op_id].state, OpState::AwaitingReconnect);

    let new_identity = AgentIdentity {
        version: "1.0.1".into(),
        source_commit: "def456".into(),
        store_path: "/nix/store/p2".into(),
        binary_hash: "h2".into(),
    };
    let final_state = eng.handle_reconnect(&mut state, &host_id, new_identity, 30).unwrap();
    assert_eq!(final_state, Some(OpState::Success));
    assert_eq!(state.hosts[&host_id].pending_command, None);
}

#[test]
fn stale_binary_reconnect_flags_agent_outdated() {
    let (mut state, host_id) = state_with_host("hsb1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 10).unwrap();
    eng.handle_disconnect(&mut state, &host_id, 20).unwrap();

    let identical_identity = state.hosts[&host_id].identity.clone();
    let final_state = eng.handle_reconnect(&mut state, &host_id, identical_identity, 30).unwrap();

    assert_eq!(final_state, Some(OpState::StaleBinary));
    assert_eq!(state.hosts[&host_id].update_status[&CompartmentKind::Agent].value, CompartmentValue::Outdated);
}

#[test]
fn watchdog_warns_then_hard_times_out_a_running_op() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 0).unwrap();

    let warn_at = state.ops[&op.op_id].timeout_policy.warn_at_ms;
    let hard_at = state.ops[&op.op_id].timeout_policy.hard_at_ms;

    assert_eq!(eng.watchdog_tick(&mut state, op.op_id, warn_at), Some(WatchdogOutcome::Warned));
    assert_eq!(state.ops[&op.op_id].state, OpState::RunningWarning);

    assert_eq!(eng.watchdog_tick(&mut state, op.op_id, hard_at), Some(WatchdogOutcome::HardTimedOut));
    assert_eq!(state.ops[&op.op_id].state, OpState::TimeoutPending);
}

#[test]
fn timeout_kill_kill_failed_then_reboot_aborts_with_no_auto_retry() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 0).unwrap();
    state.ops.get_mut(&op.op_id).unwrap().state = OpState::TimeoutPending;

    eng.begin_kill(&mut state, op.op_id, 100).unwrap();
    assert_eq!(state.ops[&op.op_id].state, OpState::Killing);

    eng.resolve_kill(&mut state, op.op_id, false, 105).unwrap();
    assert_eq!(state.ops[&op.op_id].state, OpState::KillFailed);
    // KILL_FAILED is non-terminal; pending_command must stay set.
    assert_eq!(state.hosts[&host_id].pending_command, Some(op.op_id));

    eng.initiate_reboot(&mut state, &host_id, 110).unwrap();
    assert_eq!(state.ops[&op.op_id].state, OpState::AbortedByReboot);
    assert!(state.ops[&op.op_id].snapshot.is_none());
    assert_eq!(state.hosts[&host_id].pending_command, None);
    assert!(state.recovery_markers.0.contains(&host_id));

    let recovered = eng.recover_after_reboot(&mut state, &host_id);
    assert!(recovered);
    assert_eq!(state.ops[&op.op_id].state, OpState::PostRebootRecovery);
    assert!(!state.recovery_markers.0.contains(&host_id));
}

#[test]
fn watchdog_escalates_killing_to_sigkill_then_kill_failed() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 0).unwrap();
    state.ops.get_mut(&op.op_id).unwrap().state = OpState::TimeoutPending;
    eng.begin_kill(&mut state, op.op_id, 100).unwrap();

    assert_eq!(eng.watchdog_tick(&mut state, op.op_id, 104_999), None);
    assert_eq!(eng.watchdog_tick(&mut state, op.op_id, 105_000), Some(WatchdogOutcome::KillEscalated));
    assert!(state.ops[&op.op_id].kill_escalated);
    assert_eq!(state.ops[&op.op_id].state, OpState::Killing);

    // Re-ticking inside the same escalation window must not resend SIGKILL.
    assert_eq!(eng.watchdog_tick(&mut state, op.op_id, 105_500), None);

    assert_eq!(eng.watchdog_tick(&mut state, op.op_id, 110_000), Some(WatchdogOutcome::KillTimedOut));
    assert_eq!(state.ops[&op.op_id].state, OpState::KillFailed);
    assert_eq!(state.hosts[&host_id].pending_command, Some(op.op_id));
}

#[test]
fn extend_timeout_returns_a_timeout_pending_op_to_running() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 0).unwrap();
    state.ops.get_mut(&op.op_id).unwrap().state = OpState::TimeoutPending;

    eng.extend_timeout(&mut state, op.op_id, 200).unwrap();
    assert_eq!(state.ops[&op.op_id].state, OpState::Running);
    assert_eq!(state.ops[&op.op_id].phase_started_at_ms, 200);
    assert_eq!(state.hosts[&host_id].pending_command, Some(op.op_id));
}

#[test]
fn ignore_timeout_releases_pending_command_and_is_terminal() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 0).unwrap();
    state.ops.get_mut(&op.op_id).unwrap().state = OpState::TimeoutPending;

    eng.ignore_timeout(&mut state, op.op_id, 200).unwrap();
    assert_eq!(state.ops[&op.op_id].state, OpState::Ignored);
    assert!(state.ops[&op.op_id].state.is_terminal());
    assert_eq!(state.hosts[&host_id].pending_command, None);
}

#[test]
fn extend_and_ignore_timeout_reject_wrong_state() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let op = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    eng.mark_running(&mut state, op.op_id, 0).unwrap();

    assert!(eng.extend_timeout(&mut state, op.op_id, 1).is_err());
    assert!(eng.ignore_timeout(&mut state, op.op_id, 1).is_err());
}

#[test]
fn concurrent_dispatch_race_only_one_op_created() {
    let (mut state, host_id) = state_with_host("web-1");
    let host = with_compartment(state.hosts.remove(&host_id).unwrap(), CompartmentKind::System, CompartmentValue::Outdated);
    state.hosts.insert(host_id.clone(), host);
    let eng = engine();

    let first = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 0).unwrap();
    let second = eng.dispatch(&mut state, host_id.clone(), OpKind::Switch, 1).unwrap();

    assert_eq!(first.state, OpState::Queued);
    assert_eq!(second.state, OpState::Blocked);
    assert_eq!(state.ops.len(), 2);
    assert_eq!(state.hosts[&host_id].pending_command, Some(first.op_id));
}

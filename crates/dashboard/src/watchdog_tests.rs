use super::*;
use crate::gateway::agent::AgentRegistry;
use crate::store::StateStore;
use nf_core::test_support::fresh_host;
use nf_core::{AgentIdentity, OpKind, OpState};

fn identity() -> AgentIdentity {
    AgentIdentity { version: "1.0.0".into(), source_commit: "abc".into(), store_path: "/nix/store/p1".into(), binary_hash: "h1".into() }
}

fn open(dir: &tempfile::TempDir) -> StateStore {
    StateStore::open(dir.path()).expect("open store")
}

#[test]
fn tick_once_escalates_a_pull_past_its_hard_timeout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let agents = AgentRegistry::new();
    let host = fresh_host("web-1", identity());
    let host_id = host.id.clone();
    store.register_host(host_id.clone(), host.hostname.clone(), host.platform, host.identity.clone(), host.update_status.clone(), 0).expect("register");

    let op = store.dispatch(host_id, OpKind::Pull, 0).expect("dispatch");
    store.mark_running(op.op_id, 0).expect("mark running");

    // Pull's hard-at is 5 minutes; push well past it.
    tick_once(&store, &agents, 6 * 60_000);
    assert_eq!(store.op(op.op_id).expect("op").state, OpState::TimeoutPending);
}

#[test]
fn tick_once_is_a_no_op_for_a_fresh_running_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let agents = AgentRegistry::new();
    let host = fresh_host("web-2", identity());
    let host_id = host.id.clone();
    store.register_host(host_id.clone(), host.hostname.clone(), host.platform, host.identity.clone(), host.update_status.clone(), 0).expect("register");

    let op = store.dispatch(host_id, OpKind::Pull, 0).expect("dispatch");
    store.mark_running(op.op_id, 0).expect("mark running");

    tick_once(&store, &agents, 100);
    assert_eq!(store.op(op.op_id).expect("op").state, OpState::Running);
}

#[test]
fn tick_once_sends_sigkill_once_a_killing_op_hits_the_escalation_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let agents = AgentRegistry::new();
    let host = fresh_host("web-4", identity());
    let host_id = host.id.clone();
    store.register_host(host_id.clone(), host.hostname.clone(), host.platform, host.identity.clone(), host.update_status.clone(), 0).expect("register");

    let op = store.dispatch(host_id, OpKind::Pull, 0).expect("dispatch");
    store.mark_running(op.op_id, 0).expect("mark running");
    tick_once(&store, &agents, 6 * 60_000);
    store.begin_kill(op.op_id, 6 * 60_000).expect("begin kill");

    // No agent connection registered, so tick_once can't actually deliver
    // the SIGKILL, but it must still drive the engine's escalation — the
    // op ends up KILL_FAILED rather than stuck in KILLING forever.
    tick_once(&store, &agents, 6 * 60_000 + 5_000);
    assert!(store.op(op.op_id).expect("op").kill_escalated);
    tick_once(&store, &agents, 6 * 60_000 + 10_000);
    assert_eq!(store.op(op.op_id).expect("op").state, OpState::KillFailed);
}

#[test]
fn sweep_once_logs_a_stuck_queued_finding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open(&dir);
    let host = fresh_host("web-3", identity());
    let host_id = host.id.clone();
    store.register_host(host_id.clone(), host.hostname.clone(), host.platform, host.identity.clone(), host.update_status.clone(), 0).expect("register");

    // Left in Queued without ever calling mark_running.
    store.dispatch(host_id, OpKind::Pull, 0).expect("dispatch");

    sweep_once(&store, 61_000);
    let log = store.system_log();
    assert!(log.iter().any(|e| e.code.as_deref() == Some("stuck_queued")));
}

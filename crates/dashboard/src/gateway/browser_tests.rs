use super::*;
use crate::store::StateStore;
use nf_core::test_support::fresh_host;
use nf_core::{AgentIdentity, HostId, OpKind};

fn identity() -> AgentIdentity {
    AgentIdentity { version: "1.0.0".into(), source_commit: "abc".into(), store_path: "/nix/store/p1".into(), binary_hash: "h1".into() }
}

fn store_with_host() -> (StateStore, HostId) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::open(dir.path()).expect("open");
    let host = fresh_host("browser-host", identity());
    let host_id = host.id.clone();
    store
        .register_host(host_id.clone(), host.hostname.clone(), host.platform, host.identity.clone(), host.update_status.clone(), 1_000)
        .expect("register");
    (store, host_id)
}

#[test]
fn subscribe_then_full_state_reflects_dispatched_ops() {
    let (store, host_id) = store_with_host();
    let _handle = store.subscribe(8);
    store.dispatch(host_id, OpKind::Test, 2_000).expect("dispatch");

    let full = store.full_state();
    assert_eq!(full.hosts.len(), 1);
    assert_eq!(full.ops.len(), 1);
}

#[tokio::test]
async fn a_delta_reaches_a_live_subscriber() {
    let (store, host_id) = store_with_host();
    let mut handle = store.subscribe(8);
    store.dispatch(host_id, OpKind::Test, 2_000).expect("dispatch");

    let msg = handle.rx.try_recv().expect("delta queued");
    assert!(matches!(msg, DashboardToBrowser::Delta { .. }));
}

#[test]
fn send_to_subscriber_misses_a_disconnected_handle() {
    let (store, _host_id) = store_with_host();
    let handle = store.subscribe(4);
    let id = handle.id;
    drop(handle);

    let delivered = store.send_to_subscriber(id, DashboardToBrowser::Sync { version: store.version() });
    assert!(!delivered, "a dropped receiver must report delivery failure");
}

use super::*;
use nf_core::{ChangeKind, ChangeTarget, Host, HostId, Platform};
use serde_json::json;
use tempfile::tempdir;

fn host_registered(version: u64, id: &str) -> Change {
    let host = Host::new(HostId::parse(id).unwrap(), id.into(), Platform::Nixos, version * 10);
    Change::new(version, version * 10, ChangeKind::HostRegistered, ChangeTarget::Host(id.into()), json!(host))
}

#[test]
fn recover_on_fresh_dir_is_empty() {
    let dir = tempdir().unwrap();
    let checkpointer = Checkpointer::new(dir.path());
    let recovered = checkpointer.recover().unwrap();
    assert_eq!(recovered.state, MaterializedState::default());
}

#[test]
fn wal_records_survive_recovery_without_a_checkpoint() {
    let dir = tempdir().unwrap();
    let checkpointer = Checkpointer::new(dir.path());

    {
        let mut recovered = checkpointer.recover().unwrap();
        for v in 1..=3 {
            let change = host_registered(v, &format!("web-{v}"));
            crate::apply::apply_change(&mut recovered.state, change.clone());
            recovered.wal.append(&change).unwrap();
        }
    }

    let recovered = checkpointer.recover().unwrap();
    assert_eq!(recovered.state.hosts.len(), 3);
    assert_eq!(recovered.state.version, 3);
}

#[test]
fn checkpoint_then_recover_yields_the_same_state_with_empty_wal() {
    let dir = tempdir().unwrap();
    let checkpointer = Checkpointer::new(dir.path());

    let mut recovered = checkpointer.recover().unwrap();
    let change = host_registered(1, "web-1");
    crate::apply::apply_change(&mut recovered.state, change.clone());
    recovered.wal.append(&change).unwrap();

    checkpointer.checkpoint(&recovered.state, &mut recovered.wal).unwrap();
    assert!(Wal::replay(recovered.wal.path()).unwrap().is_empty());

    let after = checkpointer.recover().unwrap();
    assert_eq!(after.state, recovered.state);
}

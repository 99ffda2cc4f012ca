use super::*;
use nf_core::Host;
use tempfile::tempdir;

#[test]
fn load_of_missing_snapshot_is_empty_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.snapshot");
    let state = Snapshot::load(&path).unwrap();
    assert_eq!(state, MaterializedState::default());
}

#[test]
fn write_then_load_roundtrips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.snapshot");

    let mut state = MaterializedState::default();
    let host = Host::new(nf_core::HostId::parse("web-1").unwrap(), "web-1".into(), nf_core::Platform::Nixos, 100);
    state.hosts.insert(host.id.clone(), host);
    state.version = 7;

    Snapshot::write(&path, &state).unwrap();
    let loaded = Snapshot::load(&path).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn write_does_not_leave_a_tmp_file_behind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.snapshot");
    Snapshot::write(&path, &MaterializedState::default()).unwrap();
    assert!(path.exists());
    assert!(!path.with_file_name("nixfleet.snapshot.tmp").exists());
}

#[test]
fn second_write_overwrites_the_first() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.snapshot");

    let mut first = MaterializedState::default();
    first.version = 1;
    Snapshot::write(&path, &first).unwrap();

    let mut second = MaterializedState::default();
    second.version = 2;
    Snapshot::write(&path, &second).unwrap();

    let loaded = Snapshot::load(&path).unwrap();
    assert_eq!(loaded.version, 2);
}

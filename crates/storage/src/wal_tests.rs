use super::*;
use nf_core::{ChangeKind, ChangeTarget};
use serde_json::json;
use tempfile::tempdir;

fn change(version: u64) -> Change {
    Change::new(
        version,
        1_000 + version,
        ChangeKind::HostStatusUpdated,
        ChangeTarget::Host("web-1".into()),
        json!({ "status": "online" }),
    )
}

#[test]
fn replay_of_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.wal");
    assert!(Wal::replay(&path).unwrap().is_empty());
}

#[test]
fn append_then_replay_roundtrips_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.wal");
    {
        let mut wal = Wal::open(&path).unwrap();
        for v in 1..=5 {
            wal.append(&change(v)).unwrap();
        }
    }
    let replayed = Wal::replay(&path).unwrap();
    assert_eq!(replayed.len(), 5);
    for (i, change) in replayed.iter().enumerate() {
        assert_eq!(change.version, (i + 1) as u64);
    }
}

#[test]
fn reopening_appends_rather_than_overwriting() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.wal");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&change(1)).unwrap();
    }
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&change(2)).unwrap();
    }
    let replayed = Wal::replay(&path).unwrap();
    assert_eq!(replayed.len(), 2);
}

#[test]
fn truncate_empties_the_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.wal");
    let mut wal = Wal::open(&path).unwrap();
    wal.append(&change(1)).unwrap();
    wal.truncate().unwrap();
    drop(wal);
    assert!(Wal::replay(&path).unwrap().is_empty());
}

#[test]
fn truncated_trailing_record_is_reported_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nixfleet.wal");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&change(1)).unwrap();
    }
    // chop off the last byte of the (compressed) record, leaving a length
    // prefix that promises more data than is actually present.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.pop();
    std::fs::write(&path, bytes).unwrap();

    let err = Wal::replay(&path).unwrap_err();
    assert!(matches!(err, WalError::Corrupt(_)));
}

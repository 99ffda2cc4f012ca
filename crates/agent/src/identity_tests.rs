use super::*;

#[test]
fn capture_resolves_the_running_test_binary() {
    let identity = capture().expect("capture should succeed under the test harness");
    assert!(!identity.binary_hash.is_empty());
    assert!(!identity.store_path.is_empty());
    assert_eq!(identity.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn hash_file_is_stable_across_repeated_reads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("payload");
    std::fs::write(&path, b"nixfleet-agent-binary-contents").expect("write");

    let first = hash_file(&path).expect("hash");
    let second = hash_file(&path).expect("hash");
    assert_eq!(first, second);
    assert_eq!(first.len(), 64, "sha-256 hex digest is 64 chars");
}

use super::*;
use nf_core::{LogLevel, MAX_IN_MEMORY_LOG_ENTRIES};

fn entry(n: usize) -> LogEntry {
    LogEntry::system(n as u64, LogLevel::Info, format!("entry {n}"))
}

#[test]
fn default_state_is_empty() {
    let state = MaterializedState::default();
    assert!(state.hosts.is_empty());
    assert!(state.ops.is_empty());
    assert_eq!(state.version, 0);
    assert!(state.recovery_markers.0.is_empty());
    assert!(state.pending_prs.is_empty());
}

#[test]
fn system_log_is_bounded() {
    let mut state = MaterializedState::default();
    for n in 0..(MAX_IN_MEMORY_LOG_ENTRIES + 50) {
        state.push_system_log(entry(n));
    }
    assert_eq!(state.system_log.len(), MAX_IN_MEMORY_LOG_ENTRIES);
    // the oldest 50 entries should have been evicted
    assert_eq!(state.system_log.front().unwrap().message, "entry 50");
}

#[test]
fn host_log_is_bounded_per_host() {
    let mut state = MaterializedState::default();
    let host_id = HostId::parse("web-1").unwrap();
    for n in 0..(MAX_IN_MEMORY_LOG_ENTRIES + 1) {
        state.push_host_log(host_id.clone(), entry(n));
    }
    assert_eq!(state.host_logs[&host_id].len(), MAX_IN_MEMORY_LOG_ENTRIES);
}

#[test]
fn host_logs_are_independent_per_host() {
    let mut state = MaterializedState::default();
    let a = HostId::parse("host-a").unwrap();
    let b = HostId::parse("host-b").unwrap();
    state.push_host_log(a.clone(), entry(1));
    state.push_host_log(b.clone(), entry(2));
    assert_eq!(state.host_logs[&a].len(), 1);
    assert_eq!(state.host_logs[&b].len(), 1);
}

#[test]
fn pending_pr_roundtrips_through_json() {
    let pr = PendingPr {
        project: "nixpkgs".into(),
        url: "https://example.invalid/pr/1".into(),
        title: "bump foo".into(),
    };
    let json = serde_json::to_string(&pr).unwrap();
    let back: PendingPr = serde_json::from_str(&json).unwrap();
    assert_eq!(pr, back);
}

use super::*;

#[test]
fn constant_time_eq_matches_identical_strings() {
    assert!(constant_time_eq("secret", "secret"));
}

#[test]
fn constant_time_eq_rejects_different_lengths_and_contents() {
    assert!(!constant_time_eq("secret", "secre"));
    assert!(!constant_time_eq("secret", "secrey"));
}

#[test]
fn agent_token_ok_is_permissive_in_dev_mode() {
    assert!(agent_token_ok(None, None));
    assert!(agent_token_ok(None, Some("whatever")));
}

#[test]
fn agent_token_ok_requires_a_match_when_configured() {
    assert!(agent_token_ok(Some("s3cr3t"), Some("s3cr3t")));
    assert!(!agent_token_ok(Some("s3cr3t"), Some("wrong")));
    assert!(!agent_token_ok(Some("s3cr3t"), None));
}

#[test]
fn session_round_trip_validates_only_with_the_right_csrf_token() {
    let store = SessionStore::new();
    let (session_id, csrf) = store.create();
    assert!(store.validate(&session_id, &csrf));
    assert!(!store.validate(&session_id, "bogus"));
}

#[test]
fn destroyed_session_fails_validation() {
    let store = SessionStore::new();
    let (session_id, csrf) = store.create();
    store.destroy(&session_id);
    assert!(!store.validate(&session_id, &csrf));
}

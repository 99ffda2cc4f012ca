use super::*;
use nf_core::test_support::fresh_host;

#[test]
fn claim_then_release_round_trips() {
    let mut host = fresh_host("web-1", Default::default());
    assert_eq!(host.pending_command, None);

    let op_id = OpId::new();
    PendingCommandStore::claim(&mut host, op_id);
    assert_eq!(host.pending_command, Some(op_id));

    PendingCommandStore::release(&mut host);
    assert_eq!(host.pending_command, None);
}

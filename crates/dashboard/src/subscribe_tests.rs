use super::*;

#[test]
fn send_until_full_then_rejects() {
    let (sub, _handle) = Subscriber::new(1, 2);
    let msg = || DashboardToBrowser::Sync { version: 1 };
    assert!(sub.try_send(msg()));
    assert!(sub.try_send(msg()));
    assert!(!sub.try_send(msg()), "third send should find the bounded queue full");
}

#[test]
fn dropping_the_handle_makes_further_sends_fail() {
    let (sub, handle) = Subscriber::new(1, 4);
    drop(handle);
    assert!(!sub.try_send(DashboardToBrowser::Sync { version: 1 }));
}

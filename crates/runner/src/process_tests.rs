// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use nf_core::op::OpId;
use tokio::sync::mpsc;

#[tokio::test]
async fn spawn_streams_stdout_lines() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let op_id = OpId::new();
    let mut proc = RunningProcess::spawn(
        op_id,
        "printf",
        &["line1\nline2\n".to_string()],
        None,
        tx,
    )
    .unwrap();

    let outcome = proc.wait_with_timeout(Duration::from_secs(5)).await;
    assert!(matches!(outcome, RunOutcome::Exited(0)));

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line.line);
    }
    assert_eq!(lines, vec!["line1", "line2"]);
}

#[tokio::test]
async fn exit_code_is_reported() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut proc = RunningProcess::spawn(OpId::new(), "sh", &["-c".into(), "exit 7".into()], None, tx)
        .unwrap();
    let outcome = proc.wait_with_timeout(Duration::from_secs(5)).await;
    assert!(matches!(outcome, RunOutcome::Exited(7)));
}

#[tokio::test]
async fn wait_with_timeout_reports_timed_out() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut proc =
        RunningProcess::spawn(OpId::new(), "sleep", &["5".into()], None, tx).unwrap();
    let outcome = proc.wait_with_timeout(Duration::from_millis(50)).await;
    assert!(matches!(outcome, RunOutcome::TimedOut));
    // clean up so the test doesn't leak a sleeping child
    let _ = proc.kill(KillSignal::Sigkill);
}

#[tokio::test]
async fn escalate_kill_reaps_an_unresponsive_process() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut proc = RunningProcess::spawn(OpId::new(), "sleep", &["30".into()], None, tx).unwrap();
    // Short stage waits keep the test fast; real callers use the 5s policy.
    let killed = escalate_kill(&mut proc, Duration::from_millis(100)).await;
    assert!(killed);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! StateStore: the single authoritative apply loop behind one mutex (§5).
//! Every mutation funnels through here — call the engine, turn its effect
//! into a `Change`, apply it to the live state, append it to the WAL, and
//! fan it out to subscribers, all inside one lock acquisition.

use crate::compartments::{self, OpOutcome};
use crate::subscribe::{Subscriber, SubscriberHandle};
use nf_core::{
    AgentIdentity, Change, ChangeKind, ChangeTarget, CompartmentMap, Host, HostId, HostStatus,
    LogEntry, Metrics, Op, OpId, OpKind, OpState, Platform,
};
use nf_engine::{OpEngine, OpEngineError};
use nf_protocol::{DashboardToBrowser, FullState};
use nf_storage::{apply_change, CheckpointError, Checkpointer, MaterializedState, Wal, WalError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Engine(#[from] OpEngineError),
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("host {0} is not registered")]
    UnknownHost(HostId),
    #[error("op {0} is not known")]
    UnknownOp(OpId),
    #[error("host {0} already exists")]
    HostAlreadyExists(HostId),
}

/// Cap on retained lines per op; output is at-most-once and not durable,
/// so this only needs to satisfy "recovered via output_ref on demand"
/// for ops that are still recent.
const MAX_OUTPUT_LINES_PER_OP: usize = 5_000;

struct Inner {
    state: MaterializedState,
    wal: Wal,
    checkpointer: Checkpointer,
    engine: OpEngine,
    subscribers: Vec<Subscriber>,
    next_subscriber_id: u64,
    /// Non-durable op output buffer, keyed by `op_id`; never WAL'd (§4.4).
    output: std::collections::HashMap<OpId, VecDeque<(nf_protocol::OutputStream, String)>>,
}

impl Inner {
    fn record(
        &mut self,
        kind: ChangeKind,
        target: ChangeTarget,
        data: serde_json::Value,
        ts_ms: u64,
    ) -> Result<Change, StoreError> {
        let version = self.state.version + 1;
        let change = Change::new(version, ts_ms, kind, target, data);
        apply_change(&mut self.state, change.clone());
        self.wal.append(&change)?;
        self.fan_out(DashboardToBrowser::Delta { version, change: change.clone() });
        Ok(change)
    }

    fn fan_out(&mut self, msg: DashboardToBrowser) {
        self.subscribers.retain(|sub| sub.try_send(msg.clone()));
    }

    fn record_host(&mut self, host: &Host, ts_ms: u64) -> Result<(), StoreError> {
        let data = serde_json::to_value(host).expect("Host always serializes");
        self.record(ChangeKind::HostRegistered, ChangeTarget::Host(host.id.to_string()), data, ts_ms)?;
        Ok(())
    }

    fn record_op(&mut self, op: &Op, kind: ChangeKind, ts_ms: u64) -> Result<(), StoreError> {
        let data = serde_json::to_value(op).expect("Op always serializes");
        self.record(kind, ChangeTarget::Op(op.op_id.to_string()), data, ts_ms)?;
        Ok(())
    }

    fn record_compartments(&mut self, host_id: &HostId, ts_ms: u64) -> Result<(), StoreError> {
        let slots: Vec<_> = self.state.hosts[host_id].update_status.iter().map(|(k, v)| (*k, v.clone())).collect();
        for (kind, status) in slots {
            let data = serde_json::to_value((kind, status)).expect("compartment tuple always serializes");
            self.record(ChangeKind::CompartmentUpdated, ChangeTarget::Host(host_id.to_string()), data, ts_ms)?;
        }
        Ok(())
    }
}

pub struct StateStore {
    inner: Mutex<Inner>,
}

impl StateStore {
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let checkpointer = Checkpointer::new(state_dir.as_ref());
        let recovered = checkpointer.recover()?;
        Ok(Self {
            inner: Mutex::new(Inner {
                state: recovered.state,
                wal: recovered.wal,
                checkpointer,
                engine: OpEngine::new(),
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                output: std::collections::HashMap::new(),
            }),
        })
    }

    pub fn version(&self) -> u64 {
        self.inner.lock().state.version
    }

    pub fn full_state(&self) -> FullState {
        let inner = self.inner.lock();
        FullState { hosts: inner.state.hosts.clone(), ops: inner.state.ops.clone() }
    }

    pub fn host(&self, host_id: &HostId) -> Option<Host> {
        self.inner.lock().state.hosts.get(host_id).cloned()
    }

    pub fn op(&self, op_id: OpId) -> Option<Op> {
        self.inner.lock().state.ops.get(&op_id).cloned()
    }

    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let Inner { state, wal, checkpointer, .. } = &mut *inner;
        checkpointer.checkpoint(state, wal)?;
        Ok(())
    }

    pub fn subscribe(&self, capacity: usize) -> SubscriberHandle {
        let mut inner = self.inner.lock();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        let (sub, handle) = Subscriber::new(id, capacity);
        inner.subscribers.push(sub);
        handle
    }

    /// Pushes `msg` onto one specific subscriber's queue, used to answer a
    /// `get_state` request without needing write access to its socket's
    /// sink from the reader half of the connection.
    pub fn send_to_subscriber(&self, id: u64, msg: DashboardToBrowser) -> bool {
        self.inner.lock().subscribers.iter().find(|s| s.id == id).is_some_and(|s| s.try_send(msg))
    }

    // ---- host lifecycle ----

    /// Handles a `register` frame — first contact, or a reconnect. If the
    /// host had a `switch` sitting in `AwaitingReconnect`, resolves it via
    /// the FreshnessVerifier before applying the routine identity/status
    /// update.
    pub fn register_host(
        &self,
        host_id: HostId,
        hostname: String,
        platform: Platform,
        identity: AgentIdentity,
        reported: CompartmentMap,
        now_ms: u64,
    ) -> Result<Host, StoreError> {
        let mut inner = self.inner.lock();

        inner.engine.recover_after_reboot(&mut inner.state, &host_id);

        let existing_pending = inner.state.hosts.get(&host_id).and_then(|h| h.pending_command);
        if inner.state.hosts.contains_key(&host_id) {
            if inner.engine.handle_reconnect(&mut inner.state, &host_id, identity.clone(), now_ms)?.is_some() {
                if let Some(op) = existing_pending.and_then(|op_id| inner.state.ops.get(&op_id).cloned()) {
                    inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
                }
            }
        }

        let mut host = inner
            .state
            .hosts
            .get(&host_id)
            .cloned()
            .unwrap_or_else(|| Host::new(host_id.clone(), hostname.clone(), platform, now_ms));
        host.hostname = hostname;
        host.platform = platform;
        host.status = HostStatus::Online;
        host.last_seen_ms = now_ms;
        host.removed_at_ms = None;
        // Only a brand-new registration or an explicit compartment report
        // overwrites identity/compartments here; a reconnect mid-switch
        // already had both updated by `handle_reconnect` above.
        if host.pending_command.is_none() {
            host.identity = identity;
            host.update_status = reported;
        }

        inner.record_host(&host, now_ms)?;
        Ok(host)
    }

    /// Admin-create (`POST /api/hosts`): seeds a host record ahead of its
    /// first agent connection. Platform and identity are provisional — the
    /// next `register_host` overwrites them unconditionally.
    pub fn create_host(&self, host_id: HostId, hostname: String, now_ms: u64) -> Result<Host, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.hosts.contains_key(&host_id) {
            return Err(StoreError::HostAlreadyExists(host_id));
        }
        let host = Host::new(host_id, hostname, Platform::Nixos, now_ms);
        inner.record_host(&host, now_ms)?;
        Ok(host)
    }

    pub fn heartbeat(
        &self,
        host_id: &HostId,
        metrics: Metrics,
        reported: CompartmentMap,
        identity: AgentIdentity,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        {
            let host = inner.state.hosts.get_mut(host_id).ok_or_else(|| StoreError::UnknownHost(host_id.clone()))?;
            host.metrics = metrics;
            host.identity = identity;
            host.last_seen_ms = now_ms;
            host.status = HostStatus::Online;
            // Heartbeat never touches `pending_command` (P2's sole-writer
            // rule is the OpEngine, via LifecycleManager).
            for (kind, status) in reported {
                host.update_status.insert(kind, status);
            }
        }
        let data = serde_json::to_value(inner.state.hosts[host_id].status).expect("status always serializes");
        inner.record(ChangeKind::HostStatusUpdated, ChangeTarget::Host(host_id.to_string()), data, now_ms)?;
        inner.record_compartments(host_id, now_ms)?;
        Ok(())
    }

    /// Marks a host offline after its socket drops; if a `switch` is mid
    /// flight, defers its terminal state to `AwaitingReconnect` instead.
    pub fn mark_offline(&self, host_id: &HostId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(op_id) = inner.engine.handle_disconnect(&mut inner.state, host_id, now_ms)? {
            let op = inner.state.ops[&op_id].clone();
            inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        }
        if let Some(host) = inner.state.hosts.get_mut(host_id) {
            host.status = HostStatus::Offline;
        } else {
            return Err(StoreError::UnknownHost(host_id.clone()));
        }
        let data = serde_json::to_value(HostStatus::Offline).expect("status always serializes");
        inner.record(ChangeKind::HostStatusUpdated, ChangeTarget::Host(host_id.to_string()), data, now_ms)?;
        Ok(())
    }

    pub fn remove_host(&self, host_id: &HostId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.hosts.contains_key(host_id) {
            return Err(StoreError::UnknownHost(host_id.clone()));
        }
        inner.record(ChangeKind::HostUnregistered, ChangeTarget::Host(host_id.to_string()), serde_json::Value::Null, now_ms)?;
        Ok(())
    }

    // ---- op lifecycle ----

    pub fn dispatch(&self, host_id: HostId, kind: OpKind, now_ms: u64) -> Result<Op, StoreError> {
        let mut inner = self.inner.lock();
        let op = inner.engine.dispatch(&mut inner.state, host_id.clone(), kind, now_ms)?;
        inner.record_op(&op, ChangeKind::OpCreated, now_ms)?;
        Ok(op)
    }

    pub fn mark_running(&self, op_id: OpId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.engine.mark_running(&mut inner.state, op_id, now_ms)?;
        let op = inner.state.ops[&op_id].clone();
        inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        Ok(())
    }

    pub fn command_complete(
        &self,
        op_id: OpId,
        exit_code: i32,
        fresh_status: CompartmentMap,
        now_ms: u64,
    ) -> Result<OpState, StoreError> {
        let mut inner = self.inner.lock();
        let final_state = inner.engine.handle_command_complete(&mut inner.state, op_id, exit_code, fresh_status, now_ms)?;
        let op = inner.state.ops.get(&op_id).ok_or(StoreError::UnknownOp(op_id))?.clone();

        if let Some(host) = inner.state.hosts.get_mut(&op.host_id) {
            let outcome = if final_state == OpState::Success { OpOutcome::Success } else { OpOutcome::Failure };
            compartments::infer_system(&mut host.update_status, op.kind, outcome, now_ms);
        }
        inner.record_compartments(&op.host_id, now_ms)?;
        inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        Ok(final_state)
    }

    pub fn watchdog_tick(&self, op_id: OpId, now_ms: u64) -> Result<Option<nf_engine::WatchdogOutcome>, StoreError> {
        let mut inner = self.inner.lock();
        let outcome = inner.engine.watchdog_tick(&mut inner.state, op_id, now_ms);
        if outcome.is_some() {
            let op = inner.state.ops.get(&op_id).ok_or(StoreError::UnknownOp(op_id))?.clone();
            inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        }
        Ok(outcome)
    }

    pub fn extend_timeout(&self, op_id: OpId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.engine.extend_timeout(&mut inner.state, op_id, now_ms)?;
        let op = inner.state.ops[&op_id].clone();
        inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        Ok(())
    }

    pub fn ignore_timeout(&self, op_id: OpId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.engine.ignore_timeout(&mut inner.state, op_id, now_ms)?;
        let op = inner.state.ops[&op_id].clone();
        inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        Ok(())
    }

    pub fn begin_kill(&self, op_id: OpId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.engine.begin_kill(&mut inner.state, op_id, now_ms)?;
        let op = inner.state.ops[&op_id].clone();
        inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        Ok(())
    }

    pub fn resolve_kill(&self, op_id: OpId, killed: bool, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.engine.resolve_kill(&mut inner.state, op_id, killed, now_ms)?;
        let op = inner.state.ops[&op_id].clone();
        inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        Ok(())
    }

    pub fn initiate_reboot(&self, host_id: &HostId, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.engine.initiate_reboot(&mut inner.state, host_id, now_ms)?;
        if let Some(op) = inner.state.ops.values().find(|op| &op.host_id == host_id && op.state == OpState::AbortedByReboot).cloned()
        {
            inner.record_op(&op, ChangeKind::OpStateChanged, now_ms)?;
        }
        Ok(())
    }

    // ---- logs & output ----

    pub fn append_system_log(&self, entry: LogEntry, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let data = serde_json::to_value(&entry).expect("LogEntry always serializes");
        inner.record(ChangeKind::LogEntryAppended, ChangeTarget::System, data, now_ms)?;
        Ok(())
    }

    pub fn append_host_log(&self, host_id: &HostId, entry: LogEntry, now_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let data = serde_json::to_value(&entry).expect("LogEntry always serializes");
        inner.record(ChangeKind::LogEntryAppended, ChangeTarget::Host(host_id.to_string()), data, now_ms)?;
        Ok(())
    }

    /// Appends one output line and fans it to subscribers directly — never
    /// through the WAL or the version counter (§4.4).
    pub fn append_output(&self, op_id: OpId, stream: nf_protocol::OutputStream, line: String) {
        let mut inner = self.inner.lock();
        {
            let buf = inner.output.entry(op_id).or_default();
            buf.push_back((stream, line.clone()));
            while buf.len() > MAX_OUTPUT_LINES_PER_OP {
                buf.pop_front();
            }
        }
        inner.fan_out(DashboardToBrowser::Output { op_id, stream, line });
    }

    /// The retained tail of an op's output, for `GET /api/hosts/{id}/output`.
    pub fn output_log(&self, op_id: OpId) -> Vec<(nf_protocol::OutputStream, String)> {
        self.inner.lock().output.get(&op_id).map(|b| b.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn system_log(&self) -> Vec<LogEntry> {
        self.inner.lock().state.system_log.iter().cloned().collect()
    }

    /// Every op id currently in a non-terminal state, the watchdog's
    /// per-tick working set.
    pub fn active_op_ids(&self) -> Vec<OpId> {
        self.inner.lock().state.ops.values().filter(|op| op.state.is_non_terminal()).map(|op| op.op_id).collect()
    }

    /// Runs one self-healing sweep pass over the live state (§4.6); a
    /// read-only scan, so no lock is held across the returned findings.
    pub fn sweep(&self, now_ms: u64) -> Vec<LogEntry> {
        nf_engine::sweep(&self.inner.lock().state, now_ms)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded per-connection outgoing queue for browser subscribers (§4.5).
//! A slow browser must never block the StateStore's apply loop: messages
//! are pushed with `try_send`, and a full queue gets the subscriber
//! dropped rather than the sender stalling.

use nf_protocol::DashboardToBrowser;
use tokio::sync::mpsc;

/// Held by the `StateStore`, one per live browser connection.
pub struct Subscriber {
    pub id: u64,
    tx: mpsc::Sender<DashboardToBrowser>,
}

/// Held by the Gateway task driving the WebSocket write half.
pub struct SubscriberHandle {
    pub id: u64,
    pub rx: mpsc::Receiver<DashboardToBrowser>,
}

impl Subscriber {
    pub fn new(id: u64, capacity: usize) -> (Self, SubscriberHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, tx }, SubscriberHandle { id, rx })
    }

    /// Returns `false` if the queue was full (or the receiver already
    /// dropped) — the caller must then remove this subscriber.
    pub fn try_send(&self, msg: DashboardToBrowser) -> bool {
        self.tx.try_send(msg).is_ok()
    }
}

#[cfg(test)]
#[path = "subscribe_tests.rs"]
mod tests;

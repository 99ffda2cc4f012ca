// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PRSource`: external collaborator polled for pending dependency-update
//! PRs (§ Open Questions — "an external PRSource interface is polled").
//! No concrete git-forge client is implemented; `NullPrSource` is the
//! shipped no-op, and a future client only needs to implement the trait.

use async_trait::async_trait;
use nf_storage::PendingPr;
use std::time::Duration;

#[async_trait]
pub trait PrSource: Send + Sync {
    /// Returns every currently-open dependency-update PR known to the
    /// forge. Errors are logged by the poller and treated as "no change
    /// this cycle" rather than propagated — a flaky forge API must not
    /// take the dashboard down.
    async fn poll(&self) -> anyhow::Result<Vec<PendingPr>>;
}

/// Ships as the default until a concrete git-forge client exists.
pub struct NullPrSource;

#[async_trait]
impl PrSource for NullPrSource {
    async fn poll(&self) -> anyhow::Result<Vec<PendingPr>> {
        Ok(Vec::new())
    }
}

/// One poll-and-record cycle; the caller drives the interval (see
/// `main.rs`'s background task) so this stays a plain, testable function
/// rather than an un-cancellable infinite loop.
pub async fn poll_once(source: &dyn PrSource, now_ms: u64, mut record: impl FnMut(PendingPr, u64)) {
    match source.poll().await {
        Ok(prs) => {
            for pr in prs {
                record(pr, now_ms);
            }
        }
        Err(err) => {
            tracing::warn!(%err, "PRSource poll failed, will retry next interval");
        }
    }
}

/// Spawns a background task that calls [`poll_once`] every `interval`.
pub fn spawn(
    source: Box<dyn PrSource>,
    interval: Duration,
    mut record: impl FnMut(PendingPr, u64) + Send + 'static,
    mut now_ms: impl FnMut() -> u64 + Send + 'static,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            poll_once(source.as_ref(), now_ms(), &mut record).await;
        }
    })
}

#[cfg(test)]
#[path = "prsource_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nf-storage: the embedded-KV realization of the authoritative
//! `MaterializedState`, its write-ahead log, snapshotting, and the
//! checkpointer that ties them together for crash recovery.

mod apply;
mod checkpoint;
mod error;
mod snapshot;
mod state;
mod wal;

pub use apply::apply_change;
pub use checkpoint::{CheckpointError, Checkpointer, Recovered};
pub use error::{SnapshotError, WalError};
pub use snapshot::Snapshot;
pub use state::{MaterializedState, PendingPr, RecoveryMarkers};
pub use wal::Wal;

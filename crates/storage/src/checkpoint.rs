// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpointer: periodically (and on shutdown) writes a full snapshot of
//! `MaterializedState` and truncates the WAL, so recovery only has to
//! replay whatever was appended since the last checkpoint rather than the
//! log's entire history.

use crate::error::{SnapshotError, WalError};
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Wal(#[from] WalError),
}

/// Recovered startup state: the last snapshot with the WAL tail replayed on
/// top of it, plus the reopened WAL ready to accept further appends.
pub struct Recovered {
    pub state: MaterializedState,
    pub wal: Wal,
}

pub struct Checkpointer {
    snapshot_path: PathBuf,
    wal_path: PathBuf,
}

impl Checkpointer {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        let state_dir = state_dir.as_ref();
        Self {
            snapshot_path: state_dir.join("nixfleet.snapshot"),
            wal_path: state_dir.join("nixfleet.wal"),
        }
    }

    /// Loads the last snapshot, replays any WAL records appended after it,
    /// and hands back the reconstructed state plus a live `Wal` handle
    /// (§ Crash-recovery contract).
    pub fn recover(&self) -> Result<Recovered, CheckpointError> {
        let mut state = Snapshot::load(&self.snapshot_path)?;
        for change in Wal::replay(&self.wal_path)? {
            super::apply::apply_change(&mut state, change);
        }
        let wal = Wal::open(&self.wal_path)?;
        Ok(Recovered { state, wal })
    }

    /// Writes a fresh snapshot of `state` and truncates `wal`, so the next
    /// recovery only has to replay records appended from here on.
    pub fn checkpoint(&self, state: &MaterializedState, wal: &mut Wal) -> Result<(), CheckpointError> {
        Snapshot::write(&self.snapshot_path, state)?;
        wal.truncate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;

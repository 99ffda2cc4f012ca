// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot: a full, zstd-compressed JSON dump of `MaterializedState`,
//! written atomically (write-to-temp, then rename) so a crash mid-write
//! cannot corrupt the previous good snapshot.

use crate::error::SnapshotError;
use crate::state::MaterializedState;
use std::fs;
use std::path::{Path, PathBuf};

const ZSTD_LEVEL: i32 = 3;

pub struct Snapshot;

impl Snapshot {
    /// Writes `state` to `path` atomically: encodes to a `path.tmp` sibling,
    /// then renames over `path` so readers never observe a partial file.
    pub fn write(path: impl AsRef<Path>, state: &MaterializedState) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let json = serde_json::to_vec(state)?;
        let compressed =
            zstd::stream::encode_all(&json[..], ZSTD_LEVEL).map_err(|e| SnapshotError::Zstd(e.to_string()))?;

        let tmp_path = tmp_sibling(path);
        fs::write(&tmp_path, &compressed)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Loads the snapshot at `path`, or an empty state if no snapshot has
    /// ever been written yet (fresh install).
    pub fn load(path: impl AsRef<Path>) -> Result<MaterializedState, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(MaterializedState::default());
        }
        let compressed = fs::read(path)?;
        let json = zstd::stream::decode_all(&compressed[..]).map_err(|e| SnapshotError::Zstd(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log: every applied `Change` is appended here before the
//! in-memory apply is considered committed (§4.4 Apply, step 5). Each
//! record is a zstd-compressed JSON-encoded `Change`, framed with a 4-byte
//! big-endian length prefix.

use crate::error::WalError;
use nf_core::Change;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

const ZSTD_LEVEL: i32 = 3;

pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Opens (creating if absent) the WAL file at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Appends one change, fsyncing before returning so a crash immediately
    /// after this call cannot lose the record.
    pub fn append(&mut self, change: &Change) -> Result<(), WalError> {
        let json = serde_json::to_vec(change)?;
        let compressed = zstd::stream::encode_all(&json[..], ZSTD_LEVEL)
            .map_err(|e| WalError::Zstd(e.to_string()))?;
        let len = u32::try_from(compressed.len())
            .map_err(|_| WalError::Corrupt("record exceeds 4GiB".into()))?;
        self.file.write_all(&len.to_be_bytes())?;
        self.file.write_all(&compressed)?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Replays every record currently in the WAL file, in append order.
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<Change>, WalError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = BufReader::new(File::open(path)?);
        let mut changes = Vec::new();
        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut compressed = vec![0u8; len];
            reader.read_exact(&mut compressed).map_err(|_| {
                WalError::Corrupt("truncated record, WAL tail likely cut off mid-write".into())
            })?;
            let json = zstd::stream::decode_all(&compressed[..])
                .map_err(|e| WalError::Zstd(e.to_string()))?;
            let change: Change = serde_json::from_slice(&json)?;
            changes.push(change);
        }
        Ok(changes)
    }

    /// Truncates the WAL to empty, used by the checkpointer right after a
    /// snapshot has durably captured everything the WAL held.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        use std::io::Seek;
        self.file.seek(std::io::SeekFrom::Start(0))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;

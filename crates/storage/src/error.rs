// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wal record corrupt: {0}")]
    Corrupt(String),

    #[error("failed to encode change: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("zstd error: {0}")]
    Zstd(String),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("zstd error: {0}")]
    Zstd(String),
}

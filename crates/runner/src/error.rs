// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn { command: String, #[source] source: std::io::Error },

    #[error("failed to signal pid {pid}: {source}")]
    Signal { pid: u32, #[source] source: std::io::Error },

    #[error("child process produced no pid (already reaped)")]
    NoPid,
}

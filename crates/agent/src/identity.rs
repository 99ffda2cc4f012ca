// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity capture (§4.1): computed once at startup and reported verbatim
//! in every heartbeat thereafter. Never recomputed at runtime.

use nf_core::AgentIdentity;
use sha2::{Digest, Sha256};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("could not locate running executable: {0}")]
    CurrentExe(#[source] std::io::Error),

    #[error("could not resolve symlinks for {path:?}: {source}")]
    Canonicalize { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error("could not read executable bytes at {path:?}: {source}")]
    Hash { path: std::path::PathBuf, #[source] source: std::io::Error },
}

const BUILD_GIT_HASH: &str = env!("BUILD_GIT_HASH");

/// Captures the running agent's 3-layer freshness fingerprint: the build's
/// version and commit are compile-time constants, the store path and binary
/// hash are read from the executable on disk exactly once.
pub fn capture() -> Result<AgentIdentity, IdentityError> {
    let exe = std::env::current_exe().map_err(IdentityError::CurrentExe)?;
    let store_path = std::fs::canonicalize(&exe)
        .map_err(|source| IdentityError::Canonicalize { path: exe.clone(), source })?;
    let binary_hash = hash_file(&store_path)?;

    Ok(AgentIdentity {
        version: env!("CARGO_PKG_VERSION").to_string(),
        source_commit: BUILD_GIT_HASH.to_string(),
        store_path: store_path.display().to_string(),
        binary_hash,
    })
}

fn hash_file(path: &std::path::Path) -> Result<String, IdentityError> {
    let mut file = std::fs::File::open(path)
        .map_err(|source| IdentityError::Hash { path: path.to_path_buf(), source })?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|source| IdentityError::Hash { path: path.to_path_buf(), source })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

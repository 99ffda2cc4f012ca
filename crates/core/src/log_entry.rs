// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LogEntry: append-only, bounded, keyed by host or by the system tab.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of in-memory `LogEntry` rows kept per log before older
/// entries are spilled to disk (§3 Entities: LogEntry).
pub const MAX_IN_MEMORY_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "debug",
        Info => "info",
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

/// An append-only log row, keyed either by host (host tabs) or "system"
/// (`host_id = None`, the System Log tab).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub ts_ms: u64,
    pub level: LogLevel,
    pub host_id: Option<String>,
    pub state: Option<String>,
    pub code: Option<String>,
    pub message: String,
    pub details: Option<Value>,
}

impl LogEntry {
    pub fn system(ts_ms: u64, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            ts_ms,
            level,
            host_id: None,
            state: None,
            code: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn for_host(
        ts_ms: u64,
        level: LogLevel,
        host_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ts_ms,
            level,
            host_id: Some(host_id.into()),
            state: None,
            code: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
#[path = "log_entry_tests.rs"]
mod tests;

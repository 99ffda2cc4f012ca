// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of machine-readable `code` strings from §7, as an enum so
//! validators and the HTTP layer never hand-format them ad hoc.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Validation
    HostOffline,
    CommandPending,
    AlreadyCurrent,
    GitOutdated,
    UnknownState,
    // Execution
    ExitNonzero,
    GoalNotAchieved,
    Partial,
    PartialGitOnly,
    PartialSystemOnly,
    // Lifecycle
    StaleBinary,
    SuspiciousCache,
    ReconnectTimeout,
    OrphanedSnapshot,
    StuckRunning,
    StuckQueued,
    KillFailed,
    AbortedByReboot,
    // Protocol
    AuthFailed,
    CsrfMissing,
    RateLimited,
    BadMessage,
    // Transport
    ConnectionLost,
    Superseded,
}

crate::simple_display! {
    ErrorCode {
        HostOffline => "host_offline",
        CommandPending => "command_pending",
        AlreadyCurrent => "already_current",
        GitOutdated => "git_outdated",
        UnknownState => "unknown_state",
        ExitNonzero => "exit_nonzero",
        GoalNotAchieved => "goal_not_achieved",
        Partial => "partial",
        PartialGitOnly => "partial_git_only",
        PartialSystemOnly => "partial_system_only",
        StaleBinary => "stale_binary",
        SuspiciousCache => "suspicious_cache",
        ReconnectTimeout => "reconnect_timeout",
        OrphanedSnapshot => "orphaned_snapshot",
        StuckRunning => "stuck_running",
        StuckQueued => "stuck_queued",
        KillFailed => "kill_failed",
        AbortedByReboot => "aborted_by_reboot",
        AuthFailed => "auth_failed",
        CsrfMissing => "csrf_missing",
        RateLimited => "rate_limited",
        BadMessage => "bad_message",
        ConnectionLost => "connection_lost",
        Superseded => "superseded",
    }
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostOffline => "host_offline",
            Self::CommandPending => "command_pending",
            Self::AlreadyCurrent => "already_current",
            Self::GitOutdated => "git_outdated",
            Self::UnknownState => "unknown_state",
            Self::ExitNonzero => "exit_nonzero",
            Self::GoalNotAchieved => "goal_not_achieved",
            Self::Partial => "partial",
            Self::PartialGitOnly => "partial_git_only",
            Self::PartialSystemOnly => "partial_system_only",
            Self::StaleBinary => "stale_binary",
            Self::SuspiciousCache => "suspicious_cache",
            Self::ReconnectTimeout => "reconnect_timeout",
            Self::OrphanedSnapshot => "orphaned_snapshot",
            Self::StuckRunning => "stuck_running",
            Self::StuckQueued => "stuck_queued",
            Self::KillFailed => "kill_failed",
            Self::AbortedByReboot => "aborted_by_reboot",
            Self::AuthFailed => "auth_failed",
            Self::CsrfMissing => "csrf_missing",
            Self::RateLimited => "rate_limited",
            Self::BadMessage => "bad_message",
            Self::ConnectionLost => "connection_lost",
            Self::Superseded => "superseded",
        }
    }
}

#[cfg(test)]
#[path = "error_code_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication boundaries: a shared bearer secret for the agent
//! channel, and session cookie + CSRF header for every POST route an
//! operator's browser hits.

use parking_lot::RwLock;
use rand::RngCore;
use std::collections::HashMap;

/// Name of the CSRF header every mutating HTTP request must carry,
/// matching the value stashed in the session at login.
pub const CSRF_HEADER: &str = "x-nf-csrf";
pub const SESSION_COOKIE: &str = "nf_session";

/// Constant-time string comparison, used for both the agent bearer token
/// and the CSRF header so a timing side channel can't shorten the guess.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Checks the agent channel's `?token=` query parameter against the
/// configured shared secret. No secret configured means development mode:
/// any connection is accepted.
pub fn agent_token_ok(expected: Option<&str>, presented: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => presented.is_some_and(|p| constant_time_eq(expected, p)),
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub csrf_token: String,
}

/// In-memory session store keyed by session id. There is no multi-node
/// deployment story for this control plane (§ Non-goals), so nothing more
/// durable than process memory is needed.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { sessions: RwLock::new(HashMap::new()) }
    }

    /// Creates a new session and returns its id alongside the CSRF token
    /// the client must echo back on every mutating request.
    pub fn create(&self) -> (String, String) {
        let session_id = random_token();
        let csrf_token = random_token();
        self.sessions.write().insert(session_id.clone(), Session { csrf_token: csrf_token.clone() });
        (session_id, csrf_token)
    }

    pub fn destroy(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    /// Validates a request's session cookie against its CSRF header.
    pub fn validate(&self, session_id: &str, csrf_header: &str) -> bool {
        self.sessions.read().get(session_id).is_some_and(|s| constant_time_eq(&s.csrf_token, csrf_header))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

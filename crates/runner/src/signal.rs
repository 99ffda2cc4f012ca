// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal delivery to a child pid without reaching for `unsafe` `libc::kill`.

use crate::error::RunnerError;
use crate::process::KillSignal;

#[cfg(unix)]
pub fn send_signal(pid: u32, signal: KillSignal) -> Result<(), RunnerError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let sig = match signal {
        KillSignal::Sigterm => Signal::SIGTERM,
        KillSignal::Sigkill => Signal::SIGKILL,
    };
    kill(Pid::from_raw(pid as i32), sig).map_err(|errno| RunnerError::Signal {
        pid,
        source: std::io::Error::from_raw_os_error(errno as i32),
    })
}

#[cfg(not(unix))]
pub fn send_signal(_pid: u32, _signal: KillSignal) -> Result<(), RunnerError> {
    Err(RunnerError::NoPid)
}

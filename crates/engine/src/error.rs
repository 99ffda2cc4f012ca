// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use nf_core::{HostId, OpId, OpState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpEngineError {
    #[error("host {0} is not known to the engine")]
    UnknownHost(HostId),

    #[error("op {0} is not known to the engine")]
    UnknownOp(OpId),

    #[error("op {op} is not in a state where {attempted} is legal (currently {current})")]
    InvalidTransition { op: OpId, current: OpState, attempted: &'static str },
}

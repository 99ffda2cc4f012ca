// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn wrap_detached_prefixes_with_setsid() {
    let cmd = wrap_detached("home-manager", &["switch".to_string()]);
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), "setsid");
    let args: Vec<_> = std_cmd.get_args().map(|a| a.to_str().unwrap()).collect();
    assert_eq!(args, vec!["home-manager", "switch"]);
}

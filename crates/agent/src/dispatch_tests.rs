use super::*;

#[test]
fn pull_shells_out_to_git_pull() {
    let (program, args) = command_for(OpKind::Pull, Platform::Nixos, &[]).unwrap();
    assert_eq!(program, "git");
    assert_eq!(args, vec!["pull".to_string()]);
}

#[test]
fn switch_on_nixos_uses_nixos_rebuild() {
    let (program, args) = command_for(OpKind::Switch, Platform::Nixos, &[]).unwrap();
    assert_eq!(program, "nixos-rebuild");
    assert_eq!(args, vec!["switch".to_string()]);
}

#[test]
fn switch_on_darwin_home_is_wrapped_in_a_new_session() {
    let (program, args) = command_for(OpKind::Switch, Platform::DarwinHome, &[]).unwrap();
    assert_eq!(program, "setsid");
    assert_eq!(args, vec!["home-manager".to_string(), "switch".to_string()]);
}

#[test]
fn extra_args_are_appended_after_the_subcommand() {
    let (_, args) =
        command_for(OpKind::RefreshLock, Platform::Nixos, &["--commit-lock-file".to_string()])
            .unwrap();
    assert_eq!(args, vec!["flake", "update", "--commit-lock-file"]);
}

#[test]
fn kill_and_reboot_are_not_dispatchable_subprocess_kinds() {
    assert!(command_for(OpKind::Kill, Platform::Nixos, &[]).is_none());
    assert!(command_for(OpKind::Reboot, Platform::Nixos, &[]).is_none());
}

#[test]
fn pull_switch_has_no_single_subprocess_mapping() {
    // pull-switch is driven as two sequential `run_one()` calls inside
    // `run()` via `pull_switch_steps`, not a single subprocess.
    assert!(command_for(OpKind::PullSwitch, Platform::Nixos, &[]).is_none());
}

#[test]
fn pull_switch_steps_run_git_pull_then_the_platform_switch() {
    let (pull, switch) = pull_switch_steps(Platform::Nixos, &[]);
    assert_eq!(pull, ("git".to_string(), vec!["pull".to_string()]));
    assert_eq!(switch, ("nixos-rebuild".to_string(), vec!["switch".to_string()]));
}

#[test]
fn pull_switch_steps_apply_args_to_the_switch_step_only() {
    let (pull, switch) = pull_switch_steps(Platform::DarwinSystem, &["--fast".to_string()]);
    assert_eq!(pull, ("git".to_string(), vec!["pull".to_string()]));
    assert_eq!(switch, ("darwin-rebuild".to_string(), vec!["switch".to_string(), "--fast".to_string()]));
}

#[test]
fn only_switch_kinds_self_restart_on_success() {
    assert!(completes_via_self_restart(OpKind::Switch));
    assert!(completes_via_self_restart(OpKind::PullSwitch));
    assert!(!completes_via_self_restart(OpKind::Pull));
    assert!(!completes_via_self_restart(OpKind::Test));
}

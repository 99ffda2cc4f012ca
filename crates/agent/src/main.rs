// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nf-agent` — per-host process that registers with the dashboard and runs
//! dispatched ops.

use clap::Parser;
use nf_agent::{env, identity, RuntimeConfig};
use nf_core::{HostId, Platform};

#[derive(Parser)]
#[command(name = "nf-agent", version, about = "NixFleet per-host agent")]
struct Cli {
    /// Platform this host runs, overriding auto-detection.
    #[arg(long, value_enum)]
    platform: Option<CliPlatform>,
}

#[derive(Copy, Clone, clap::ValueEnum)]
enum CliPlatform {
    Nixos,
    DarwinSystem,
    DarwinHome,
}

impl From<CliPlatform> for Platform {
    fn from(p: CliPlatform) -> Self {
        match p {
            CliPlatform::Nixos => Platform::Nixos,
            CliPlatform::DarwinSystem => Platform::DarwinSystem,
            CliPlatform::DarwinHome => Platform::DarwinHome,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_env("NF_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let host_id = HostId::parse(env::host_id()?)?;
    let hostname = hostname_or_fallback();
    let platform = cli.platform.map(Platform::from).unwrap_or_else(detect_platform);
    let identity = identity::capture()?;

    tracing::info!(
        host_id = %host_id,
        ?platform,
        version = %identity.version,
        commit = %identity.source_commit,
        "starting nf-agent"
    );

    let cfg = RuntimeConfig {
        dashboard_url: env::dashboard_url()?,
        host_id,
        hostname,
        platform,
        token: env::agent_token(),
        identity,
        heartbeat_interval: env::heartbeat_interval(),
        backoff_min: env::backoff_min(),
        backoff_max: env::backoff_max(),
    };

    nf_agent::run_forever(cfg).await;
    Ok(())
}

fn hostname_or_fallback() -> String {
    std::env::var("NF_HOSTNAME")
        .ok()
        .or_else(|| {
            std::process::Command::new("hostname")
                .output()
                .ok()
                .filter(|o| o.status.success())
                .and_then(|o| String::from_utf8(o.stdout).ok())
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[cfg(target_os = "linux")]
fn detect_platform() -> Platform {
    Platform::Nixos
}

#[cfg(target_os = "macos")]
fn detect_platform() -> Platform {
    // Darwin hosts default to the home-manager surface; a full system
    // (nix-darwin) host must opt in with `--platform darwin-system`.
    Platform::DarwinHome
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn detect_platform() -> Platform {
    Platform::Nixos
}

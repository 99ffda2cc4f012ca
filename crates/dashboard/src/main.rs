// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `nfd` — the dashboard control plane: one process holding the
//! authoritative `StateStore`, the two WebSocket gateways, and the HTTP
//! surface that drives them.

use axum::routing::get;
use axum::Router;
use clap::Parser;
use nf_dashboard::gateway::{agent, browser, AppState};
use nf_dashboard::{env, http, prsource, store::StateStore, watchdog};
use nf_core::clock::{Clock, SystemClock};
use std::sync::Arc;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Parser)]
#[command(name = "nfd", version, about = "NixFleet dashboard control plane")]
struct Cli {
    /// Override the resolved state directory.
    #[arg(long)]
    state_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let state_dir = match cli.state_dir {
        Some(dir) => dir,
        None => env::state_dir()?,
    };
    std::fs::create_dir_all(&state_dir)?;

    let file_appender = tracing_appender::rolling::daily(&state_dir, "nfd.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_env("NF_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(file_writer.and(std::io::stderr))
        .init();

    tracing::info!(?state_dir, "starting nfd");

    let store = Arc::new(StateStore::open(&state_dir)?);
    let app = AppState {
        store: store.clone(),
        sessions: Arc::new(nf_dashboard::auth::SessionStore::new()),
        agents: Arc::new(agent::AgentRegistry::new()),
        expected_agent_token: env::expected_agent_token(),
    };

    spawn_watchdog(store.clone(), app.agents.clone());
    spawn_pr_poller(store.clone());
    spawn_checkpoint_loop(store.clone());

    let router = Router::new()
        .route("/ws/agent", get(agent::upgrade))
        .route("/ws/browser", get(browser::upgrade))
        .merge(http::router())
        .with_state(app);

    let addr = env::bind_addr()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

/// One-second tick over active ops plus the 30s self-healing sweep (§4.2,
/// §4.6), both driven off the same background task.
fn spawn_watchdog(store: Arc<StateStore>, agents: Arc<agent::AgentRegistry>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(watchdog::TICK_INTERVAL);
        let mut sweep = tokio::time::interval(watchdog::SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = tick.tick() => watchdog::tick_once(&store, &agents, SystemClock.epoch_ms()),
                _ = sweep.tick() => watchdog::sweep_once(&store, SystemClock.epoch_ms()),
            }
        }
    });
}

fn spawn_pr_poller(store: Arc<StateStore>) {
    let interval = env::pr_source_poll_interval();
    let record_store = store;
    prsource::spawn(
        Box::new(prsource::NullPrSource),
        interval,
        move |pr, now_ms| {
            let entry = nf_core::LogEntry::system(now_ms, nf_core::LogLevel::Info, format!("pending PR detected: {}", pr.url));
            if let Err(err) = record_store.append_system_log(entry, now_ms) {
                tracing::warn!(%err, "failed to record pending PR");
            }
        },
        || SystemClock.epoch_ms(),
    );
}

/// Periodic checkpoint so the WAL doesn't grow without bound between
/// process restarts.
fn spawn_checkpoint_loop(store: Arc<StateStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            if let Err(err) = store.checkpoint() {
                tracing::warn!(%err, "checkpoint failed");
            }
        }
    });
}

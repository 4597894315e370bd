// ABOUTME: Main entry point for the devbox-monitor service
// Wires config, Docker source, triggers, and the WebSocket endpoint together

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

use devbox_monitor::config::MonitorConfig;
use devbox_monitor::docker::DockerContainerSource;
use devbox_monitor::server::{self, StatusMonitor};
use devbox_monitor::status::StatusAggregator;
use devbox_monitor::watch::{self, ReportWatcher};

#[derive(Parser, Debug)]
#[command(name = "devbox-monitor", version, about = "Real-time status broadcaster for containerized development environments")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on for observer connections
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Compose project whose containers are monitored
    #[arg(long)]
    project_label: Option<String>,

    /// Directory tree watched for report changes
    #[arg(long)]
    watch_root: Option<PathBuf>,

    /// Seconds between timer-driven refreshes
    #[arg(long)]
    poll_interval: Option<u64>,
}

// All service state lives on the single monitor task; a current-thread
// runtime is enough, and the watcher thread only ever crosses in via the
// event channel.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let mut config = MonitorConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(label) = cli.project_label {
        config.project_label = label;
    }
    if let Some(root) = cli.watch_root {
        config.watch_root = root;
    }
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }

    info!(
        "Starting devbox-monitor for project {} on {}",
        config.project_label, config.bind_addr
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let source = DockerContainerSource::connect().await;
    let aggregator = StatusAggregator::new(&config, source);
    let monitor_handle = tokio::spawn(StatusMonitor::new(aggregator, events_rx).run());

    // Report watching is best-effort; without it the poll trigger still
    // keeps observers fresh
    let report_watcher = match ReportWatcher::spawn(&config.watch_root, events_tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            error!("Failed to watch {}: {}", config.watch_root.display(), e);
            None
        }
    };

    let poll_handle = watch::spawn_poll_trigger(config.poll_interval(), events_tx.clone());

    let listener = TcpListener::bind(config.bind_addr).await?;

    tokio::select! {
        result = server::serve(listener, events_tx, config.observer_buffer) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    // Release the watcher's OS resources and stop the background tasks
    // before the runtime goes away
    drop(report_watcher);
    poll_handle.abort();
    monitor_handle.abort();

    info!("devbox-monitor stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devbox_monitor=info".into()),
        )
        .init();
}

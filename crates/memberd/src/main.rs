//! # Memberd - gossip membership daemon
//!
//! Tracks cluster membership by exchanging heartbeat snapshots with a
//! random subset of peers every gossip interval and locally declaring
//! peers failed, then removed, when their heartbeats stop.
//!
//! ## Architecture
//! ```text
//! Node A ⇄ UDP heartbeats ⇄ Node B
//!    ↓                         ↓
//! MembershipView           MembershipView
//! (sender / receiver / failure detector)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use memberd::cluster::NodeManager;
use memberd::config::NodeConfig;
use memberd_common::constants::DEFAULT_LISTEN_ADDR;

/// Memberd - decentralized gossip membership daemon
#[derive(Parser, Debug)]
#[command(name = "memberd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// UDP address to listen on for heartbeats
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR, env = "MEMBERD_LISTEN")]
    listen: SocketAddr,

    /// Existing peer to bootstrap from (omit to start a new cluster)
    #[arg(short, long, env = "MEMBERD_PEER")]
    peer: Option<SocketAddr>,

    /// Configuration file path
    #[arg(short, long, default_value = "config/memberd.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("🫀 Starting Memberd v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = NodeConfig::load(&args.config)?;
    info!("📋 Configuration loaded from {}", args.config);

    // Construct the node; invalid configuration aborts here
    let manager = NodeManager::new(args.listen, args.peer, config)
        .await
        .context("Failed to create membership node")?;

    // Log every membership transition
    manager.on_member_joined(|peer| info!(peer = %peer, "➕ Member joined"));
    manager.on_member_failed(|peer| info!(peer = %peer, "💔 Member failed"));
    manager.on_member_revived(|peer| info!(peer = %peer, "💚 Member revived"));
    manager.on_member_removed(|peer| info!(peer = %peer, "➖ Member removed"));

    manager.start();
    info!("🚀 Memberd listening on {}", manager.self_addr());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl+C handler")?;
    info!("🛑 Shutdown signal received");

    manager.stop().await;

    info!("👋 Memberd shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}

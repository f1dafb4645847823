//! Download proxy.
//!
//! Forwards `METHOD /<host>/<path>?<query>` to `https://<host>/<path>?<query>`
//! and returns the upstream response as an attachment download.
//!
//! ```text
//!     Client                        download-proxy                       Upstream
//!  ───────────────┐   ┌───────────────────────────────────────────┐   ┌──────────
//!  GET /a.com/f ──┼──▶│ path decode → header filter → https fetch │──▶│ a.com/f
//!                 │   │                                           │   │
//!  attachment  ◀──┼───│ download headers ← (rewrite) ← response   │◀──│
//!  ───────────────┘   └───────────────────────────────────────────┘   └──────────
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use download_proxy::config::watcher::ConfigWatcher;
use download_proxy::config::{load_config, ProxyConfig};
use download_proxy::lifecycle::{signals, Shutdown};
use download_proxy::observability::logging;
use download_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "download-proxy")]
#[command(about = "Forward /<host>/<path> to https://<host>/<path> as a download", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload forwarding settings when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    tracing::info!("download-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rewrite_enabled = config.rewrite.enabled,
        "Configuration loaded"
    );

    // Keeps the watch alive for the lifetime of the server.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

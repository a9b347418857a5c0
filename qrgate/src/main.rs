//! qrgate - Main entry point
//!
//! Serves the QR scanner and the admin-only QR generator over HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qrgate::config::{self, Config};
use qrgate::web::{app_router, AppState};

/// qrgate - Scan QR codes publicly, generate them as admin
#[derive(Parser)]
#[command(name = "qrgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Generate a default configuration file
    InitConfig {
        /// Output path (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };
    init_logging(filter);

    match cli.command {
        Commands::Serve { listen } => serve(&cli.config, listen).await,
        Commands::InitConfig { output } => generate_config(output),
    }
}

/// Initialize logging (stdout only; the server writes nothing to disk).
fn init_logging(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Run the web server until Ctrl+C
async fn serve(config_path: &Path, listen_override: Option<SocketAddr>) -> Result<()> {
    let config = Config::load(config_path)?;
    let listen_addr = match listen_override {
        Some(addr) => addr,
        None => config.listen_addr()?,
    };

    let state = Arc::new(AppState::new(&config));

    // Spawn expired session cleanup task
    let cleanup_state = state.clone();
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        loop {
            ticker.tick().await;
            let removed = cleanup_state.sessions.cleanup_expired().await;
            if removed > 0 {
                debug!(
                    "Removed {} expired sessions ({} active)",
                    removed,
                    cleanup_state.sessions.count().await
                );
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    info!("qrgate starting...");
    info!("Listening on: http://{}", listen_addr);

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Generate a default configuration file
fn generate_config(output: Option<PathBuf>) -> Result<()> {
    let config = config::default_config_template();

    match output {
        Some(path) => {
            std::fs::write(&path, &config)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Configuration written to: {}", path.display());
        }
        None => {
            print!("{}", config);
        }
    }

    Ok(())
}

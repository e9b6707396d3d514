//! cuelight server.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cuelight::config::Config;
use cuelight::create_app_with_config;
use cuelight::state::AppState;
use cuelight::transmitter::{ArtNetTransmitter, NullTransmitter, Transmitter};

/// cuelight - lighting console cue engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CUELIGHT_PORT")]
    port: Option<u16>,

    /// Send Art-Net to this address (enables output)
    #[arg(long, env = "CUELIGHT_ARTNET_TARGET")]
    artnet_target: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(args.port, args.artnet_target)
        .context("Failed to load configuration")?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(&config)?;
    info!("Configuration loaded");

    let transmitter: Box<dyn Transmitter> = if config.transmitter.enabled {
        match ArtNetTransmitter::new(&config.transmitter) {
            Ok(transmitter) => Box::new(transmitter),
            Err(e) => {
                warn!("Art-Net output disabled: {}", e);
                Box::new(NullTransmitter)
            }
        }
    } else {
        info!("Art-Net output disabled");
        Box::new(NullTransmitter)
    };

    let (state, engine) = AppState::spawn(&config, transmitter);
    let app = create_app_with_config(state, config.cors_allowed_origins.clone()).await;

    // Bind to 0.0.0.0 to be accessible from all interfaces
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // The router held the engine handles; give the task a moment to wind down
    match tokio::time::timeout(Duration::from_secs(2), engine).await {
        Ok(Err(e)) => warn!("Engine task ended abnormally: {}", e),
        Err(_) => warn!("Engine task still running at shutdown"),
        Ok(Ok(())) => {}
    }
    info!("Server shut down");
    Ok(())
}

/// Initialize logging to stdout and, if configured, a daily rolling file.
///
/// The level comes from the config, then RUST_LOG, then defaults to info.
fn init_logging(
    config: &Config,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stdout_layer = fmt::layer().with_target(false).compact();

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .context("log_file must name a file")?;
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

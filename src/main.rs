//! # OBD2 Gateway
//!
//! HTTP service collecting OBD-II/GPS dongle telemetry per vehicle.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument or `OBD2_GATEWAY_CONFIG`, defaults otherwise)
//!    - Set up logging with tracing subscriber
//!    - Bind the HTTP listener
//!
//! 2. **Serving**
//!    - Dongles call `/push?VIN=` once after startup and `/post?id=` per payload
//!    - Operators read the report on `/`
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C stops accepting requests
//!    - All collected data is dropped with the process
//!
//! # Examples
//!
//! ```bash
//! cargo run --release -- config/gateway.toml
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use obd2_gateway::config::{Config, LoggingConfig};
use obd2_gateway::gateway::Gateway;
use obd2_gateway::http::{self, HttpState};

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "OBD2_GATEWAY_CONFIG";

fn load_config() -> Result<Config> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());

    match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path)),
        None => Ok(Config::default()),
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// file writer and must live until shutdown.
fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    if config.directory.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    let _log_guard = init_tracing(&config.logging)?;

    info!("OBD2 Gateway v{} starting...", env!("CARGO_PKG_VERSION"));

    let bind = config.bind_addr()?;
    let state = HttpState {
        gateway: Arc::new(Gateway::new()),
    };
    let app = http::router(state, config.server.max_payload_bytes);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    info!(bind = %bind, "HTTP listening");
    info!("Press Ctrl+C to exit");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down...");
        })
        .await?;

    Ok(())
}

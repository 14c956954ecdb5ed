//! quasar - a single-connection IRC bot.
//!
//! Connects to one server, registers, and logs every line it receives until
//! the connection fails or the process is interrupted.

mod config;

use crate::config::Config;
use quasar_irc::{Connection, TracingSink};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting quasar");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.irc.server,
        nick = %config.irc.nick,
        "Connecting"
    );

    let connection = Connection::connect(config.irc.to_connection_config(), TracingSink)
        .await
        .map_err(|e| {
            error!(server = %config.irc.server, error = %e, "Failed to connect");
            e
        })?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let quit_message = Some(config.irc.quit_message.as_str()).filter(|m| !m.is_empty());
    match connection.run_until(shutdown, quit_message).await {
        Some(e) => Err(e.into()),
        None => {
            info!("Shut down cleanly");
            Ok(())
        }
    }
}

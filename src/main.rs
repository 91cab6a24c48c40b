//! slirc-logd - Straylight IRC Log Daemon
//!
//! Usage: `slirc-logd [config.toml]`

use std::sync::Arc;

use slirc_logd::clock::SystemClock;
use slirc_logd::config::{Config, validate};
use slirc_logd::network::IrcConnector;
use slirc_logd::source::{ChannelSource, SqliteChannelSource, StaticChannelSource};
use slirc_logd::telemetry::init_tracing;
use slirc_logd::{Agent, AgentSettings};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("Failed to load config {}: {}", config_path, e);
        e
    })?;

    init_tracing(config.logging.format);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(path = %config_path, "Invalid configuration: {}", e);
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        tls = config.server.tls,
        nickname = %config.server.nickname,
        logs = %config.logs.directory,
        "Starting slirc-logd"
    );

    let source: Arc<dyn ChannelSource> = match &config.channels.database {
        Some(path) => match SqliteChannelSource::connect(path).await {
            Ok(source) => Arc::new(source),
            Err(e) => {
                error!(path = %path, error = %e, "Channel database unavailable, retrying on next reconciliation");
                Arc::new(SqliteChannelSource::open(path))
            }
        },
        None => Arc::new(StaticChannelSource::new(&config.channels.list)),
    };

    let agent = Agent::new(
        AgentSettings::from_config(&config),
        Arc::new(IrcConnector::new(config.server.clone())),
        source,
        Arc::new(SystemClock),
    );

    agent
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

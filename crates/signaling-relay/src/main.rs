//! Signaling relay - Entry point.

use anyhow::{Context, Result};
use signaling_medium::{MediumOptions, ParticipantId, SignalingMedium};
use signaling_relay::{
    api::{create_router_with_rate_limit, with_cors, AppState, RateLimitState},
    config::Config,
    store::open_repository,
};
use std::net::SocketAddr;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_logging(&config.log.level);

    info!("Starting signaling relay");

    let repository = open_repository(&config.store);
    let options = MediumOptions {
        event_capacity: config.events.channel_capacity,
        operator: config.relay.operator_id.clone().map(ParticipantId::new),
    };
    let medium = SignalingMedium::open(repository, options)
        .await
        .context("Failed to open ledger")?;

    info!(
        participants = medium.participant_count().await,
        "Ledger ready"
    );

    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let mut app = create_router_with_rate_limit(AppState::new(medium), rate_limit);
    if config.server.allow_cors {
        app = with_cors(app);
    }

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?,
        config.server.port,
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Signaling relay stopped");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

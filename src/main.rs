use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use web_complexity_analyzer::{build_router, config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting Web Complexity Analyzer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded");
    info!("  Port: {}", config.api_port);
    info!("  Proxy base URL: {}", config.proxy_base_url);
    info!("  Cache TTL: {:?}", config.cache_ttl());
    info!("  Scoring profile: {}", config.scoring_profile);

    info!("Initializing services...");
    let state = AppState::from_config(config.clone())?;
    let _sweeper = state.analyzer.cache().spawn_cleanup(config.cache_ttl());
    info!("Cache cleanup scheduled every {:?}", config.cache_ttl());

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tokio::spawn(async move {
        if !state.warm_up(Duration::from_secs(1), 30).await {
            warn!("Proxy and validate routes stay unavailable");
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating shutdown...");
        },
    }
}

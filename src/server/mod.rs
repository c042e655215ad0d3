pub mod handlers;
pub mod state;

use crate::catalog::spawn_refresh_loop;
use crate::config::Config;
use axum::{Router, routing::get};
use state::AppState;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Build the router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::service_descriptor))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/videos", get(handlers::videos::missing_sku))
        .route("/videos/", get(handlers::videos::missing_sku))
        .route("/videos/{sku}", get(handlers::videos::videos_by_sku))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the background refresher and serve HTTP until Ctrl-C
pub async fn start(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let refresh_interval = config.refresh_interval;
    let refresh_on_start = config.refresh_on_start;

    let state = AppState::new(config)?;

    let cancel = CancellationToken::new();
    let refresher = spawn_refresh_loop(
        state.catalog.clone(),
        refresh_interval,
        refresh_on_start,
        cancel.clone(),
    );

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            cancel.cancel();
            return Err(e.into());
        }
    };

    info!("🚀 Server listening on http://{}", addr);
    info!("📡 Videos available at http://{}/videos/{{sku}}", addr);

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await;

    cancel.cancel();
    if let Err(e) = refresher.await {
        error!("Background refresher ended abnormally: {}", e);
    }

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

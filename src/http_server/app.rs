use std::sync::Arc;

use axum::{Router, routing::get};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    http_server::{http_routes::spotify_auth, state::AppState},
    services::{auth::Authenticator, background::SyncScheduleConfig},
};

pub struct HttpServerConfig {
    pub port: u16,
    pub authenticator: Arc<Authenticator>,
    pub schedule: SyncScheduleConfig,
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", get(spotify_auth::login))
        .route("/callback", get(spotify_auth::callback))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

pub async fn start(config: HttpServerConfig) -> color_eyre::Result<()> {
    let app_state = Arc::new(AppState::new(config.authenticator, config.schedule));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", config.port))?;
    tracing::info!(
        "Listening on port {}, visit /login to authorize with Spotify",
        config.port
    );
    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}

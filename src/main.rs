//! Sigl 공유 그림 서버

mod canvas;
mod config;
mod cosmetic;
mod error;
mod handlers;
mod ids;
mod protocol;
mod registry;
mod state;
mod sweeper;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    response::Json,
    routing::{get, post},
    Router,
};
use config::Config;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tokio::fs::create_dir_all(&config.canvas.image_dir)
        .await
        .with_context(|| {
            format!(
                "could not create image directory {}",
                config.canvas.image_dir.display()
            )
        })?;

    match canvas::remove_stale_temp_files(&config.canvas.image_dir).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed = removed, "Removed stale canvas temp files"),
        Err(e) => tracing::warn!(error = %e, "Could not clean canvas temp files"),
    }

    let state = Arc::new(AppState::new(config.clone()));

    // 만료 방 정리 스케줄러
    tokio::spawn(sweeper::run(
        state.registry.clone(),
        config.room.sweep_interval,
    ));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {}", addr))?;

    tracing::info!("Sigl server started");
    tracing::info!("Address: {}", addr);
    tracing::info!("Images: {}", config.canvas.image_dir.display());

    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// 라우터 설정
fn app(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    // CORS 설정
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let cors = if config.allows_any_origin() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/create_room", post(handlers::create_room))
        .route("/api/get_config", post(handlers::get_config))
        .route("/api/send_strokes", post(handlers::send_strokes))
        .route("/api/get_done", post(handlers::get_done))
        .nest_service("/sigils", ServeDir::new(state.registry.image_dir()))
        .nest_service("/s", ServeFile::new(config.site_dir.join("sigl.html")))
        .fallback_service(ServeDir::new(&config.site_dir))
        .layer(DefaultBodyLimit::max(config.canvas.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "server": "sigl-server",
        "rooms": state.registry.len().await,
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }))
}

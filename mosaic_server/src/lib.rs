use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use photomosaic::ColorSample;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8765".to_string(),
            tile_width: 16,
            tile_height: 16,
        }
    }
}

/// The SVG tile for one color: an ellipse filling the tile.
pub fn tile_markup(color: &ColorSample, width: u32, height: u32) -> String {
    let (rx, ry) = (width as f32 / 2.0, height as f32 / 2.0);
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\">\
         <ellipse cx=\"{rx}\" cy=\"{ry}\" rx=\"{rx}\" ry=\"{ry}\" fill=\"#{color}\"></ellipse></svg>"
    )
}

async fn color_tile(State(cfg): State<ServerConfig>, Path(color): Path<String>) -> impl IntoResponse {
    match color.parse::<ColorSample>() {
        Ok(color) => {
            debug!(color = %color, "Serving tile");
            let markup = tile_markup(&color, cfg.tile_width, cfg.tile_height);
            (StatusCode::OK, [(header::CONTENT_TYPE, "image/svg+xml")], markup)
        }
        Err(e) => (StatusCode::BAD_REQUEST, [(header::CONTENT_TYPE, "text/plain")], e.to_string()),
    }
}

pub fn router(cfg: ServerConfig) -> Router {
    Router::new()
        .route("/color/:color", get(color_tile))
        .route("/healthz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(cfg)
}

/// Binds the listener and serves in the background. Returns the bound address,
/// which differs from `bind_addr` when it asks for port 0.
pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(
        "Tile server listening on http://{} (tile={}x{})",
        local_addr, cfg.tile_width, cfg.tile_height
    );

    let app = router(cfg);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Tile server stopped");
        }
    });

    Ok((local_addr, server))
}

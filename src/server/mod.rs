use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::resolver::Resolver;

pub mod format;
pub mod mcp;
pub mod routes;

/// Server state
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/verse", get(routes::handle_verse))
        .route("/match", get(routes::handle_match))
        .route("/search", get(routes::handle_search))
        .route("/chapter/{n}", get(routes::handle_chapter))
        .route("/stats", get(routes::handle_stats))
        .route("/seed", post(routes::handle_seed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, resolver: Arc<Resolver>) -> anyhow::Result<()> {
    let app = router(Arc::new(AppState { resolver }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    eprintln!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use newsfeed_migrate::Migrator;
use newsfeed_store::FeedReader;

pub mod rest;

pub struct AppState {
    pub reader: FeedReader,
    pub migrator: Arc<Migrator>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Reconciliation triggers
        .route("/migrator/users", post(rest::migrate_users))
        .route("/migrator/users/{user}", post(rest::migrate_user))
        .route("/migrator/publications", post(rest::migrate_publications))
        // Feed
        .route("/{user}", get(rest::get_news))
        .with_state(state)
        // Logging layer: method + path + status + latency
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

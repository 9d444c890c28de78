mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::vault::Vault;

pub fn create_router(vault: Vault) -> Router {
    let api = Router::new()
        // Projects
        .route("/projects/init", post(handlers::init_project))
        .route("/parts", get(handlers::list_parts))
        // Versions
        .route("/parts/{file}/versions", post(handlers::create_version))
        .route("/parts/{file}/versions", get(handlers::version_history))
        .route("/parts/{file}/versions/latest", get(handlers::latest_version))
        // Lifecycle transitions
        .route("/parts/{file}/freeze", post(handlers::freeze_version))
        .route("/parts/{file}/release", post(handlers::release_version))
        .route("/parts/{file}/rework", post(handlers::rework_version))
        // State
        .route("/parts/{file}/state", get(handlers::part_state))
        .route("/parts/{file}/summary", get(handlers::part_summary))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(vault)
}

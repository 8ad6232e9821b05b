use axum::{routing::get, Router};

use crate::handlers;
use crate::shared::state::AppState;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // META
        // ========================================
        .route("/api/meta/models", get(handlers::meta::list_models))
        .route(
            "/api/meta/:model/relations",
            get(handlers::meta::relations),
        )
        // ========================================
        // GENERIC CRUD
        // ========================================
        .route(
            "/api/:model",
            get(handlers::crud::list).post(handlers::crud::create),
        )
        .route(
            "/api/:model/:id",
            get(handlers::crud::get_by_id)
                .patch(handlers::crud::update)
                .delete(handlers::crud::delete),
        )
        .with_state(state)
}

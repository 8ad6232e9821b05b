pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::shared::config::{get_database_path, load_config};
use crate::shared::data::db::initialize_database;
use crate::shared::relations::EntityRegistry;
use crate::shared::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = load_config()?;
    tracing::info!(
        "Populate limits: default {}, specific {}, all {}",
        config.populate.default_depth,
        config.populate.max_specific_depth,
        config.populate.max_all_relations_depth
    );

    let registry = Arc::new(EntityRegistry::from_catalog());
    tracing::info!("Registry: {} entities", registry.entities().count());

    let db_path = get_database_path(&config)?;
    tracing::info!("Database: {}", db_path.display());
    let db = initialize_database(&db_path, &registry).await?;

    let state = AppState::new(&config, registry, db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::shared::config::{Config, QueryConfig};
use crate::shared::query::{PopulateResolver, QueryConditionBuilder};
use crate::shared::relations::EntityRegistry;

/// Shared handler state; cloned per request
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EntityRegistry>,
    pub resolver: PopulateResolver,
    pub builder: QueryConditionBuilder,
    pub query: QueryConfig,
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn new(config: &Config, registry: Arc<EntityRegistry>, db: DatabaseConnection) -> Self {
        Self {
            resolver: PopulateResolver::new(registry.clone(), config.populate),
            builder: QueryConditionBuilder::new(registry.clone()),
            query: config.query,
            registry,
            db,
        }
    }
}

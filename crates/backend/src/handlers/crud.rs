use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::shared::api::{ApiResponse, Pagination};
use sea_orm::JsonValue;

use super::error::AppError;
use crate::shared::data::populate_loader::load_relations;
use crate::shared::data::repository::{self, UpdateOutcome};
use crate::shared::query::{DetailParams, ListParams};
use crate::shared::relations::EntityDef;
use crate::shared::state::AppState;

type Envelope<T> = Json<ApiResponse<T>>;

fn resolve<'a>(state: &'a AppState, model: &str) -> Result<&'a EntityDef, AppError> {
    state
        .registry
        .entity(model)
        .ok_or_else(|| AppError::UnknownModel(model.to_string()))
}

fn object_body(body: &JsonValue) -> Result<&serde_json::Map<String, JsonValue>, AppError> {
    body.as_object().ok_or(AppError::InvalidBody)
}

/// GET /api/:model
pub async fn list(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Envelope<Vec<JsonValue>>, AppError> {
    let entity = resolve(&state, &model)?;
    let params = ListParams::from_query(&query, &state.query, state.resolver.limits().default_depth);

    let built = state.builder.build(
        &entity.name,
        &params.filters,
        params.sort.as_deref(),
        params.order.as_deref(),
    );
    let (mut rows, total) =
        repository::list(&state.db, entity, &built, params.limit, params.offset()).await?;

    let spec = state
        .resolver
        .build_inclusion(&entity.name, &params.populate, params.depth);
    load_relations(&state.db, &state.registry, entity, &mut rows, &spec).await?;

    Ok(Json(
        ApiResponse::ok(rows).with_pagination(Pagination::new(params.page, params.limit, total)),
    ))
}

/// GET /api/:model/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Envelope<JsonValue>, AppError> {
    let entity = resolve(&state, &model)?;
    let params = DetailParams::from_query(&query, state.resolver.limits().default_depth);

    let mut row = repository::find_by_id(&state.db, entity, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.name.clone()))?;

    let spec = state
        .resolver
        .build_inclusion(&entity.name, &params.populate, params.depth);
    load_relations(
        &state.db,
        &state.registry,
        entity,
        std::slice::from_mut(&mut row),
        &spec,
    )
    .await?;

    Ok(Json(ApiResponse::ok(row)))
}

/// POST /api/:model
pub async fn create(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(body): Json<JsonValue>,
) -> Result<(StatusCode, Envelope<JsonValue>), AppError> {
    let entity = resolve(&state, &model)?;
    let values = repository::writable_values(entity, object_body(&body)?)?;
    let row = repository::insert(&state.db, entity, values).await?;
    tracing::info!("Created {} {}", entity.name, row["id"]);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(row).with_message(format!("{} created successfully", entity.name))),
    ))
}

/// PATCH /api/:model/:id
pub async fn update(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Envelope<JsonValue>, AppError> {
    let entity = resolve(&state, &model)?;
    let values = repository::writable_values(entity, object_body(&body)?)?;

    match repository::update(&state.db, entity, &id, values).await? {
        UpdateOutcome::NoFields => Err(AppError::NoFields),
        UpdateOutcome::NotFound => Err(AppError::NotFound(entity.name.clone())),
        UpdateOutcome::Updated => {
            let row = repository::find_by_id(&state.db, entity, &id)
                .await?
                .ok_or_else(|| AppError::NotFound(entity.name.clone()))?;
            Ok(Json(
                ApiResponse::ok(row).with_message(format!("{} updated successfully", entity.name)),
            ))
        }
    }
}

/// DELETE /api/:model/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
) -> Result<Envelope<JsonValue>, AppError> {
    let entity = resolve(&state, &model)?;
    if !repository::delete(&state.db, entity, &id).await? {
        return Err(AppError::NotFound(entity.name.clone()));
    }
    tracing::info!("Deleted {} {}", entity.name, id);
    Ok(Json(
        ApiResponse::ok(serde_json::json!({ "id": id }))
            .with_message(format!("{} deleted successfully", entity.name)),
    ))
}

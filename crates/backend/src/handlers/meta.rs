use axum::extract::{Path, State};
use axum::Json;
use contracts::shared::api::ApiResponse;
use contracts::shared::meta::{ModelInfo, ModelRelations, RelationInfo};

use super::error::AppError;
use crate::shared::relations::{EntityDef, RelationLink};
use crate::shared::state::AppState;

fn model_info(entity: &EntityDef) -> ModelInfo {
    ModelInfo {
        name: entity.name.clone(),
        route: entity.route.clone(),
        fields: entity.fields.iter().map(|f| f.name.clone()).collect(),
        relations: entity.relations.iter().map(|r| r.name.clone()).collect(),
    }
}

/// GET /api/meta/models
pub async fn list_models(State(state): State<AppState>) -> Json<ApiResponse<Vec<ModelInfo>>> {
    Json(ApiResponse::ok(state.registry.entities().map(model_info).collect()))
}

/// GET /api/meta/:model/relations
pub async fn relations(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Json<ApiResponse<ModelRelations>>, AppError> {
    let entity = state
        .registry
        .entity(&model)
        .ok_or_else(|| AppError::UnknownModel(model.clone()))?;

    let relations = entity
        .relations
        .iter()
        .map(|r| {
            let (kind, key) = match &r.link {
                RelationLink::BelongsTo { local } => ("belongsTo", local),
                RelationLink::HasMany { foreign } => ("hasMany", foreign),
            };
            RelationInfo {
                name: r.name.clone(),
                target: r.target.clone(),
                kind: kind.to_string(),
                key: key.clone(),
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(ModelRelations {
        model: entity.name.clone(),
        relations,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::relations::EntityRegistry;

    #[test]
    fn test_model_info_lists_fields_and_relations() {
        let registry = EntityRegistry::from_catalog();
        let info = model_info(registry.entity("orders").unwrap());
        assert_eq!(info.name, "order");
        assert_eq!(info.route, "orders");
        assert!(info.fields.contains(&"orderDate".to_string()));
        assert!(info.fields.contains(&"billingAddressId".to_string()));
        assert_eq!(
            info.relations,
            vec![
                "customer",
                "warehouse",
                "billingAddress",
                "shippingAddress",
                "approver",
                "creator",
                "items",
                "shipments",
            ]
        );
    }
}

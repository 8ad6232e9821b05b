use serde::{Deserialize, Serialize};

/// Entry of `GET /api/meta/models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub route: String,
    pub fields: Vec<String>,
    pub relations: Vec<String>,
}

/// Body of `GET /api/meta/:model/relations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRelations {
    pub model: String,
    pub relations: Vec<RelationInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    pub name: String,
    pub target: String,
    /// `"belongsTo"` or `"hasMany"`
    pub kind: String,
    /// Local key for belongsTo, foreign key on the target for hasMany
    pub key: String,
}

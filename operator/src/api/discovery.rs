use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::util::AppError;

use super::{AppState, CRD_GROUP};

pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let mut groups: Vec<String> = state.store.list_crds().await?.into_iter().map(|c| c.group).collect();
    groups.push(CRD_GROUP.to_string());
    groups.sort();
    groups.dedup();
    Ok(Json(json!({ "groups": groups })))
}

pub async fn list_versions(State(state): State<AppState>, Path(group): Path<String>) -> Result<Json<Value>, AppError> {
    if group == CRD_GROUP {
        return Ok(Json(json!({ "group": group, "versions": ["v1"] })));
    }
    let versions: Vec<String> = state
        .store
        .list_crds()
        .await?
        .into_iter()
        .filter(|c| c.group == group)
        .map(|c| c.version)
        .collect();
    Ok(Json(json!({ "group": group, "versions": versions })))
}

pub async fn list_resources_for_version(
    State(state): State<AppState>,
    Path((group, version)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    if group == CRD_GROUP {
        return Ok(Json(json!({
            "resources": [{ "plural": "customresourcedefinitions", "kind": "CustomResourceDefinition" }]
        })));
    }
    let resources: Vec<Value> = state
        .store
        .list_crds()
        .await?
        .into_iter()
        .filter(|c| c.group == group && c.version == version)
        .map(|c| json!({ "plural": c.plural, "kind": c.kind, "scope": c.scope }))
        .collect();
    Ok(Json(json!({ "resources": resources })))
}

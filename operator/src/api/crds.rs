use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ferrite_types::{Crd, CrdScope, Error};
use serde::Deserialize;
use serde_json::Value;

use crate::util::AppError;

use super::envelope::crd_envelope;
use super::{AppState, CRD_GROUP};

#[derive(Deserialize)]
pub struct CrdRequest {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    #[serde(default)]
    pub short_names: Vec<String>,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub scope: CrdScope,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let crds = state.store.list_crds().await?;
    Ok(Json(serde_json::json!({
        "apiVersion": format!("{CRD_GROUP}/v1"),
        "kind": "CustomResourceDefinitionList",
        "items": crds.iter().map(|c| crd_envelope(CRD_GROUP, c)).collect::<Vec<_>>(),
    })))
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CrdRequest>) -> Result<(StatusCode, Json<Value>), AppError> {
    let crd = Crd {
        group: req.group,
        version: req.version,
        kind: req.kind,
        plural: req.plural,
        short_names: req.short_names,
        schema: req.schema,
        scope: req.scope,
        created_at: Utc::now(),
    };
    state.store.put_crd(crd.clone()).await?;
    tracing::info!(group = %crd.group, kind = %crd.kind, "registered crd");
    Ok((StatusCode::CREATED, Json(crd_envelope(CRD_GROUP, &crd))))
}

pub async fn get(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Value>, AppError> {
    let crds = state.store.list_crds().await?;
    let crd = crds
        .into_iter()
        .find(|c| c.storage_name() == name)
        .ok_or_else(|| Error::NotFound {
            kind: "CustomResourceDefinition".to_string(),
            name: name.clone(),
        })?;
    Ok(Json(crd_envelope(CRD_GROUP, &crd)))
}

pub async fn delete(State(state): State<AppState>, Path(name): Path<String>) -> Result<StatusCode, AppError> {
    let removed = state.store.delete_crd(&name).await?;
    if removed.is_none() {
        return Err(Error::NotFound {
            kind: "CustomResourceDefinition".to_string(),
            name,
        }
        .into());
    }
    Ok(StatusCode::NO_CONTENT)
}

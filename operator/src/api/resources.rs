use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use ferrite_types::{Error, GroupVersionPlural, ReconcileAction, ReconcileMessage, ResourceState};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::queue::WorkQueue;
use crate::util::{messages, AppError};

use super::envelope::{instance_envelope, instance_list_envelope};
use super::table;
use super::AppState;

#[derive(Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub metadata: CreateMetadata,
    #[serde(default)]
    pub spec: Value,
}

#[derive(Deserialize, Default)]
pub struct CreateMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn list_cluster(
    State(state): State<AppState>,
    Path((group, version, plural)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    list(state, group, version, plural, None, headers).await
}

pub async fn list_namespaced(
    State(state): State<AppState>,
    Path((group, version, namespace, plural)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    list(state, group, version, plural, Some(namespace), headers).await
}

async fn list(
    state: AppState,
    group: String,
    version: String,
    plural: String,
    namespace: Option<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let instances = state
        .store
        .list_resources(Some(&group), None, Some(&plural), namespace.as_deref())
        .await?;

    let accept = headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if table::wants_table(accept) {
        return Ok(Json(serde_json::to_value(table::render(&group, &version, &instances)).unwrap_or(Value::Null)));
    }

    let kind = instances.first().map(|i| i.kind.clone()).unwrap_or_default();
    Ok(Json(serde_json::to_value(instance_list_envelope(&group, &version, &kind, &instances)).unwrap_or(Value::Null)))
}

pub async fn create_cluster(
    State(state): State<AppState>,
    Path((group, version, plural)): Path<(String, String, String)>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    create(state, group, version, plural, None, req).await
}

pub async fn create_namespaced(
    State(state): State<AppState>,
    Path((group, version, namespace, plural)): Path<(String, String, String, String)>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    create(state, group, version, plural, Some(namespace), req).await
}

async fn create(
    state: AppState,
    group: String,
    version: String,
    plural: String,
    namespace: Option<String>,
    req: CreateRequest,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let gvp = GroupVersionPlural::new(group.clone(), version.clone(), plural.clone());
    let instance = state
        .store
        .put_resource(gvp.clone(), namespace.clone(), req.metadata.name, req.spec)
        .await?;

    state
        .store
        .set_status(
            &gvp,
            namespace.as_deref(),
            &instance.name,
            json!({ "state": ResourceState::Pending.to_string(), "message": messages::PENDING }),
        )
        .await?;

    state
        .queue
        .send(ReconcileMessage {
            action: ReconcileAction::Create,
            kind: instance.kind.clone(),
            group: instance.group.clone(),
            plural: instance.plural.clone(),
            namespace: instance.namespace.clone(),
            name: instance.name.clone(),
            spec: instance.spec.clone(),
            status: None,
        })
        .await;

    tracing::info!(kind = %instance.kind, name = %instance.name, "created resource instance");
    Ok((StatusCode::CREATED, Json(serde_json::to_value(instance_envelope(&group, &version, &instance)).unwrap_or(Value::Null))))
}

pub async fn get_cluster(
    State(state): State<AppState>,
    Path((group, version, plural, name)): Path<(String, String, String, String)>,
) -> Result<Json<Value>, AppError> {
    get(state, group, version, plural, None, name).await
}

pub async fn get_namespaced(
    State(state): State<AppState>,
    Path((group, version, namespace, plural, name)): Path<(String, String, String, String, String)>,
) -> Result<Json<Value>, AppError> {
    get(state, group, version, plural, Some(namespace), name).await
}

async fn get(
    state: AppState,
    group: String,
    version: String,
    plural: String,
    namespace: Option<String>,
    name: String,
) -> Result<Json<Value>, AppError> {
    let gvp = GroupVersionPlural::new(group.clone(), version.clone(), plural.clone());
    let instance = state
        .store
        .get_resource(&gvp, namespace.as_deref(), &name)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: plural.clone(),
            name: name.clone(),
        })?;
    Ok(Json(serde_json::to_value(instance_envelope(&group, &version, &instance)).unwrap_or(Value::Null)))
}

pub async fn patch_cluster(
    State(state): State<AppState>,
    Path((group, version, plural, name)): Path<(String, String, String, String)>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, AppError> {
    patch(state, group, version, plural, None, name, patch).await
}

pub async fn patch_namespaced(
    State(state): State<AppState>,
    Path((group, version, namespace, plural, name)): Path<(String, String, String, String, String)>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, AppError> {
    patch(state, group, version, plural, Some(namespace), name, patch).await
}

async fn patch(
    state: AppState,
    group: String,
    version: String,
    plural: String,
    namespace: Option<String>,
    name: String,
    patch: Value,
) -> Result<Json<Value>, AppError> {
    let gvp = GroupVersionPlural::new(group.clone(), version.clone(), plural.clone());
    let spec_patch = patch.get("spec").cloned().unwrap_or(patch);
    let instance = state.store.patch_resource_spec(&gvp, namespace.as_deref(), &name, spec_patch).await?;
    Ok(Json(serde_json::to_value(instance_envelope(&group, &version, &instance)).unwrap_or(Value::Null)))
}

pub async fn delete_cluster(
    State(state): State<AppState>,
    Path((group, version, plural, name)): Path<(String, String, String, String)>,
) -> Result<StatusCode, AppError> {
    delete(state, group, version, plural, None, name).await
}

pub async fn delete_namespaced(
    State(state): State<AppState>,
    Path((group, version, namespace, plural, name)): Path<(String, String, String, String, String)>,
) -> Result<StatusCode, AppError> {
    delete(state, group, version, plural, Some(namespace), name).await
}

async fn delete(
    state: AppState,
    group: String,
    version: String,
    plural: String,
    namespace: Option<String>,
    name: String,
) -> Result<StatusCode, AppError> {
    let gvp = GroupVersionPlural::new(group.clone(), version.clone(), plural.clone());
    let removed = state
        .store
        .delete_resource(&gvp, namespace.as_deref(), &name)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: plural.clone(),
            name: name.clone(),
        })?;

    state
        .queue
        .send(ReconcileMessage {
            action: ReconcileAction::Delete,
            kind: removed.kind.clone(),
            group: removed.group.clone(),
            plural: removed.plural.clone(),
            namespace: removed.namespace.clone(),
            name: removed.name.clone(),
            spec: removed.spec.clone(),
            status: removed.status.clone(),
        })
        .await;

    tracing::info!(kind = %removed.kind, name = %removed.name, "deleted resource instance");
    Ok(StatusCode::NO_CONTENT)
}


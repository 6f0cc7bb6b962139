use chrono::Utc;
use ferrite_types::{DependencyEdge, ResourceState, Result};
use serde_json::{json, Value};

use crate::store::ResourceStore;
use crate::util::messages;

/// Result of checking an instance's declared dependencies.
pub enum GateResult {
    Ready,
    Pending(Vec<DependencyEdge>),
}

fn dependencies_from_spec(spec: &Value) -> Vec<DependencyEdge> {
    spec.get("dependencies")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

/// Looks up every edge declared in `spec.dependencies` and reports which
/// ones, if any, are not yet `Ready`. A missing dependency or one with no
/// status at all both count as "not ready". `group` is the owning
/// resource's own group, used when an edge omits its own.
pub async fn check(store: &dyn ResourceStore, group: &str, spec: &Value) -> Result<GateResult> {
    let mut unresolved = Vec::new();
    for edge in dependencies_from_spec(spec) {
        let edge_group = edge.resolved_group(group).to_string();
        let found = store.find_by_kind_name(&edge_group, &edge.kind, &edge.name).await?;
        let ready = matches!(found.and_then(|r| r.state()), Some(ResourceState::Ready));
        if !ready {
            unresolved.push(edge);
        }
    }
    if unresolved.is_empty() {
        Ok(GateResult::Ready)
    } else {
        Ok(GateResult::Pending(unresolved))
    }
}

/// Writes the `Pending` status produced by a blocked gate check.
pub async fn write_pending_status(
    store: &dyn ResourceStore,
    group: &str,
    plural: &str,
    namespace: Option<&str>,
    name: &str,
    unresolved: &[DependencyEdge],
) -> Result<()> {
    let gvp = store.resolve_gvp(group, plural).await?;
    store
        .set_status(
            &gvp,
            namespace,
            name,
            json!({
                "state": ResourceState::Pending.to_string(),
                "message": messages::WAITING_ON_DEPENDENCIES,
                "pendingDependencies": unresolved,
                "lastDependencyCheck": Utc::now().to_rfc3339(),
            }),
        )
        .await
}

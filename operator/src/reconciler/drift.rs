//! Periodic drift reconciliation: diffs the locally declared resource
//! set against each provider's actual object set and converges them,
//! independently of anything the event pipeline does. Runs once per
//! `tick_interval` per registered `(group, kind)`, skipping a kind's
//! scan entirely if its previous scan is still in flight.

use std::sync::Arc;

use chrono::Utc;
use ferrite_types::{Error, ReconcileAction, ReconcileMessage, ResourceState};
use serde_json::json;

use crate::naming;
use crate::providers::{Binding, ProviderDriver};
use crate::queue::WorkQueue;
use crate::store::ResourceStore;
use crate::util::messages;

use super::{gate, Context};

const MAX_HEALTH_ERROR_BYTES: usize = 500;

pub async fn run_forever(ctx: Arc<Context>) {
    let mut ticker = tokio::time::interval(ctx.config.tick_interval);
    loop {
        ticker.tick().await;
        for ((group, kind), driver) in ctx.registry.all() {
            let Some(lock) = ctx.drift_locks.get(&(group.clone(), kind.clone())).cloned() else {
                continue;
            };
            let ctx = ctx.clone();
            let group = group.clone();
            let kind = kind.clone();
            tokio::spawn(async move {
                let Ok(_guard) = lock.try_lock_owned() else {
                    tracing::debug!(%group, %kind, "drift scan already in flight, skipping this tick");
                    return;
                };
                if let Err(e) = scan_kind(&ctx, &group, &kind, driver.as_ref()).await {
                    tracing::error!(%group, %kind, error = %e, "drift scan failed");
                }
            });
        }
    }
}

async fn scan_kind(ctx: &Context, group: &str, kind: &str, driver: &dyn ProviderDriver) -> ferrite_types::Result<()> {
    pending_sweep(ctx, group, kind).await?;

    let crd_plural = match ctx.store.list_crds().await?.into_iter().find(|c| c.group == group && c.kind == kind) {
        Some(c) => c.plural,
        None => return Ok(()),
    };

    let external = driver.list().await?;
    let local = ctx.store.list_resources(Some(group), Some(kind), None, None).await?;

    orphan_deletion(ctx, group, &crd_plural, driver, &external).await;
    missing_creation(ctx, group, kind, &crd_plural, &external, &local).await;

    if driver.supports_bindings() {
        binding_drift(ctx, driver, &local).await;
    }
    if driver.supports_health() {
        health_probe(ctx, group, &crd_plural, driver, &local).await;
    }

    Ok(())
}

/// Re-runs the dependency gate over every `Pending` instance of this
/// kind, enqueuing `create` for the ones that are now unblocked.
async fn pending_sweep(ctx: &Context, group: &str, kind: &str) -> ferrite_types::Result<()> {
    for instance in ctx.store.query_pending(group, kind).await? {
        match gate::check(&*ctx.store, &instance.group, &instance.spec).await? {
            gate::GateResult::Ready => {
                ctx.queue
                    .send(ReconcileMessage {
                        action: ReconcileAction::Create,
                        kind: instance.kind.clone(),
                        group: instance.group.clone(),
                        plural: instance.plural.clone(),
                        namespace: instance.namespace.clone(),
                        name: instance.name.clone(),
                        spec: instance.spec.clone(),
                        status: instance.status.clone(),
                    })
                    .await;
            }
            gate::GateResult::Pending(unresolved) => {
                gate::write_pending_status(
                    &*ctx.store,
                    &instance.group,
                    &instance.plural,
                    instance.namespace.as_deref(),
                    &instance.name,
                    &unresolved,
                )
                .await?;
            }
        }
    }
    Ok(())
}

/// Deletes external objects whose name matches this instance's naming
/// pattern but which have no corresponding local instance. This is the
/// only reason the naming pattern needs to stay stable and parseable.
async fn orphan_deletion(ctx: &Context, group: &str, plural: &str, driver: &dyn ProviderDriver, external: &[crate::providers::ExternalObject]) {
    for object in external {
        let Some(parsed) = naming::parse_external_name(&object.name, &ctx.config.instance_name) else {
            continue;
        };
        if parsed.group != group || parsed.plural != plural {
            continue;
        }
        let found = ctx
            .store
            .get_resource(
                &match ctx.store.resolve_gvp(group, plural).await {
                    Ok(gvp) => gvp,
                    Err(_) => continue,
                },
                parsed.namespace.as_deref(),
                &parsed.resource_name,
            )
            .await
            .ok()
            .flatten();
        if found.is_some() {
            continue;
        }
        tracing::info!(name = %object.name, "deleting orphaned external object with no matching instance");
        if let Err(e) = driver.delete(&object.id).await {
            tracing::warn!(name = %object.name, error = %e, "failed to delete orphaned external object");
        }
    }
}

/// Enqueues a `create` for every local instance with no corresponding
/// external object, reusing the normal create path including the
/// dependency gate.
async fn missing_creation(
    ctx: &Context,
    group: &str,
    kind: &str,
    _plural: &str,
    external: &[crate::providers::ExternalObject],
    local: &[ferrite_types::ResourceInstance],
) {
    for instance in local {
        let expected_name = naming::external_name(
            &ctx.config.instance_name,
            group,
            &instance.plural,
            instance.namespace.as_deref(),
            &instance.name,
        );
        if external.iter().any(|o| o.name == expected_name) {
            continue;
        }
        tracing::info!(name = %instance.name, %kind, "recreating instance missing from provider's object list");
        ctx.queue
            .send(ReconcileMessage {
                action: ReconcileAction::Create,
                kind: instance.kind.clone(),
                group: instance.group.clone(),
                plural: instance.plural.clone(),
                namespace: instance.namespace.clone(),
                name: instance.name.clone(),
                spec: instance.spec.clone(),
                status: instance.status.clone(),
            })
            .await;
    }
}

/// Recomputes each instance's expected bindings from `spec.bindings`,
/// resolving each referent through the store, and re-uploads the
/// binding list if it doesn't set-equal the provider's live list.
async fn binding_drift(ctx: &Context, driver: &dyn ProviderDriver, local: &[ferrite_types::ResourceInstance]) {
    for instance in local {
        let Some(external_id) = instance.status.as_ref().and_then(|s| s.get("externalId")).and_then(|v| v.as_str()) else {
            continue;
        };
        let expected = match resolve_expected_bindings(&*ctx.store, instance).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(name = %instance.name, error = %e, "failed to resolve expected bindings");
                continue;
            }
        };
        let live = match driver.get_bindings(external_id).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(name = %instance.name, error = %e, "failed to fetch live bindings");
                continue;
            }
        };
        let expected_set: std::collections::HashSet<_> = expected.iter().cloned().collect();
        let live_set: std::collections::HashSet<_> = live.iter().cloned().collect();
        if expected_set == live_set {
            continue;
        }
        tracing::info!(name = %instance.name, "binding drift detected, re-uploading binding list");
        if let Err(e) = driver.put_bindings(external_id, &expected).await {
            let child_failure = Error::ChildSideEffectFailed(e.to_string());
            tracing::warn!(name = %instance.name, error = %child_failure, "failed to upload corrected bindings, marking partially ready");
            if let Err(e) = super::set_partially_ready(
                ctx,
                &instance.gvp(),
                instance.namespace.as_deref(),
                &instance.name,
                external_id,
                &child_failure.to_string(),
            )
            .await
            {
                tracing::warn!(name = %instance.name, error = %e, "failed to write partially ready status");
            }
        }
    }
}

async fn resolve_expected_bindings(store: &dyn ResourceStore, instance: &ferrite_types::ResourceInstance) -> ferrite_types::Result<Vec<Binding>> {
    let declared = instance
        .spec
        .get("bindings")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let mut bindings = Vec::new();
    for entry in declared {
        let kind = entry.get("kind").and_then(|v| v.as_str()).unwrap_or_default();
        let name = entry.get("name").and_then(|v| v.as_str()).unwrap_or_default();
        let binding_type = entry.get("type").and_then(|v| v.as_str()).unwrap_or_default();
        let referent = store.find_by_kind_name(&instance.group, kind, name).await?;
        let Some(referent) = referent else { continue };
        let Some(id) = referent.status.as_ref().and_then(|s| s.get("externalId")).and_then(|v| v.as_str()) else {
            continue;
        };
        bindings.push(Binding {
            name: name.to_string(),
            binding_type: binding_type.to_string(),
            id: id.to_string(),
        });
    }
    Ok(bindings)
}

/// Probes each network-exposed instance's custom hostname and flips
/// `Ready`/`Failed` based on the result.
async fn health_probe(ctx: &Context, group: &str, plural: &str, driver: &dyn ProviderDriver, local: &[ferrite_types::ResourceInstance]) {
    for instance in local {
        if !matches!(instance.state(), Some(ResourceState::Ready) | Some(ResourceState::Failed)) {
            continue;
        }
        let hostname = naming::hostname(&instance.name, &ctx.config.instance_name, &ctx.config.domain);
        let result = driver.health(&hostname).await;
        let Ok(gvp) = ctx.store.resolve_gvp(group, plural).await else {
            continue;
        };
        let mut status = instance.status.clone().unwrap_or_else(|| json!({}));
        let now = Utc::now().to_rfc3339();
        match result {
            Ok(()) => {
                status["state"] = json!(ResourceState::Ready.to_string());
                status["message"] = json!(messages::READY);
                status["lastHealthCheck"] = json!(now);
                status["healthCheckStatus"] = json!("ok");
                status.as_object_mut().map(|o| o.remove("healthCheckError"));
            }
            Err(Error::ProviderTransient(reason)) | Err(Error::ProviderPermanent(reason)) => {
                status["state"] = json!(ResourceState::Failed.to_string());
                status["message"] = json!(messages::HEALTH_CHECK_FAILED);
                status["lastHealthCheck"] = json!(now);
                status["healthCheckStatus"] = json!("failed");
                status["healthCheckError"] = json!(truncate(&reason, MAX_HEALTH_ERROR_BYTES));
            }
            Err(other) => {
                tracing::warn!(name = %instance.name, error = %other, "unexpected error from health probe");
                continue;
            }
        }
        if let Err(e) = ctx.store.set_status(&gvp, instance.namespace.as_deref(), &instance.name, status).await {
            tracing::warn!(name = %instance.name, error = %e, "failed to write health check status");
        }
    }
}

fn truncate(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}


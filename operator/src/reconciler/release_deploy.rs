//! Orchestration for the composite provisioning pattern: on creation of
//! a `ReleaseDeploy` instance, derived `ReleaseVersion` and `Deployment`
//! child instances are created in order once the primary object is
//! `Ready`; on deletion, children are torn down in reverse order first.
//! Failures in the derived chain are logged but never fail the primary
//! resource, and a later reconcile never attempts to rebuild a missing
//! child - this matches "log and continue" literally rather than adding
//! reconciliation behavior the system doesn't otherwise describe.

use ferrite_types::{ReconcileAction, ReconcileMessage, Result};
use serde_json::json;

use super::{provision, Context};
use crate::providers::ProviderDriver;
use crate::queue::WorkQueue;

const VERSION_PLURAL: &str = "releaseversions";
pub(crate) const VERSION_KIND: &str = "ReleaseVersion";
const DEPLOYMENT_PLURAL: &str = "deployments";
pub(crate) const DEPLOYMENT_KIND: &str = "Deployment";

fn version_name(owner: &str) -> String {
    format!("{owner}-version")
}

fn deployment_name(owner: &str) -> String {
    format!("{owner}-deployment")
}

pub async fn create(ctx: &Context, driver: &dyn ProviderDriver, msg: &ReconcileMessage) -> Result<()> {
    let Some(release_id) = provision(ctx, driver, msg).await? else {
        return Ok(());
    };

    let version_name = version_name(&msg.name);
    match ctx
        .store
        .put_resource(
            ctx.store.resolve_gvp(&msg.group, VERSION_PLURAL).await?,
            msg.namespace.clone(),
            Some(version_name.clone()),
            json!({
                "dependencies": [{"kind": msg.kind, "name": msg.name}],
                "releaseId": release_id,
            }),
        )
        .await
    {
        Ok(version) => {
            ctx.queue
                .send(ReconcileMessage {
                    action: ReconcileAction::Create,
                    kind: VERSION_KIND.to_string(),
                    group: msg.group.clone(),
                    plural: VERSION_PLURAL.to_string(),
                    namespace: version.namespace.clone(),
                    name: version.name.clone(),
                    spec: version.spec.clone(),
                    status: None,
                })
                .await;
        }
        Err(e) => {
            tracing::warn!(owner = %msg.name, error = %e, "failed to create release version child");
            return Ok(());
        }
    }

    let deployment_name = deployment_name(&msg.name);
    match ctx
        .store
        .put_resource(
            ctx.store.resolve_gvp(&msg.group, DEPLOYMENT_PLURAL).await?,
            msg.namespace.clone(),
            Some(deployment_name.clone()),
            json!({
                "dependencies": [
                    {"kind": msg.kind, "name": msg.name},
                    {"kind": VERSION_KIND, "name": version_name},
                ],
            }),
        )
        .await
    {
        Ok(deployment) => {
            ctx.queue
                .send(ReconcileMessage {
                    action: ReconcileAction::Create,
                    kind: DEPLOYMENT_KIND.to_string(),
                    group: msg.group.clone(),
                    plural: DEPLOYMENT_PLURAL.to_string(),
                    namespace: deployment.namespace.clone(),
                    name: deployment.name.clone(),
                    spec: deployment.spec.clone(),
                    status: None,
                })
                .await;
        }
        Err(e) => {
            tracing::warn!(owner = %msg.name, error = %e, "failed to create deployment child");
        }
    }

    Ok(())
}

pub async fn delete(ctx: &Context, driver: &dyn ProviderDriver, msg: &ReconcileMessage) -> Result<()> {
    delete_child(ctx, &msg.group, DEPLOYMENT_PLURAL, DEPLOYMENT_KIND, msg.namespace.as_deref(), &deployment_name(&msg.name)).await;
    delete_child(ctx, &msg.group, VERSION_PLURAL, VERSION_KIND, msg.namespace.as_deref(), &version_name(&msg.name)).await;

    let external_id = msg
        .status
        .as_ref()
        .and_then(|s| s.get("externalId"))
        .and_then(|v| v.as_str());
    if let Some(external_id) = external_id {
        driver.delete(external_id).await?;
    }
    Ok(())
}

/// Deletes one child instance's external object (via its own registered
/// driver) and its store row. Missing identifiers, missing CRDs and
/// missing drivers are all skipped silently: there is nothing to clean
/// up without them.
async fn delete_child(ctx: &Context, group: &str, plural: &str, kind: &str, namespace: Option<&str>, name: &str) {
    let Ok(gvp) = ctx.store.resolve_gvp(group, plural).await else {
        return;
    };
    let Ok(Some(instance)) = ctx.store.get_resource(&gvp, namespace, name).await else {
        return;
    };
    let external_id = instance.status.as_ref().and_then(|s| s.get("externalId")).and_then(|v| v.as_str());
    if let (Some(external_id), Some(driver)) = (external_id, ctx.registry.get(group, kind)) {
        if let Err(e) = driver.delete(external_id).await {
            tracing::warn!(%name, %kind, error = %e, "failed to delete composite child's external object");
        }
    }
    if let Err(e) = ctx.store.delete_resource(&gvp, namespace, name).await {
        tracing::warn!(%name, %kind, error = %e, "failed to delete composite child's store row");
    }
}

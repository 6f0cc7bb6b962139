pub mod context;
pub mod drift;
pub mod fanout;
pub mod gate;
pub mod release_deploy;

pub use context::Context;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ferrite_types::{Error, ReconcileAction, ReconcileMessage, ResourceState, Result};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::naming;
use crate::providers::{CreateOutcome, ProviderDriver};
use crate::queue::{Delivery, Receiver};
use crate::util::messages;

/// Deadline applied to a single reconcile attempt. A timeout is treated
/// as a transient provider failure so the message is retried rather than
/// written to status as a permanent one.
const RECONCILE_DEADLINE: Duration = Duration::from_secs(25);

/// Starts `workers` cooperative tasks pulling from the same queue
/// receiver handle and dispatching each delivered message to its kind's
/// provider driver, plus the periodic drift-scan task. Runs until the
/// queue is closed.
pub async fn run(ctx: Arc<Context>, receiver: Receiver, workers: usize) {
    let receiver = Arc::new(Mutex::new(receiver));

    let mut handles = Vec::new();
    for worker_id in 0..workers {
        let ctx = ctx.clone();
        let receiver = receiver.clone();
        handles.push(tokio::spawn(async move {
            loop {
                let delivery = { receiver.lock().await.recv().await };
                let Some(delivery) = delivery else {
                    tracing::debug!(worker_id, "queue closed, worker exiting");
                    break;
                };
                handle_delivery(&ctx, delivery).await;
            }
        }));
    }

    handles.push(tokio::spawn(drift::run_forever(ctx.clone())));

    for handle in handles {
        let _ = handle.await;
    }
}

async fn handle_delivery(ctx: &Context, delivery: Delivery) {
    let message = delivery.message.clone();
    match reconcile_message(ctx, &message).await {
        Ok(()) => delivery.ack(),
        Err(Error::ProviderTransient(reason)) => {
            tracing::warn!(kind = %message.kind, name = %message.name, reason, "retrying after transient failure");
            delivery.retry();
        }
        Err(e) => {
            tracing::error!(kind = %message.kind, name = %message.name, error = %e, "reconcile failed, not retrying");
            delivery.ack();
        }
    }
}

async fn reconcile_message(ctx: &Context, msg: &ReconcileMessage) -> Result<()> {
    let Some(driver) = ctx.registry.get(&msg.group, &msg.kind) else {
        tracing::warn!(kind = %msg.kind, group = %msg.group, "no driver registered for this kind, dropping message");
        return Ok(());
    };

    #[cfg(feature = "metrics")]
    if let Some(metrics) = ctx.metrics.get(&msg.kind) {
        metrics
            .reconcile_counter
            .with_label_values(&[&msg.name, msg.namespace.as_deref().unwrap_or("")])
            .inc();
    }

    match msg.action {
        ReconcileAction::Create => reconcile_create(ctx, driver, msg).await,
        ReconcileAction::Delete => reconcile_delete(ctx, driver, msg).await,
    }
}

async fn reconcile_create(ctx: &Context, driver: Arc<dyn ProviderDriver>, msg: &ReconcileMessage) -> Result<()> {
    match gate::check(&*ctx.store, &msg.group, &msg.spec).await? {
        gate::GateResult::Pending(unresolved) => {
            gate::write_pending_status(&*ctx.store, &msg.group, &msg.plural, msg.namespace.as_deref(), &msg.name, &unresolved)
                .await?;
            return Ok(());
        }
        gate::GateResult::Ready => {}
    }

    if msg.kind == "ReleaseDeploy" {
        return release_deploy::create(ctx, driver.as_ref(), msg).await;
    }

    provision(ctx, driver.as_ref(), msg).await.map(|_| ())
}

/// Idempotent-create path shared by the generic per-kind contract and
/// the `ReleaseDeploy` orchestrator's primary object: calls the driver,
/// adopts a pre-existing object by name on `AlreadyExists`, writes the
/// resulting status, and runs fan-out on success. Returns the
/// provider-assigned id when the instance reached `Ready`, `None` when
/// it was written `Failed`.
pub(crate) async fn provision(ctx: &Context, driver: &dyn ProviderDriver, msg: &ReconcileMessage) -> Result<Option<String>> {
    let external = naming::external_name(
        &ctx.config.instance_name,
        &msg.group,
        &msg.plural,
        msg.namespace.as_deref(),
        &msg.name,
    );

    let outcome = timeout(RECONCILE_DEADLINE, driver.create(&external, &msg.spec))
        .await
        .map_err(|_| Error::ProviderTransient("reconcile deadline exceeded".to_string()))??;

    match outcome {
        CreateOutcome::Created { external_id, endpoint } => {
            action(ctx, msg, "create");
            set_ready(ctx, msg, &external_id, endpoint.as_deref()).await?;
            fanout::on_ready(&*ctx.store, &ctx.queue, &msg.group, &msg.kind, &msg.name).await?;
            Ok(Some(external_id))
        }
        CreateOutcome::AlreadyExists => {
            action(ctx, msg, "adopt");
            match driver.list().await {
                Ok(objects) => {
                    if let Some(found) = objects.into_iter().find(|o| o.name == external) {
                        set_ready(ctx, msg, &found.id, None).await?;
                        fanout::on_ready(&*ctx.store, &ctx.queue, &msg.group, &msg.kind, &msg.name).await?;
                        Ok(Some(found.id))
                    } else {
                        set_failed(
                            ctx,
                            msg,
                            "provider reported the object already exists but no matching object was found on list",
                        )
                        .await?;
                        Ok(None)
                    }
                }
                Err(e) => {
                    set_failed(ctx, msg, &e.to_string()).await?;
                    Ok(None)
                }
            }
        }
    }
}

async fn reconcile_delete(ctx: &Context, driver: Arc<dyn ProviderDriver>, msg: &ReconcileMessage) -> Result<()> {
    if msg.kind == "ReleaseDeploy" {
        return release_deploy::delete(ctx, driver.as_ref(), msg).await;
    }
    let external_id = msg
        .status
        .as_ref()
        .and_then(|s| s.get("externalId"))
        .and_then(|v| v.as_str());
    let Some(external_id) = external_id else {
        tracing::debug!(kind = %msg.kind, name = %msg.name, "delete with no recorded external id, nothing to do");
        return Ok(());
    };
    action(ctx, msg, "delete");
    driver.delete(external_id).await
}

/// Writes a `Ready` status carrying the provider-assigned identifier.
pub(crate) async fn set_ready(ctx: &Context, msg: &ReconcileMessage, external_id: &str, endpoint: Option<&str>) -> Result<()> {
    let gvp = ctx.store.resolve_gvp(&msg.group, &msg.plural).await?;
    ctx.store
        .set_status(
            &gvp,
            msg.namespace.as_deref(),
            &msg.name,
            json!({
                "state": ResourceState::Ready.to_string(),
                "message": messages::READY,
                "externalId": external_id,
                "endpoint": endpoint,
                "reconciledAt": Utc::now().to_rfc3339(),
            }),
        )
        .await
}

/// Writes a `Failed` status carrying the error payload that caused it.
pub(crate) async fn set_failed(ctx: &Context, msg: &ReconcileMessage, error: &str) -> Result<()> {
    let gvp = ctx.store.resolve_gvp(&msg.group, &msg.plural).await?;
    ctx.store
        .set_status(
            &gvp,
            msg.namespace.as_deref(),
            &msg.name,
            json!({
                "state": ResourceState::Failed.to_string(),
                "error": error,
            }),
        )
        .await
}

/// Writes a `PartiallyReady` status: the primary object succeeded but a
/// secondary side effect (e.g. a binding update) failed.
pub(crate) async fn set_partially_ready(
    ctx: &Context,
    gvp: &ferrite_types::GroupVersionPlural,
    namespace: Option<&str>,
    name: &str,
    external_id: &str,
    error: &str,
) -> Result<()> {
    ctx.store
        .set_status(
            gvp,
            namespace,
            name,
            json!({
                "state": ResourceState::PartiallyReady.to_string(),
                "message": messages::PARTIALLY_READY,
                "externalId": external_id,
                "error": error,
                "reconciledAt": Utc::now().to_rfc3339(),
            }),
        )
        .await
}

#[cfg(feature = "metrics")]
fn action(ctx: &Context, msg: &ReconcileMessage, action: &str) {
    if let Some(metrics) = ctx.metrics.get(&msg.kind) {
        metrics
            .action_counter
            .with_label_values(&[&msg.name, msg.namespace.as_deref().unwrap_or(""), action])
            .inc();
    }
}

#[cfg(not(feature = "metrics"))]
fn action(_ctx: &Context, _msg: &ReconcileMessage, _action: &str) {}

use ferrite_types::{ReconcileAction, ReconcileMessage, ResourceState, Result};

use crate::queue::{InMemoryQueue, WorkQueue};
use crate::store::ResourceStore;

use super::gate;

/// Re-checks every `Pending` instance that could depend on the resource
/// which just became `Ready`, enqueuing a fresh `create` for any whose
/// dependencies are now fully resolved. Instances that are still
/// blocked get their `pendingDependencies`/`lastDependencyCheck` status
/// refreshed so their next fan-out or drift tick reflects current state.
pub async fn on_ready(
    store: &dyn ResourceStore,
    queue: &InMemoryQueue,
    resolved_group: &str,
    resolved_kind: &str,
    resolved_name: &str,
) -> Result<()> {
    let candidates = store.list_resources(None, None, None, None).await?;
    for candidate in candidates {
        if candidate.state() != Some(ResourceState::Pending) {
            continue;
        }
        let depends_on_resolved = candidate.dependencies().iter().any(|edge| {
            edge.kind == resolved_kind
                && edge.name == resolved_name
                && edge.resolved_group(&candidate.group) == resolved_group
        });
        if !depends_on_resolved {
            continue;
        }

        match gate::check(store, &candidate.group, &candidate.spec).await? {
            gate::GateResult::Ready => {
                queue
                    .send(ReconcileMessage {
                        action: ReconcileAction::Create,
                        kind: candidate.kind.clone(),
                        group: candidate.group.clone(),
                        plural: candidate.plural.clone(),
                        namespace: candidate.namespace.clone(),
                        name: candidate.name.clone(),
                        spec: candidate.spec.clone(),
                        status: candidate.status.clone(),
                    })
                    .await;
            }
            gate::GateResult::Pending(unresolved) => {
                gate::write_pending_status(
                    store,
                    &candidate.group,
                    &candidate.plural,
                    candidate.namespace.as_deref(),
                    &candidate.name,
                    &unresolved,
                )
                .await?;
            }
        }
    }
    Ok(())
}

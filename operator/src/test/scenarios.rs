use std::sync::Arc;
use std::time::Duration;

use ferrite_types::{GroupVersionPlural, ReconcileAction, ReconcileMessage, ResourceState};
use serde_json::json;

use crate::naming;
use crate::providers::ProviderRegistry;
use crate::queue::{InMemoryQueue, WorkQueue};
use crate::reconciler::{self, Context};
use crate::store::{InMemoryStore, ResourceStore};

use super::util::{test_config, test_crd, wait_until, MockDriver};

const TIMEOUT: Duration = Duration::from_secs(2);

struct Harness {
    store: Arc<dyn ResourceStore>,
    queue: Arc<InMemoryQueue>,
    driver: Arc<MockDriver>,
    gvp: GroupVersionPlural,
}

async fn harness() -> Harness {
    let store: Arc<dyn ResourceStore> = Arc::new(InMemoryStore::new());
    store.put_crd(test_crd("ferrite.io", "v1", "Widget", "widgets")).await.unwrap();
    let (queue, receiver) = InMemoryQueue::new();
    let queue = Arc::new(queue);

    let driver = Arc::new(MockDriver::new("Widget"));
    let mut registry = ProviderRegistry::new();
    registry.register("ferrite.io", "Widget", driver.clone());

    let ctx = Arc::new(Context::new(store.clone(), queue.clone(), Arc::new(registry), Arc::new(test_config())));
    tokio::spawn(reconciler::run(ctx, receiver, 2));

    Harness {
        store,
        queue,
        driver,
        gvp: GroupVersionPlural::new("ferrite.io", "v1", "widgets"),
    }
}

fn create_message(name: &str, spec: serde_json::Value) -> ReconcileMessage {
    ReconcileMessage {
        action: ReconcileAction::Create,
        kind: "Widget".to_string(),
        group: "ferrite.io".to_string(),
        plural: "widgets".to_string(),
        namespace: None,
        name: name.to_string(),
        spec,
        status: None,
    }
}

#[tokio::test]
async fn create_is_idempotently_provisioned_and_becomes_ready() {
    let h = harness().await;
    h.store.put_resource(h.gvp.clone(), None, Some("a".to_string()), json!({})).await.unwrap();
    h.queue.send(create_message("a", json!({}))).await;

    let converged = wait_until(
        || async {
            matches!(h.store.get_resource(&h.gvp, None, "a").await.unwrap().and_then(|i| i.state()), Some(ResourceState::Ready))
        },
        TIMEOUT,
    )
    .await;
    assert!(converged, "instance never reached Ready");

    let instance = h.store.get_resource(&h.gvp, None, "a").await.unwrap().unwrap();
    assert!(instance.status.unwrap()["externalId"].is_string());
    assert_eq!(h.driver.object_count(), 1);
}

#[tokio::test]
async fn already_existing_external_object_is_adopted_by_name() {
    let h = harness().await;
    let external = naming::external_name(&test_config().instance_name, "ferrite.io", "widgets", None, "a");
    h.driver.seed(&external, "pre-existing-id");

    h.store.put_resource(h.gvp.clone(), None, Some("a".to_string()), json!({})).await.unwrap();
    h.queue.send(create_message("a", json!({}))).await;

    let converged = wait_until(
        || async {
            matches!(h.store.get_resource(&h.gvp, None, "a").await.unwrap().and_then(|i| i.state()), Some(ResourceState::Ready))
        },
        TIMEOUT,
    )
    .await;
    assert!(converged, "adopted instance never reached Ready");

    let instance = h.store.get_resource(&h.gvp, None, "a").await.unwrap().unwrap();
    assert_eq!(instance.status.unwrap()["externalId"], "pre-existing-id");
    // Adoption must not create a second external object.
    assert_eq!(h.driver.object_count(), 1);
}

#[tokio::test]
async fn dependent_instance_is_pending_until_its_dependency_becomes_ready() {
    let h = harness().await;

    h.store.put_resource(h.gvp.clone(), None, Some("a".to_string()), json!({})).await.unwrap();
    h.store
        .put_resource(
            h.gvp.clone(),
            None,
            Some("b".to_string()),
            json!({"dependencies": [{"kind": "Widget", "name": "a"}]}),
        )
        .await
        .unwrap();

    // "b" is reconciled before "a" exists externally; it must stay Pending.
    h.queue.send(create_message("b", json!({"dependencies": [{"kind": "Widget", "name": "a"}]}))).await;
    let b_pending = wait_until(
        || async { matches!(h.store.get_resource(&h.gvp, None, "b").await.unwrap().and_then(|i| i.state()), Some(ResourceState::Pending)) },
        TIMEOUT,
    )
    .await;
    assert!(b_pending, "b should be Pending while its dependency is unresolved");
    assert_eq!(h.driver.object_count(), 0);

    // Once "a" is reconciled and reaches Ready, fan-out should pick "b" back up.
    h.queue.send(create_message("a", json!({}))).await;
    let b_ready = wait_until(
        || async { matches!(h.store.get_resource(&h.gvp, None, "b").await.unwrap().and_then(|i| i.state()), Some(ResourceState::Ready)) },
        TIMEOUT,
    )
    .await;
    assert!(b_ready, "b should become Ready once its dependency resolves via fan-out");
    assert_eq!(h.driver.object_count(), 2);
}

#[tokio::test]
async fn delete_tears_down_the_external_object() {
    let h = harness().await;
    h.store.put_resource(h.gvp.clone(), None, Some("a".to_string()), json!({})).await.unwrap();
    h.queue.send(create_message("a", json!({}))).await;
    wait_until(
        || async { matches!(h.store.get_resource(&h.gvp, None, "a").await.unwrap().and_then(|i| i.state()), Some(ResourceState::Ready)) },
        TIMEOUT,
    )
    .await;
    assert_eq!(h.driver.object_count(), 1);

    let removed = h.store.delete_resource(&h.gvp, None, "a").await.unwrap().unwrap();
    h.queue
        .send(ReconcileMessage {
            action: ReconcileAction::Delete,
            kind: removed.kind,
            group: removed.group,
            plural: removed.plural,
            namespace: removed.namespace,
            name: removed.name,
            spec: removed.spec,
            status: removed.status,
        })
        .await;

    let converged = wait_until(|| async { h.driver.object_count() == 0 }, TIMEOUT).await;
    assert!(converged, "external object was never torn down");
}

#[tokio::test]
async fn release_deploy_create_provisions_both_children_to_ready() {
    let store: Arc<dyn ResourceStore> = Arc::new(InMemoryStore::new());
    store.put_crd(test_crd("ferrite.io", "v1", "ReleaseDeploy", "releasedeploys")).await.unwrap();
    store.put_crd(test_crd("ferrite.io", "v1", "ReleaseVersion", "releaseversions")).await.unwrap();
    store.put_crd(test_crd("ferrite.io", "v1", "Deployment", "deployments")).await.unwrap();

    let (queue, receiver) = InMemoryQueue::new();
    let queue = Arc::new(queue);

    let release_driver = Arc::new(MockDriver::new("ReleaseDeploy"));
    let version_driver = Arc::new(MockDriver::new("ReleaseVersion"));
    let deployment_driver = Arc::new(MockDriver::new("Deployment"));

    let mut registry = ProviderRegistry::new();
    registry.register("ferrite.io", "ReleaseDeploy", release_driver.clone());
    registry.register("ferrite.io", "ReleaseVersion", version_driver.clone());
    registry.register("ferrite.io", "Deployment", deployment_driver.clone());

    let ctx = Arc::new(Context::new(store.clone(), queue.clone(), Arc::new(registry), Arc::new(test_config())));
    tokio::spawn(reconciler::run(ctx, receiver, 2));

    let release_gvp = GroupVersionPlural::new("ferrite.io", "v1", "releasedeploys");
    store.put_resource(release_gvp.clone(), None, Some("main".to_string()), json!({"ref": "v1.0.0"})).await.unwrap();
    queue
        .send(ReconcileMessage {
            action: ReconcileAction::Create,
            kind: "ReleaseDeploy".to_string(),
            group: "ferrite.io".to_string(),
            plural: "releasedeploys".to_string(),
            namespace: None,
            name: "main".to_string(),
            spec: json!({"ref": "v1.0.0"}),
            status: None,
        })
        .await;

    let release_ready = wait_until(
        || async { matches!(store.get_resource(&release_gvp, None, "main").await.unwrap().and_then(|i| i.state()), Some(ResourceState::Ready)) },
        TIMEOUT,
    )
    .await;
    assert!(release_ready, "release deploy's primary object never reached Ready");

    let version_gvp = GroupVersionPlural::new("ferrite.io", "v1", "releaseversions");
    let version_ready = wait_until(
        || async {
            matches!(
                store.get_resource(&version_gvp, None, "main-version").await.unwrap().and_then(|i| i.state()),
                Some(ResourceState::Ready)
            )
        },
        TIMEOUT,
    )
    .await;
    assert!(version_ready, "release version child never reached Ready");

    let deployment_gvp = GroupVersionPlural::new("ferrite.io", "v1", "deployments");
    let deployment_ready = wait_until(
        || async {
            matches!(
                store.get_resource(&deployment_gvp, None, "main-deployment").await.unwrap().and_then(|i| i.state()),
                Some(ResourceState::Ready)
            )
        },
        TIMEOUT,
    )
    .await;
    assert!(deployment_ready, "deployment child never reached Ready");

    assert_eq!(release_driver.object_count(), 1);
    assert_eq!(version_driver.object_count(), 1);
    assert_eq!(deployment_driver.object_count(), 1);
}

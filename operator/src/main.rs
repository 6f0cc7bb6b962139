mod api;
mod config;
mod naming;
mod providers;
mod queue;
mod reconciler;
mod store;
mod util;

#[cfg(test)]
mod test;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;
use providers::{D1Driver, ProviderRegistry, QueueDriver, ReleaseDeployDriver, ReqwestProviderClient, WorkerDriver};
use queue::InMemoryQueue;
use reconciler::release_deploy::{DEPLOYMENT_KIND, VERSION_KIND};
use store::InMemoryStore;

/// Builds the provider driver registry from environment-configured
/// backends. Each driver gets its own base URL/token pair so a
/// deployment can point different kinds at different backing APIs.
///
/// `ReleaseDeploy`'s children are registered alongside it: `ReleaseVersion`
/// is D1-like (plain create/list/delete, no bindings or health probe) and
/// `Deployment` is Worker-like (bindings plus a health probe), matching how
/// the composite orchestrator describes them.
fn build_registry(group: &str) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    let client_for = |prefix: &str| {
        let base_url = std::env::var(format!("{prefix}_BASE_URL")).unwrap_or_default();
        let token = std::env::var(format!("{prefix}_TOKEN")).unwrap_or_default();
        Arc::new(ReqwestProviderClient::new(base_url, token))
    };

    registry.register(group, "D1", Arc::new(D1Driver::new(client_for("D1"))));
    registry.register(group, "Queue", Arc::new(QueueDriver::new(client_for("QUEUE"))));
    registry.register(group, "Worker", Arc::new(WorkerDriver::new(client_for("WORKER"))));
    registry.register(group, "ReleaseDeploy", Arc::new(ReleaseDeployDriver::new(client_for("RELEASE"))));
    registry.register(group, VERSION_KIND, Arc::new(D1Driver::new(client_for("RELEASE_VERSION"))));
    registry.register(group, DEPLOYMENT_KIND, Arc::new(WorkerDriver::new(client_for("DEPLOYMENT"))));

    registry
}

/// Group under which the shipped driver kinds (D1, Queue, Worker,
/// ReleaseDeploy and its children) are registered.
const CONTROL_PLANE_GROUP: &str = "ferrite.io";

async fn run(config: Config) {
    let store: Arc<dyn store::ResourceStore> = Arc::new(InMemoryStore::new());
    let (queue, receiver) = InMemoryQueue::new();
    let queue = Arc::new(queue);
    let registry = Arc::new(build_registry(CONTROL_PLANE_GROUP));

    let workers = config.workers;
    #[cfg(feature = "metrics")]
    let metrics_port = config.metrics_port;
    let bind_addr = config.bind_addr.clone();

    let ctx = Arc::new(reconciler::Context::new(
        store.clone(),
        queue.clone(),
        registry,
        Arc::new(config),
    ));

    tokio::spawn(reconciler::run(ctx, receiver, workers));

    #[cfg(feature = "metrics")]
    if let Some(port) = metrics_port {
        tokio::spawn(util::metrics::run_server(port));
    }

    let state = api::AppState { store, queue };
    if let Err(e) = api::server::serve(&bind_addr, state).await {
        tracing::error!(error = %e, "rest api surface exited");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    let config = Config::parse();
    run(config).await;

    panic!("exited unexpectedly");
}

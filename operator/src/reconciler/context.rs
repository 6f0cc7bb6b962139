use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::providers::ProviderRegistry;
use crate::queue::InMemoryQueue;
use crate::store::ResourceStore;

#[cfg(feature = "metrics")]
use crate::util::metrics::ControllerMetrics;

/// Shared handle threaded through every reconcile attempt: the store,
/// the queue (used for re-enqueueing fan-out messages), the registry of
/// provider drivers, and process configuration. Mirrors the source's
/// `ContextData` struct, generalized across kinds rather than one per
/// controller binary.
pub struct Context {
    pub store: Arc<dyn ResourceStore>,
    pub queue: Arc<InMemoryQueue>,
    pub registry: Arc<ProviderRegistry>,
    pub config: Arc<Config>,
    /// One mutex per registered `(group, kind)`, held for the duration
    /// of that kind's drift scan. A scan that can't acquire it (a prior
    /// scan is still running) is skipped for that tick rather than
    /// queued to wait.
    pub drift_locks: HashMap<(String, String), Arc<Mutex<()>>>,
    #[cfg(feature = "metrics")]
    pub metrics: HashMap<String, ControllerMetrics>,
}

impl Context {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        queue: Arc<InMemoryQueue>,
        registry: Arc<ProviderRegistry>,
        config: Arc<Config>,
    ) -> Self {
        let drift_locks = registry
            .all()
            .map(|(key, _)| (key.clone(), Arc::new(Mutex::new(()))))
            .collect();

        #[cfg(feature = "metrics")]
        let metrics = registry
            .all()
            .map(|((_, kind), _)| (kind.clone(), ControllerMetrics::new(&kind.to_lowercase())))
            .collect();

        Self {
            store,
            queue,
            registry,
            config,
            drift_locks,
            #[cfg(feature = "metrics")]
            metrics,
        }
    }
}

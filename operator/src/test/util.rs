//! Shared fixtures for the reconciler/drift/API test suites: a
//! `ProviderDriver` double backed by plain mutexes (no external calls)
//! and a polling helper standing in for the watch-stream idiom the
//! teacher used against a real cluster - here "the cluster" is just our
//! own in-memory store, so polling it directly is cheap enough to be
//! the right tool rather than a compromise.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ferrite_types::{Crd, CrdScope, Error, Result};
use serde_json::Value;
use uuid::Uuid;

use crate::config::Config;
use crate::providers::{Binding, CreateOutcome, ExternalObject, ProviderDriver};

pub fn test_crd(group: &str, version: &str, kind: &str, plural: &str) -> Crd {
    Crd {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
        plural: plural.to_string(),
        short_names: Vec::new(),
        schema: None,
        scope: CrdScope::Cluster,
        created_at: Utc::now(),
    }
}

pub fn test_config() -> Config {
    Config {
        instance_name: "test-inst".to_string(),
        domain: "example.test".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        tick_interval: Duration::from_millis(20),
        workers: 2,
        #[cfg(feature = "metrics")]
        metrics_port: None,
    }
}

/// Polls `condition` until it resolves `true` or `timeout` elapses.
/// Returns whether it converged.
pub async fn wait_until<F, Fut>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// In-process stand-in for a real provider API. Every call is recorded
/// so tests can assert on what the reconciler/drift scan actually did
/// without standing up wiremock for the paths that don't need real
/// HTTP request shapes asserted.
pub struct MockDriver {
    kind: &'static str,
    objects: Mutex<HashMap<String, ExternalObject>>,
    bindings: Mutex<HashMap<String, Vec<Binding>>>,
    put_bindings_calls: Mutex<Vec<(String, Vec<Binding>)>>,
    health_ok: Mutex<bool>,
    bindings_capable: bool,
    health_capable: bool,
}

impl MockDriver {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            objects: Mutex::new(HashMap::new()),
            bindings: Mutex::new(HashMap::new()),
            put_bindings_calls: Mutex::new(Vec::new()),
            health_ok: Mutex::new(true),
            bindings_capable: false,
            health_capable: false,
        }
    }

    pub fn with_bindings(mut self) -> Self {
        self.bindings_capable = true;
        self
    }

    pub fn with_health(mut self) -> Self {
        self.health_capable = true;
        self
    }

    /// Seeds a pre-existing external object, as if it were provisioned
    /// outside the operator (or left behind by a previous instance).
    pub fn seed(&self, external_name: &str, id: &str) {
        self.objects.lock().unwrap().insert(
            external_name.to_string(),
            ExternalObject {
                name: external_name.to_string(),
                id: id.to_string(),
                attributes: Value::Null,
            },
        );
    }

    pub fn set_health(&self, ok: bool) {
        *self.health_ok.lock().unwrap() = ok;
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn put_bindings_calls(&self) -> Vec<(String, Vec<Binding>)> {
        self.put_bindings_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderDriver for MockDriver {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn create(&self, external_name: &str, _spec: &Value) -> Result<CreateOutcome> {
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(external_name) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let id = Uuid::new_v4().to_string();
        objects.insert(
            external_name.to_string(),
            ExternalObject {
                name: external_name.to_string(),
                id: id.clone(),
                attributes: Value::Null,
            },
        );
        Ok(CreateOutcome::Created {
            external_id: id,
            endpoint: None,
        })
    }

    async fn list(&self) -> Result<Vec<ExternalObject>> {
        Ok(self.objects.lock().unwrap().values().cloned().collect())
    }

    async fn delete(&self, external_id: &str) -> Result<()> {
        self.objects.lock().unwrap().retain(|_, o| o.id != external_id);
        Ok(())
    }

    async fn get_bindings(&self, external_id: &str) -> Result<Vec<Binding>> {
        Ok(self.bindings.lock().unwrap().get(external_id).cloned().unwrap_or_default())
    }

    async fn put_bindings(&self, external_id: &str, bindings: &[Binding]) -> Result<()> {
        self.bindings.lock().unwrap().insert(external_id.to_string(), bindings.to_vec());
        self.put_bindings_calls.lock().unwrap().push((external_id.to_string(), bindings.to_vec()));
        Ok(())
    }

    async fn health(&self, _hostname: &str) -> Result<()> {
        if *self.health_ok.lock().unwrap() {
            Ok(())
        } else {
            Err(Error::ProviderTransient("mock health check failed".to_string()))
        }
    }

    fn supports_bindings(&self) -> bool {
        self.bindings_capable
    }

    fn supports_health(&self) -> bool {
        self.health_capable
    }
}

mod d1;
mod http;
mod queue_kind;
mod release_deploy;
mod worker;

pub use d1::D1Driver;
pub use http::{ProviderClient, ReqwestProviderClient};
pub use queue_kind::QueueDriver;
pub use release_deploy::ReleaseDeployDriver;
pub use worker::WorkerDriver;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ferrite_types::{Error, Result};
use serde_json::Value;

/// An external object as reported by a provider's list call: its
/// deterministic name plus whatever identifiers/metadata the driver
/// keeps in status.
#[derive(Debug, Clone)]
pub struct ExternalObject {
    pub name: String,
    pub id: String,
    pub attributes: Value,
}

/// A binding attached to a `Worker`-like resource, identified by the
/// triple used for set-equality comparison during drift scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub name: String,
    pub binding_type: String,
    pub id: String,
}

/// Outcome of a create call distinguishing the idempotent-adoption path
/// from an ordinary success.
pub enum CreateOutcome {
    Created { external_id: String, endpoint: Option<String> },
    AlreadyExists,
}

/// Per-kind adapter translating a desired spec into calls against an
/// external API. Optional capabilities (`get_bindings`/`put_bindings`/
/// `health`) default to "unsupported" so kinds like `D1` and `Queue`
/// that have neither bindings nor a health endpoint don't need to
/// implement them.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn create(&self, external_name: &str, spec: &Value) -> Result<CreateOutcome>;
    async fn list(&self) -> Result<Vec<ExternalObject>>;
    async fn delete(&self, external_id: &str) -> Result<()>;

    async fn get_bindings(&self, _external_id: &str) -> Result<Vec<Binding>> {
        Ok(Vec::new())
    }

    async fn put_bindings(&self, _external_id: &str, _bindings: &[Binding]) -> Result<()> {
        Ok(())
    }

    async fn health(&self, _hostname: &str) -> Result<()> {
        Ok(())
    }

    /// Whether this kind carries bindings to other resources and should
    /// be included in drift scan's binding drift check.
    fn supports_bindings(&self) -> bool {
        false
    }

    /// Whether this kind is network-exposed and should be included in
    /// drift scan's health probe.
    fn supports_health(&self) -> bool {
        false
    }
}

/// Looks up the driver registered for a `(group, kind)` pair. A message
/// for an unregistered kind is logged and acknowledged rather than
/// retried forever, since no driver will ever appear for it without a
/// process restart.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    drivers: HashMap<(String, String), Arc<dyn ProviderDriver>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, group: impl Into<String>, kind: impl Into<String>, driver: Arc<dyn ProviderDriver>) {
        self.drivers.insert((group.into(), kind.into()), driver);
    }

    pub fn get(&self, group: &str, kind: &str) -> Option<Arc<dyn ProviderDriver>> {
        self.drivers.get(&(group.to_string(), kind.to_string())).cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = (&(String, String), &Arc<dyn ProviderDriver>)> {
        self.drivers.iter()
    }
}

/// Helper shared by drivers whose `create` must classify a non-success
/// response into the transient/permanent/already-exists buckets from the
/// error handling policy.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> Error {
    if status == reqwest::StatusCode::CONFLICT {
        Error::AlreadyExists(body.to_string())
    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::ProviderTransient(format!("{status}: {body}"))
    } else {
        Error::ProviderPermanent(format!("{status}: {body}"))
    }
}

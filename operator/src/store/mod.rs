mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use ferrite_types::{Crd, GroupVersionPlural, ResourceInstance, Result};

/// Resource Store: durable storage of CRDs and resource instances. The
/// concrete backend (in-memory here) is swappable behind this trait; the
/// rest of the system never depends on the storage technology.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn put_crd(&self, crd: Crd) -> Result<()>;
    async fn get_crd(&self, gvp: &GroupVersionPlural) -> Result<Option<Crd>>;
    async fn delete_crd(&self, name: &str) -> Result<Option<Crd>>;
    async fn list_crds(&self) -> Result<Vec<Crd>>;

    /// Inserts a new resource instance. `name` falls back to a fresh
    /// unique id when `None`. Fails with `UnknownKind` if no CRD is
    /// registered for `gvp`.
    async fn put_resource(
        &self,
        gvp: GroupVersionPlural,
        namespace: Option<String>,
        name: Option<String>,
        spec: serde_json::Value,
    ) -> Result<ResourceInstance>;

    async fn get_resource(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceInstance>>;

    async fn list_resources(
        &self,
        group: Option<&str>,
        kind: Option<&str>,
        plural: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<Vec<ResourceInstance>>;

    /// Looks a resource up by its kind name rather than plural, used by
    /// the dependency gate which only has `{kind, name}` to go on.
    async fn find_by_kind_name(
        &self,
        group: &str,
        kind: &str,
        name: &str,
    ) -> Result<Option<ResourceInstance>>;

    async fn delete_resource(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceInstance>>;

    /// Shallow-merges `patch` onto the stored `spec` (see `util::merge`).
    async fn patch_resource_spec(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
        patch: serde_json::Value,
    ) -> Result<ResourceInstance>;

    async fn set_status(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
        status: serde_json::Value,
    ) -> Result<()>;

    /// Instances of `(group, kind)` whose `status.state == Pending`.
    async fn query_pending(&self, group: &str, kind: &str) -> Result<Vec<ResourceInstance>>;

    /// Resolves the registered version for `(group, plural)`. Reconcile
    /// messages and dependency edges carry no version component, so
    /// anything that needs to address the store precisely (set_status,
    /// get_resource, ...) from one of those inputs goes through this
    /// first.
    async fn resolve_gvp(&self, group: &str, plural: &str) -> Result<GroupVersionPlural>;
}

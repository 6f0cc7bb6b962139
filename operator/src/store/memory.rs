use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use ferrite_types::{Crd, Error, GroupVersionPlural, ResourceInstance, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::util::shallow_merge;

use super::ResourceStore;

/// In-memory `ResourceStore`. Holds two maps guarded by a single
/// `RwLock` each, matching the two tables described for the persisted
/// state: one for CRDs keyed by storage name, one for instances keyed
/// by internal id. All mutations take the write lock for their full
/// duration, which is what gives the store its "serializes its own
/// writes" property.
#[derive(Default)]
pub struct InMemoryStore {
    crds: RwLock<HashMap<String, Crd>>,
    resources: RwLock<HashMap<Uuid, ResourceInstance>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn put_crd(&self, crd: Crd) -> Result<()> {
        let mut crds = self.crds.write().await;
        let key = crd.storage_name();
        if crds.contains_key(&key) {
            return Err(Error::AlreadyExists(format!("crd {key}")));
        }
        crds.insert(key, crd);
        Ok(())
    }

    async fn get_crd(&self, gvp: &GroupVersionPlural) -> Result<Option<Crd>> {
        let crds = self.crds.read().await;
        Ok(crds
            .values()
            .find(|c| c.group == gvp.group && c.version == gvp.version && c.plural == gvp.plural)
            .cloned())
    }

    async fn delete_crd(&self, name: &str) -> Result<Option<Crd>> {
        let removed = self.crds.write().await.remove(name);
        if let Some(crd) = &removed {
            let mut resources = self.resources.write().await;
            resources.retain(|_, r| !(r.group == crd.group && r.version == crd.version && r.plural == crd.plural));
        }
        Ok(removed)
    }

    async fn list_crds(&self) -> Result<Vec<Crd>> {
        Ok(self.crds.read().await.values().cloned().collect())
    }

    async fn put_resource(
        &self,
        gvp: GroupVersionPlural,
        namespace: Option<String>,
        name: Option<String>,
        spec: serde_json::Value,
    ) -> Result<ResourceInstance> {
        let crd = self.get_crd(&gvp).await?.ok_or_else(|| Error::UnknownKind {
            group: gvp.group.clone(),
            version: gvp.version.clone(),
            plural: gvp.plural.clone(),
        })?;
        let name = name.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut resources = self.resources.write().await;
        let exists = resources.values().any(|r| {
            r.group == gvp.group
                && r.version == gvp.version
                && r.plural == gvp.plural
                && r.namespace == namespace
                && r.name == name
        });
        if exists {
            return Err(Error::AlreadyExists(format!("{} {name}", gvp.plural)));
        }

        let instance = ResourceInstance {
            id: Uuid::new_v4(),
            group: gvp.group,
            version: gvp.version,
            plural: gvp.plural,
            kind: crd.kind,
            namespace,
            name,
            spec,
            status: None,
            created_at: Utc::now(),
        };
        resources.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn get_resource(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceInstance>> {
        let resources = self.resources.read().await;
        Ok(resources
            .values()
            .find(|r| {
                r.group == gvp.group
                    && r.version == gvp.version
                    && r.plural == gvp.plural
                    && r.namespace.as_deref() == namespace
                    && r.name == name
            })
            .cloned())
    }

    async fn list_resources(
        &self,
        group: Option<&str>,
        kind: Option<&str>,
        plural: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<Vec<ResourceInstance>> {
        let resources = self.resources.read().await;
        Ok(resources
            .values()
            .filter(|r| group.map_or(true, |g| r.group == g))
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .filter(|r| plural.map_or(true, |p| r.plural == p))
            .filter(|r| namespace.map_or(true, |n| r.namespace.as_deref() == Some(n)))
            .cloned()
            .collect())
    }

    async fn find_by_kind_name(
        &self,
        group: &str,
        kind: &str,
        name: &str,
    ) -> Result<Option<ResourceInstance>> {
        let resources = self.resources.read().await;
        Ok(resources
            .values()
            .find(|r| r.group == group && r.kind == kind && r.name == name)
            .cloned())
    }

    async fn delete_resource(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceInstance>> {
        let mut resources = self.resources.write().await;
        let id = resources
            .values()
            .find(|r| {
                r.group == gvp.group
                    && r.version == gvp.version
                    && r.plural == gvp.plural
                    && r.namespace.as_deref() == namespace
                    && r.name == name
            })
            .map(|r| r.id);
        Ok(match id {
            Some(id) => resources.remove(&id),
            None => None,
        })
    }

    async fn patch_resource_spec(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
        patch: serde_json::Value,
    ) -> Result<ResourceInstance> {
        let mut resources = self.resources.write().await;
        let id = resources
            .values()
            .find(|r| {
                r.group == gvp.group
                    && r.version == gvp.version
                    && r.plural == gvp.plural
                    && r.namespace.as_deref() == namespace
                    && r.name == name
            })
            .map(|r| r.id)
            .ok_or_else(|| Error::NotFound {
                kind: gvp.plural.clone(),
                name: name.to_string(),
            })?;
        let instance = resources.get_mut(&id).unwrap();
        shallow_merge(&mut instance.spec, patch);
        Ok(instance.clone())
    }

    async fn set_status(
        &self,
        gvp: &GroupVersionPlural,
        namespace: Option<&str>,
        name: &str,
        status: serde_json::Value,
    ) -> Result<()> {
        let mut resources = self.resources.write().await;
        let id = resources
            .values()
            .find(|r| {
                r.group == gvp.group
                    && r.version == gvp.version
                    && r.plural == gvp.plural
                    && r.namespace.as_deref() == namespace
                    && r.name == name
            })
            .map(|r| r.id);
        if let Some(id) = id {
            // Last-writer-wins, including partial fields such as
            // lastHealthCheck: no attempt to merge against a concurrent
            // writer's status.
            resources.get_mut(&id).unwrap().status = Some(status);
        }
        Ok(())
    }

    async fn query_pending(&self, group: &str, kind: &str) -> Result<Vec<ResourceInstance>> {
        let resources = self.resources.read().await;
        Ok(resources
            .values()
            .filter(|r| r.group == group && r.kind == kind)
            .filter(|r| matches!(r.state(), Some(ferrite_types::ResourceState::Pending)))
            .cloned()
            .collect())
    }

    async fn resolve_gvp(&self, group: &str, plural: &str) -> Result<GroupVersionPlural> {
        let crds = self.crds.read().await;
        crds.values()
            .find(|c| c.group == group && c.plural == plural)
            .map(|c| GroupVersionPlural::new(c.group.clone(), c.version.clone(), c.plural.clone()))
            .ok_or_else(|| Error::UnknownKind {
                group: group.to_string(),
                version: String::new(),
                plural: plural.to_string(),
            })
    }
}

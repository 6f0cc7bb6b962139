use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::ResourceState;

/// The three coordinates that select a CRD: `(group, version, plural)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupVersionPlural {
    pub group: String,
    pub version: String,
    pub plural: String,
}

impl GroupVersionPlural {
    pub fn new(group: impl Into<String>, version: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            plural: plural.into(),
        }
    }
}

/// Full identity of a resource instance: its kind coordinates plus
/// namespace (absent for cluster-scoped kinds) and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub gvp: GroupVersionPlural,
    pub namespace: Option<String>,
    pub name: String,
}

/// A concrete object of a declared kind.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ResourceInstance {
    pub id: Uuid,

    pub group: String,
    pub version: String,
    pub plural: String,
    pub kind: String,

    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,

    #[serde(default = "serde_json::Value::default")]
    pub spec: serde_json::Value,

    #[serde(default)]
    pub status: Option<serde_json::Value>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ResourceInstance {
    pub fn gvp(&self) -> GroupVersionPlural {
        GroupVersionPlural::new(self.group.clone(), self.version.clone(), self.plural.clone())
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            gvp: self.gvp(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// Reads `status.state`, tolerating an absent or unparseable status
    /// as "no state yet" rather than an error (see drift scan's
    /// `ParseError` policy).
    pub fn state(&self) -> Option<ResourceState> {
        self.status
            .as_ref()?
            .get("state")?
            .as_str()?
            .parse()
            .ok()
    }

    pub fn dependencies(&self) -> Vec<crate::DependencyEdge> {
        self.spec
            .get("dependencies")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether instances of a [`Crd`] carry a namespace component in their identity.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CrdScope {
    #[default]
    Cluster,
    Namespaced,
}

impl std::str::FromStr for CrdScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cluster" => Ok(CrdScope::Cluster),
            "Namespaced" => Ok(CrdScope::Namespaced),
            _ => Err(()),
        }
    }
}

/// A declared kind. Uniquely identified by `(group, version, plural)`; the
/// storage key is `"{plural}.{group}"`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Crd {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,

    #[serde(default, rename = "shortNames")]
    pub short_names: Vec<String>,

    /// Opaque schema blob. Never validated against; CRDs are schemaless
    /// at the store layer by design.
    #[serde(default)]
    pub schema: Option<serde_json::Value>,

    #[serde(default)]
    pub scope: CrdScope,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Crd {
    /// Storage primary key: `"{plural}.{group}"`.
    pub fn storage_name(&self) -> String {
        format!("{}.{}", self.plural, self.group)
    }

    pub fn gvp(&self) -> (&str, &str, &str) {
        (&self.group, &self.version, &self.plural)
    }
}

use serde::{Deserialize, Serialize};

/// A reference to another resource instance that must be `Ready` before
/// the owning instance can be provisioned. `group` defaults to the owning
/// resource's own group when absent.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DependencyEdge {
    #[serde(default)]
    pub group: Option<String>,
    pub kind: String,
    pub name: String,
}

impl DependencyEdge {
    pub fn resolved_group<'a>(&'a self, owner_group: &'a str) -> &'a str {
        self.group.as_deref().unwrap_or(owner_group)
    }
}

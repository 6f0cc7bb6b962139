use serde::{Deserialize, Serialize};

/// Reconciliation state of a resource instance.
///
/// `(none) -> Pending -> Ready`, with `Ready <-> Failed` driven by health
/// checks, `Ready -> PartiallyReady` when a secondary side effect fails
/// after the primary object was created, and `Pending -> Failed` on an
/// unrecoverable provisioning error.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Ready,
    PartiallyReady,
    Failed,
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceState::Pending => "Pending",
            ResourceState::Ready => "Ready",
            ResourceState::PartiallyReady => "PartiallyReady",
            ResourceState::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ResourceState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ResourceState::Pending),
            "Ready" => Ok(ResourceState::Ready),
            "PartiallyReady" => Ok(ResourceState::PartiallyReady),
            "Failed" => Ok(ResourceState::Failed),
            _ => Err(()),
        }
    }
}

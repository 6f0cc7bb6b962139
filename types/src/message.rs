use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    Create,
    Delete,
}

/// Unit of work delivered by the work queue. Carries enough of the
/// instance to reconcile without a roundtrip to the store, since the
/// store row may already be gone by the time a `delete` is handled.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ReconcileMessage {
    pub action: ReconcileAction,
    pub kind: String,
    pub group: String,
    pub plural: String,

    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,

    #[serde(default = "serde_json::Value::default")]
    pub spec: serde_json::Value,

    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

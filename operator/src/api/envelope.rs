use ferrite_types::{Crd, ResourceInstance};
use serde::Serialize;
use serde_json::{json, Value};

/// Kubernetes-style envelope wrapping a single object.
#[derive(Serialize)]
pub struct Envelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Serialize)]
pub struct Metadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "creationTimestamp", skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
}

#[derive(Serialize)]
pub struct EnvelopeList {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub items: Vec<Envelope>,
}

pub fn instance_envelope(group: &str, version: &str, instance: &ResourceInstance) -> Envelope {
    Envelope {
        api_version: format!("{group}/{version}"),
        kind: instance.kind.clone(),
        metadata: Metadata {
            name: instance.name.clone(),
            namespace: instance.namespace.clone(),
            creation_timestamp: Some(instance.created_at.to_rfc3339()),
        },
        spec: instance.spec.clone(),
        status: instance.status.clone(),
    }
}

pub fn instance_list_envelope(group: &str, version: &str, kind: &str, instances: &[ResourceInstance]) -> EnvelopeList {
    EnvelopeList {
        api_version: format!("{group}/{version}"),
        kind: format!("{kind}List"),
        items: instances.iter().map(|i| instance_envelope(group, version, i)).collect(),
    }
}

pub fn crd_envelope(group: &str, crd: &Crd) -> Value {
    json!({
        "apiVersion": format!("{group}/v1"),
        "kind": "CustomResourceDefinition",
        "metadata": { "name": crd.storage_name() },
        "spec": {
            "group": crd.group,
            "version": crd.version,
            "kind": crd.kind,
            "plural": crd.plural,
            "shortNames": crd.short_names,
            "scope": crd.scope,
        },
    })
}

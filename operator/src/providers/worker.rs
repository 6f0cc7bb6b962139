use std::sync::Arc;

use async_trait::async_trait;
use ferrite_types::{Error, Result};
use serde_json::{json, Value};

use super::{Binding, ExternalObject, ProviderClient, ProviderDriver};
use crate::providers::http::ensure_success;

/// Driver for a network-exposed compute resource. Unlike `D1`/`Queue`,
/// `Worker` carries bindings to other resources and a health probe
/// against its custom hostname.
pub struct WorkerDriver {
    client: Arc<dyn ProviderClient>,
    health_client: reqwest::Client,
}

impl WorkerDriver {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self {
            client,
            health_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ProviderDriver for WorkerDriver {
    fn kind(&self) -> &'static str {
        "Worker"
    }

    async fn create(&self, external_name: &str, spec: &Value) -> Result<super::CreateOutcome> {
        let (status, body) = self
            .client
            .post(
                "/workers",
                &json!({ "name": external_name, "script": spec.get("script") }),
            )
            .await?;
        if status == reqwest::StatusCode::CONFLICT {
            return Ok(super::CreateOutcome::AlreadyExists);
        }
        let body = ensure_success(status, body)?;
        let external_id = body["id"].as_str().unwrap_or_default().to_string();
        let endpoint = body["endpoint"].as_str().map(str::to_string);
        Ok(super::CreateOutcome::Created { external_id, endpoint })
    }

    async fn list(&self) -> Result<Vec<ExternalObject>> {
        let (status, body) = self.client.get("/workers").await?;
        let body = ensure_success(status, body)?;
        let items = body.as_array().cloned().unwrap_or_default();
        Ok(items
            .into_iter()
            .map(|v| ExternalObject {
                name: v["name"].as_str().unwrap_or_default().to_string(),
                id: v["id"].as_str().unwrap_or_default().to_string(),
                attributes: v,
            })
            .collect())
    }

    async fn delete(&self, external_id: &str) -> Result<()> {
        let status = self.client.delete(&format!("/workers/{external_id}")).await?;
        ensure_success(status, Value::Null)?;
        Ok(())
    }

    async fn get_bindings(&self, external_id: &str) -> Result<Vec<Binding>> {
        let (status, body) = self.client.get(&format!("/workers/{external_id}/bindings")).await?;
        let body = ensure_success(status, body)?;
        let items = body.as_array().cloned().unwrap_or_default();
        Ok(items
            .into_iter()
            .map(|v| Binding {
                name: v["name"].as_str().unwrap_or_default().to_string(),
                binding_type: v["type"].as_str().unwrap_or_default().to_string(),
                id: v["id"].as_str().unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn put_bindings(&self, external_id: &str, bindings: &[Binding]) -> Result<()> {
        let payload: Vec<Value> = bindings
            .iter()
            .map(|b| json!({ "name": b.name, "type": b.binding_type, "id": b.id }))
            .collect();
        let (status, body) = self
            .client
            .put(&format!("/workers/{external_id}/bindings"), &json!(payload))
            .await?;
        ensure_success(status, body)?;
        Ok(())
    }

    fn supports_bindings(&self) -> bool {
        true
    }

    fn supports_health(&self) -> bool {
        true
    }

    async fn health(&self, hostname: &str) -> Result<()> {
        let url = format!("https://{hostname}/");
        let resp = self
            .health_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ProviderTransient(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Error::ProviderTransient(format!("health check returned {}", resp.status())))
        }
    }
}

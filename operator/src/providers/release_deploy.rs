use std::sync::Arc;

use async_trait::async_trait;
use ferrite_types::Result;
use serde_json::{json, Value};

use super::{ExternalObject, ProviderClient, ProviderDriver};
use crate::providers::http::ensure_success;

/// Driver for the orchestrating resource of the composite provisioning
/// pattern. This driver only owns the primary external object; the
/// ordered creation/deletion of its `ReleaseVersion` and `Deployment`
/// children is orchestrated by the reconciler (see
/// `reconciler::release_deploy`), not by this driver.
pub struct ReleaseDeployDriver {
    client: Arc<dyn ProviderClient>,
}

impl ReleaseDeployDriver {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self { client }
    }

    /// Fetches release metadata from the external source of truth ahead
    /// of creating the primary object. Failures here are transient by
    /// nature (it's a plain GET) and propagate as such.
    pub async fn fetch_metadata(&self, reference: &str) -> Result<Value> {
        let (status, body) = self.client.get(&format!("/releases/meta?ref={reference}")).await?;
        ensure_success(status, body)
    }
}

#[async_trait]
impl ProviderDriver for ReleaseDeployDriver {
    fn kind(&self) -> &'static str {
        "ReleaseDeploy"
    }

    async fn create(&self, external_name: &str, spec: &Value) -> Result<super::CreateOutcome> {
        let reference = spec.get("ref").and_then(Value::as_str).unwrap_or_default();
        let metadata = self.fetch_metadata(reference).await?;
        let (status, body) = self
            .client
            .post("/releases", &json!({ "name": external_name, "metadata": metadata }))
            .await?;
        if status == reqwest::StatusCode::CONFLICT {
            return Ok(super::CreateOutcome::AlreadyExists);
        }
        let body = ensure_success(status, body)?;
        let external_id = body["id"].as_str().unwrap_or_default().to_string();
        Ok(super::CreateOutcome::Created {
            external_id,
            endpoint: None,
        })
    }

    async fn list(&self) -> Result<Vec<ExternalObject>> {
        let (status, body) = self.client.get("/releases").await?;
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
        let status = self.client.delete(&format!("/releases/{external_id}")).await?;
        ensure_success(status, Value::Null)?;
        Ok(())
    }
}

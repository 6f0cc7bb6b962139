use std::sync::Arc;

use async_trait::async_trait;
use ferrite_types::Result;
use serde_json::{json, Value};

use super::{ExternalObject, ProviderClient, ProviderDriver};
use crate::providers::http::ensure_success;

/// Driver for a managed message-queue resource. Same shape as `D1`: no
/// bindings, no health probe.
pub struct QueueDriver {
    client: Arc<dyn ProviderClient>,
}

impl QueueDriver {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderDriver for QueueDriver {
    fn kind(&self) -> &'static str {
        "Queue"
    }

    async fn create(&self, external_name: &str, _spec: &Value) -> Result<super::CreateOutcome> {
        let (status, body) = self
            .client
            .post("/queues", &json!({ "name": external_name }))
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
        let (status, body) = self.client.get("/queues").await?;
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
        let status = self.client.delete(&format!("/queues/{external_id}")).await?;
        ensure_success(status, Value::Null)?;
        Ok(())
    }
}

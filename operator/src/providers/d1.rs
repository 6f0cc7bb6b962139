use std::sync::Arc;

use async_trait::async_trait;
use ferrite_types::Result;
use serde_json::{json, Value};

use super::{ExternalObject, ProviderClient, ProviderDriver};
use crate::providers::http::ensure_success;

/// Driver for a managed database resource. No bindings, no health
/// probe: a `D1` instance is either provisioned or it isn't.
pub struct D1Driver {
    client: Arc<dyn ProviderClient>,
}

impl D1Driver {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderDriver for D1Driver {
    fn kind(&self) -> &'static str {
        "D1"
    }

    async fn create(&self, external_name: &str, _spec: &Value) -> Result<super::CreateOutcome> {
        let (status, body) = self
            .client
            .post("/d1/databases", &json!({ "name": external_name }))
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
        let (status, body) = self.client.get("/d1/databases").await?;
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
        let status = self.client.delete(&format!("/d1/databases/{external_id}")).await?;
        ensure_success(status, Value::Null)?;
        Ok(())
    }
}

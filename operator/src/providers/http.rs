use async_trait::async_trait;
use ferrite_types::{Error, Result};
use serde_json::Value;

use super::classify_status;

/// Transport abstraction shared by all provider drivers, so the drivers
/// themselves contain only request-shaping and response-classifying
/// logic and never build a `reqwest::Client` of their own.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<(reqwest::StatusCode, Value)>;
    async fn post(&self, path: &str, body: &Value) -> Result<(reqwest::StatusCode, Value)>;
    async fn put(&self, path: &str, body: &Value) -> Result<(reqwest::StatusCode, Value)>;
    async fn delete(&self, path: &str) -> Result<reqwest::StatusCode>;
}

/// `ProviderClient` backed by a real HTTP API, used by every shipped
/// driver. `base_url` and `token` are read from per-driver environment
/// variables at construction time and never logged.
pub struct ReqwestProviderClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ReqwestProviderClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn parse(resp: reqwest::Response) -> Result<(reqwest::StatusCode, Value)> {
        let status = resp.status();
        let body = resp.text().await.map_err(to_transient)?;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        Ok((status, value))
    }
}

fn to_transient(e: reqwest::Error) -> Error {
    Error::ProviderTransient(e.to_string())
}

#[async_trait]
impl ProviderClient for ReqwestProviderClient {
    async fn get(&self, path: &str) -> Result<(reqwest::StatusCode, Value)> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(to_transient)?;
        Self::parse(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(reqwest::StatusCode, Value)> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(to_transient)?;
        Self::parse(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<(reqwest::StatusCode, Value)> {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(to_transient)?;
        Self::parse(resp).await
    }

    async fn delete(&self, path: &str) -> Result<reqwest::StatusCode> {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(to_transient)?;
        Ok(resp.status())
    }
}

/// Raises a classified error if `status` does not indicate success,
/// otherwise returns the parsed body unchanged.
pub(crate) fn ensure_success(status: reqwest::StatusCode, body: Value) -> Result<Value> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(classify_status(status, &body.to_string()))
    }
}

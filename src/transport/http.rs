use super::{Transport, TransportError, TransportResult};
use crate::config::ConsoleConfig;
use crate::core::{ConsoleError, Result};
use crate::upload::StagedAsset;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

/// `reqwest`-backed transport bound to one API root.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ConsoleConfig,
}

impl HttpTransport {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConsoleError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    async fn send(&self, method: &'static str, path: &str, request: RequestBuilder) -> TransportResult<Value> {
        debug!(method, path, "sending request");

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string));
            debug!(method, path, status = status.as_u16(), "request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> TransportResult<Value> {
        let request = self.client.get(self.config.url_for(path));
        self.send("GET", path, request).await
    }

    async fn post(&self, path: &str, body: &Value) -> TransportResult<Value> {
        let request = self.client.post(self.config.url_for(path)).json(body);
        self.send("POST", path, request).await
    }

    async fn put(&self, path: &str, body: &Value) -> TransportResult<Value> {
        let request = self.client.put(self.config.url_for(path)).json(body);
        self.send("PUT", path, request).await
    }

    async fn delete(&self, path: &str) -> TransportResult<Value> {
        let request = self.client.delete(self.config.url_for(path));
        self.send("DELETE", path, request).await
    }

    async fn upload(&self, path: &str, field: &str, asset: &StagedAsset) -> TransportResult<Value> {
        let part = Part::bytes(asset.bytes.clone())
            .file_name(asset.file_name.clone())
            .mime_str(&asset.content_type)
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let form = Form::new().part(field.to_string(), part);

        let request = self.client.post(self.config.url_for(path)).multipart(form);
        self.send("POST", path, request).await
    }
}

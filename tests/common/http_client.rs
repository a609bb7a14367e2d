//! HTTP client helpers for tests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

const STATUS_HEADER: &str = "x-asksphere-status";
const USER_ID_HEADER: &str = "x-user-id";

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

/// Status code, `x-asksphere-status` header and JSON body of one call.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub status_header: String,
    pub body: serde_json::Value,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    async fn into_api_response(resp: reqwest::Response) -> Result<ApiResponse, TestClientError> {
        let status = resp.status().as_u16();
        let status_header = resp
            .headers()
            .get(STATUS_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text)
            .map_err(|_| TestClientError::UnexpectedStatus(status, text))?;

        Ok(ApiResponse {
            status,
            status_header,
            body,
        })
    }

    pub async fn moderate(
        &self,
        user: Option<&str>,
        community_id: &str,
        text: &str,
    ) -> Result<ApiResponse, TestClientError> {
        let mut builder = self
            .client
            .post(self.url("/v1/moderate"))
            .json(&serde_json::json!({ "community_id": community_id, "text": text }));
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }

        Self::into_api_response(builder.send().await?).await
    }

    pub async fn active_bans(&self, community_id: &str) -> Result<ApiResponse, TestClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/communities/{}/bans", community_id)))
            .send()
            .await?;

        Self::into_api_response(resp).await
    }

    pub async fn health(&self) -> Result<HealthResponse, TestClientError> {
        let resp = self.client.get(self.url("/healthz")).send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(TestClientError::UnexpectedStatus(status, body))
        }
    }

    pub async fn ready(&self) -> Result<ReadyResponse, TestClientError> {
        let resp = self.client.get(self.url("/ready")).send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(TestClientError::UnexpectedStatus(status, body))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentStatus {
    pub http: String,
    pub embedder_mode: String,
    pub classifier_mode: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub components: ComponentStatus,
}

impl ReadyResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0} - Body: {1}")]
    UnexpectedStatus(u16, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url_building() {
        let client = TestClient::new("http://localhost:8080");
        assert_eq!(client.url("/healthz"), "http://localhost:8080/healthz");
        assert_eq!(client.url("healthz"), "http://localhost:8080/healthz");
    }
}

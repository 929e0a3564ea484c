//! REST transport to one media server.
//!
//! Every call returns the raw status and body; deciding whether a non-2xx
//! status is fatal belongs to the caller. Only network-level failures are
//! errors here.

use crate::config::ServerProfile;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_ok(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Parses the body of a call whose success is required, mapping non-2xx
    /// and decode failures to transport errors.
    pub fn require<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        if !self.is_success() {
            return Err(Error::Status {
                path: path.to_string(),
                status: self.status,
            });
        }
        self.json().map_err(|source| Error::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse>;
    async fn post(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse>;
    async fn delete(&self, path: &str) -> Result<ApiResponse>;
}

/// `reqwest`-backed transport bound to a profile's base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(profile: &ServerProfile, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Http {
                path: profile.api_url.clone(),
                source,
            })?;
        Ok(Self::with_client(client, &profile.api_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| Error::Http {
            path: path.to_string(),
            source,
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| Error::Http {
            path: path.to_string(),
            source,
        })?;

        tracing::debug!("{} -> HTTP {} ({} bytes)", path, status, body.len());
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.send(Method::POST, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, path, None).await
    }
}

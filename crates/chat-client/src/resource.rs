//! Remote image resources: HEAD probe for classification, GET for payload.

use std::future::Future;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};

use crate::{ClientError, DEFAULT_USER_AGENT};

/// Classification of a remote resource from a header-only request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// Reachable, ordinary image.
    Static,
    /// Reachable, backed by an animated GIF.
    Animated,
    /// Non-success status or transport failure.
    Unreachable,
}

/// Probes and downloads remote resources.
///
/// Implementations perform no caching; callers own negative caching.
pub trait ResourceFetcher: Send + Sync {
    fn probe(&self, url: &str) -> impl Future<Output = ProbeResult> + Send;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

/// Classify a HEAD response.
pub fn classify(status: StatusCode, content_type: Option<&str>) -> ProbeResult {
    if !status.is_success() {
        return ProbeResult::Unreachable;
    }
    match content_type {
        Some(ct) if ct.to_ascii_lowercase().contains("image/gif") => ProbeResult::Animated,
        _ => ProbeResult::Static,
    }
}

/// reqwest-backed [`ResourceFetcher`].
pub struct ResourceClient {
    http: reqwest::Client,
    user_agent: String,
}

impl ResourceClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for ResourceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceFetcher for ResourceClient {
    async fn probe(&self, url: &str) -> ProbeResult {
        let resp = match self
            .http
            .head(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(url, error = %e, "Resource probe failed");
                return ProbeResult::Unreachable;
            }
        };

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let result = classify(resp.status(), content_type);
        tracing::debug!(url, status = resp.status().as_u16(), ?result, "Resource probed");
        result
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

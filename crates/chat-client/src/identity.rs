//! Remote identity lookup.
//!
//! Given a lowercase login, asks the identity API for the display-cased
//! name. The API answers `GET {base}{login}` with a JSON object carrying a
//! `display_name` field.

use std::future::Future;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::{ParseError, Url};

use crate::ClientError;

pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://api.twitch.tv/kraken/users/";

const LOOKUP_ACCEPT: &str = "application/vnd.twitchtv.v5+json";

/// Resolves a lowercase login to its display-cased form.
pub trait IdentityLookup: Send + Sync {
    fn lookup_display_name(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// HTTP identity lookup client.
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    client_id: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            client_id: None,
        }
    }

    /// Send a `Client-Id` header with every lookup.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        let client_id = client_id.into();
        self.client_id = (!client_id.trim().is_empty()).then_some(client_id);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The login is always appended as a single, percent-encoded path segment.
    fn lookup_url(&self, login: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| ClientError::UrlParse(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(login);
        Ok(url)
    }
}

impl Default for IdentityClient {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_BASE_URL)
    }
}

impl IdentityLookup for IdentityClient {
    async fn lookup_display_name(&self, login: &str) -> Result<String, ClientError> {
        let url = self.lookup_url(login)?;
        let mut req = self.http.get(url).header(ACCEPT, LOOKUP_ACCEPT);
        if let Some(client_id) = &self.client_id {
            req = req.header("Client-Id", client_id);
        }
        let resp = req.send().await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let display_name = parse_display_name(&body)?;
        tracing::debug!(login, display_name = %display_name, "Resolved display name");
        Ok(display_name)
    }
}

/// Extract `display_name` from a lookup response body.
pub fn parse_display_name(body: &str) -> Result<String, ClientError> {
    let resp: IdentityResponse = serde_json::from_str(body)?;
    resp.display_name
        .filter(|name| !name.trim().is_empty())
        .ok_or(ClientError::MissingField("display_name"))
}

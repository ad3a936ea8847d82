//! HTTP collaborators for the chat overlay engine.
//!
//! Provides the identity lookup used to resolve display-cased usernames
//! and the resource client used to probe and download emoji/badge images.

pub mod identity;
pub mod resource;

pub use identity::{IdentityClient, IdentityLookup};
pub use resource::{ProbeResult, ResourceClient, ResourceFetcher};

/// Browser-like user agent; some emoji CDNs reject requests without one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Unified error type for the chat-client crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Response missing field: {0}")]
    MissingField(&'static str),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

//! Runtime engine configuration loaded from the environment.

use anyhow::{Context, bail};
use chat_core::{CasingPolicy, CasingSettings};

use super::defaults::{describe, get_default};
use super::validation::validate_setting;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub casing_policy: CasingPolicy,
    pub infer_casing_from_body: bool,
    pub identity_base_url: String,
    pub identity_client_id: Option<String>,
    pub emoji_workers: usize,
    pub emoji_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            casing_policy: CasingPolicy::None,
            infer_casing_from_body: false,
            identity_base_url: chat_client::identity::DEFAULT_LOOKUP_BASE_URL.into(),
            identity_client_id: None,
            emoji_workers: 4,
            emoji_queue_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty or missing values fall back
    /// to defaults; anything else must pass validation.
    pub fn load_from<G>(lookup: G) -> Result<Self, anyhow::Error>
    where
        G: Fn(&str) -> Option<String>,
    {
        let g = |key: &str| -> Result<String, anyhow::Error> {
            let value = lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| get_default(key).map(str::to_string))
                .unwrap_or_default();
            if let Err(e) = validate_setting(key, &value) {
                let about = describe(key).unwrap_or("unknown setting");
                bail!("invalid {key}={value:?}: {e} ({about})");
            }
            Ok(value)
        };

        let client_id = g("IDENTITY_CLIENT_ID")?;

        Ok(Self {
            casing_policy: g("CASING_POLICY")?
                .parse()
                .context("CASING_POLICY")?,
            infer_casing_from_body: g("INFER_CASING_FROM_BODY")? == "true",
            identity_base_url: g("IDENTITY_LOOKUP_BASE_URL")?,
            identity_client_id: if client_id.is_empty() {
                None
            } else {
                Some(client_id)
            },
            emoji_workers: g("EMOJI_WORKER_COUNT")?
                .parse()
                .context("EMOJI_WORKER_COUNT")?,
            emoji_queue_capacity: g("EMOJI_QUEUE_CAPACITY")?
                .parse()
                .context("EMOJI_QUEUE_CAPACITY")?,
        })
    }

    pub fn casing_settings(&self) -> CasingSettings {
        CasingSettings {
            policy: self.casing_policy,
            infer_from_body: self.infer_casing_from_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<EngineConfig, anyhow::Error> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::load_from(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.casing_policy, CasingPolicy::None);
        assert!(!config.infer_casing_from_body);
        assert_eq!(config.identity_base_url, "https://api.twitch.tv/kraken/users/");
        assert_eq!(config.identity_client_id, None);
        assert_eq!(config.emoji_workers, 4);
        assert_eq!(config.emoji_queue_capacity, 256);
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("CASING_POLICY", "lookup"),
            ("INFER_CASING_FROM_BODY", "true"),
            ("IDENTITY_LOOKUP_BASE_URL", "http://localhost:9000/users/"),
            ("IDENTITY_CLIENT_ID", "abc123"),
            ("EMOJI_WORKER_COUNT", "2"),
            ("EMOJI_QUEUE_CAPACITY", " 32 "),
        ])
        .unwrap();
        assert_eq!(
            config.casing_settings(),
            CasingSettings {
                policy: CasingPolicy::RemoteLookup,
                infer_from_body: true,
            }
        );
        assert_eq!(config.identity_base_url, "http://localhost:9000/users/");
        assert_eq!(config.identity_client_id.as_deref(), Some("abc123"));
        assert_eq!(config.emoji_workers, 2);
        assert_eq!(config.emoji_queue_capacity, 32);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("CASING_POLICY", "  "), ("EMOJI_WORKER_COUNT", "")]).unwrap();
        assert_eq!(config.casing_policy, CasingPolicy::None);
        assert_eq!(config.emoji_workers, 4);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = load(&[("EMOJI_WORKER_COUNT", "64")]).unwrap_err();
        assert!(err.to_string().contains("EMOJI_WORKER_COUNT"));
        assert!(err.to_string().contains("Background emoji download workers"));
        assert!(load(&[("CASING_POLICY", "loud")]).is_err());
    }
}

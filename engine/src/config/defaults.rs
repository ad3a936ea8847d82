//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

use chat_client::identity::DEFAULT_LOOKUP_BASE_URL;

type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    (
        "CASING_POLICY",
        "none",
        "Username casing: none, all_caps, all_lower, first_cap or lookup",
    ),
    (
        "INFER_CASING_FROM_BODY",
        "false",
        "Use the casing a sender types for their own name",
    ),
    (
        "IDENTITY_LOOKUP_BASE_URL",
        DEFAULT_LOOKUP_BASE_URL,
        "Base URL of the display-name lookup API",
    ),
    ("IDENTITY_CLIENT_ID", "", "Client-Id header for display-name lookups"),
    ("EMOJI_WORKER_COUNT", "4", "Background emoji download workers"),
    ("EMOJI_QUEUE_CAPACITY", "256", "Maximum queued emoji loads"),
];

#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}

/// One-line description of a setting key, or `None` if not defined.
pub fn describe(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.description)
}

/// Every known key, in declaration order.
pub fn keys() -> impl Iterator<Item = &'static str> {
    DEFS.iter().map(|&(key, _, _)| key)
}

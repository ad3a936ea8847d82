//! Display-name resolution.
//!
//! Each lowercase handle is resolved once per session and cached. A match
//! of the sender's own handle in the message body (when inference is on)
//! overrides whatever was cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};

use chat_client::IdentityLookup;
use regex::RegexBuilder;

use crate::models::{CasingPolicy, MessageType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CasingSettings {
    pub policy: CasingPolicy,
    /// Take the sender's casing from their own message when it appears there.
    pub infer_from_body: bool,
}

pub struct UsernameResolver<L> {
    lookup: L,
    settings: RwLock<CasingSettings>,
    cases: Mutex<HashMap<String, String>>,
    lookup_failures: AtomicU64,
}

impl<L: IdentityLookup> UsernameResolver<L> {
    pub fn new(lookup: L, settings: CasingSettings) -> Self {
        Self {
            lookup,
            settings: RwLock::new(settings),
            cases: Mutex::new(HashMap::new()),
            lookup_failures: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> CasingSettings {
        match self.settings.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Replace the active settings. Cached names are kept; callers clear
    /// explicitly when the operator changes policy.
    pub fn set_settings(&self, settings: CasingSettings) {
        let mut guard = match self.settings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
    }

    pub fn set_policy(&self, policy: CasingPolicy) {
        let infer_from_body = self.settings().infer_from_body;
        self.set_settings(CasingSettings {
            policy,
            infer_from_body,
        });
    }

    /// Resolve `raw` to the form shown to viewers.
    ///
    /// Join notices pass through untouched. With [`CasingPolicy::RemoteLookup`]
    /// the identity API is queried for parsable message types; a failed
    /// lookup falls back to `raw` and is retried on the next message.
    pub async fn resolve(&self, raw: &str, body: &str, message_type: MessageType) -> String {
        if !message_type.has_speaking_identity() {
            return raw.to_string();
        }

        let key = raw.to_lowercase();
        let settings = self.settings();

        if settings.infer_from_body {
            if let Some(found) = find_in_body(raw, body) {
                self.cases().insert(key, found.clone());
                return found;
            }
        }

        let cached = self.cases().get(&key).cloned();
        if let Some(cached) = cached {
            return cached;
        }

        let derived = match settings.policy {
            CasingPolicy::None => raw.to_string(),
            CasingPolicy::AllCaps => raw.to_uppercase(),
            CasingPolicy::AllLower => key.clone(),
            CasingPolicy::FirstCap => first_cap(raw),
            CasingPolicy::RemoteLookup => {
                if !message_type.contains_parsable_username() {
                    return raw.to_string();
                }
                match self.lookup.lookup_display_name(&key).await {
                    Ok(name) => name,
                    Err(e) => {
                        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(login = %key, error = %e, "Display name lookup failed");
                        return raw.to_string();
                    }
                }
            }
        };

        // A body match may have landed while the lookup was in flight.
        self.cases().entry(key).or_insert(derived).clone()
    }

    /// Forget every cached display name.
    pub fn clear(&self) {
        let mut cases = self.cases();
        let dropped = cases.len();
        cases.clear();
        tracing::debug!(dropped, "Casing cache cleared");
    }

    pub fn cached(&self, handle: &str) -> Option<String> {
        self.cases().get(&handle.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.cases().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases().is_empty()
    }

    /// Lookups that failed since startup.
    pub fn lookup_failures(&self) -> u64 {
        self.lookup_failures.load(Ordering::Relaxed)
    }

    fn cases(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.cases.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Whole-word, case-insensitive match of `handle` in `body`, returned with
/// the casing the sender typed.
fn find_in_body(handle: &str, body: &str) -> Option<String> {
    if !mentions(handle, body) {
        return None;
    }
    let pattern = format!(r"\b{}\b", regex::escape(handle));
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;
    re.find(body).map(|m| m.as_str().to_string())
}

/// Cheap substring test run before compiling a word-boundary pattern.
fn mentions(handle: &str, body: &str) -> bool {
    !handle.is_empty() && body.to_lowercase().contains(&handle.to_lowercase())
}

fn first_cap(handle: &str) -> String {
    let mut chars = handle.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

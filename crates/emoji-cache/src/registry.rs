//! Permanent record of resource URLs that failed a probe.

use std::collections::HashSet;
use std::sync::Mutex;

/// Set of URLs known to be unreachable.
///
/// Membership never expires; a URL added here is not requested again for
/// as long as the registry lives. Share one instance between caches with
/// an `Arc`.
#[derive(Debug, Default)]
pub struct NegativeResourceRegistry {
    urls: Mutex<HashSet<String>>,
}

impl NegativeResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        let guard = match self.urls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.contains(url)
    }

    /// Mark a URL unreachable. Returns `true` if it was not already known.
    pub fn insert(&self, url: &str) -> bool {
        let mut guard = match self.urls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let added = guard.insert(url.to_string());
        if added {
            tracing::info!(url, known = guard.len(), "Resource marked unreachable");
        }
        added
    }

    pub fn len(&self) -> usize {
        match self.urls.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Token-indexed emoji cache.
//!
//! Records are registered up front from emoji source listings; their images
//! are fetched the first time a renderer asks for them.

mod load;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chat_client::ResourceFetcher;

use crate::record::{EmojiImage, EmojiRecord};
use crate::registry::NegativeResourceRegistry;

/// A token in message text that maps to an emoji.
#[derive(Debug, Clone)]
pub struct TokenMatch {
    /// Byte offset of the token in the scanned text.
    pub start: usize,
    pub end: usize,
    pub record: Arc<EmojiRecord>,
}

/// In-memory emoji cache.
///
/// Emoji records are indexed by identifier; several records may share one.
pub struct EmojiCache<F> {
    pub(super) fetcher: F,
    pub(super) registry: Arc<NegativeResourceRegistry>,
    /// Identifier -> records, in registration order.
    records: RwLock<HashMap<String, Vec<Arc<EmojiRecord>>>>,
}

impl<F: ResourceFetcher> EmojiCache<F> {
    pub fn new(fetcher: F, registry: Arc<NegativeResourceRegistry>) -> Self {
        Self {
            fetcher,
            registry,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<NegativeResourceRegistry> {
        &self.registry
    }

    /// Register a record under its identifier.
    pub fn insert(&self, record: EmojiRecord) -> Arc<EmojiRecord> {
        let record = Arc::new(record);
        self.write()
            .entry(record.identifier().to_string())
            .or_default()
            .push(Arc::clone(&record));
        record
    }

    /// All records for an identifier, in registration order.
    pub fn records(&self, identifier: &str) -> Vec<Arc<EmojiRecord>> {
        self.read().get(identifier).cloned().unwrap_or_default()
    }

    pub fn first(&self, identifier: &str) -> Option<Arc<EmojiRecord>> {
        self.read()
            .get(identifier)
            .and_then(|records| records.first().cloned())
    }

    /// The record registered as a substitute for `identifier`, if any.
    ///
    /// Used for badges such as a custom moderator badge replacing the stock one.
    pub fn replacement_for(&self, identifier: &str) -> Option<Arc<EmojiRecord>> {
        self.read()
            .values()
            .flatten()
            .find(|record| record.replaces() == Some(identifier))
            .cloned()
    }

    /// Find emoji tokens in whitespace-separated message text.
    pub fn scan(&self, text: &str) -> Vec<TokenMatch> {
        let records = self.read();
        let mut matches = Vec::new();
        for (start, token) in split_tokens(text) {
            let Some(record) = records.get(token).and_then(|r| r.first()) else {
                continue;
            };
            matches.push(TokenMatch {
                start,
                end: start + token.len(),
                record: Arc::clone(record),
            });
        }
        matches
    }

    /// Resolve the first record for `identifier` that yields an image.
    pub async fn image_for_token(
        &self,
        identifier: &str,
        want_animated: bool,
    ) -> Option<(Arc<EmojiRecord>, EmojiImage)> {
        for record in self.records(identifier) {
            if let Some(image) = self.get_image(&record, want_animated).await {
                return Some((record, image));
            }
        }
        None
    }

    /// Warm both slots of a record.
    pub async fn preload(&self, record: &EmojiRecord) {
        let _ = self.get_image(record, true).await;
    }

    /// Drop every record. The negative registry is left intact.
    pub fn clear(&self) {
        let mut records = self.write();
        let count = records.len();
        records.clear();
        tracing::info!(count, "Emoji cache cleared");
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Arc<EmojiRecord>>>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Arc<EmojiRecord>>>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Split on whitespace, keeping byte offsets.
fn split_tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(char::is_whitespace)
        .scan(0usize, move |offset, token| {
            let start = *offset;
            *offset += token.len();
            // Advance past the separator that ended this token.
            if let Some(sep) = text[*offset..].chars().next() {
                *offset += sep.len_utf8();
            }
            Some((start, token))
        })
        .filter(|(_, token)| !token.is_empty())
}

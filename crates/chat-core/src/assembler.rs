use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{ChatMessage, MessageType};

/// Stamps chat lines with the sender's running post count.
///
/// Counts are keyed by the lowercase username so casing variations of the
/// same sender share one counter. Every assembled line counts, joins included.
#[derive(Default)]
pub struct MessageAssembler {
    counts: Mutex<HashMap<String, u32>>,
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assemble(
        &self,
        message_type: MessageType,
        username: &str,
        body: impl Into<String>,
    ) -> ChatMessage {
        let post_count = {
            let mut counts = self.counts();
            let count = counts.entry(username.to_lowercase()).or_insert(0);
            *count = count.saturating_add(1);
            *count
        };
        ChatMessage::new(message_type, username.to_string(), body.into(), post_count)
    }

    /// Zero every counter. Paired with a casing-cache clear on session reset.
    pub fn reset(&self) {
        self.counts().clear();
    }

    pub fn post_count(&self, username: &str) -> u32 {
        self.counts()
            .get(&username.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        match self.counts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_lowercase_user() {
        let assembler = MessageAssembler::new();
        let counts: Vec<u32> = ["bob", "Bob", "BOB"]
            .into_iter()
            .map(|name| assembler.assemble(MessageType::Normal, name, "hi").post_count())
            .collect();
        assert_eq!(counts, vec![1, 2, 3]);

        let other = assembler.assemble(MessageType::Action, "alice", "waves");
        assert_eq!(other.post_count(), 1);
        assert_eq!(other.display_username(), "alice");
        assert_eq!(other.body(), "waves");
        assert_eq!(other.message_type(), MessageType::Action);
    }

    #[test]
    fn joins_are_counted() {
        let assembler = MessageAssembler::new();
        assembler.assemble(MessageType::Join, "carol", "joined #chan.");
        let msg = assembler.assemble(MessageType::Normal, "carol", "hello");
        assert_eq!(msg.post_count(), 2);
    }

    #[test]
    fn reset_restarts_counts() {
        let assembler = MessageAssembler::new();
        for _ in 0..5 {
            assembler.assemble(MessageType::Normal, "dave", "spam");
        }
        assert_eq!(assembler.post_count("Dave"), 5);

        assembler.reset();
        assert_eq!(assembler.post_count("dave"), 0);
        assert_eq!(
            assembler.assemble(MessageType::Normal, "dave", "again").post_count(),
            1
        );
    }
}

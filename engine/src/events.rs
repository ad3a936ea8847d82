//! Inputs consumed by the engine.
//!
//! Chat events arrive already parsed from the chat network. Configuration
//! events come from the operator's settings surface. Emoji definitions are
//! fed in by whatever loads the emote sets for the channel.

use chat_core::CasingPolicy;
use emoji_cache::{EmojiError, EmojiKind, EmojiRecord, TintColor};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Join {
        channel: String,
        sender: String,
    },
    Action {
        channel: String,
        sender: String,
        action: String,
    },
    Message {
        channel: String,
        sender: String,
        body: String,
    },
    /// Operator-typed line injected from the control surface.
    Manual {
        sender: String,
        body: String,
    },
    PrivateMessage {
        sender: String,
        body: String,
    },
    ChannelBan {
        channel: String,
        host_mask: String,
    },
    ChannelUnban {
        channel: String,
        host_mask: String,
    },
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "config", rename_all = "snake_case")]
pub enum ConfigEvent {
    /// Policy or inference toggle changed; cached casings are dropped.
    CasingChanged {
        policy: CasingPolicy,
        #[serde(default)]
        infer_from_body: bool,
    },
    /// Emote sets are being reloaded; drop every emoji record.
    EmojiSourcesChanged,
    /// Full session reset, e.g. after a reconnect.
    SessionReset,
}

/// One emoji or badge as described by an emote set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmojiDefinition {
    pub emoji: String,
    pub url: String,
    pub kind: EmojiKind,
    #[serde(default)]
    pub replaces: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// `#rrggbb` background for tinted badges.
    #[serde(default)]
    pub tint: Option<String>,
    #[serde(default)]
    pub animated: bool,
    /// The source already knows the payload is a GIF.
    #[serde(default)]
    pub animated_gif: bool,
}

impl EmojiDefinition {
    pub fn into_record(self) -> Result<EmojiRecord, EmojiError> {
        let mut record = EmojiRecord::new(self.emoji, &self.url, self.kind)?
            .with_animated_container(self.animated)
            .with_animated_gif(self.animated_gif);
        if let (Some(width), Some(height)) = (self.width, self.height) {
            record = record.with_size(width, height);
        }
        if let Some(replaces) = self.replaces {
            record = record.replacing(replaces);
        }
        match self.tint.as_deref().map(TintColor::from_hex) {
            Some(Some(color)) => record = record.with_tint(color),
            Some(None) => {
                tracing::warn!(identifier = record.identifier(), "Ignoring malformed tint color");
            }
            None => {}
        }
        Ok(record)
    }
}

/// Anything the dispatcher accepts on its input channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EngineInput {
    Chat(ChatEvent),
    Config(ConfigEvent),
    Emoji(EmojiDefinition),
}

impl From<ChatEvent> for EngineInput {
    fn from(event: ChatEvent) -> Self {
        Self::Chat(event)
    }
}

impl From<ConfigEvent> for EngineInput {
    fn from(event: ConfigEvent) -> Self {
        Self::Config(event)
    }
}

impl From<EmojiDefinition> for EngineInput {
    fn from(def: EmojiDefinition) -> Self {
        Self::Emoji(def)
    }
}

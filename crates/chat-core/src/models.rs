use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Ordinary channel message.
    Normal,
    /// `/me` action.
    Action,
    /// Someone joined the channel.
    Join,
    /// Operator-injected message from the control surface.
    Manual,
    /// Engine-generated notice.
    System,
}

impl MessageType {
    /// Whether the line has a speaker whose name should be normalized.
    pub fn has_speaking_identity(self) -> bool {
        !matches!(self, Self::Join)
    }

    /// Whether the sender field is a real chat login the identity API knows.
    pub fn contains_parsable_username(self) -> bool {
        matches!(self, Self::Normal | Self::Action)
    }
}

/// How display names are derived from raw handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasingPolicy {
    /// Leave the handle as delivered.
    #[default]
    None,
    AllCaps,
    AllLower,
    /// First character upper-case, remainder lower-case.
    FirstCap,
    /// Ask the identity API for the display-cased name.
    #[serde(alias = "lookup")]
    RemoteLookup,
}

impl CasingPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AllCaps => "all_caps",
            Self::AllLower => "all_lower",
            Self::FirstCap => "first_cap",
            Self::RemoteLookup => "remote_lookup",
        }
    }
}

impl fmt::Display for CasingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown casing policy: {0}")]
pub struct ParsePolicyError(pub String);

impl FromStr for CasingPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "all_caps" => Ok(Self::AllCaps),
            "all_lower" | "all_lowercase" => Ok(Self::AllLower),
            "first_cap" | "first" => Ok(Self::FirstCap),
            "remote_lookup" | "lookup" => Ok(Self::RemoteLookup),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// A chat line ready for rendering. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    message_type: MessageType,
    display_username: String,
    body: String,
    post_count: u32,
    timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub(crate) fn new(
        message_type: MessageType,
        display_username: String,
        body: String,
        post_count: u32,
    ) -> Self {
        Self {
            message_type,
            display_username,
            body,
            post_count,
            timestamp: Utc::now(),
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn display_username(&self) -> &str {
        &self.display_username
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Sender's cumulative message count when this line was assembled, starting at 1.
    pub fn post_count(&self) -> u32 {
        self.post_count
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

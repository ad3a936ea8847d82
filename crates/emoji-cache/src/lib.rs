//! Lazy-loading emoji and badge image cache.
//!
//! Emoji records carry a source URL and are only downloaded the first
//! time a renderer asks for their image. URLs that fail a probe are kept
//! in a [`NegativeResourceRegistry`] and never requested again.

pub mod cache;
pub mod decode;
pub mod loader;
pub mod opacity;
pub mod record;
pub mod registry;

pub use cache::{EmojiCache, TokenMatch};
pub use decode::AnimatedImage;
pub use loader::{EmojiLoader, LoadCompletion};
pub use record::{EmojiImage, EmojiKind, EmojiRecord, SlotStatus, TintColor};
pub use registry::NegativeResourceRegistry;

/// Fallback edge length for records created without explicit dimensions.
pub const DEFAULT_EMOJI_SIZE: u32 = 24;

/// Unified error type for the emoji-cache crate.
#[derive(Debug, thiserror::Error)]
pub enum EmojiError {
    #[error("Invalid emoji source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Resource fetch failed: {0}")]
    Fetch(#[from] chat_client::ClientError),

    #[error("Emoji load queue is full")]
    QueueFull,

    #[error("Emoji loader has shut down")]
    LoaderClosed,
}

//! Emoji records and their lazily populated image slots.
//!
//! Each record owns two independent slots, one for the still image and one
//! for the animated sequence. A slot moves
//! `Unloaded -> Loading -> Loaded | PermanentlyFailed`, and falls back from
//! `Loading` to `Unloaded` when a download or decode fails in a way worth
//! retrying. Only the caller that moved a slot to `Loading` may finish it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::decode::AnimatedImage;
use crate::{DEFAULT_EMOJI_SIZE, EmojiError};

/// Where an emoji came from. Drives transparency fix-ups and tinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmojiKind {
    TwitchV1,
    TwitchV2,
    TwitchV3,
    TwitchBadge,
    FrankerFaceZ,
    FrankerFaceZBadge,
    BetterTtv,
}

impl EmojiKind {
    /// FrankerFaceZ badges ship as white-on-transparent masks meant to be colored.
    pub fn requires_tint_overlay(self) -> bool {
        matches!(self, Self::FrankerFaceZBadge)
    }
}

/// Background color applied to tinted badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TintColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TintColor {
    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

/// An image handed to the render surface.
#[derive(Debug, Clone)]
pub enum EmojiImage {
    Static(Arc<DynamicImage>),
    Animated(Arc<AnimatedImage>),
}

impl EmojiImage {
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Animated(_))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Static(img) => (img.width(), img.height()),
            Self::Animated(anim) => (anim.width, anim.height),
        }
    }
}

/// Observable state of an image slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Unloaded,
    Loading,
    Loaded,
    PermanentlyFailed,
}

#[derive(Debug)]
enum Slot<T> {
    Unloaded,
    Loading,
    Loaded(Arc<T>),
    PermanentlyFailed,
}

impl<T> Slot<T> {
    fn status(&self) -> SlotStatus {
        match self {
            Self::Unloaded => SlotStatus::Unloaded,
            Self::Loading => SlotStatus::Loading,
            Self::Loaded(_) => SlotStatus::Loaded,
            Self::PermanentlyFailed => SlotStatus::PermanentlyFailed,
        }
    }

    fn loaded(&self) -> Option<Arc<T>> {
        match self {
            Self::Loaded(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    fn claim(&mut self) -> Claim {
        match self {
            Self::Loaded(_) => Claim::Ready,
            Self::Loading => Claim::Busy,
            Self::PermanentlyFailed => Claim::Failed,
            Self::Unloaded => {
                *self = Self::Loading;
                Claim::Claimed
            }
        }
    }
}

/// Result of trying to take ownership of a slot for loading.
pub(crate) enum Claim {
    /// Already loaded.
    Ready,
    /// Caller now owns the `Loading` state and must finish or release it.
    Claimed,
    /// Another task is loading.
    Busy,
    Failed,
}

#[derive(Debug)]
struct RecordState {
    width: u32,
    height: u32,
    animated_gif: bool,
    first_failure_logged: bool,
    animated_failure_logged: bool,
    still: Slot<DynamicImage>,
    animated: Slot<AnimatedImage>,
}

/// A single emoji or badge image source.
///
/// Several records may share an identifier (alternate sizes or frames);
/// the cache hands out the first one that yields an image.
#[derive(Debug)]
pub struct EmojiRecord {
    identifier: String,
    replaces: Option<String>,
    url: Url,
    kind: EmojiKind,
    tint_color: Option<TintColor>,
    animated_container: bool,
    state: Mutex<RecordState>,
}

impl EmojiRecord {
    /// Create a record. Fails if `url` is not a valid absolute URL.
    pub fn new(
        identifier: impl Into<String>,
        url: &str,
        kind: EmojiKind,
    ) -> Result<Self, EmojiError> {
        Ok(Self {
            identifier: identifier.into(),
            replaces: None,
            url: Url::parse(url)?,
            kind,
            tint_color: None,
            animated_container: false,
            state: Mutex::new(RecordState {
                width: DEFAULT_EMOJI_SIZE,
                height: DEFAULT_EMOJI_SIZE,
                animated_gif: false,
                first_failure_logged: false,
                animated_failure_logged: false,
                still: Slot::Unloaded,
                animated: Slot::Unloaded,
            }),
        })
    }

    /// Declared size, used until the real image is decoded.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        let state = self.state_mut();
        state.width = width;
        state.height = height;
        self
    }

    /// Mark this record as a substitute display for another token.
    pub fn replacing(mut self, identifier: impl Into<String>) -> Self {
        self.replaces = Some(identifier.into());
        self
    }

    pub fn with_tint(mut self, color: TintColor) -> Self {
        self.tint_color = Some(color);
        self
    }

    /// Source metadata says the emoji animates, independent of file format.
    pub fn with_animated_container(mut self, animated: bool) -> Self {
        self.animated_container = animated;
        self
    }

    /// Source metadata already says the payload is a GIF.
    pub fn with_animated_gif(mut self, animated_gif: bool) -> Self {
        self.state_mut().animated_gif = animated_gif;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn replaces(&self) -> Option<&str> {
        self.replaces.as_deref()
    }

    pub fn is_replacement(&self) -> bool {
        self.replaces.is_some()
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn kind(&self) -> EmojiKind {
        self.kind
    }

    pub fn tint_color(&self) -> Option<TintColor> {
        self.tint_color
    }

    pub fn is_animated_container(&self) -> bool {
        self.animated_container
    }

    pub fn is_animated_gif(&self) -> bool {
        self.lock().animated_gif
    }

    pub fn width(&self) -> u32 {
        self.lock().width
    }

    pub fn height(&self) -> u32 {
        self.lock().height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let state = self.lock();
        (state.width, state.height)
    }

    pub fn static_status(&self) -> SlotStatus {
        self.lock().still.status()
    }

    pub fn animated_status(&self) -> SlotStatus {
        self.lock().animated.status()
    }

    pub fn first_failure_logged(&self) -> bool {
        self.lock().first_failure_logged
    }

    /// The renderer must apply a color transform instead of drawing verbatim.
    pub fn is_coloring_required(&self) -> bool {
        self.kind.requires_tint_overlay() || self.tint_color.is_some()
    }

    /// Image already in memory, without touching the network.
    ///
    /// The animated sequence is returned only when requested and the
    /// record is GIF-backed; otherwise the still image.
    pub fn loaded_image(&self, want_animated: bool) -> Option<EmojiImage> {
        let state = self.lock();
        if want_animated && state.animated_gif {
            state.animated.loaded().map(EmojiImage::Animated)
        } else {
            state.still.loaded().map(EmojiImage::Static)
        }
    }

    /// Whether a load attempt could still make progress.
    pub fn needs_load(&self) -> bool {
        let state = self.lock();
        match state.still {
            Slot::Unloaded => true,
            Slot::Loaded(_) => {
                state.animated_gif && matches!(state.animated, Slot::Unloaded)
            }
            Slot::Loading | Slot::PermanentlyFailed => false,
        }
    }

    pub(crate) fn claim_static(&self) -> Claim {
        self.lock().still.claim()
    }

    pub(crate) fn claim_animated(&self) -> Claim {
        self.lock().animated.claim()
    }

    pub(crate) fn mark_animated_gif(&self) {
        self.lock().animated_gif = true;
    }

    pub(crate) fn mark_unreachable(&self) {
        let mut state = self.lock();
        state.still = Slot::PermanentlyFailed;
        state.animated = Slot::PermanentlyFailed;
    }

    pub(crate) fn store_static(&self, img: DynamicImage) {
        let mut state = self.lock();
        state.width = img.width();
        state.height = img.height();
        state.still = Slot::Loaded(Arc::new(img));
    }

    /// Give the still slot back after a retryable failure, logging only the first one.
    pub(crate) fn release_static(&self, error: &dyn fmt::Display) {
        let mut state = self.lock();
        state.still = Slot::Unloaded;
        if state.first_failure_logged {
            tracing::debug!(identifier = %self.identifier, url = %self.url, %error, "Emoji load failed again");
        } else {
            state.first_failure_logged = true;
            tracing::error!(identifier = %self.identifier, url = %self.url, %error, "Unable to load emoji");
        }
    }

    pub(crate) fn store_animated(&self, anim: AnimatedImage) {
        let mut state = self.lock();
        state.width = anim.width;
        state.height = anim.height;
        state.animated = Slot::Loaded(Arc::new(anim));
    }

    pub(crate) fn release_animated(&self, error: &dyn fmt::Display) {
        let mut state = self.lock();
        state.animated = Slot::Unloaded;
        if state.animated_failure_logged {
            tracing::debug!(identifier = %self.identifier, url = %self.url, %error, "Animated emoji load failed again");
        } else {
            state.animated_failure_logged = true;
            tracing::error!(identifier = %self.identifier, url = %self.url, %error, "Unable to load animated emoji");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn state_mut(&mut self) -> &mut RecordState {
        match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

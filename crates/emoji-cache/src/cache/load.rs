use chat_client::{ProbeResult, ResourceFetcher};

use super::*;
use crate::decode;
use crate::opacity;
use crate::record::Claim;

impl<F: ResourceFetcher> EmojiCache<F> {
    /// Lazily load and return an image for `record`.
    ///
    /// The still image is always loaded first; GIF-backed records then get
    /// their full frame sequence, even when the still load failed. The
    /// animated image is returned only when `want_animated` is set and the
    /// record is GIF-backed.
    ///
    /// Returns `None` when the URL is known unreachable (the record is then
    /// marked terminal), when loading fails, or while another task holds the
    /// slot in `Loading`.
    pub async fn get_image(&self, record: &EmojiRecord, want_animated: bool) -> Option<EmojiImage> {
        if self.registry.contains(record.url()) {
            // Another record may have found this URL dead.
            record.mark_unreachable();
            return None;
        }

        let fresh_bytes = match record.claim_static() {
            Claim::Ready => None,
            Claim::Busy | Claim::Failed => return None,
            Claim::Claimed => self.load_static(record).await,
        };

        // A failed still load does not skip the frame sequence.
        if record.is_animated_gif() {
            if let Claim::Claimed = record.claim_animated() {
                self.load_animated(record, fresh_bytes).await;
            }
        }

        record.loaded_image(want_animated)
    }

    /// Probe, download and decode the still image. Returns the payload so
    /// the animated pass can reuse it.
    async fn load_static(&self, record: &EmojiRecord) -> Option<Vec<u8>> {
        let url = record.url();
        match self.fetcher.probe(url).await {
            ProbeResult::Unreachable => {
                self.registry.insert(url);
                record.mark_unreachable();
                return None;
            }
            ProbeResult::Animated => record.mark_animated_gif(),
            ProbeResult::Static => {}
        }

        let bytes = match self.fetcher.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                record.release_static(&e);
                return None;
            }
        };

        match decode::decode_static(&bytes) {
            Ok(img) => {
                record.store_static(opacity::apply_if_needed(record.kind(), img));
                tracing::debug!(
                    identifier = record.identifier(),
                    width = record.width(),
                    height = record.height(),
                    "Emoji loaded"
                );
                Some(bytes)
            }
            Err(e) => {
                record.release_static(&e);
                None
            }
        }
    }

    async fn load_animated(&self, record: &EmojiRecord, fresh_bytes: Option<Vec<u8>>) {
        let bytes = match fresh_bytes {
            Some(bytes) => bytes,
            None => match self.fetcher.fetch(record.url()).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    record.release_animated(&e);
                    return;
                }
            },
        };

        match decode::decode_animated(&bytes) {
            Ok(anim) => {
                tracing::debug!(
                    identifier = record.identifier(),
                    frames = anim.frame_count(),
                    "Animated emoji loaded"
                );
                record.store_animated(anim);
            }
            Err(e) => record.release_animated(&e),
        }
    }
}

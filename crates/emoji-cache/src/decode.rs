//! Image decoding for downloaded emoji payloads.

use std::fmt;
use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frame, ImageDecoder, ImageResult};

/// A fully decoded animated sequence.
pub struct AnimatedImage {
    pub frames: Vec<Frame>,
    /// Logical screen size reported by the container, which may differ from
    /// the first frame's size.
    pub width: u32,
    pub height: u32,
}

impl AnimatedImage {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Debug for AnimatedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedImage")
            .field("frames", &self.frames.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Decode a still image. Animated payloads yield their first frame.
pub fn decode_static(bytes: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory(bytes)
}

/// Decode every frame of a GIF payload.
pub fn decode_animated(bytes: &[u8]) -> ImageResult<AnimatedImage> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions();
    let frames = decoder.into_frames().collect_frames()?;
    Ok(AnimatedImage {
        frames,
        width,
        height,
    })
}

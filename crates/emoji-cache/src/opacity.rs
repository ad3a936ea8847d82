//! Transparency correction for emotes served without an alpha channel.
//!
//! Legacy Twitch v1 emote sizes 2.0 and 3.0 are sometimes delivered as
//! opaque images with a solid background even though chat shows them
//! transparent (Kappa is the classic example). The background is removed
//! by flood-filling from the image border.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::record::EmojiKind;

/// Maximum per-channel distance from the corner color still treated as background.
const BACKGROUND_TOLERANCE: u8 = 12;

/// Whether a decoded image of this kind needs its background cleared.
pub fn is_candidate(kind: EmojiKind, img: &DynamicImage) -> bool {
    kind == EmojiKind::TwitchV1 && !img.color().has_alpha()
}

/// Apply the correction if `kind` and the decoded format call for it.
pub fn apply_if_needed(kind: EmojiKind, img: DynamicImage) -> DynamicImage {
    if is_candidate(kind, &img) {
        tracing::debug!(w = img.width(), h = img.height(), "Clearing opaque emote background");
        fix_opaque_background(&img)
    } else {
        img
    }
}

/// Make the border-connected region matching the top-left pixel transparent.
pub fn fix_opaque_background(img: &DynamicImage) -> DynamicImage {
    let mut rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return DynamicImage::ImageRgba8(rgba);
    }

    let background = *rgba.get_pixel(0, 0);
    let mut visited = vec![false; (w as usize) * (h as usize)];
    let mut stack = border_pixels(w, h);

    while let Some((x, y)) = stack.pop() {
        let idx = (y as usize) * (w as usize) + x as usize;
        if visited[idx] {
            continue;
        }
        visited[idx] = true;

        if !matches_background(rgba.get_pixel(x, y), &background) {
            continue;
        }
        clear_pixel(&mut rgba, x, y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < w {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < h {
            stack.push((x, y + 1));
        }
    }

    DynamicImage::ImageRgba8(rgba)
}

fn border_pixels(w: u32, h: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(2 * (w as usize + h as usize));
    for x in 0..w {
        out.push((x, 0));
        out.push((x, h - 1));
    }
    for y in 0..h {
        out.push((0, y));
        out.push((w - 1, y));
    }
    out
}

fn matches_background(px: &Rgba<u8>, background: &Rgba<u8>) -> bool {
    px.0[..3]
        .iter()
        .zip(&background.0[..3])
        .all(|(a, b)| a.abs_diff(*b) <= BACKGROUND_TOLERANCE)
}

fn clear_pixel(img: &mut RgbaImage, x: u32, y: u32) {
    img.get_pixel_mut(x, y).0[3] = 0;
}

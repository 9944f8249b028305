//! APA102 ("DotStar") wire encoding.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬─────────────────────┐
//! │ Start (4B 0) │ per LED: 0b111bbbbb, c0 c1 c2│ End (⌈n/16⌉B 0xFF)  │
//! └──────────────┴──────────────────────────────┴─────────────────────┘
//! ```
//!
//! `bbbbb` is the 5-bit global brightness; `c0..c2` follow the strip's
//! [`ColorOrder`]. The end frame supplies the extra clock edges the LEDs
//! need to shift data down the chain.

use lumenrelay_frame::Rgb;

use crate::color::ColorOrder;

pub const START_FRAME_LEN: usize = 4;
pub const MAX_BRIGHTNESS: u8 = 31;

const LED_FRAME_MARKER: u8 = 0b1110_0000;

/// Number of end-frame bytes for a chain of `pixel_count` LEDs.
pub fn end_frame_len(pixel_count: usize) -> usize {
    pixel_count.div_ceil(16)
}

/// Total bytes clocked out for one refresh.
pub fn encoded_len(pixel_count: usize) -> usize {
    START_FRAME_LEN + pixel_count * 4 + end_frame_len(pixel_count)
}

/// Encode one refresh of the whole strip into `dst`.
///
/// `brightness` above [`MAX_BRIGHTNESS`] is treated as full brightness.
pub fn encode(pixels: &[Rgb], order: ColorOrder, brightness: u8, dst: &mut Vec<u8>) {
    dst.clear();
    dst.reserve(encoded_len(pixels.len()));
    dst.extend_from_slice(&[0u8; START_FRAME_LEN]);

    let global = LED_FRAME_MARKER | brightness.min(MAX_BRIGHTNESS);
    for &pixel in pixels {
        dst.push(global);
        dst.extend_from_slice(&order.arrange(pixel));
    }

    dst.resize(dst.len() + end_frame_len(pixels.len()), 0xff);
}

use bytes::Bytes;

use crate::error::{FrameError, Result};

/// Bytes per pixel on the wire: red, green, blue.
pub const BYTES_PER_PIXEL: usize = 3;

/// A colour as sent by the producer. No gamma correction or clamping is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One pixel of a strip frame; `index` is its position in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRecord {
    pub index: usize,
    pub color: Rgb,
}

/// A complete strip frame of `pixel_count * 3` bytes.
#[derive(Debug, Clone)]
pub struct StripFrame {
    payload: Bytes,
}

impl StripFrame {
    /// Validate that `payload` holds exactly `pixel_count` pixels.
    pub fn new(payload: Bytes, pixel_count: usize) -> Result<Self> {
        let expected = pixel_count * BYTES_PER_PIXEL;
        if payload.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: payload.len(),
            });
        }
        Ok(Self { payload })
    }

    /// Fill every pixel with one colour.
    pub fn solid(pixel_count: usize, color: Rgb) -> Self {
        let payload: Vec<u8> = std::iter::repeat([color.r, color.g, color.b])
            .take(pixel_count)
            .flatten()
            .collect();
        Self {
            payload: payload.into(),
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.payload.len() / BYTES_PER_PIXEL
    }

    /// Pixels in LED order; record `i` comes from bytes `[3i, 3i + 3)`.
    pub fn pixels(&self) -> impl Iterator<Item = PixelRecord> + '_ {
        self.payload
            .chunks_exact(BYTES_PER_PIXEL)
            .enumerate()
            .map(|(index, rgb)| PixelRecord {
                index,
                color: Rgb::new(rgb[0], rgb[1], rgb[2]),
            })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}

//! Fixed-length framing for the lumenrelay pipelines.
//!
//! Neither input carries a header or delimiter; a frame is simply the next
//! `N` bytes of the stream:
//! - DMX: 1 universe byte followed by 512 channel values (513 bytes)
//! - LED strip: 3 bytes (red, green, blue) per pixel
//!
//! [`FixedFrameReader`] accumulates partial reads and hands out complete
//! frames, reporting end of stream as a distinct [`ReadOutcome`].

pub mod dmx;
pub mod error;
pub mod pixel;
pub mod reader;
pub mod writer;

pub use dmx::{encode_dmx_frame, DmxFrame, DMX_FRAME_LEN, UNIVERSE_SIZE};
pub use error::{FrameError, Result};
pub use pixel::{PixelRecord, Rgb, StripFrame, BYTES_PER_PIXEL};
pub use reader::{FixedFrameReader, FrameConfig, OverrunPolicy, ReadOutcome};
pub use writer::FrameWriter;

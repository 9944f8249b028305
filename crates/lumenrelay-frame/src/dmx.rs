use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Number of channels in one DMX universe.
pub const UNIVERSE_SIZE: usize = 512;

/// Wire size of one DMX frame: universe byte + channel values.
pub const DMX_FRAME_LEN: usize = 1 + UNIVERSE_SIZE;

/// A DMX frame split into its routing byte and channel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    /// Universe the payload addresses. Passed through as-is, never range-checked.
    pub universe: u8,
    /// The 512 channel values.
    pub payload: Bytes,
}

impl DmxFrame {
    /// Split a complete 513-byte frame.
    ///
    /// Wire format:
    /// ```text
    /// ┌──────────────┬──────────────────────────────┐
    /// │ Universe (1B)│ Channel values (512B)        │
    /// └──────────────┴──────────────────────────────┘
    /// ```
    pub fn split(frame: Bytes) -> Result<Self> {
        if frame.len() != DMX_FRAME_LEN {
            return Err(FrameError::LengthMismatch {
                expected: DMX_FRAME_LEN,
                actual: frame.len(),
            });
        }

        Ok(Self {
            universe: frame[0],
            payload: frame.slice(1..),
        })
    }
}

/// Encode a universe index and its 512 channel values into the wire format.
pub fn encode_dmx_frame(universe: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() != UNIVERSE_SIZE {
        return Err(FrameError::LengthMismatch {
            expected: UNIVERSE_SIZE,
            actual: payload.len(),
        });
    }
    dst.reserve(DMX_FRAME_LEN);
    dst.put_u8(universe);
    dst.put_slice(payload);
    Ok(())
}

use std::io::{ErrorKind, Write};

use crate::error::{FrameError, Result};
use crate::pixel::StripFrame;
use crate::reader::FrameConfig;

/// Writes complete fixed-length frames to any `Write` stream.
///
/// This is the producer side of the relays: every write is checked against
/// the configured frame length so a relay never sees a short or long frame.
pub struct FrameWriter<T> {
    inner: T,
    frame_len: usize,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            frame_len: config.frame_len,
        }
    }

    /// Write one raw frame with a single `write_all` (blocking).
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() != self.frame_len {
            return Err(FrameError::LengthMismatch {
                expected: self.frame_len,
                actual: frame.len(),
            });
        }

        self.inner.write_all(frame).map_err(|err| match err.kind() {
            ErrorKind::WriteZero => FrameError::ConnectionClosed,
            _ => FrameError::Io(err),
        })?;
        self.flush()
    }

    /// Write a strip frame.
    pub fn send_strip(&mut self, frame: &StripFrame) -> Result<()> {
        self.write_frame(frame.as_bytes())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

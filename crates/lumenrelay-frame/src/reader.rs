use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::dmx::DMX_FRAME_LEN;
use crate::error::{FrameError, Result};
use crate::pixel::BYTES_PER_PIXEL;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// What to do with bytes that arrive past the end of the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrunPolicy {
    /// Keep them as the start of the next frame (continuous streams).
    Carry,
    /// Treat them as a protocol violation and drop the buffer.
    Reject,
}

/// Configuration for a fixed-length frame reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Exact size of every frame in bytes.
    pub frame_len: usize,
    pub overrun: OverrunPolicy,
}

impl FrameConfig {
    /// 513-byte DMX frames on a continuous stream.
    pub fn dmx() -> Self {
        Self {
            frame_len: DMX_FRAME_LEN,
            overrun: OverrunPolicy::Carry,
        }
    }

    /// `pixel_count * 3` byte strip frames; overlong reads are rejected.
    pub fn strip(pixel_count: usize) -> Self {
        Self {
            frame_len: pixel_count * BYTES_PER_PIXEL,
            overrun: OverrunPolicy::Reject,
        }
    }
}

/// Result of one [`FixedFrameReader::read_frame`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Exactly `frame_len` bytes.
    Frame(Bytes),
    /// The stream closed. `partial` bytes of an unfinished frame were discarded.
    EndOfStream { partial: usize },
}

/// Reads fixed-length frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames or
/// an explicit end of stream.
pub struct FixedFrameReader<T> {
    inner: T,
    buf: BytesMut,
    chunk: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> FixedFrameReader<T> {
    pub fn new(inner: T, config: FrameConfig) -> Self {
        // In reject mode a read may ask for one byte more than a whole frame,
        // which is how an overlong delivery becomes visible.
        let chunk_len = match config.overrun {
            OverrunPolicy::Carry => READ_CHUNK_SIZE,
            OverrunPolicy::Reject => config.frame_len + 1,
        };
        Self {
            inner,
            buf: BytesMut::with_capacity(config.frame_len),
            chunk: vec![0u8; chunk_len],
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Never times out; a stalled peer blocks the caller.
    pub fn read_frame(&mut self) -> Result<ReadOutcome> {
        let frame_len = self.config.frame_len;
        if frame_len == 0 {
            return Err(FrameError::InvalidFrameLength);
        }

        loop {
            if self.buf.len() >= frame_len {
                return Ok(ReadOutcome::Frame(self.buf.split_to(frame_len).freeze()));
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                let partial = self.buf.len();
                self.buf.clear();
                return Ok(ReadOutcome::EndOfStream { partial });
            }

            let received = self.buf.len() + read;
            if self.config.overrun == OverrunPolicy::Reject && received > frame_len {
                self.buf.clear();
                return Err(FrameError::Oversized {
                    received,
                    expected: frame_len,
                });
            }

            self.buf.extend_from_slice(&self.chunk[..read]);
            trace!(buffered = self.buf.len(), frame_len, "accumulated frame bytes");
        }
    }

    /// Bytes of the next frame already buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    fn strip_config(pixels: usize) -> FrameConfig {
        FrameConfig::strip(pixels)
    }

    fn frame(outcome: ReadOutcome) -> Bytes {
        match outcome {
            ReadOutcome::Frame(bytes) => bytes,
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[test]
    fn reads_single_dmx_frame() {
        let mut wire = vec![4u8];
        wire.extend(std::iter::repeat(9u8).take(512));

        let mut reader = FixedFrameReader::new(Cursor::new(wire.clone()), FrameConfig::dmx());
        let bytes = frame(reader.read_frame().unwrap());

        assert_eq!(bytes.len(), DMX_FRAME_LEN);
        assert_eq!(bytes.as_ref(), wire.as_slice());
    }

    #[test]
    fn carry_keeps_back_to_back_frames() {
        let mut wire = vec![1u8; DMX_FRAME_LEN];
        wire.extend(vec![2u8; DMX_FRAME_LEN]);

        let mut reader = FixedFrameReader::new(Cursor::new(wire), FrameConfig::dmx());

        assert!(frame(reader.read_frame().unwrap()).iter().all(|&b| b == 1));
        assert!(frame(reader.read_frame().unwrap()).iter().all(|&b| b == 2));
        assert_eq!(
            reader.read_frame().unwrap(),
            ReadOutcome::EndOfStream { partial: 0 }
        );
    }

    #[test]
    fn end_of_stream_mid_frame_reports_partial() {
        let mut reader =
            FixedFrameReader::new(Cursor::new(vec![0u8; 100]), FrameConfig::dmx());

        assert_eq!(
            reader.read_frame().unwrap(),
            ReadOutcome::EndOfStream { partial: 100 }
        );
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = FixedFrameReader::new(Cursor::new(Vec::<u8>::new()), strip_config(2));
        assert_eq!(
            reader.read_frame().unwrap(),
            ReadOutcome::EndOfStream { partial: 0 }
        );
    }

    #[test]
    fn partial_read_handling() {
        let wire: Vec<u8> = (0..6).collect();
        let byte_reader = ByteByByteReader {
            bytes: wire.clone(),
            pos: 0,
        };
        let mut reader = FixedFrameReader::new(byte_reader, strip_config(2));

        assert_eq!(frame(reader.read_frame().unwrap()).as_ref(), wire.as_slice());
    }

    #[test]
    fn reject_detects_overlong_delivery() {
        let mut reader = FixedFrameReader::new(Cursor::new(vec![7u8; 7]), strip_config(2));

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Oversized {
                received: 7,
                expected: 6
            }
        ));
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn reject_detects_overrun_after_partial_frame() {
        let reader = ChunkedReader {
            chunks: vec![vec![0u8; 4], vec![0u8; 3]],
        };
        let mut reader = FixedFrameReader::new(reader, strip_config(2));

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Oversized {
                received: 7,
                expected: 6
            }
        ));
    }

    #[test]
    fn reject_accepts_exact_frames_one_read_at_a_time() {
        let reader = ChunkedReader {
            chunks: vec![vec![1u8; 6], vec![2u8; 2], vec![2u8; 4]],
        };
        let mut reader = FixedFrameReader::new(reader, strip_config(2));

        assert!(frame(reader.read_frame().unwrap()).iter().all(|&b| b == 1));
        assert!(frame(reader.read_frame().unwrap()).iter().all(|&b| b == 2));
        assert_eq!(
            reader.read_frame().unwrap(),
            ReadOutcome::EndOfStream { partial: 0 }
        );
    }

    #[test]
    fn zero_length_frames_are_rejected() {
        let mut reader = FixedFrameReader::new(Cursor::new(vec![1u8]), strip_config(0));
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::InvalidFrameLength
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(vec![5u8; 3]),
        };
        let mut framed = FixedFrameReader::new(reader, strip_config(1));
        assert_eq!(frame(framed.read_frame().unwrap()).as_ref(), &[5, 5, 5]);
    }

    #[test]
    fn io_error_propagates() {
        let mut framed = FixedFrameReader::new(FailingReader, FrameConfig::dmx());
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn reads_over_socket_pair() {
        let (mut left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut reader = FixedFrameReader::new(right, strip_config(2));

        left.write_all(&[1, 2, 3]).unwrap();
        left.write_all(&[4, 5, 6]).unwrap();
        drop(left);

        let bytes = frame(reader.read_frame().unwrap());
        assert_eq!(bytes.as_ref(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn accessors_and_into_inner() {
        let reader = FixedFrameReader::new(Cursor::new(Vec::<u8>::new()), FrameConfig::dmx());

        assert_eq!(reader.config().frame_len, DMX_FRAME_LEN);
        let _ = reader.get_ref();
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Delivers each chunk in exactly one read call.
    struct ChunkedReader {
        chunks: Vec<Vec<u8>>,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            assert!(chunk.len() <= buf.len(), "test chunk larger than read buffer");
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}

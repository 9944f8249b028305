use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use lumenrelay_frame::{FixedFrameReader, FrameConfig, FrameError, ReadOutcome, StripFrame};
use lumenrelay_transport::{SocketFile, SocketOptions, TransportError, UnixDomainSocket};
use tracing::{debug, info, warn};

use crate::bus::PixelBus;
use crate::error::{Result, StripError};

/// Pause after a transient accept failure, so a full descriptor table does
/// not turn into a busy loop.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// How a producer connection ended. None of these stop the listener.
#[derive(Debug)]
pub enum ConnectionEnd {
    /// The peer closed. `partial` bytes of an unfinished frame were dropped.
    Closed { frames: u64, partial: usize },
    /// The peer sent more than one frame's worth of bytes in a single read.
    Violation { frames: u64, received: usize },
    /// Reading from the peer failed.
    Failed { frames: u64, error: FrameError },
}

impl ConnectionEnd {
    /// Frames applied to the strip before the connection ended.
    pub fn frames(&self) -> u64 {
        match self {
            ConnectionEnd::Closed { frames, .. }
            | ConnectionEnd::Violation { frames, .. }
            | ConnectionEnd::Failed { frames, .. } => *frames,
        }
    }
}

/// Write every pixel of `frame` to the bus, then latch them with one `show`.
pub fn apply_frame<B: PixelBus + ?Sized>(bus: &mut B, frame: &StripFrame) -> Result<()> {
    for pixel in frame.pixels() {
        bus.set_pixel_color(pixel.index, pixel.color)?;
    }
    bus.show()
}

/// Relay frames from one producer connection until it ends.
///
/// Connection problems are reported through [`ConnectionEnd`]; only bus
/// failures come back as `Err`.
pub fn serve_connection<R, B>(stream: R, bus: &mut B) -> Result<ConnectionEnd>
where
    R: Read,
    B: PixelBus + ?Sized,
{
    let pixel_count = bus.pixel_count();
    let mut reader = FixedFrameReader::new(stream, FrameConfig::strip(pixel_count));
    let mut frames = 0u64;

    loop {
        match reader.read_frame() {
            Ok(ReadOutcome::Frame(bytes)) => {
                let frame = StripFrame::new(bytes, pixel_count)?;
                apply_frame(bus, &frame)?;
                frames += 1;
            }
            Ok(ReadOutcome::EndOfStream { partial }) => {
                if partial > 0 {
                    debug!(partial, "peer closed mid-frame, dropping partial frame");
                }
                return Ok(ConnectionEnd::Closed { frames, partial });
            }
            Err(FrameError::Oversized { received, expected }) => {
                warn!(received, expected, "unexpected data, closing connection");
                return Ok(ConnectionEnd::Violation { frames, received });
            }
            Err(error) => {
                warn!(error = %error, "connection read failed");
                return Ok(ConnectionEnd::Failed { frames, error });
            }
        }
    }
}

/// Accepts producers on a Unix domain socket, one at a time, and drives the
/// strip with their frames.
///
/// Producers write one whole frame per write and wait for the relay to take
/// it before writing the next. Frames that arrive back to back can land in a
/// single read, which counts as more than a frame's worth of data and closes
/// the connection.
pub struct StripServer<B> {
    socket: UnixDomainSocket,
    bus: B,
}

impl<B: PixelBus> StripServer<B> {
    pub fn bind(path: impl AsRef<Path>, options: SocketOptions, bus: B) -> Result<Self> {
        let socket = UnixDomainSocket::bind_with_options(path, options)?;
        Ok(Self { socket, bus })
    }

    /// Wrap an already bound socket.
    pub fn from_socket(socket: UnixDomainSocket, bus: B) -> Self {
        Self { socket, bus }
    }

    pub fn path(&self) -> &Path {
        self.socket.path()
    }

    /// Handle for removing the socket file from outside the serve loop.
    pub fn socket_file(&self) -> SocketFile {
        self.socket.socket_file()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Accept the next producer and serve it until it goes away.
    pub fn serve_one(&mut self) -> Result<ConnectionEnd> {
        info!(path = ?self.socket.path(), "waiting for a connection");
        let mut stream = self.socket.accept()?;

        match stream.peer_credentials() {
            Some(peer) => info!(pid = peer.pid, uid = peer.uid, "connection from"),
            None => info!("connection from unknown peer"),
        }

        let end = serve_connection(&mut stream, &mut self.bus)?;
        if let Err(err) = stream.close() {
            debug!(error = %err, "closing producer connection failed");
        }
        info!(frames = end.frames(), "connection finished");
        Ok(end)
    }

    /// Serve producers forever. Returns only when the bus or the listener fails.
    ///
    /// Accept errors that leave the listener usable, such as an aborted
    /// connection or a full descriptor table, are logged and retried.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.serve_one() {
                Ok(_) => {}
                Err(StripError::Transport(TransportError::Accept(err)))
                    if is_transient_accept_error(&err) =>
                {
                    warn!(error = %err, "accept failed, retrying");
                    std::thread::sleep(ACCEPT_RETRY_DELAY);
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn into_bus(self) -> B {
        self.bus
    }
}

/// Whether a failed `accept` leaves the listener able to accept again.
fn is_transient_accept_error(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    matches!(
        err.raw_os_error(),
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM | libc::EPROTO)
    )
}

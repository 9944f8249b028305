/// Errors that can occur while talking to the OLA daemon.
#[derive(Debug, thiserror::Error)]
pub enum OlaError {
    /// The daemon is not running or dropped the connection.
    #[error("olad not running at {addr}: {reason}")]
    DaemonUnavailable { addr: String, reason: String },

    /// The daemon answered with something that is not a valid RPC message.
    #[error("malformed rpc message: {0}")]
    Decode(#[from] prost::DecodeError),

    /// An RPC message exceeds the 28-bit size field of the header.
    #[error("rpc message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The header carried a protocol version this client does not speak.
    #[error("unsupported rpc protocol version {0}")]
    UnsupportedVersion(u32),

    /// Reading a DMX frame from the input failed.
    #[error(transparent)]
    Frame(#[from] lumenrelay_frame::FrameError),

    /// Local I/O error unrelated to the daemon connection.
    #[error("ola client I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OlaError {
    pub(crate) fn unavailable(addr: &str, reason: impl ToString) -> Self {
        Self::DaemonUnavailable {
            addr: addr.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True when the error means "olad is not there", which the forwarder
    /// recovers from by reconnecting.
    pub fn is_daemon_unavailable(&self) -> bool {
        matches!(self, Self::DaemonUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, OlaError>;

use std::fmt;
use std::io;

use lumenrelay_frame::FrameError;
use lumenrelay_ola::OlaError;
use lumenrelay_strip::StripError;
use lumenrelay_transport::TransportError;

// Exit codes follow the sysexits-style table used across our tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Oversized { .. } | FrameError::LengthMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn ola_error(context: &str, err: OlaError) -> CliError {
    match err {
        OlaError::Frame(err) => frame_error(context, err),
        OlaError::Io(source) => io_error(context, source),
        OlaError::DaemonUnavailable { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        OlaError::Decode(_) | OlaError::UnsupportedVersion(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn strip_error(context: &str, err: StripError) -> CliError {
    match err {
        StripError::Transport(err) => transport_error(context, err),
        StripError::Frame(err) => frame_error(context, err),
        StripError::Bus(source)
        | StripError::Spi { source, .. }
        | StripError::Gpio { source, .. } => io_error(context, source),
        StripError::NoPixels | StripError::PixelIndex { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

use std::path::PathBuf;

/// Errors from the strip socket and producer connections.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be created at `path`.
    #[error("cannot listen on {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No relay is listening at `path`.
    #[error("cannot connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(std::io::Error),

    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `sun_path` cannot hold the requested path.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;

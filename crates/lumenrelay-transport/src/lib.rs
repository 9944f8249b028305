//! Local stream transport for lumenrelay.
//!
//! The strip relay listens on a filesystem-path Unix domain socket and serves
//! one producer at a time. This crate owns the socket lifecycle:
//! - stale socket cleanup before bind
//! - explicit permission bits and listen backlog
//! - socket file removal on drop
//!
//! Accepted connections are handed out as [`RelayStream`] values.

pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use stream::{PeerCredentials, RelayStream};

#[cfg(unix)]
pub use uds::{SocketFile, SocketOptions, UnixDomainSocket};

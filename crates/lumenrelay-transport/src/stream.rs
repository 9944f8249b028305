use std::io::{Read, Write};
use std::net::Shutdown;

use crate::error::Result;

/// Identity of the process on the other end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerCredentials {
    pub uid: u32,
    pub gid: u32,
    pub pid: u32,
}

/// A connected producer stream implementing Read + Write.
///
/// Wraps the accepted Unix domain socket. Dropping the stream closes the
/// connection.
pub struct RelayStream {
    inner: std::os::unix::net::UnixStream,
}

impl Read for RelayStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for RelayStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl RelayStream {
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self { inner: stream }
    }

    /// Shut down both directions of the connection.
    ///
    /// A peer that already went away is not an error.
    pub fn close(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Get the credentials of the connected peer (Linux only).
    ///
    /// Uses `SO_PEERCRED`; returns `None` if unavailable.
    #[cfg(target_os = "linux")]
    pub fn peer_credentials(&self) -> Option<PeerCredentials> {
        use std::os::fd::AsRawFd;

        let fd = self.inner.as_raw_fd();
        let mut cred = libc::ucred {
            pid: 0,
            uid: 0,
            gid: 0,
        };
        let mut len = std::mem::size_of::<libc::ucred>() as libc::socklen_t;

        // SAFETY: `cred` and `len` are valid writable pointers for the provided sizes,
        // and `fd` is an open Unix socket descriptor owned by this stream.
        let rc = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                (&mut cred as *mut libc::ucred).cast::<libc::c_void>(),
                &mut len,
            )
        };

        if rc == 0 && len as usize == std::mem::size_of::<libc::ucred>() {
            Some(PeerCredentials {
                uid: cred.uid,
                gid: cred.gid,
                pid: cred.pid as u32,
            })
        } else {
            None
        }
    }

    /// Get the credentials of the connected peer.
    ///
    /// Returns `None` on platforms that do not expose peer credentials.
    #[cfg(not(target_os = "linux"))]
    pub fn peer_credentials(&self) -> Option<PeerCredentials> {
        None
    }
}

impl std::fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStream").field("type", &"unix").finish()
    }
}

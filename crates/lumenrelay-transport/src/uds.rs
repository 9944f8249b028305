use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::RelayStream;

/// `sockaddr_un.sun_path` capacity, including the trailing NUL.
#[cfg(target_os = "linux")]
const SUN_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const SUN_PATH_LEN: usize = 104;

/// Bind options for the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOptions {
    /// Permission bits applied to the socket file after bind.
    pub mode: u32,
    /// Maximum number of pending, not yet accepted connections.
    pub backlog: i32,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            mode: UnixDomainSocket::DEFAULT_SOCKET_MODE,
            backlog: UnixDomainSocket::DEFAULT_BACKLOG,
        }
    }
}

/// Device, inode and change time of the socket file a listener created.
///
/// The change time tells apart a socket that reuses a freed inode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
    ctime: i64,
    ctime_nsec: i64,
}

impl FileIdentity {
    fn of(metadata: &std::fs::Metadata) -> Self {
        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
        }
    }
}

/// The socket file a listener created, identified by device and inode.
///
/// Can be handed to a signal handler to clean up without touching a socket
/// that another process has since bound at the same path.
#[derive(Debug, Clone)]
pub struct SocketFile {
    path: PathBuf,
    identity: FileIdentity,
}

impl SocketFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path still names the socket file this listener created.
    pub fn is_owned(&self) -> bool {
        std::fs::symlink_metadata(&self.path)
            .map(|metadata| {
                metadata.file_type().is_socket() && FileIdentity::of(&metadata) == self.identity
            })
            .unwrap_or(false)
    }

    /// Remove the socket file if it is still ours. Returns whether it was removed.
    pub fn remove_if_owned(&self) -> bool {
        if !self.is_owned() {
            debug!(path = ?self.path, "socket path was replaced, leaving it");
            return false;
        }
        debug!(path = ?self.path, "removing socket file");
        std::fs::remove_file(&self.path).is_ok()
    }
}

/// Listening Unix domain socket at a filesystem path.
///
/// Binding replaces a stale socket left by an earlier run. The socket file is
/// removed again on drop, unless something else has taken over the path.
#[derive(Debug)]
pub struct UnixDomainSocket {
    listener: UnixListener,
    file: SocketFile,
}

impl UnixDomainSocket {
    /// Default permission mode: any local user may write frames.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o666;
    /// Default listen queue depth.
    pub const DEFAULT_BACKLOG: i32 = 5;

    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_options(path, SocketOptions::default())
    }

    /// Bind and listen with explicit permission bits and backlog.
    ///
    /// An existing socket at `path` is removed first. Any other kind of file
    /// is left alone and reported as a bind error.
    pub fn bind_with_options(path: impl AsRef<Path>, options: SocketOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        remove_stale_socket(&path).map_err(bind_err)?;
        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        listen(&listener, options.backlog).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(options.mode))
            .map_err(bind_err)?;
        let identity = std::fs::symlink_metadata(&path)
            .map(|metadata| FileIdentity::of(&metadata))
            .map_err(bind_err)?;

        info!(
            ?path,
            mode = %format!("{:o}", options.mode),
            backlog = options.backlog,
            "listening on unix domain socket"
        );

        Ok(Self {
            listener,
            file: SocketFile { path, identity },
        })
    }

    /// Wait for the next producer (blocking).
    pub fn accept(&self) -> Result<RelayStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.file.path, "accepted connection");
        Ok(RelayStream::from_unix(stream))
    }

    /// Connect to a listening socket as a producer (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<RelayStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "connected to unix domain socket");
        Ok(RelayStream::from_unix(stream))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Handle on the socket file, for cleanup outside the listener's owner.
    pub fn socket_file(&self) -> SocketFile {
        self.file.clone()
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        self.file.remove_if_owned();
    }
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= SUN_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: SUN_PATH_LEN,
        });
    }
    Ok(())
}

fn remove_stale_socket(path: &Path) -> std::io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    if !metadata.file_type().is_socket() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "existing path is not a unix socket",
        ));
    }
    debug!(?path, "removing stale socket");
    std::fs::remove_file(path)
}

/// `UnixListener::bind` listens with the platform default backlog; a second
/// `listen(2)` on the same socket only changes the queue depth.
fn listen(listener: &UnixListener, backlog: i32) -> std::io::Result<()> {
    // SAFETY: the descriptor is owned by `listener`, which outlives this call.
    let rc = unsafe { libc::listen(listener.as_raw_fd(), backlog) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;

use bytes::BytesMut;
use tracing::{debug, info, trace};

use crate::error::{OlaError, Result};
use crate::rpc::{decode_rpc, encode_rpc, RpcMessage, RpcType};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Blocking client for the OLA daemon's RPC port.
///
/// Only `UpdateDmxData` is spoken. Replies are acknowledgements the relay
/// does not wait for; they are drained without blocking after each send so
/// the daemon never stalls on a full socket.
pub struct OlaClient {
    stream: TcpStream,
    addr: String,
    next_id: u32,
    priority: Option<i32>,
    inbox: BytesMut,
    scratch: Vec<u8>,
}

impl OlaClient {
    /// Connect to the daemon (blocking).
    ///
    /// Any failure to reach the daemon is reported as
    /// [`OlaError::DaemonUnavailable`].
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|err| OlaError::unavailable(addr, err))?;
        stream
            .set_nodelay(true)
            .map_err(|err| OlaError::unavailable(addr, err))?;
        info!(addr, "connected to olad");

        Ok(Self {
            stream,
            addr: addr.to_string(),
            next_id: 0,
            priority: None,
            inbox: BytesMut::with_capacity(READ_CHUNK_SIZE),
            scratch: vec![0u8; READ_CHUNK_SIZE],
        })
    }

    /// Send universe updates with an explicit source priority.
    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = priority;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one universe update without waiting for the reply.
    pub fn send_dmx(&mut self, universe: u8, data: &[u8]) -> Result<()> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let request = RpcMessage::update_dmx(id, universe, data, self.priority);
        let mut wire = BytesMut::new();
        encode_rpc(&request, &mut wire)?;

        self.stream
            .write_all(&wire)
            .map_err(|err| OlaError::unavailable(&self.addr, err))?;
        trace!(id, universe, size = data.len(), "sent dmx update");

        self.drain_replies()
    }

    /// Read whatever replies are already waiting, without blocking.
    fn drain_replies(&mut self) -> Result<()> {
        self.stream.set_nonblocking(true)?;
        let read = self.read_available();
        self.stream.set_nonblocking(false)?;
        read?;

        while let Some(reply) = decode_rpc(&mut self.inbox)? {
            log_reply(&reply);
        }
        Ok(())
    }

    fn read_available(&mut self) -> Result<()> {
        loop {
            match self.stream.read(&mut self.scratch) {
                Ok(0) => {
                    return Err(OlaError::unavailable(
                        &self.addr,
                        "daemon closed the connection",
                    ))
                }
                Ok(n) => self.inbox.extend_from_slice(&self.scratch[..n]),
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(OlaError::unavailable(&self.addr, err)),
            }
        }
    }
}

fn log_reply(reply: &RpcMessage) {
    match reply.kind() {
        Some(RpcType::Response) => trace!(id = reply.id, "dmx update acknowledged"),
        Some(RpcType::ResponseFailed) => {
            let reason = reply
                .buffer
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            debug!(id = reply.id, %reason, "olad rejected dmx update");
        }
        other => debug!(id = reply.id, kind = ?other, "ignoring rpc message from olad"),
    }
}

impl std::fmt::Debug for OlaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OlaClient")
            .field("addr", &self.addr)
            .field("next_id", &self.next_id)
            .finish()
    }
}

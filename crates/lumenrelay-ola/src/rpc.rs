//! OLA RPC framing.
//!
//! Every message on the daemon connection is a protobuf `RpcMessage`
//! preceded by a 4-byte header in host byte order:
//!
//! ```text
//! ┌────────────┬─────────────────┬──────────────────────┐
//! │ Version    │ Size            │ RpcMessage (Size B)  │
//! │ (bits 28+) │ (bits 0..28)    │                      │
//! └────────────┴─────────────────┴──────────────────────┘
//! ```

use bytes::{Buf, BufMut, BytesMut};
use prost::Message;

use crate::error::{OlaError, Result};

/// Default address of the daemon's RPC port.
pub const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:9010";

pub const PROTOCOL_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 4;

const VERSION_SHIFT: u32 = 28;
const SIZE_MASK: u32 = 0x0fff_ffff;

/// Name of the server method that updates a universe.
pub const UPDATE_DMX_DATA: &str = "UpdateDmxData";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RpcType {
    Request = 1,
    Response = 2,
    ResponseCancel = 3,
    ResponseFailed = 4,
    ResponseNotImplemented = 5,
    Disconnect = 6,
    DescriptorRequest = 7,
    DescriptorResponse = 8,
    RequestCancel = 9,
    StreamRequest = 10,
}

/// Envelope for every request and reply.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RpcMessage {
    #[prost(enumeration = "RpcType", required, tag = "1")]
    pub r#type: i32,
    #[prost(uint32, optional, tag = "2")]
    pub id: Option<u32>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub buffer: Option<Vec<u8>>,
}

/// Body of `UpdateDmxData`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DmxData {
    #[prost(int32, required, tag = "1")]
    pub universe: i32,
    #[prost(bytes = "vec", required, tag = "2")]
    pub data: Vec<u8>,
    #[prost(int32, optional, tag = "3")]
    pub priority: Option<i32>,
}

/// Empty reply body of `UpdateDmxData`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ack {}

impl RpcMessage {
    /// Build an `UpdateDmxData` request.
    pub fn update_dmx(id: u32, universe: u8, data: &[u8], priority: Option<i32>) -> Self {
        let body = DmxData {
            universe: i32::from(universe),
            data: data.to_vec(),
            priority,
        };
        Self {
            r#type: RpcType::Request as i32,
            id: Some(id),
            name: Some(UPDATE_DMX_DATA.to_string()),
            buffer: Some(body.encode_to_vec()),
        }
    }

    /// The message type, if it is one this client knows.
    pub fn kind(&self) -> Option<RpcType> {
        RpcType::try_from(self.r#type).ok()
    }
}

/// Encode one message with its header.
pub fn encode_rpc(message: &RpcMessage, dst: &mut BytesMut) -> Result<()> {
    let size = message.encoded_len();
    if size > SIZE_MASK as usize {
        return Err(OlaError::MessageTooLarge {
            size,
            max: SIZE_MASK as usize,
        });
    }

    let header = (PROTOCOL_VERSION << VERSION_SHIFT) | (size as u32 & SIZE_MASK);
    dst.reserve(HEADER_SIZE + size);
    dst.put_slice(&header.to_ne_bytes());
    message
        .encode(dst)
        .map_err(|_| OlaError::MessageTooLarge {
            size,
            max: SIZE_MASK as usize,
        })?;
    Ok(())
}

/// Decode one message from `src`.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer.
pub fn decode_rpc(src: &mut BytesMut) -> Result<Option<RpcMessage>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut raw = [0u8; HEADER_SIZE];
    raw.copy_from_slice(&src[..HEADER_SIZE]);
    let header = u32::from_ne_bytes(raw);

    let version = header >> VERSION_SHIFT;
    if version != PROTOCOL_VERSION {
        return Err(OlaError::UnsupportedVersion(version));
    }

    let size = (header & SIZE_MASK) as usize;
    if src.len() < HEADER_SIZE + size {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let body = src.split_to(size).freeze();
    Ok(Some(RpcMessage::decode(body)?))
}

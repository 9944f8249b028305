use crate::client::OlaClient;
use crate::error::Result;
use crate::rpc::DEFAULT_DAEMON_ADDR;

/// Something that accepts universe updates.
pub trait DmxSink {
    /// Deliver one universe. Completion is not awaited.
    fn send_dmx(&mut self, universe: u8, payload: &[u8]) -> Result<()>;
}

/// Opens [`DmxSink`]s on demand.
///
/// Implementations report an unreachable daemon as
/// [`crate::OlaError::DaemonUnavailable`] so the forwarder knows to retry.
pub trait DmxConnector {
    type Sink: DmxSink;

    fn connect(&mut self) -> Result<Self::Sink>;
}

impl DmxSink for OlaClient {
    fn send_dmx(&mut self, universe: u8, payload: &[u8]) -> Result<()> {
        OlaClient::send_dmx(self, universe, payload)
    }
}

/// Connects [`OlaClient`]s to a fixed daemon address.
#[derive(Debug, Clone)]
pub struct OlaConnector {
    addr: String,
    priority: Option<i32>,
}

impl OlaConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = priority;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Default for OlaConnector {
    fn default() -> Self {
        Self::new(DEFAULT_DAEMON_ADDR)
    }
}

impl DmxConnector for OlaConnector {
    type Sink = OlaClient;

    fn connect(&mut self) -> Result<OlaClient> {
        Ok(OlaClient::connect(&self.addr)?.with_priority(self.priority))
    }
}

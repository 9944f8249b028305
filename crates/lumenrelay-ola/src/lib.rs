//! DMX delivery to the OLA daemon (`olad`).
//!
//! - [`rpc`]: OLA RPC wire codec (4-byte version/size header + protobuf body)
//! - [`client`]: blocking [`OlaClient`] speaking `UpdateDmxData`
//! - [`sink`]: the [`DmxSink`] / [`DmxConnector`] seam the forwarder drives
//! - [`forwarder`]: [`DmxForwarder`], which owns the client handle and
//!   reconnects whenever the daemon goes away

pub mod client;
pub mod error;
pub mod forwarder;
pub mod rpc;
pub mod sink;

pub use client::OlaClient;
pub use error::{OlaError, Result};
pub use forwarder::{Delivery, DmxForwarder, ForwardSummary, RetryPolicy};
pub use sink::{DmxConnector, DmxSink, OlaConnector};

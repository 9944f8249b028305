//! Frame relays for lighting hardware.
//!
//! lumenrelay moves fixed-length frames from a producer to a lighting output:
//! DMX universes read from a byte stream are forwarded to the OLA daemon, and
//! RGB frames written to a Unix domain socket are latched onto an APA102 strip.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain socket listener and producer streams
//! - [`frame`]: fixed-length frame reading, DMX and strip frame splitting
//! - [`ola`]: OLA daemon client and the reconnecting DMX forwarder
//! - [`strip`]: pixel bus drivers and the strip socket server

/// Re-export transport types.
pub mod transport {
    pub use lumenrelay_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use lumenrelay_frame::*;
}

/// Re-export OLA client types.
pub mod ola {
    pub use lumenrelay_ola::*;
}

/// Re-export strip types.
pub mod strip {
    pub use lumenrelay_strip::*;
}

//! LED strip side of lumenrelay.
//!
//! A producer connects to the strip socket and streams raw RGB frames; each
//! complete frame is written to the [`PixelBus`] pixel by pixel and latched
//! with a single `show`.
//!
//! - [`bus`]: the [`PixelBus`] trait, the APA102 strip driver and a dry-run bus
//! - [`spi`]: hardware SPI output through `spidev`
//! - [`gpio`]: bit-banged data/clock output through sysfs GPIO
//! - [`server`]: [`StripServer`], the one-connection-at-a-time relay loop

pub mod apa102;
pub mod bus;
pub mod color;
pub mod error;
pub mod gpio;
pub mod server;
pub mod spi;

pub use bus::{Apa102Strip, DryRunBus, PixelBus};
pub use color::ColorOrder;
pub use error::{Result, StripError};
pub use gpio::GpioBitBang;
pub use lumenrelay_frame::Rgb;
pub use server::{apply_frame, serve_connection, ConnectionEnd, StripServer};
pub use spi::SpiDevice;

/// Pixels on the default strip: six one-metre, 60 LED/m segments.
pub const DEFAULT_PIXEL_COUNT: usize = 60 * 6;

/// Default socket path producers connect to.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/led-socket";

use std::path::PathBuf;

/// Errors that can occur while driving the strip.
#[derive(Debug, thiserror::Error)]
pub enum StripError {
    /// Writing pixel data to the bus failed.
    #[error("pixel bus write failed: {0}")]
    Bus(#[source] std::io::Error),

    /// Opening or configuring the SPI device failed.
    #[error("spi device {path}: {source}")]
    Spi {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Exporting or driving a GPIO pin failed.
    #[error("gpio pin {pin}: {source}")]
    Gpio { pin: u32, source: std::io::Error },

    /// A pixel index outside the strip.
    #[error("pixel index {index} out of range for {count} pixels")]
    PixelIndex { index: usize, count: usize },

    /// A strip without pixels cannot receive frames.
    #[error("strip must have at least one pixel")]
    NoPixels,

    /// A frame did not match the strip geometry.
    #[error(transparent)]
    Frame(#[from] lumenrelay_frame::FrameError),

    /// Setting up the listening socket failed.
    #[error(transparent)]
    Transport(#[from] lumenrelay_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, StripError>;

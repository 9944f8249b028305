use clap::{ArgGroup, Args, Subcommand};
use std::path::PathBuf;

use lumenrelay_ola::rpc::DEFAULT_DAEMON_ADDR;
use lumenrelay_strip::apa102::MAX_BRIGHTNESS;
use lumenrelay_strip::{ColorOrder, SpiDevice, DEFAULT_PIXEL_COUNT, DEFAULT_SOCKET_PATH};
use lumenrelay_transport::UnixDomainSocket;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod dmx;
pub mod doctor;
pub mod send;
pub mod strip;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Relay 513-byte DMX frames from stdin to the OLA daemon.
    Dmx(DmxArgs),
    /// Drive an LED strip with frames written to a Unix socket.
    Strip(StripArgs),
    /// Write one strip frame to a running strip relay.
    Send(SendArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Dmx(args) => dmx::run(args),
        Command::Strip(args) => strip::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DmxArgs {
    /// OLA daemon RPC address.
    #[arg(long, env = "LUMENRELAY_OLA_ADDR", default_value = DEFAULT_DAEMON_ADDR)]
    pub daemon: String,
    /// Wait between attempts to reach the daemon (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub retry_interval: String,
    /// Source priority attached to every universe update.
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=200))]
    pub priority: Option<i32>,
}

#[derive(Args, Debug)]
pub struct StripArgs {
    /// Socket path producers connect to.
    #[arg(default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,
    /// Number of LEDs on the strip.
    #[arg(long, default_value_t = DEFAULT_PIXEL_COUNT)]
    pub pixels: usize,
    /// Socket permission bits, in octal.
    #[arg(long, default_value = "666")]
    pub mode: String,
    /// Pending connection queue depth.
    #[arg(long, default_value_t = UnixDomainSocket::DEFAULT_BACKLOG)]
    pub backlog: i32,
    /// spidev device for hardware SPI output.
    #[arg(long, default_value = SpiDevice::DEFAULT_PATH, conflicts_with = "data_pin")]
    pub spi_device: PathBuf,
    /// SPI clock rate in Hz.
    #[arg(long, default_value_t = SpiDevice::DEFAULT_SPEED_HZ)]
    pub spi_speed: u32,
    /// GPIO pin for bit-banged data (requires --clock-pin).
    #[arg(long, requires = "clock_pin")]
    pub data_pin: Option<u32>,
    /// GPIO pin for bit-banged clock (requires --data-pin).
    #[arg(long, requires = "data_pin")]
    pub clock_pin: Option<u32>,
    /// Global brightness, 0-31.
    #[arg(
        long,
        default_value_t = MAX_BRIGHTNESS,
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_BRIGHTNESS))
    )]
    pub brightness: u8,
    /// Byte order the strip expects for each LED.
    #[arg(long, default_value = "bgr")]
    pub color_order: ColorOrder,
    /// Log frames instead of driving hardware.
    #[arg(long, conflicts_with_all = ["data_pin", "clock_pin"])]
    pub dry_run: bool,
}

// One frame per connection. The relay closes connections that deliver more
// than one frame in a single read, so producers streaming several frames must
// write them one at a time and pace them.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["color", "file"])))]
pub struct SendArgs {
    /// Socket path of the strip relay.
    pub socket: PathBuf,
    /// Number of LEDs the relay was started with.
    #[arg(long, default_value_t = DEFAULT_PIXEL_COUNT)]
    pub pixels: usize,
    /// Fill the strip with one colour (RRGGBB hex).
    #[arg(long)]
    pub color: Option<String>,
    /// Send a raw frame file of exactly pixels * 3 bytes.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Strip socket path whose directory should accept a bind.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,
    /// spidev device to probe.
    #[arg(long, default_value = SpiDevice::DEFAULT_PATH)]
    pub spi_device: PathBuf,
    /// OLA daemon RPC address to probe.
    #[arg(long, env = "LUMENRELAY_OLA_ADDR", default_value = DEFAULT_DAEMON_ADDR)]
    pub daemon: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

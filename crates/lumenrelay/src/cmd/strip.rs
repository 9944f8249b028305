use lumenrelay_strip::{Apa102Strip, DryRunBus, GpioBitBang, PixelBus, SpiDevice, StripServer};
use lumenrelay_transport::{SocketFile, SocketOptions};
use tracing::info;

use crate::cmd::StripArgs;
use crate::exit::{strip_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};

pub fn run(args: StripArgs) -> CliResult<i32> {
    let options = SocketOptions {
        mode: parse_mode(&args.mode)?,
        backlog: args.backlog,
    };
    let bus = open_bus(&args)?;

    let mut server = StripServer::bind(&args.socket, options, bus)
        .map_err(|err| strip_error("failed to start strip relay", err))?;
    install_shutdown_handler(server.socket_file())?;

    info!(
        pixels = args.pixels,
        color_order = %args.color_order,
        brightness = args.brightness,
        "strip relay ready"
    );

    server
        .run()
        .map_err(|err| strip_error("strip relay failed", err))?;
    Ok(SUCCESS)
}

fn open_bus(args: &StripArgs) -> CliResult<Box<dyn PixelBus>> {
    let bus: Box<dyn PixelBus> = if args.dry_run {
        Box::new(DryRunBus::new(args.pixels).map_err(|err| strip_error("dry-run bus", err))?)
    } else if let (Some(data), Some(clock)) = (args.data_pin, args.clock_pin) {
        let output =
            GpioBitBang::open(data, clock).map_err(|err| strip_error("gpio bus", err))?;
        Box::new(configure(Apa102Strip::new(output, args.pixels), args)?)
    } else {
        let output = SpiDevice::open(&args.spi_device, args.spi_speed)
            .map_err(|err| strip_error("spi bus", err))?;
        Box::new(configure(Apa102Strip::new(output, args.pixels), args)?)
    };
    Ok(bus)
}

fn configure<W: std::io::Write>(
    strip: lumenrelay_strip::Result<Apa102Strip<W>>,
    args: &StripArgs,
) -> CliResult<Apa102Strip<W>> {
    let strip = strip.map_err(|err| strip_error("strip", err))?;
    Ok(strip
        .with_brightness(args.brightness)
        .with_color_order(args.color_order))
}

/// The process exits from the signal handler, so the listener's drop never
/// runs. The handler removes the socket file only while it is still ours.
fn install_shutdown_handler(socket: SocketFile) -> CliResult<()> {
    ctrlc::set_handler(move || {
        info!(path = ?socket.path(), "shutting down");
        socket.remove_if_owned();
        std::process::exit(SUCCESS);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("failed to install signal handler: {err}")))
}

/// Octal permission bits, with or without a leading `0o` or `0`.
fn parse_mode(input: &str) -> CliResult<u32> {
    let digits = input.trim().trim_start_matches("0o");
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| CliError::new(USAGE, format!("invalid octal socket mode: {input}")))?;
    if mode > 0o777 {
        return Err(CliError::new(
            USAGE,
            format!("socket mode out of range: {input}"),
        ));
    }
    Ok(mode)
}

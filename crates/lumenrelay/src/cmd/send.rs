use std::fs;

use lumenrelay_frame::{FrameConfig, FrameWriter, Rgb, StripFrame};
use lumenrelay_transport::UnixDomainSocket;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_sent, OutputFormat, SentFrame};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    if args.pixels == 0 {
        return Err(CliError::new(USAGE, "--pixels must be greater than zero"));
    }
    let frame = resolve_frame(&args)?;

    let stream = UnixDomainSocket::connect(&args.socket)
        .map_err(|err| transport_error("connect failed", err))?;
    let mut writer = FrameWriter::new(stream, FrameConfig::strip(args.pixels));
    writer
        .send_strip(&frame)
        .map_err(|err| frame_error("send failed", err))?;

    print_sent(
        &SentFrame {
            socket: &args.socket,
            pixels: frame.pixel_count(),
            bytes: frame.as_bytes().len(),
        },
        format,
    );
    Ok(SUCCESS)
}

fn resolve_frame(args: &SendArgs) -> CliResult<StripFrame> {
    if let Some(color) = &args.color {
        return Ok(StripFrame::solid(args.pixels, parse_color(color)?));
    }
    if let Some(path) = &args.file {
        let data = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return StripFrame::new(data.into(), args.pixels)
            .map_err(|err| frame_error(&format!("{} is not one frame", path.display()), err));
    }
    Err(CliError::new(USAGE, "one of --color or --file is required"))
}

/// `RRGGBB` hex, optionally prefixed with `#`.
fn parse_color(input: &str) -> CliResult<Rgb> {
    let hex = input.trim().trim_start_matches('#');
    let invalid = || CliError::new(USAGE, format!("invalid colour (expected RRGGBB): {input}"));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
    };
    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

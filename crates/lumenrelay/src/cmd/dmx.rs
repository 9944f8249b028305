use std::io;
use std::time::Duration;

use lumenrelay_frame::{FixedFrameReader, FrameConfig};
use lumenrelay_ola::{DmxForwarder, OlaConnector, RetryPolicy};
use tracing::{info, warn};

use crate::cmd::DmxArgs;
use crate::exit::{ola_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};

pub fn run(args: DmxArgs) -> CliResult<i32> {
    let interval = parse_duration(&args.retry_interval)?;
    let connector = OlaConnector::new(args.daemon).with_priority(args.priority);
    let mut forwarder =
        DmxForwarder::new(connector).with_retry_policy(RetryPolicy::constant(interval));

    let stdin = io::stdin();
    let mut reader = FixedFrameReader::new(stdin.lock(), FrameConfig::dmx());
    info!(daemon = forwarder.connector().addr(), "relaying dmx frames from stdin");

    let summary = forwarder
        .run(&mut reader)
        .map_err(|err| ola_error("dmx relay failed", err))?;

    if summary.partial > 0 {
        warn!(
            partial = summary.partial,
            frames = summary.frames,
            "input ended mid-frame"
        );
        return Ok(FAILURE);
    }

    info!(
        frames = summary.frames,
        sent = summary.sent,
        lost = summary.lost,
        "input closed"
    );
    Ok(SUCCESS)
}

/// Parse `250ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

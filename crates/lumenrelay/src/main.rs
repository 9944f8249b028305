mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "lumenrelay", version, about = "DMX and LED strip frame relays")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_runs_with_no_flags() {
        let cli = Cli::try_parse_from(["lumenrelay", "strip"]).expect("strip args should parse");
        let Command::Strip(args) = cli.command else {
            panic!("expected strip command");
        };
        assert_eq!(args.socket, std::path::PathBuf::from("/tmp/led-socket"));
        assert_eq!(args.pixels, 360);
        assert_eq!(args.backlog, 5);
        assert_eq!(args.mode, "666");
    }

    #[test]
    fn dmx_defaults_to_local_daemon() {
        let cli = Cli::try_parse_from(["lumenrelay", "dmx"]).expect("dmx args should parse");
        let Command::Dmx(args) = cli.command else {
            panic!("expected dmx command");
        };
        assert_eq!(args.daemon, "127.0.0.1:9010");
        assert_eq!(args.retry_interval, "1s");
        assert_eq!(args.priority, None);
    }

    #[test]
    fn bit_bang_pins_must_come_together() {
        let err = Cli::try_parse_from(["lumenrelay", "strip", "--data-pin", "23"])
            .expect_err("a lone data pin should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn bit_bang_conflicts_with_spi_device() {
        let err = Cli::try_parse_from([
            "lumenrelay",
            "strip",
            "--data-pin",
            "23",
            "--clock-pin",
            "24",
            "--spi-device",
            "/dev/spidev0.1",
        ])
        .expect_err("both buses should conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "lumenrelay",
            "send",
            "/tmp/led-socket",
            "--pixels",
            "10",
            "--color",
            "ff0000",
            "--file",
            "frame.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn brightness_is_bounded() {
        let err = Cli::try_parse_from(["lumenrelay", "strip", "--brightness", "32"])
            .expect_err("brightness above 31 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}

use std::fs::OpenOptions;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use lumenrelay_transport::UnixDomainSocket;
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

const DAEMON_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

/// Only a socket that cannot be bound fails the run. Missing hardware and a
/// stopped daemon are warnings.
pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        socket_bind_check(&args.socket),
        spi_device_check(&args.spi_device),
        gpio_sysfs_check(Path::new(SYSFS_GPIO_ROOT)),
        daemon_check(&args.daemon),
    ];

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHECK", "STATUS", "DETAIL"]);
            for c in &output.checks {
                table.add_row(vec![
                    c.name.to_string(),
                    status_text(c.status).to_string(),
                    c.detail.clone(),
                ]);
            }
            println!("{table}");
            println!("overall: {}", output.overall);
        }
        OutputFormat::Pretty => {
            println!("lumenrelay doctor\n");
            for c in &output.checks {
                println!("  [{:>4}] {:<14} {}", status_text(c.status), c.name, c.detail);
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

/// Bind a throwaway socket next to where the strip relay would listen.
fn socket_bind_check(socket: &Path) -> CheckResult {
    const NAME: &str = "socket_bind";

    let dir = match socket.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let probe = dir.join(format!(".lumenrelay-doctor-{}.sock", std::process::id()));

    match UnixDomainSocket::bind(&probe) {
        Ok(listener) => {
            drop(listener);
            CheckResult::new(
                NAME,
                CheckStatus::Pass,
                format!("{} accepts unix sockets", dir.display()),
            )
        }
        Err(err) => CheckResult::new(NAME, CheckStatus::Fail, err.to_string()),
    }
}

fn spi_device_check(device: &Path) -> CheckResult {
    const NAME: &str = "spi_device";

    if !device.exists() {
        return CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("{} not found (enable SPI or use --dry-run)", device.display()),
        );
    }
    match OpenOptions::new().read(true).write(true).open(device) {
        Ok(_) => CheckResult::new(
            NAME,
            CheckStatus::Pass,
            format!("{} is writable", device.display()),
        ),
        Err(err) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("{}: {err}", device.display()),
        ),
    }
}

fn gpio_sysfs_check(root: &Path) -> CheckResult {
    const NAME: &str = "gpio_sysfs";

    if root.join("export").exists() {
        CheckResult::new(
            NAME,
            CheckStatus::Info,
            format!("{} available for bit-banged output", root.display()),
        )
    } else {
        CheckResult::new(
            NAME,
            CheckStatus::Skip,
            format!("{} not present", root.display()),
        )
    }
}

fn daemon_check(addr: &str) -> CheckResult {
    const NAME: &str = "ola_daemon";

    let resolved = match addr.to_socket_addrs() {
        Ok(mut addrs) => addrs.next(),
        Err(err) => {
            let detail = format!("invalid address {addr}: {err}");
            return CheckResult::new(NAME, CheckStatus::Fail, detail);
        }
    };
    let Some(sock_addr) = resolved else {
        return CheckResult::new(NAME, CheckStatus::Fail, format!("{addr} did not resolve"));
    };

    match TcpStream::connect_timeout(&sock_addr, DAEMON_PROBE_TIMEOUT) {
        Ok(_) => CheckResult::new(NAME, CheckStatus::Pass, format!("olad reachable at {addr}")),
        Err(err) => CheckResult::new(
            NAME,
            CheckStatus::Warn,
            format!("olad not reachable at {addr} ({err}); dmx relay will wait for it"),
        ),
    }
}

use lumenrelay_strip::{DEFAULT_PIXEL_COUNT, DEFAULT_SOCKET_PATH};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("lumenrelay {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: lumenrelay");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("LUMENRELAY_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("ola_rpc_protocol: {}", lumenrelay_ola::rpc::PROTOCOL_VERSION);
    println!("default_socket: {DEFAULT_SOCKET_PATH}");
    println!("default_pixels: {DEFAULT_PIXEL_COUNT}");

    Ok(SUCCESS)
}

//! Switch process entry point.

use clap::Parser;
use mesh::{init_tracing, SwitchArgs};

#[tokio::main]
async fn main() {
    init_tracing();
    let args = SwitchArgs::parse();

    let controller_addr = match tokio::net::lookup_host((args.controller_host.as_str(), args.controller_port))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
    {
        Some(addr) => addr,
        None => {
            eprintln!(
                "failed to resolve controller address {}:{}",
                args.controller_host, args.controller_port
            );
            std::process::exit(1);
        }
    };

    let log_path = std::path::PathBuf::from(format!("switch{}.log", args.switch_id));

    if let Err(err) = mesh_switch::run(args.switch_id, controller_addr, args.fail_neighbor, &log_path).await {
        eprintln!("switch exited with error: {err:?}");
        std::process::exit(1);
    }
}

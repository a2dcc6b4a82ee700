//! CLI argument shapes and shared process setup for the `controller` and
//! `switch` binaries.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::Parser;

/// `<program> <port> <config_file>`
#[derive(Debug, Parser)]
#[command(name = "controller", about = "Centralized routing controller")]
pub struct ControllerArgs {
    /// UDP port to bind.
    pub port: u16,
    /// Path to the topology config file (switch count + edge list).
    pub config_file: std::path::PathBuf,
}

/// `<program> <switch_id> <controller_host> <controller_port> [-f <neighbor_id>]`
#[derive(Debug, Parser)]
#[command(name = "switch", about = "Routed switch node")]
pub struct SwitchArgs {
    /// This switch's id.
    pub switch_id: i32,
    /// Controller's hostname or IP.
    pub controller_host: String,
    /// Controller's UDP port.
    pub controller_port: u16,
    /// Synthetic one-way link failure: suppress outbound KEEP_ALIVE to this
    /// neighbor while still decoding and discarding its inbound datagrams.
    #[arg(short = 'f', long = "fail-neighbor")]
    pub fail_neighbor: Option<i32>,
}

/// Install a `tracing_subscriber` formatter reading `RUST_LOG`, for the
/// ambient operational logs (distinct from the `mesh-eventlog` output
/// contract files each binary also writes).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

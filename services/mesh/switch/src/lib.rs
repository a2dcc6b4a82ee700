//! Switch state core and UDP glue.
//!
//! [`state::SwitchState`] holds the neighbor table and installed routing
//! table behind a single lock; [`net::run`] is the binary-facing entry
//! point that registers with the Controller and then drives a UDP socket
//! and a periodic KEEP_ALIVE/TOPOLOGY_UPDATE timer against it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod net;
mod state;

pub use net::{run, serve};
pub use state::{Outcome, Send, SwitchState};

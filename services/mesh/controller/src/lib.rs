//! Controller state core and UDP glue.
//!
//! [`state::ControllerState`] holds all mutable Controller state behind a
//! single lock and exposes pure operations that return an [`state::Outcome`]
//! of sends and log records; [`net::run`] is the binary-facing entry point
//! that drives a UDP socket and a periodic liveness-scan timer against it.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod net;
mod state;

pub use net::{run, serve};
pub use state::{ControllerState, Outcome, Send};

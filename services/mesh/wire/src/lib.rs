//! Binary wire protocol for the mesh routing network.
//!
//! Five message types, one per UDP datagram, big-endian integers, a
//! single leading type-code byte. See [`Message`] for the full set and
//! [`consts`] for the shared network/timing constants both ends of the
//! wire agree on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod consts;
mod error;
mod message;

pub use error::WireError;
pub use message::{Message, NeighborAddr, NeighborStatus, RouteEntry};

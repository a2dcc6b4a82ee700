//! Shared network and timing constants, mirrored on both ends of the wire.

use std::time::Duration;

/// Maximum size of a single datagram. Messages must fit within this.
pub const BUFFER_SIZE: usize = 4096;

/// Period between periodic timer ticks (liveness scan, keepalive/topology report).
pub const UPDATE_DELAY: Duration = Duration::from_secs(2);

/// Soft-state expiry window. Must be at least 3x `UPDATE_DELAY` so a single
/// lost datagram never causes a false failure.
pub const TIMEOUT: Duration = Duration::from_secs(6);

/// Distance reported for an unreachable destination.
pub const UNREACHABLE_DISTANCE: i32 = 9999;

/// Next-hop reported for an unreachable destination.
pub const UNREACHABLE_HOP: i32 = -1;

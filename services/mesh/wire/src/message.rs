//! Message types and their wire encoding.
//!
//! Every datagram is a single message, beginning with a one-byte type code,
//! all multi-byte integers big-endian. See the module doc for the exact
//! byte layout of each type.

use crate::consts::BUFFER_SIZE;
use crate::error::WireError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

const TYPE_REGISTER_REQUEST: u8 = 1;
const TYPE_REGISTER_RESPONSE: u8 = 2;
const TYPE_ROUTING_UPDATE: u8 = 3;
const TYPE_KEEP_ALIVE: u8 = 4;
const TYPE_TOPOLOGY_UPDATE: u8 = 5;

/// A switch's view of one neighbor, as reported in REGISTER_RESPONSE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborAddr {
    /// Neighbor's switch id.
    pub neighbor_id: i32,
    /// Whether the Controller currently considers this neighbor alive.
    pub alive: bool,
    /// Neighbor's UDP port.
    pub port: i32,
    /// Neighbor's host (IPv4/hostname string, NUL-terminated on the wire).
    pub host: String,
}

/// One routing table entry: `(src, dst, next_hop, distance)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Source switch id this entry originates from.
    pub src: i32,
    /// Destination switch id.
    pub dst: i32,
    /// Next hop switch id, or `UNREACHABLE_HOP` (-1).
    pub next_hop: i32,
    /// Path cost, or `UNREACHABLE_DISTANCE` (9999).
    pub distance: i32,
}

/// One neighbor's liveness as reported in TOPOLOGY_UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborStatus {
    /// Neighbor switch id.
    pub neighbor_id: i32,
    /// Whether the reporting switch currently considers this neighbor alive.
    pub alive: bool,
}

/// A fully decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Switch -> Controller: "I am switch_id, reachable at port".
    RegisterRequest {
        /// Requesting switch's id.
        switch_id: i32,
        /// Requesting switch's UDP port.
        port: i32,
    },
    /// Controller -> Switch: template neighbors with current address/liveness.
    RegisterResponse {
        /// The requesting switch's template neighbors.
        neighbors: Vec<NeighborAddr>,
    },
    /// Controller -> Switch: this switch's routing table slice.
    RoutingUpdate {
        /// Routing entries for the recipient.
        routes: Vec<RouteEntry>,
    },
    /// Switch -> Switch: liveness pulse.
    KeepAlive {
        /// Sending switch's id.
        sender_switch_id: i32,
    },
    /// Switch -> Controller: this switch's current view of each neighbor.
    TopologyUpdate {
        /// Reporting switch's id.
        sender_switch_id: i32,
        /// Reporting switch's view of each template neighbor.
        neighbors: Vec<NeighborStatus>,
    },
}

fn require(buf: &[u8], need: usize) -> Result<(), WireError> {
    if buf.len() < need {
        Err(WireError::Truncated {
            need,
            have: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Read a NUL-terminated UTF-8 host string, advancing `buf` past the NUL.
fn take_cstring(buf: &mut Bytes) -> Result<String, WireError> {
    let nul_pos = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(WireError::UnterminatedHost)?;
    let raw = buf.split_to(nul_pos);
    buf.advance(1); // skip the NUL
    String::from_utf8(raw.to_vec()).map_err(|_| WireError::InvalidUtf8)
}

fn put_cstring(out: &mut BytesMut, host: &str) {
    out.put_slice(host.as_bytes());
    out.put_u8(0);
}

impl Message {
    /// Encode this message into a fresh buffer, type code first.
    pub fn encode(&self) -> Result<Bytes, WireError> {
        let mut out = BytesMut::new();
        match self {
            Message::RegisterRequest { switch_id, port } => {
                out.put_u8(TYPE_REGISTER_REQUEST);
                out.put_i32(*switch_id);
                out.put_i32(*port);
            }
            Message::RegisterResponse { neighbors } => {
                out.put_u8(TYPE_REGISTER_RESPONSE);
                out.put_u16(neighbors.len() as u16);
                for nbr in neighbors {
                    out.put_i32(nbr.neighbor_id);
                    out.put_u8(nbr.alive as u8);
                    out.put_i32(nbr.port);
                    put_cstring(&mut out, &nbr.host);
                }
            }
            Message::RoutingUpdate { routes } => {
                out.put_u8(TYPE_ROUTING_UPDATE);
                out.put_u16(routes.len() as u16);
                for r in routes {
                    out.put_i32(r.src);
                    out.put_i32(r.dst);
                    out.put_i32(r.next_hop);
                    out.put_i32(r.distance);
                }
            }
            Message::KeepAlive { sender_switch_id } => {
                out.put_u8(TYPE_KEEP_ALIVE);
                out.put_i32(*sender_switch_id);
            }
            Message::TopologyUpdate {
                sender_switch_id,
                neighbors,
            } => {
                out.put_u8(TYPE_TOPOLOGY_UPDATE);
                out.put_i32(*sender_switch_id);
                out.put_u16(neighbors.len() as u16);
                for n in neighbors {
                    out.put_i32(n.neighbor_id);
                    out.put_u8(n.alive as u8);
                }
            }
        }

        if out.len() > BUFFER_SIZE {
            return Err(WireError::TooLarge(out.len()));
        }
        Ok(out.freeze())
    }

    /// Decode a message from a received datagram.
    pub fn decode(data: &[u8]) -> Result<Message, WireError> {
        if data.len() > BUFFER_SIZE {
            return Err(WireError::TooLarge(data.len()));
        }
        require(data, 1)?;
        let mut buf = Bytes::copy_from_slice(data);
        let type_code = buf.get_u8();

        match type_code {
            TYPE_REGISTER_REQUEST => {
                require(&buf, 8)?;
                let switch_id = buf.get_i32();
                let port = buf.get_i32();
                Ok(Message::RegisterRequest { switch_id, port })
            }
            TYPE_REGISTER_RESPONSE => {
                require(&buf, 2)?;
                let n = buf.get_u16() as usize;
                // Each entry is at least 9 bytes (id, alive, port) plus a
                // 1-byte-minimum NUL-terminated host.
                if n.saturating_mul(10) > BUFFER_SIZE {
                    return Err(WireError::OversizedCount(n));
                }
                let mut neighbors = Vec::with_capacity(n);
                for _ in 0..n {
                    require(&buf, 9)?;
                    let neighbor_id = buf.get_i32();
                    let alive = buf.get_u8() != 0;
                    let port = buf.get_i32();
                    let host = take_cstring(&mut buf)?;
                    neighbors.push(NeighborAddr {
                        neighbor_id,
                        alive,
                        port,
                        host,
                    });
                }
                Ok(Message::RegisterResponse { neighbors })
            }
            TYPE_ROUTING_UPDATE => {
                require(&buf, 2)?;
                let k = buf.get_u16() as usize;
                if k.saturating_mul(16) > BUFFER_SIZE {
                    return Err(WireError::OversizedCount(k));
                }
                let mut routes = Vec::with_capacity(k);
                for _ in 0..k {
                    require(&buf, 16)?;
                    routes.push(RouteEntry {
                        src: buf.get_i32(),
                        dst: buf.get_i32(),
                        next_hop: buf.get_i32(),
                        distance: buf.get_i32(),
                    });
                }
                Ok(Message::RoutingUpdate { routes })
            }
            TYPE_KEEP_ALIVE => {
                require(&buf, 4)?;
                Ok(Message::KeepAlive {
                    sender_switch_id: buf.get_i32(),
                })
            }
            TYPE_TOPOLOGY_UPDATE => {
                require(&buf, 6)?;
                let sender_switch_id = buf.get_i32();
                let m = buf.get_u16() as usize;
                if m.saturating_mul(5) > BUFFER_SIZE {
                    return Err(WireError::OversizedCount(m));
                }
                let mut neighbors = Vec::with_capacity(m);
                for _ in 0..m {
                    require(&buf, 5)?;
                    neighbors.push(NeighborStatus {
                        neighbor_id: buf.get_i32(),
                        alive: buf.get_u8() != 0,
                    });
                }
                Ok(Message::TopologyUpdate {
                    sender_switch_id,
                    neighbors,
                })
            }
            other => Err(WireError::UnknownType(other)),
        }
    }
}

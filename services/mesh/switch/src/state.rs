//! Switch state core: the neighbor table and its failure-detection state
//! machine, plus routing-table install.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

use mesh_wire::consts::TIMEOUT;
use mesh_wire::{Message, NeighborAddr, NeighborStatus, RouteEntry};

/// One outbound datagram, payload already encoded-ready.
#[derive(Debug, Clone)]
pub struct Send {
    /// Destination.
    pub addr: SocketAddr,
    /// Message to deliver.
    pub message: Message,
}

/// Side effects of a state-core operation.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Datagrams the caller should now send, outside the lock.
    pub sends: Vec<Send>,
    /// Event-log records the caller should now append, outside the lock.
    pub log_records: Vec<Vec<String>>,
}

impl Outcome {
    fn extend(&mut self, other: Outcome) {
        self.sends.extend(other.sends);
        self.log_records.extend(other.log_records);
    }
}

#[derive(Debug, Clone, Copy)]
struct Neighbor {
    addr: SocketAddr,
    alive: bool,
    last_heard: Instant,
}

/// A switch's view of its template neighbors and its installed routing
/// table. Mutated by the receive loop and the periodic timer, both under
/// one lock.
pub struct SwitchState {
    switch_id: i32,
    controller_addr: SocketAddr,
    /// Outbound KEEP_ALIVE to this neighbor is suppressed (the `-f` flag),
    /// though inbound datagrams from it are still decoded and discarded.
    suppressed_neighbor: Option<i32>,
    neighbors: HashMap<i32, Neighbor>,
    routes: Vec<RouteEntry>,
}

impl SwitchState {
    /// Seed the neighbor table from a REGISTER_RESPONSE. Every neighbor
    /// starts `alive = true` regardless of what the Controller reported,
    /// since liveness here tracks direct KEEP_ALIVE exchange, not the
    /// Controller's view.
    pub fn new(
        switch_id: i32,
        controller_addr: SocketAddr,
        suppressed_neighbor: Option<i32>,
        neighbor_addrs: Vec<NeighborAddr>,
        now: Instant,
    ) -> Self {
        let neighbors = neighbor_addrs
            .into_iter()
            .map(|n| {
                let addr = SocketAddr::new(
                    n.host.parse().unwrap_or(std::net::Ipv4Addr::LOCALHOST.into()),
                    n.port as u16,
                );
                (
                    n.neighbor_id,
                    Neighbor {
                        addr,
                        alive: true,
                        last_heard: now,
                    },
                )
            })
            .collect();

        Self {
            switch_id,
            controller_addr,
            suppressed_neighbor,
            neighbors,
            routes: Vec::new(),
        }
    }

    fn topology_update_send(&self) -> Send {
        let neighbors = self
            .neighbors
            .iter()
            .map(|(&neighbor_id, n)| NeighborStatus {
                neighbor_id,
                alive: n.alive,
            })
            .collect();
        Send {
            addr: self.controller_addr,
            message: Message::TopologyUpdate {
                sender_switch_id: self.switch_id,
                neighbors,
            },
        }
    }

    /// Run once per `UPDATE_DELAY`: expire timed-out neighbors, send
    /// KEEP_ALIVE to every alive, non-suppressed neighbor, and report
    /// current neighbor liveness to the Controller.
    pub fn periodic_tasks(&mut self, now: Instant) -> Outcome {
        let mut out = Outcome::default();

        let timed_out: Vec<i32> = self
            .neighbors
            .iter()
            .filter(|(_, n)| n.alive && now.saturating_duration_since(n.last_heard) >= TIMEOUT)
            .map(|(&nid, _)| nid)
            .collect();
        for nid in &timed_out {
            self.neighbors.get_mut(nid).unwrap().alive = false;
            out.log_records.push(vec![format!("Neighbor Dead {nid}")]);
        }

        for (&nid, n) in &self.neighbors {
            if !n.alive {
                continue;
            }
            if self.suppressed_neighbor == Some(nid) {
                continue;
            }
            out.sends.push(Send {
                addr: n.addr,
                message: Message::KeepAlive {
                    sender_switch_id: self.switch_id,
                },
            });
        }

        out.sends.push(self.topology_update_send());
        out
    }

    /// Handle an inbound KEEP_ALIVE. Silently discarded if the sender is
    /// not a template neighbor.
    pub fn on_keep_alive(&mut self, sender_addr: SocketAddr, sender_id: i32, now: Instant) -> Outcome {
        let mut out = Outcome::default();

        let Some(n) = self.neighbors.get_mut(&sender_id) else {
            return out;
        };

        let was_dead = !n.alive;
        n.last_heard = now;

        if was_dead {
            n.alive = true;
            n.addr = sender_addr;
            out.log_records.push(vec![format!("Neighbor Alive {sender_id}")]);
            out.extend(Outcome {
                sends: vec![self.topology_update_send()],
                log_records: Vec::new(),
            });
        }

        out
    }

    /// Install a freshly received routing table and log it.
    pub fn on_routing_update(&mut self, routes: Vec<RouteEntry>) -> Outcome {
        let mut lines = vec!["Routing Update".to_string()];
        for r in &routes {
            lines.push(format!("{},{}:{}", r.src, r.dst, r.next_hop));
        }
        lines.push("Routing Complete".to_string());

        self.routes = routes;

        Outcome {
            sends: Vec::new(),
            log_records: vec![lines],
        }
    }

    /// The switch's currently installed routing table.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), port)
    }

    fn sample_state(suppressed: Option<i32>) -> SwitchState {
        SwitchState::new(
            1,
            addr(9000),
            suppressed,
            vec![
                NeighborAddr {
                    neighbor_id: 0,
                    alive: true,
                    port: 9100,
                    host: "127.0.0.1".to_string(),
                },
                NeighborAddr {
                    neighbor_id: 2,
                    alive: true,
                    port: 9200,
                    host: "127.0.0.1".to_string(),
                },
            ],
            Instant::now(),
        )
    }

    #[test]
    fn periodic_tasks_sends_keepalive_to_every_alive_neighbor_and_topology_update() {
        let mut state = sample_state(None);
        let out = state.periodic_tasks(Instant::now());
        let keepalive_targets: Vec<_> = out
            .sends
            .iter()
            .filter(|s| matches!(s.message, Message::KeepAlive { .. }))
            .map(|s| s.addr)
            .collect();
        assert_eq!(keepalive_targets.len(), 2);
        assert!(out
            .sends
            .iter()
            .any(|s| matches!(s.message, Message::TopologyUpdate { .. })));
    }

    #[test]
    fn suppressed_neighbor_gets_no_keepalive() {
        let mut state = sample_state(Some(2));
        let out = state.periodic_tasks(Instant::now());
        let keepalive_targets: Vec<_> = out
            .sends
            .iter()
            .filter_map(|s| match &s.message {
                Message::KeepAlive { .. } => Some(s.addr),
                _ => None,
            })
            .collect();
        assert_eq!(keepalive_targets, vec![addr(9100)]);
    }

    #[test]
    fn single_missed_period_does_not_mark_dead() {
        let mut state = sample_state(None);
        let now = Instant::now() + std::time::Duration::from_secs(2);
        let out = state.periodic_tasks(now);
        assert!(!out.log_records.iter().any(|r| r[0].starts_with("Neighbor Dead")));
    }

    #[test]
    fn timeout_marks_neighbor_dead_and_stops_keepalive() {
        let mut state = sample_state(None);
        let later = Instant::now() + TIMEOUT + std::time::Duration::from_millis(1);
        let out = state.periodic_tasks(later);
        assert!(out.log_records.iter().any(|r| r[0] == "Neighbor Dead 0" || r[0] == "Neighbor Dead 2"));
        let keepalive_count = out
            .sends
            .iter()
            .filter(|s| matches!(s.message, Message::KeepAlive { .. }))
            .count();
        assert!(keepalive_count < 2);
    }

    #[test]
    fn keep_alive_from_dead_neighbor_revives_it_and_resyncs_address() {
        let mut state = sample_state(None);
        let later = Instant::now() + TIMEOUT + std::time::Duration::from_millis(1);
        state.periodic_tasks(later); // neighbor 0 now dead

        let new_addr = addr(9999);
        let out = state.on_keep_alive(new_addr, 0, later);
        assert!(out.log_records.iter().any(|r| r[0] == "Neighbor Alive 0"));
        assert!(out
            .sends
            .iter()
            .any(|s| matches!(s.message, Message::TopologyUpdate { .. })));
        assert_eq!(state.neighbors.get(&0).unwrap().addr, new_addr);
    }

    #[test]
    fn keep_alive_from_non_neighbor_is_discarded() {
        let mut state = sample_state(None);
        let out = state.on_keep_alive(addr(1234), 99, Instant::now());
        assert!(out.sends.is_empty());
        assert!(out.log_records.is_empty());
    }

    #[test]
    fn routing_update_installs_routes_and_logs_without_distance() {
        let mut state = sample_state(None);
        let out = state.on_routing_update(vec![RouteEntry {
            src: 1,
            dst: 1,
            next_hop: 1,
            distance: 0,
        }]);
        assert_eq!(state.routes().len(), 1);
        assert_eq!(
            out.log_records[0],
            vec!["Routing Update".to_string(), "1,1:1".to_string(), "Routing Complete".to_string()]
        );
    }
}

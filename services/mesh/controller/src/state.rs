//! Controller state core: the directory, liveness maps, and routing cache,
//! plus the pure state-transition functions that mutate them.
//!
//! Every public method here is called under the single `Mutex` that
//! [`crate::net::run`] holds the state behind. They return an [`Outcome`] describing what
//! to send and what to log instead of doing I/O directly, so the lock can
//! be released before any of it happens (spec: "Sends are allowed to
//! proceed without the lock provided the payload has already been
//! constructed under the lock").

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use mesh_routing::RoutingCache;
use mesh_topology::{build_effective_topology, Template};
use mesh_wire::consts::TIMEOUT;
use mesh_wire::{Message, NeighborAddr, NeighborStatus, RouteEntry};

fn unregistered_addr() -> SocketAddr {
    SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0)
}

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
    /// Each inner `Vec<String>` is the content lines of one record.
    pub log_records: Vec<Vec<String>>,
}

impl Outcome {
    fn extend(&mut self, other: Outcome) {
        self.sends.extend(other.sends);
        self.log_records.extend(other.log_records);
    }
}

/// The Controller's full mutable state: directory, liveness, reported
/// neighbor views, and the routing cache, all mutated together.
pub struct ControllerState {
    template: Template,
    directory: HashMap<i32, SocketAddr>,
    switch_alive: HashMap<i32, bool>,
    last_heard: HashMap<i32, Instant>,
    reported_neighbors: HashMap<i32, HashMap<i32, bool>>,
    cache: RoutingCache,
}

impl ControllerState {
    /// Build state for a freshly loaded topology template; no switch has
    /// registered yet.
    pub fn new(template: Template) -> Self {
        Self {
            template,
            directory: HashMap::new(),
            switch_alive: HashMap::new(),
            last_heard: HashMap::new(),
            reported_neighbors: HashMap::new(),
            cache: RoutingCache::new(),
        }
    }

    fn directory_addr(&self, switch_id: i32) -> SocketAddr {
        self.directory
            .get(&switch_id)
            .copied()
            .unwrap_or_else(unregistered_addr)
    }

    fn is_alive(&self, switch_id: i32) -> bool {
        self.switch_alive.get(&switch_id).copied().unwrap_or(false)
    }

    fn compose_neighbor_list(&self, switch_id: i32) -> Vec<NeighborAddr> {
        self.template
            .neighbors_of(switch_id)
            .iter()
            .map(|&(neighbor_id, _cost)| {
                let addr = self.directory_addr(neighbor_id);
                NeighborAddr {
                    neighbor_id,
                    alive: self.is_alive(neighbor_id),
                    port: addr.port() as i32,
                    host: addr.ip().to_string(),
                }
            })
            .collect()
    }

    /// Handle a REGISTER_REQUEST: register/re-register `switch_id` at
    /// `sender_addr`, send its REGISTER_RESPONSE, recompute and broadcast if
    /// the topology changed, then always send the requester its own
    /// freshly-computed routing slice directly.
    pub fn on_register_request(
        &mut self,
        sender_addr: SocketAddr,
        switch_id: i32,
        port: i32,
        now: Instant,
    ) -> Outcome {
        let mut out = Outcome::default();
        out.log_records
            .push(vec![format!("Register Request {switch_id}")]);

        self.directory
            .insert(switch_id, SocketAddr::new(sender_addr.ip(), port as u16));
        self.last_heard.insert(switch_id, now);

        // Matches the reference behavior: a switch never seen before is not
        // "dead", so no Switch Alive log fires on its first registration.
        let was_dead = !self.switch_alive.get(&switch_id).copied().unwrap_or(true);
        self.switch_alive.insert(switch_id, true);

        let seeded: HashMap<i32, bool> = self
            .template
            .neighbors_of(switch_id)
            .iter()
            .map(|&(nid, _)| (nid, true))
            .collect();
        self.reported_neighbors.insert(switch_id, seeded);

        let neighbors = self.compose_neighbor_list(switch_id);
        out.sends.push(Send {
            addr: sender_addr,
            message: Message::RegisterResponse { neighbors },
        });
        out.log_records
            .push(vec![format!("Register Response {switch_id}")]);

        if was_dead {
            out.log_records.push(vec![format!("Switch Alive {switch_id}")]);
        }

        out.extend(self.recompute_and_broadcast());

        let (routes, _) = self.current_routes();
        let own_routes: Vec<RouteEntry> = routes.iter().copied().filter(|r| r.src == switch_id).collect();
        out.sends.push(Send {
            addr: sender_addr,
            message: Message::RoutingUpdate { routes: own_routes },
        });

        out
    }

    /// Handle a TOPOLOGY_UPDATE: refresh liveness/address for the reporter,
    /// diff its neighbor view for link deaths, then recompute/broadcast.
    pub fn on_topology_update(
        &mut self,
        sender_addr: SocketAddr,
        sender_id: i32,
        neighbors: Vec<NeighborStatus>,
        now: Instant,
    ) -> Outcome {
        let mut out = Outcome::default();

        self.directory.insert(sender_id, sender_addr);
        self.last_heard.insert(sender_id, now);

        let was_dead = !self.switch_alive.get(&sender_id).copied().unwrap_or(true);
        self.switch_alive.insert(sender_id, true);
        if was_dead {
            out.log_records.push(vec![format!("Switch Alive {sender_id}")]);
        }

        let old_view = self.reported_neighbors.get(&sender_id).cloned().unwrap_or_default();
        for status in &neighbors {
            let was_alive = old_view.get(&status.neighbor_id).copied().unwrap_or(true);
            if was_alive && !status.alive {
                out.log_records
                    .push(vec![format!("Link Dead {sender_id},{}", status.neighbor_id)]);
            }
        }

        let new_view: HashMap<i32, bool> = neighbors.iter().map(|s| (s.neighbor_id, s.alive)).collect();
        self.reported_neighbors.insert(sender_id, new_view);

        out.extend(self.recompute_and_broadcast());
        out
    }

    /// Scan `last_heard` for switches past `TIMEOUT`; mark dead and
    /// recompute/broadcast if anything changed. Called every `UPDATE_DELAY`.
    pub fn periodic_liveness_scan(&mut self, now: Instant) -> Outcome {
        let mut out = Outcome::default();

        let newly_dead: Vec<i32> = self
            .last_heard
            .iter()
            .filter(|&(sid, &heard)| {
                self.is_alive(*sid) && now.saturating_duration_since(heard) >= TIMEOUT
            })
            .map(|(&sid, _)| sid)
            .collect();

        for sid in &newly_dead {
            self.switch_alive.insert(*sid, false);
            out.log_records.push(vec![format!("Switch Dead {sid}")]);
        }

        if !newly_dead.is_empty() {
            out.extend(self.recompute_and_broadcast());
        }
        out
    }

    fn current_routes(&mut self) -> (Vec<RouteEntry>, bool) {
        let topology = build_effective_topology(&self.template, &self.switch_alive, &self.reported_neighbors);
        let (routes, recomputed) = self.cache.get_routes(&topology);
        (routes.to_vec(), recomputed)
    }

    /// Recompute the effective topology; broadcast ROUTING_UPDATE to every
    /// live switch only if the cache signals an actual change.
    fn recompute_and_broadcast(&mut self) -> Outcome {
        let mut out = Outcome::default();
        let (routes, recomputed) = self.current_routes();
        if !recomputed {
            return out;
        }

        let mut lines = vec!["Routing Update".to_string()];
        for r in &routes {
            lines.push(format!("{},{}:{},{}", r.src, r.dst, r.next_hop, r.distance));
        }
        lines.push("Routing Complete".to_string());
        out.log_records.push(lines);

        let live_ids: Vec<i32> = self.template.switch_ids().filter(|&sid| self.is_alive(sid)).collect();
        for sid in live_ids {
            let Some(addr) = self.directory.get(&sid).copied() else {
                continue;
            };
            let switch_routes: Vec<RouteEntry> = routes.iter().copied().filter(|r| r.src == sid).collect();
            out.sends.push(Send {
                addr,
                message: Message::RoutingUpdate {
                    routes: switch_routes,
                },
            });
        }

        out
    }
}

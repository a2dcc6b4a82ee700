//! Single-slot memoizer gating routing recomputation on actual topology change.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use mesh_topology::EffectiveTopology;
use mesh_wire::RouteEntry;

use crate::dijkstra::compute_routes;

/// Caches the last computed routing table, keyed by a fingerprint of the
/// effective topology that produced it.
///
/// Adjacency lists are already sorted by `(neighbor_id, cost)` by
/// [`mesh_topology::build_effective_topology`], so the fingerprint is stable
/// across calls that describe the same topology regardless of how the
/// underlying maps were populated.
#[derive(Debug, Default)]
pub struct RoutingCache {
    fingerprint: Option<u64>,
    routes: Vec<RouteEntry>,
}

impl RoutingCache {
    /// A fresh, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the routing table for `topology`, recomputing only if the
    /// topology's fingerprint differs from the cached one.
    ///
    /// The second element of the tuple is `true` iff a recomputation
    /// happened on this call; callers use it to gate whether a
    /// ROUTING_UPDATE broadcast (and its log line) is warranted.
    pub fn get_routes(&mut self, topology: &EffectiveTopology) -> (&[RouteEntry], bool) {
        let fp = fingerprint(topology);
        if self.fingerprint == Some(fp) {
            return (&self.routes, false);
        }
        self.routes = compute_routes(topology);
        self.fingerprint = Some(fp);
        (&self.routes, true)
    }

    /// Invalidate the cache unconditionally; the next `get_routes` call
    /// always recomputes.
    pub fn clear(&mut self) {
        self.fingerprint = None;
    }
}

fn fingerprint(topology: &EffectiveTopology) -> u64 {
    let mut hasher = DefaultHasher::new();
    topology.switch_count().hash(&mut hasher);
    for sid in topology.switch_ids() {
        sid.hash(&mut hasher);
        topology.is_alive(sid).hash(&mut hasher);
        for &(neighbor_id, cost) in topology.neighbors_of(sid) {
            neighbor_id.hash(&mut hasher);
            cost.hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_topology::{build_effective_topology, load_template_from_str};
    use std::collections::HashMap;

    fn all_alive(n: i32) -> HashMap<i32, bool> {
        (0..n).map(|i| (i, true)).collect()
    }

    #[test]
    fn first_call_always_recomputes() {
        let template = load_template_from_str("2\n0 1 1\n").unwrap();
        let topo = build_effective_topology(&template, &all_alive(2), &HashMap::new());
        let mut cache = RoutingCache::new();
        let (_, recomputed) = cache.get_routes(&topo);
        assert!(recomputed);
    }

    #[test]
    fn unchanged_topology_hits_cache() {
        let template = load_template_from_str("2\n0 1 1\n").unwrap();
        let topo = build_effective_topology(&template, &all_alive(2), &HashMap::new());
        let mut cache = RoutingCache::new();
        cache.get_routes(&topo);
        let (_, recomputed) = cache.get_routes(&topo);
        assert!(!recomputed);
    }

    #[test]
    fn changed_topology_misses_cache() {
        let template = load_template_from_str("2\n0 1 1\n").unwrap();
        let topo_up = build_effective_topology(&template, &all_alive(2), &HashMap::new());
        let mut alive_down = all_alive(2);
        alive_down.insert(1, false);
        let topo_down = build_effective_topology(&template, &alive_down, &HashMap::new());

        let mut cache = RoutingCache::new();
        cache.get_routes(&topo_up);
        let (_, recomputed) = cache.get_routes(&topo_down);
        assert!(recomputed);
    }

    #[test]
    fn clear_forces_recompute_even_if_topology_unchanged() {
        let template = load_template_from_str("2\n0 1 1\n").unwrap();
        let topo = build_effective_topology(&template, &all_alive(2), &HashMap::new());
        let mut cache = RoutingCache::new();
        cache.get_routes(&topo);
        cache.clear();
        let (_, recomputed) = cache.get_routes(&topo);
        assert!(recomputed);
    }
}

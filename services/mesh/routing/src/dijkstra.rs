//! All-pairs shortest paths with deterministic next-hop selection.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use mesh_topology::EffectiveTopology;
use mesh_wire::consts::{UNREACHABLE_DISTANCE, UNREACHABLE_HOP};
use mesh_wire::RouteEntry;

/// Run Dijkstra from every alive source and assemble the full routing table.
///
/// Dead sources emit no entries at all. Entries to a dead or disconnected
/// destination carry `(UNREACHABLE_HOP, UNREACHABLE_DISTANCE)`. Tie-breaking
/// is deterministic: the priority queue orders by `(distance, node)` and
/// neighbor lists are iterated in ascending `(neighbor_id, cost)` order, so
/// equal-cost predecessors are resolved by smallest node id.
pub fn compute_routes(topology: &EffectiveTopology) -> Vec<RouteEntry> {
    let n = topology.switch_count();
    let mut routes = Vec::new();

    for src in 0..n {
        if !topology.is_alive(src) {
            continue;
        }
        let (dist, prev) = shortest_paths_from(topology, src);

        for dst in 0..n {
            if dst == src {
                routes.push(RouteEntry {
                    src,
                    dst,
                    next_hop: src,
                    distance: 0,
                });
                continue;
            }

            match dist.get(&dst).copied() {
                Some(d) => {
                    let next_hop = next_hop_toward(&prev, src, dst);
                    routes.push(RouteEntry {
                        src,
                        dst,
                        next_hop,
                        distance: d,
                    });
                }
                None => routes.push(RouteEntry {
                    src,
                    dst,
                    next_hop: UNREACHABLE_HOP,
                    distance: UNREACHABLE_DISTANCE,
                }),
            }
        }
    }

    routes
}

/// Single-source Dijkstra. Returns `dist[v]` for every reachable `v` and
/// `prev[v]`, the predecessor on the shortest path from `src`.
fn shortest_paths_from(
    topology: &EffectiveTopology,
    src: i32,
) -> (std::collections::HashMap<i32, i32>, std::collections::HashMap<i32, i32>) {
    use std::collections::HashMap;

    let mut dist: HashMap<i32, i32> = HashMap::new();
    let mut prev: HashMap<i32, i32> = HashMap::new();
    let mut visited: HashMap<i32, bool> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(i32, i32)>> = BinaryHeap::new();

    dist.insert(src, 0);
    heap.push(Reverse((0, src)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if visited.get(&u).copied().unwrap_or(false) {
            continue;
        }
        visited.insert(u, true);

        for &(v, cost) in topology.neighbors_of(u) {
            let candidate = d + cost;
            let better = match dist.get(&v) {
                Some(&existing) => candidate < existing,
                None => true,
            };
            if better {
                dist.insert(v, candidate);
                prev.insert(v, u);
                heap.push(Reverse((candidate, v)));
            }
        }
    }

    (dist, prev)
}

/// Walk `prev[]` back from `dst` to find the first hop away from `src`.
fn next_hop_toward(prev: &std::collections::HashMap<i32, i32>, src: i32, dst: i32) -> i32 {
    let mut node = dst;
    loop {
        let pred = match prev.get(&node) {
            Some(&p) => p,
            None => return node, // unreachable from the caller's perspective; shouldn't happen if dist is Some
        };
        if pred == src {
            return node;
        }
        node = pred;
    }
}

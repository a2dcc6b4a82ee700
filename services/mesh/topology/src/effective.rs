//! Derivation of the effective topology from the template plus live state.

use std::collections::HashMap;

use crate::template::Template;

/// The undirected weighted graph actually used for a routing recomputation:
/// the template filtered by switch liveness and mutual neighbor-alive
/// agreement. Never persisted between recomputations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveTopology {
    switch_count: i32,
    /// `switch_id -> [(neighbor_id, cost)]`, sorted, for live switches only.
    adjacency: HashMap<i32, Vec<(i32, i32)>>,
    alive: HashMap<i32, bool>,
}

impl EffectiveTopology {
    /// Number of switches in the template (`N`).
    pub fn switch_count(&self) -> i32 {
        self.switch_count
    }

    /// Whether `switch_id` is currently alive.
    pub fn is_alive(&self, switch_id: i32) -> bool {
        self.alive.get(&switch_id).copied().unwrap_or(false)
    }

    /// `switch_id`'s surviving neighbor edges, sorted by `(neighbor_id, cost)`.
    ///
    /// Empty for a dead switch, even if the template lists neighbors.
    pub fn neighbors_of(&self, switch_id: i32) -> &[(i32, i32)] {
        if !self.is_alive(switch_id) {
            return &[];
        }
        self.adjacency
            .get(&switch_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All switch ids `0..N`.
    pub fn switch_ids(&self) -> impl Iterator<Item = i32> {
        0..self.switch_count
    }
}

/// Build the effective topology.
///
/// `reported_neighbors[a][b]` is `a`'s latest claim about whether `b` is
/// alive; a switch that has not yet reported is treated as claiming all its
/// template neighbors are alive (see the open question on reported-neighbor
/// defaults). An edge `(a,b,cost)` survives iff both `a` and `b` are alive
/// switches AND `a` claims `b` alive AND `b` claims `a` alive AND the edge
/// exists in the template.
pub fn build_effective_topology(
    template: &Template,
    switch_alive: &HashMap<i32, bool>,
    reported_neighbors: &HashMap<i32, HashMap<i32, bool>>,
) -> EffectiveTopology {
    let is_alive = |sid: i32| switch_alive.get(&sid).copied().unwrap_or(false);

    let claims_alive = |reporter: i32, target: i32| -> bool {
        match reported_neighbors.get(&reporter) {
            Some(view) => view.get(&target).copied().unwrap_or(true),
            None => true,
        }
    };

    let mut adjacency: HashMap<i32, Vec<(i32, i32)>> = HashMap::new();
    for a in template.switch_ids() {
        if !is_alive(a) {
            continue;
        }
        for &(b, cost) in template.neighbors_of(a) {
            if !is_alive(b) {
                continue;
            }
            if !claims_alive(a, b) || !claims_alive(b, a) {
                continue;
            }
            adjacency.entry(a).or_default().push((b, cost));
        }
    }
    for neighbors in adjacency.values_mut() {
        neighbors.sort_unstable();
    }

    EffectiveTopology {
        switch_count: template.switch_count(),
        adjacency,
        alive: switch_alive.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::load_template_from_str;

    fn all_alive(n: i32) -> HashMap<i32, bool> {
        (0..n).map(|i| (i, true)).collect()
    }

    #[test]
    fn fully_alive_topology_mirrors_template() {
        let template = load_template_from_str("4\n0 1 1\n1 2 1\n2 3 1\n").unwrap();
        let eff = build_effective_topology(&template, &all_alive(4), &HashMap::new());
        assert_eq!(eff.neighbors_of(1), &[(0, 1), (2, 1)]);
        assert!(eff.is_alive(3));
    }

    #[test]
    fn dead_switch_has_no_edges_and_is_removed_from_neighbors() {
        let template = load_template_from_str("4\n0 1 1\n1 2 1\n2 3 1\n").unwrap();
        let mut alive = all_alive(4);
        alive.insert(2, false);
        let eff = build_effective_topology(&template, &alive, &HashMap::new());
        assert!(eff.neighbors_of(2).is_empty());
        assert_eq!(eff.neighbors_of(1), &[(0, 1)]);
        assert_eq!(eff.neighbors_of(3), &[]);
    }

    #[test]
    fn unilateral_link_death_removes_edge_both_directions() {
        let template = load_template_from_str("4\n0 1 1\n1 2 1\n2 3 1\n").unwrap();
        let mut reported = HashMap::new();
        let mut view1 = HashMap::new();
        view1.insert(2, false);
        reported.insert(1, view1);
        // switch 2 still reports 1 alive.
        let eff = build_effective_topology(&template, &all_alive(4), &reported);
        assert_eq!(eff.neighbors_of(1), &[(0, 1)]);
        assert_eq!(eff.neighbors_of(2), &[(3, 1)]);
    }

    #[test]
    fn unreported_switch_defaults_to_claiming_neighbors_alive() {
        let template = load_template_from_str("2\n0 1 1\n").unwrap();
        let eff = build_effective_topology(&template, &all_alive(2), &HashMap::new());
        assert_eq!(eff.neighbors_of(0), &[(1, 1)]);
    }
}

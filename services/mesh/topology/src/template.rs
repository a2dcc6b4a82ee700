//! The immutable adjacency template loaded from a config file.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;

/// Costs must stay strictly below this so a real distance can never collide
/// with the sentinel used for unreachable destinations.
const MAX_COST: i32 = 9998;

/// The config-file-derived adjacency list: `switch_id -> [(neighbor_id, cost)]`.
///
/// Immutable once loaded. Adjacency lists are kept sorted by `(neighbor_id,
/// cost)` so every consumer (the shortest-path engine, the cache fingerprint)
/// iterates them in the same deterministic order without re-sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    switch_count: i32,
    adjacency: HashMap<i32, Vec<(i32, i32)>>,
}

impl Template {
    /// Number of switches declared by the config file (`N`); valid ids are `0..N`.
    pub fn switch_count(&self) -> i32 {
        self.switch_count
    }

    /// This switch's template neighbors as `(neighbor_id, cost)`, sorted.
    pub fn neighbors_of(&self, switch_id: i32) -> &[(i32, i32)] {
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

/// Parse a template from the config file's textual contents.
///
/// Format: first non-blank-significant line is the decimal switch count
/// `N`; every subsequent non-blank line is `a b c` (switch, switch, cost),
/// a single undirected edge. Blank lines are otherwise permitted anywhere.
pub fn load_template_from_str(contents: &str) -> Result<Template, ConfigError> {
    let mut n: Option<i32> = None;
    let mut adjacency: HashMap<i32, Vec<(i32, i32)>> = HashMap::new();

    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let n = match n {
            None => {
                let parsed = trimmed
                    .parse()
                    .map_err(|_| ConfigError::ParseN(trimmed.to_string()))?;
                n = Some(parsed);
                continue;
            }
            Some(n) => n,
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(ConfigError::ParseEdge { line: line_no });
        }
        let a: i32 = fields[0]
            .parse()
            .map_err(|_| ConfigError::ParseEdge { line: line_no })?;
        let b: i32 = fields[1]
            .parse()
            .map_err(|_| ConfigError::ParseEdge { line: line_no })?;
        let c: i32 = fields[2]
            .parse()
            .map_err(|_| ConfigError::ParseEdge { line: line_no })?;

        if a < 0 || a >= n {
            return Err(ConfigError::SwitchIdOutOfRange { id: a, n });
        }
        if b < 0 || b >= n {
            return Err(ConfigError::SwitchIdOutOfRange { id: b, n });
        }
        if c < 1 || c > MAX_COST {
            return Err(ConfigError::CostOutOfRange(c));
        }

        adjacency.entry(a).or_default().push((b, c));
        adjacency.entry(b).or_default().push((a, c));
    }

    let n = n.ok_or_else(|| ConfigError::ParseN(String::new()))?;

    for neighbors in adjacency.values_mut() {
        neighbors.sort_unstable();
        neighbors.dedup();
    }

    Ok(Template {
        switch_count: n,
        adjacency,
    })
}

/// Load and parse a template from a config file on disk.
pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> Result<Template, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    load_template_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_node_line_topology() {
        let template = load_template_from_str("4\n0 1 1\n1 2 1\n2 3 1\n").unwrap();
        assert_eq!(template.switch_count(), 4);
        assert_eq!(template.neighbors_of(0), &[(1, 1)]);
        assert_eq!(template.neighbors_of(1), &[(0, 1), (2, 1)]);
        assert_eq!(template.neighbors_of(3), &[(2, 1)]);
    }

    #[test]
    fn tolerates_blank_lines() {
        let template = load_template_from_str("\n\n4\n\n0 1 1\n\n1 2 1\n2 3 1\n\n").unwrap();
        assert_eq!(template.switch_count(), 4);
        assert_eq!(template.neighbors_of(1), &[(0, 1), (2, 1)]);
    }

    #[test]
    fn rejects_malformed_n() {
        let err = load_template_from_str("not-a-number\n0 1 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseN(_)));
    }

    #[test]
    fn rejects_malformed_edge_line() {
        let err = load_template_from_str("2\n0 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseEdge { line: 2 }));
    }

    #[test]
    fn rejects_out_of_range_switch_id() {
        let err = load_template_from_str("2\n0 5 1\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SwitchIdOutOfRange { id: 5, n: 2 }
        ));
    }

    #[test]
    fn rejects_nonpositive_cost() {
        let err = load_template_from_str("2\n0 1 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::CostOutOfRange(0)));
    }

    #[test]
    fn rejects_cost_at_unreachable_sentinel() {
        let err = load_template_from_str("2\n0 1 9999\n").unwrap_err();
        assert!(matches!(err, ConfigError::CostOutOfRange(9999)));
    }

    #[test]
    fn switch_with_no_edges_has_empty_neighbor_list() {
        let template = load_template_from_str("3\n0 1 1\n").unwrap();
        assert!(template.neighbors_of(2).is_empty());
    }
}

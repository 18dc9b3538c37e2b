//! Independent correctness checking, run against a finished BFS result
//! rather than trusted blindly. Grounded on `debug_utils.h`'s
//! `check_bfs_correctness`, with its print-and-return-bool shape replaced by
//! a list of concrete [`Mismatch`]es the caller can inspect or assert on.

use crate::config::VERT_MAX;
use crate::csr::Csr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The source's own distance wasn't zero.
    SourceDistanceNotZero { got: u32 },
    /// A non-source vertex recorded distance zero.
    NonSourceAtDistanceZero { vertex: u32 },
    /// A vertex marked unreachable has a neighbor that is reachable — in an
    /// undirected graph that neighbor's edge would make `vertex` reachable
    /// too.
    UnreachableHasReachableNeighbor { vertex: u32, neighbor: u32 },
    /// `dist[v] > dist[u] + 1` for an edge `(u, v)`: a BFS edge can only
    /// ever increase distance by exactly one hop.
    EdgeRelaxationViolated { u: u32, v: u32, dist_u: u32, dist_v: u32 },
    /// A reachable non-source vertex has no neighbor one hop closer to the
    /// source, so nothing could have discovered it at its recorded distance.
    MissingPredecessor { vertex: u32, dist: u32 },
    /// The source itself isn't its own parent.
    SourceIsNotOwnParent { got: u32 },
    /// A non-source vertex has a parent that both (a) is not `VERT_MAX` and
    /// (b) is not actually one of its neighbors in the graph.
    ParentIsNotANeighbor { vertex: u32, parent: u32 },
    /// A vertex with no parent recorded has a neighbor that does have one.
    UnreachableHasParentedNeighbor { vertex: u32, neighbor: u32 },
}

/// Checks the five properties `debug_utils.h` checks: source at zero,
/// no other vertex at zero, edge relaxation, predecessor existence, and
/// reachability closure over unreachable vertices.
pub fn check_distances(csr: &Csr, distances: &[u32], source: u32) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    if distances[source as usize] != 0 {
        mismatches.push(Mismatch::SourceDistanceNotZero {
            got: distances[source as usize],
        });
    }

    for u in 0..csr.nrows {
        let dist_u = distances[u as usize];

        if dist_u == VERT_MAX {
            for &v in csr.neighbors(u) {
                if distances[v as usize] != VERT_MAX {
                    mismatches.push(Mismatch::UnreachableHasReachableNeighbor { vertex: u, neighbor: v });
                }
            }
            continue;
        }

        if dist_u == 0 && u != source {
            mismatches.push(Mismatch::NonSourceAtDistanceZero { vertex: u });
        }

        let mut found_predecessor = dist_u == 0;
        for &v in csr.neighbors(u) {
            let dist_v = distances[v as usize];
            if dist_v != VERT_MAX && dist_v > dist_u + 1 {
                mismatches.push(Mismatch::EdgeRelaxationViolated { u, v, dist_u, dist_v });
            }
            if dist_u > 0 && dist_v == dist_u - 1 {
                found_predecessor = true;
            }
        }
        if !found_predecessor {
            mismatches.push(Mismatch::MissingPredecessor { vertex: u, dist: dist_u });
        }
    }

    mismatches
}

/// Checks the parent-array analogue: the source is its own parent, every
/// other parented vertex's parent is a real neighbor, and reachability
/// closure holds the same way it does for distances.
pub fn check_parents(csr: &Csr, parents: &[u32], source: u32) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    if parents[source as usize] != source {
        mismatches.push(Mismatch::SourceIsNotOwnParent {
            got: parents[source as usize],
        });
    }

    for u in 0..csr.nrows {
        let parent_u = parents[u as usize];

        if parent_u == VERT_MAX {
            for &v in csr.neighbors(u) {
                if parents[v as usize] != VERT_MAX {
                    mismatches.push(Mismatch::UnreachableHasParentedNeighbor { vertex: u, neighbor: v });
                }
            }
            continue;
        }

        if u == source {
            continue;
        }
        if !csr.neighbors(u).contains(&parent_u) {
            mismatches.push(Mismatch::ParentIsNotANeighbor { vertex: u, parent: parent_u });
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference;

    fn path4() -> (Vec<u32>, Vec<u32>) {
        (vec![0, 1, 3, 5, 6], vec![1, 0, 2, 1, 3, 2])
    }

    #[test]
    fn reference_distances_pass_their_own_check() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        let dist = reference::distances(&csr, 0);
        assert!(check_distances(&csr, &dist, 0).is_empty());
    }

    #[test]
    fn reference_parents_pass_their_own_check() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        let parents = reference::parents(&csr, 0);
        assert!(check_parents(&csr, &parents, 0).is_empty());
    }

    #[test]
    fn catches_a_source_not_at_zero() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        let mut dist = reference::distances(&csr, 0);
        dist[0] = 5;
        let mismatches = check_distances(&csr, &dist, 0);
        assert!(mismatches.contains(&Mismatch::SourceDistanceNotZero { got: 5 }));
    }

    #[test]
    fn catches_a_skipped_hop() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        let mut dist = reference::distances(&csr, 0);
        dist[3] = 7; // should be 3
        let mismatches = check_distances(&csr, &dist, 0);
        assert!(mismatches
            .iter()
            .any(|m| matches!(m, Mismatch::EdgeRelaxationViolated { .. })));
    }

    #[test]
    fn catches_a_bogus_parent_edge() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        let mut parents = reference::parents(&csr, 0);
        parents[3] = 0; // 0 is not a neighbor of 3
        let mismatches = check_parents(&csr, &parents, 0);
        assert!(mismatches.contains(&Mismatch::ParentIsNotANeighbor { vertex: 3, parent: 0 }));
    }
}

//! A plain, single-threaded BFS used only to check the parallel engine's
//! output. Grounded on `implementations/reference.cpp`: a level-by-level
//! `VecDeque`, no chunking, no direction switch.

use std::collections::VecDeque;

use crate::config::VERT_MAX;
use crate::csr::Csr;

/// Distances from `source`, `VERT_MAX` for anything unreachable.
pub fn distances(csr: &Csr, source: u32) -> Vec<u32> {
    let mut dist = vec![VERT_MAX; csr.nrows as usize];
    dist[source as usize] = 0;
    let mut frontier = VecDeque::new();
    frontier.push_back(source);
    while let Some(v) = frontier.pop_front() {
        for &n in csr.neighbors(v) {
            if dist[n as usize] == VERT_MAX {
                dist[n as usize] = dist[v as usize] + 1;
                frontier.push_back(n);
            }
        }
    }
    dist
}

/// Parents from `source`; the source's own entry is `source`, matching
/// `merged_csr_parents.cpp`'s convention (`PARENT_ID(start) = source`).
pub fn parents(csr: &Csr, source: u32) -> Vec<u32> {
    let mut parent = vec![VERT_MAX; csr.nrows as usize];
    parent[source as usize] = source;
    let mut frontier = VecDeque::new();
    frontier.push_back(source);
    while let Some(v) = frontier.pop_front() {
        for &n in csr.neighbors(v) {
            if parent[n as usize] == VERT_MAX {
                parent[n as usize] = v;
                frontier.push_back(n);
            }
        }
    }
    parent
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> (Vec<u32>, Vec<u32>) {
        (vec![0, 1, 3, 5, 6], vec![1, 0, 2, 1, 3, 2])
    }

    fn cycle4() -> (Vec<u32>, Vec<u32>) {
        (vec![0, 2, 4, 6, 8], vec![1, 3, 0, 2, 1, 3, 2, 0])
    }

    #[test]
    fn distances_on_a_path() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        assert_eq!(distances(&csr, 0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn distances_on_a_cycle_take_the_short_way_round() {
        let (row_ptr, col_idx) = cycle4();
        let csr = Csr::new(4, 8, &row_ptr, &col_idx).unwrap();
        assert_eq!(distances(&csr, 0), vec![0, 1, 2, 1]);
    }

    #[test]
    fn unreachable_vertices_stay_at_the_sentinel() {
        let row_ptr = vec![0u32, 1, 1, 2, 2];
        let col_idx = vec![2u32, 0];
        let csr = Csr::new(4, 2, &row_ptr, &col_idx).unwrap();
        let dist = distances(&csr, 0);
        assert_eq!(dist[0], 0);
        assert_eq!(dist[1], VERT_MAX);
        assert_eq!(dist[3], VERT_MAX);
    }

    #[test]
    fn parents_on_a_path_root_at_source() {
        let (row_ptr, col_idx) = path4();
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        assert_eq!(parents(&csr, 0), vec![0, 0, 1, 2]);
    }
}

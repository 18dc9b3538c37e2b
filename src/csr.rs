use crate::error::Error;

/// A borrowed compressed-sparse-row view of an unweighted, undirected graph.
///
/// The engine never retains a `Csr` past construction of a
/// [`crate::layout::MergedLayout`]: it is read once to build the merged
/// layout, then dropped.
#[derive(Debug, Clone, Copy)]
pub struct Csr<'a> {
    pub nrows: u32,
    pub nnz: u32,
    pub row_ptr: &'a [u32],
    pub col_idx: &'a [u32],
}

impl<'a> Csr<'a> {
    /// Builds a `Csr`, checking the structural invariants the rest of this
    /// crate assumes: `row_ptr` has `nrows + 1` entries, is non-decreasing, ends
    /// at `nnz`, and every neighbor id is in range.
    pub fn new(
        nrows: u32,
        nnz: u32,
        row_ptr: &'a [u32],
        col_idx: &'a [u32],
    ) -> Result<Self, Error> {
        if row_ptr.len() != nrows as usize + 1 {
            return Err(Error::InvalidGraph(format!(
                "row_ptr has {} entries, expected {}",
                row_ptr.len(),
                nrows + 1
            )));
        }
        if col_idx.len() != nnz as usize {
            return Err(Error::InvalidGraph(format!(
                "col_idx has {} entries, expected nnz={}",
                col_idx.len(),
                nnz
            )));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidGraph("row_ptr is not monotone".into()));
        }
        if row_ptr.last().copied() != Some(nnz) {
            return Err(Error::InvalidGraph("row_ptr[N] != nnz".into()));
        }
        if col_idx.iter().any(|&c| c >= nrows) {
            return Err(Error::InvalidGraph(
                "col_idx contains an out-of-range neighbor".into(),
            ));
        }
        Ok(Csr {
            nrows,
            nnz,
            row_ptr,
            col_idx,
        })
    }

    #[inline]
    pub fn degree(&self, v: u32) -> u32 {
        self.row_ptr[v as usize + 1] - self.row_ptr[v as usize]
    }

    #[inline]
    pub fn neighbors(&self, v: u32) -> &'a [u32] {
        let start = self.row_ptr[v as usize] as usize;
        let end = self.row_ptr[v as usize + 1] as usize;
        &self.col_idx[start..end]
    }

    /// Validates that `source` names a vertex with at least one edge: an
    /// isolated vertex can never be the root of a traversal that reaches
    /// anything.
    pub fn check_source(&self, source: u32) -> Result<(), Error> {
        if source >= self.nrows || self.degree(source) == 0 {
            return Err(Error::InvalidSource {
                source,
                nrows: self.nrows,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_monotone_row_ptr() {
        let row_ptr = [0u32, 2, 1, 3];
        let col_idx = [1u32, 2, 0];
        assert!(Csr::new(3, 3, &row_ptr, &col_idx).is_err());
    }

    #[test]
    fn rejects_out_of_range_neighbor() {
        let row_ptr = [0u32, 1, 2];
        let col_idx = [1u32, 5];
        assert!(Csr::new(2, 2, &row_ptr, &col_idx).is_err());
    }

    #[test]
    fn accepts_valid_path() {
        let row_ptr = [0u32, 1, 3, 5, 6];
        let col_idx = [1u32, 0, 2, 1, 3, 2];
        let csr = Csr::new(4, 6, &row_ptr, &col_idx).unwrap();
        assert_eq!(csr.degree(1), 2);
        assert_eq!(csr.neighbors(0), &[1]);
    }

    #[test]
    fn rejects_isolated_source() {
        let row_ptr = [0u32, 1, 1, 2];
        let col_idx = [2u32, 0];
        let csr = Csr::new(3, 2, &row_ptr, &col_idx).unwrap();
        assert!(csr.check_source(1).is_err());
    }
}

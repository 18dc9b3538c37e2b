//! A minimal Matrix Market coordinate-format reader, turning a `.mtx` file
//! into an unweighted undirected CSR.
//!
//! `bfs.c` loads graphs through `mmio_read_csr_u32_f32`, a third-party
//! wrapper whose implementation isn't part of the code this crate was
//! distilled from; this reader covers the same SuiteSparse coordinate
//! format directly rather than bind to that library. Every entry is
//! symmetrized unconditionally (both `(i, j)` and `(j, i)` are added),
//! regardless of the file's declared `symmetric`/`general` token: the
//! engine's contract is an undirected graph, a duplicate neighbor entry
//! from an already-symmetric file is harmless, and silently dropping a
//! reverse edge would not be.

use std::io::{BufRead, BufReader, Read};

use crate::error::{Error, Result};

pub struct MtxGraph {
    pub nrows: u32,
    pub row_ptr: Vec<u32>,
    pub col_idx: Vec<u32>,
}

pub fn read_csr<R: Read>(reader: R) -> Result<MtxGraph> {
    let mut lines = BufReader::new(reader).lines();

    let banner = lines
        .next()
        .ok_or_else(|| Error::InvalidGraph("empty .mtx file".into()))??;
    if !banner.starts_with("%%MatrixMarket") {
        return Err(Error::InvalidGraph("missing %%MatrixMarket banner".into()));
    }

    let mut dims_line = None;
    for line in &mut lines {
        let line = line?;
        if line.trim_start().starts_with('%') || line.trim().is_empty() {
            continue;
        }
        dims_line = Some(line);
        break;
    }
    let dims_line = dims_line.ok_or_else(|| Error::InvalidGraph("missing dimensions line".into()))?;
    let mut dims = dims_line.split_whitespace();
    let nrows: u32 = parse_field(&mut dims, "rows")?;
    let _ncols: u32 = parse_field(&mut dims, "cols")?;
    let nnz_declared: usize = parse_field(&mut dims, "nnz")?;

    let mut edges: Vec<(u32, u32)> = Vec::with_capacity(nnz_declared * 2);
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let i: u32 = parse_field(&mut fields, "row index")?;
        let j: u32 = parse_field(&mut fields, "column index")?;
        if i == 0 || j == 0 {
            return Err(Error::InvalidGraph("Matrix Market indices are 1-based".into()));
        }
        let (u, v) = (i - 1, j - 1);
        if u >= nrows || v >= nrows {
            return Err(Error::InvalidGraph("edge references a row past the declared count".into()));
        }
        edges.push((u, v));
        if u != v {
            edges.push((v, u));
        }
    }

    edges.sort_unstable();
    let mut row_ptr = vec![0u32; nrows as usize + 1];
    for &(u, _) in &edges {
        row_ptr[u as usize + 1] += 1;
    }
    for i in 0..nrows as usize {
        row_ptr[i + 1] += row_ptr[i];
    }
    let col_idx: Vec<u32> = edges.into_iter().map(|(_, v)| v).collect();

    Ok(MtxGraph { nrows, row_ptr, col_idx })
}

fn parse_field<'a, I: Iterator<Item = &'a str>>(fields: &mut I, what: &str) -> Result<u32> {
    fields
        .next()
        .ok_or_else(|| Error::InvalidGraph(format!("missing {what}")))?
        .parse::<u32>()
        .map_err(Error::from)
}

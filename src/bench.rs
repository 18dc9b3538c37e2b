//! Run timing and source-vertex generation for the benchmark harness.
//!
//! Grounded on `benchmark.h`/`benchmark.c` (start/end timer pair, CSV append
//! with a header written only to an empty file) and on `bfs.c`'s
//! `generate_sources` (fixed source, or a seeded PRNG skipping degree-zero
//! vertices). The global mutable timer state from `benchmark.c` becomes a
//! plain [`std::time::Instant`] local to the caller; nothing here is shared
//! across threads.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::SEED;
use crate::csr::Csr;
use crate::error::Result;

/// One completed run, ready to become a CSV row.
///
/// `experiment` and `params` mirror `BENCHMARK_START(exp_name, run_id,
/// params)`'s first and third arguments: a short name for what's being
/// measured, and an arbitrary free-form description of the conditions
/// (thread count, source vertex, shape) that produced `elapsed`.
pub struct RunRecord {
    pub experiment: String,
    pub run_id: usize,
    pub source: u32,
    pub threads: usize,
    pub params: String,
    pub elapsed: Duration,
}

/// Times a single BFS invocation, the `BENCHMARK_START`/`BENCHMARK_END` pair
/// collapsed into one scope.
pub fn time_run<F: FnOnce()>(
    experiment: &str,
    run_id: usize,
    source: u32,
    threads: usize,
    params: String,
    f: F,
) -> RunRecord {
    let start = Instant::now();
    f();
    RunRecord {
        experiment: experiment.to_string(),
        run_id,
        source,
        threads,
        params,
        elapsed: start.elapsed(),
    }
}

/// Appends `record` to `path` as a CSV row, writing the header first if the
/// file is new or empty. `experiment` and `params` are quoted, matching
/// `write_to_csv`'s `"%s",%d,"%s",%.4f` format, since either may contain a
/// comma.
pub fn append_csv(path: &Path, record: &RunRecord) -> Result<()> {
    let needs_header = !path.exists() || std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_header {
        writeln!(file, "experiment,run_id,params,duration_s")?;
    }
    writeln!(
        file,
        "\"{}\",{},\"{}\",{:.6}",
        record.experiment,
        record.run_id,
        record.params,
        record.elapsed.as_secs_f64()
    )?;
    Ok(())
}

/// Builds the list of source vertices for a multi-run benchmark: `runs`
/// copies of `fixed` when given, otherwise `runs` seeded-random vertices,
/// each resampled until it has at least one neighbor.
pub fn generate_sources(csr: &Csr, runs: usize, fixed: Option<u32>) -> Vec<u32> {
    if let Some(source) = fixed {
        return vec![source; runs];
    }

    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut sources = Vec::with_capacity(runs);
    while sources.len() < runs {
        let candidate = rng.random_range(0..csr.nrows);
        if !csr.neighbors(candidate).is_empty() {
            sources.push(candidate);
        }
    }
    sources
}

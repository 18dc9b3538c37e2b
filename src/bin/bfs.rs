//! Command-line driver: load a graph, run one or more BFS traversals from a
//! chosen (or randomly generated) source, optionally check correctness, and
//! report timing.
//!
//! Grounded on `cli_parser.h`'s `AppArgs` (`-f/--file`, `-n/--runs`,
//! `-s/--source`, `-c/--check`) and `bfs.c`'s `main`, with the declarative
//! C argument table replaced by `structopt`'s derive, matching how the
//! solver's own binaries (`xputils.rs`) declare their arguments.

use std::path::PathBuf;
use std::process::exit;

use merged_bfs::bench::{append_csv, generate_sources, time_run};
use merged_bfs::csr::Csr;
use merged_bfs::engine::Engine;
use merged_bfs::layout::Shape;
use merged_bfs::mtx;
use merged_bfs::verify;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "A parallel level-synchronous BFS over large sparse graphs.")]
struct Args {
    /// Path to a Matrix Market (.mtx) graph file.
    #[structopt(short, long, parse(from_os_str))]
    file: PathBuf,

    /// Number of BFS runs.
    #[structopt(short = "n", long, default_value = "1")]
    runs: usize,

    /// Fixed source vertex; when absent, sources are drawn from a seeded PRNG.
    #[structopt(short, long)]
    source: Option<u32>,

    /// Also compute and record parents, not just distances.
    #[structopt(short, long)]
    parents: bool,

    /// Verify each run's result against the independent correctness checks.
    #[structopt(short, long)]
    check: bool,

    /// Worker thread count; defaults to the number of logical cores.
    #[structopt(short = "T", long)]
    threads: Option<usize>,

    /// Append per-run timing to this CSV file instead of only printing it.
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,
}

fn main() {
    let args = Args::from_args();

    let file = match std::fs::File::open(&args.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("failed to open {}: {e}", args.file.display());
            exit(-1);
        }
    };
    let graph = match mtx::read_csr(file) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("failed to load graph from {}: {e}", args.file.display());
            exit(-1);
        }
    };

    let threads = args
        .threads
        .unwrap_or_else(|| num_cpus::get().min(merged_bfs::config::MAX_THREADS));
    let shape = if args.parents { Shape::Parents } else { Shape::Distances };

    let engine = match Engine::build(graph.row_ptr.clone(), graph.col_idx.clone(), shape, threads) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to build engine from {}: {e}", args.file.display());
            exit(-1);
        }
    };

    let csr = Csr::new(graph.nrows, graph.col_idx.len() as u32, &graph.row_ptr, &graph.col_idx)
        .expect("mtx::read_csr produces a structurally valid CSR");
    let sources = generate_sources(&csr, args.runs, args.source);

    println!("algorithm={:?} threads={} runs={}", engine.algorithm(), threads, args.runs);

    let experiment = if args.parents { "bfs_parents" } else { "bfs_distances" };

    for (run_id, &source) in sources.iter().enumerate() {
        let mut result = Vec::new();
        let params = format!("threads={threads} source={source} algorithm={:?}", engine.algorithm());
        let record = time_run(experiment, run_id, source, threads, params, || {
            result = match engine.run(source) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("run {run_id} failed: {e}");
                    exit(1);
                }
            };
        });

        println!(
            "run_id={} source={} threads={} elapsed={:.6}",
            record.run_id,
            record.source,
            record.threads,
            record.elapsed.as_secs_f64()
        );

        if args.check {
            let mismatches = if args.parents {
                verify::check_parents(&csr, &result, source)
            } else {
                verify::check_distances(&csr, &result, source)
            };
            if mismatches.is_empty() {
                println!("run_id={run_id} check=ok");
            } else {
                println!("run_id={run_id} check=FAILED ({} mismatches)", mismatches.len());
                for m in &mismatches {
                    println!("  {m:?}");
                }
            }
        }

        if let Some(csv_path) = &args.csv {
            if let Err(e) = append_csv(csv_path, &record) {
                eprintln!("failed to append to {}: {e}", csv_path.display());
            }
        }
    }
}

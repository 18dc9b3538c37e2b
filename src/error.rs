use std::io;

/// Errors surfaced by graph ingestion and engine construction.
///
/// Propagation stops before the engine is built: a malformed graph or an
/// isolated source is reported to the caller rather than discovered mid-run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("source {source} is isolated or out of range (nrows={nrows})")]
    InvalidSource { source: u32, nrows: u32 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("expected int: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("failed to allocate the merged layout for a graph this large")]
    AllocationFailure,
}

pub type Result<T> = std::result::Result<T, Error>;

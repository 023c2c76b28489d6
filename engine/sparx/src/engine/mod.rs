//! Execution engine.
//!
//! Chunk dispatch and result composition: one worker per chunk, results
//! collected in chunk order, folded left to right into the final mapping.

mod merge;
mod tree;
mod worker;

use crate::automaton::Automaton;
use crate::splitter::split_document;
use crate::types::{ChunkResult, Mapping, Mode, ParseError};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

// =============================================================================
// ORCHESTRATION
// =============================================================================

/// Evaluate a compiled query against in-memory document bytes.
///
/// In [`Mode::Parallel`] the document is cut into up to `workers` chunks on
/// `<` boundaries and each chunk is processed on its own thread; in
/// [`Mode::Sequential`] the whole document is one chunk on the calling
/// thread. Returns `None` when the query cannot match: empty path, empty
/// document, a worker's parse error, or incompatible chunk results.
#[must_use]
pub fn evaluate(
    automaton: &Automaton,
    document: &[u8],
    workers: usize,
    mode: Mode,
) -> Option<Mapping> {
    if automaton.is_empty() {
        tracing::info!("empty query path matches nothing");
        return None;
    }
    if document.is_empty() {
        tracing::info!("empty document");
        return None;
    }
    let started = Instant::now();
    let chunks = match mode {
        Mode::Sequential => vec![document.to_vec()],
        Mode::Parallel => split_document(document, workers),
    };
    tracing::info!(chunks = chunks.len(), elapsed = ?started.elapsed(), "document split");
    evaluate_chunks(automaton, chunks, mode)
}

/// Evaluate a query over pre-cut chunks.
///
/// Every chunk after the first must begin with `<` (or be empty), the
/// invariant [`split_document`] establishes. Exposed so callers holding
/// already-chunked data can drive the engine directly.
#[must_use]
pub fn evaluate_chunks(
    automaton: &Automaton,
    chunks: Vec<Vec<u8>>,
    mode: Mode,
) -> Option<Mapping> {
    if automaton.is_empty() {
        return None;
    }
    let started = Instant::now();
    let outcomes = run_workers(automaton, chunks, mode);
    tracing::info!(elapsed = ?started.elapsed(), "all workers joined");

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(error) => {
                tracing::warn!(%error, "worker failed; query cannot match");
                return None;
            }
        }
    }
    let started = Instant::now();
    let mapping = merge::merge(&results);
    tracing::info!(elapsed = ?started.elapsed(), matched = mapping.is_some(), "results merged");
    mapping
}

/// Evaluate a query against a document file.
///
/// # Errors
/// Returns the underlying I/O error when the file cannot be read.
pub fn evaluate_file(
    automaton: &Automaton,
    path: &Path,
    workers: usize,
    mode: Mode,
) -> io::Result<Option<Mapping>> {
    let document = fs::read(path)?;
    Ok(evaluate(automaton, &document, workers, mode))
}

// =============================================================================
// WORKER DISPATCH
// =============================================================================

/// Fan the chunks out, one worker per chunk, and collect every worker's
/// result in chunk order through the parallel map itself.
#[cfg(feature = "multithread")]
fn run_workers(
    automaton: &Automaton,
    chunks: Vec<Vec<u8>>,
    mode: Mode,
) -> Vec<Result<ChunkResult, ParseError>> {
    use rayon::prelude::*;
    match mode {
        Mode::Parallel => chunks
            .into_par_iter()
            .enumerate()
            .map(|(index, chunk)| worker::run_chunk(automaton, index, &chunk))
            .collect(),
        Mode::Sequential => run_serial(automaton, chunks),
    }
}

/// Without the `multithread` feature every chunk runs on the calling thread.
#[cfg(not(feature = "multithread"))]
fn run_workers(
    automaton: &Automaton,
    chunks: Vec<Vec<u8>>,
    _mode: Mode,
) -> Vec<Result<ChunkResult, ParseError>> {
    run_serial(automaton, chunks)
}

fn run_serial(
    automaton: &Automaton,
    chunks: Vec<Vec<u8>>,
) -> Vec<Result<ChunkResult, ParseError>> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| worker::run_chunk(automaton, index, &chunk))
        .collect()
}

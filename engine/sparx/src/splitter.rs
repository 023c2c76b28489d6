//! Chunk splitter.
//!
//! Cuts the document into `N` contiguous byte ranges whose boundaries sit
//! immediately before a `<`, so every chunk after the first begins with an
//! open angle bracket (or is empty) and the tokenizer starts outside any tag
//! regardless of the surrounding nesting. Text runs are never split: the cut
//! point slides forward past any character data following the target size.

use std::fs;
use std::io;
use std::path::Path;

// =============================================================================
// SPLITTING
// =============================================================================

/// Read a file and split it into `workers` chunks on `<` boundaries.
///
/// Each chunk is an owned buffer whose ownership passes to its worker.
///
/// # Errors
/// Returns the underlying I/O error when the file cannot be read.
pub fn split_file(path: &Path, workers: usize) -> io::Result<Vec<Vec<u8>>> {
    let bytes = fs::read(path)?;
    Ok(split_document(&bytes, workers))
}

/// Split in-memory document bytes into at most `workers` chunks.
///
/// The target chunk size is `ceil(len / workers)`; every chunk except the
/// last is extended byte by byte until the next byte is `<`. An empty
/// document yields a single empty chunk. A document shorter than the worker
/// count yields fewer chunks than requested.
#[must_use]
pub fn split_document(bytes: &[u8], workers: usize) -> Vec<Vec<u8>> {
    let workers = workers.max(1);
    if bytes.is_empty() {
        return vec![Vec::new()];
    }

    let target = bytes.len().div_ceil(workers);
    let mut chunks = Vec::with_capacity(workers);
    let mut start = 0;
    for _ in 0..workers - 1 {
        if start >= bytes.len() {
            break;
        }
        let mut cut = (start + target).min(bytes.len());
        while cut < bytes.len() && bytes[cut] != b'<' {
            cut += 1;
        }
        chunks.push(bytes[start..cut].to_vec());
        start = cut;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

// =============================================================================
// TESTS
// =============================================================================

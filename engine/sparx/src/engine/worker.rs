//! Per-chunk worker.
//!
//! A worker owns one chunk, runs the tokenizer over it, feeds the events
//! into a fresh dual-stack tree, and harvests the surviving mappings. All of
//! its state is thread-local; only the compiled automaton is shared, read
//! only.

use crate::automaton::Automaton;
use crate::engine::tree::DualStackTree;
use crate::tokenizer::{Tokenizer, XmlEvent};
use crate::types::{ChunkResult, ParseError};

/// Process one chunk to completion.
///
/// # Errors
/// Returns the tokenizer's [`ParseError`] when the chunk contains a
/// forbidden transition; the tree built so far is discarded and the caller
/// treats the whole query as unmatched.
pub(crate) fn run_chunk(
    automaton: &Automaton,
    index: usize,
    chunk: &[u8],
) -> Result<ChunkResult, ParseError> {
    tracing::info!(worker = index, bytes = chunk.len(), "worker started");
    let mut tree = DualStackTree::new(automaton, index == 0);
    for event in Tokenizer::new(chunk) {
        match event? {
            XmlEvent::Open(name) => tree.open(name),
            XmlEvent::Close(name) => tree.close(name),
            XmlEvent::Text(text) => tree.text(text),
        }
    }
    let candidates = tree.harvest();
    tracing::info!(
        worker = index,
        candidates = candidates.len(),
        "worker finished"
    );
    Ok(ChunkResult { index, candidates })
}

// =============================================================================
// TESTS
// =============================================================================

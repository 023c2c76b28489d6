//! Left-to-right composition of chunk results.
//!
//! The accumulator carries the entry configuration of chunk 0 and, after
//! folding chunk `i`, the exit state and open-frame stack of the document
//! prefix. Folding the next chunk selects the candidate whose entry
//! hypothesis matches the accumulated exit: same state, and its revealed
//! context states must equal the top of the accumulated stack, frame by
//! frame. The revealed frames cancel against the stack and the chunk's own
//! frames are appended; full cancellation and plain concatenation are the
//! two endpoints of that rule. No candidate matching means the chunks are
//! incompatible and the query has no result.

use crate::types::{ChunkResult, Mapping};

/// Fold the per-chunk results, in chunk order, into the final mapping.
///
/// Returns `None` when any step finds no compatible candidate.
pub(crate) fn merge(results: &[ChunkResult]) -> Option<Mapping> {
    let first = results.first()?;
    let mut accumulator = first
        .candidates
        .iter()
        .find(|candidate| candidate.begin == 1 && candidate.begin_stack.is_empty())?
        .clone();

    for result in &results[1..] {
        let candidate = select(result, &accumulator)?;
        tracing::trace!(
            chunk = result.index,
            begin = candidate.begin,
            cancelled = candidate.begin_stack.len(),
            "merged chunk"
        );
        let keep = accumulator.end_stack.len() - candidate.begin_stack.len();
        accumulator.end_stack.truncate(keep);
        accumulator.end_stack.extend_from_slice(&candidate.end_stack);
        accumulator.end = candidate.end;
        if let Some(extra) = &candidate.output {
            match &mut accumulator.output {
                Some(buffer) => {
                    buffer.push(b' ');
                    buffer.extend_from_slice(extra);
                }
                None => accumulator.output = Some(extra.clone()),
            }
        }
    }
    Some(accumulator)
}

/// Pick the candidate compatible with the accumulated exit configuration.
///
/// Candidate reveal chains are prefix-free per entry state, so at most one
/// candidate matches.
fn select<'a>(result: &'a ChunkResult, accumulator: &Mapping) -> Option<&'a Mapping> {
    result.candidates.iter().find(|candidate| {
        candidate.begin == accumulator.end
            && candidate.begin_stack.len() <= accumulator.end_stack.len()
            && candidate
                .begin_stack
                .iter()
                .zip(accumulator.end_stack.iter().rev())
                .all(|(revealed, frame)| revealed == frame)
    })
}

// =============================================================================
// TESTS
// =============================================================================

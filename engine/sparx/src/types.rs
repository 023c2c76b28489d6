//! Shared types used across the sparx library.

use core::fmt;
use std::error;

// =============================================================================
// STATES
// =============================================================================

/// Automaton state index.
///
/// A compiled path with `k` steps uses states `1..=k + 1`; state
/// [`OVERFLOW_STATE`] is the catch-all for open tags that do not match the
/// expected next step.
pub type State = usize;

/// The overflow sink: entered on any open tag that does not advance the
/// automaton, left again when the matching close tag balances it.
pub const OVERFLOW_STATE: State = 0;

// =============================================================================
// EXECUTION MODE
// =============================================================================

/// How the document is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One chunk, processed on the calling thread.
    Sequential,
    /// One chunk per worker, processed in parallel and merged.
    Parallel,
}

// =============================================================================
// MAPPINGS
// =============================================================================

/// A mapping between entry and exit configurations of one document region.
///
/// Workers report one `Mapping` per surviving entry hypothesis; the merger
/// folds them left to right into the final answer. Fields mirror the
/// dual-stack encoding:
///
/// - `begin` is the automaton state the region was entered in.
/// - `begin_stack` lists the enclosing-context states uncovered by close tags
///   that had no matching open inside the region, in pop order.
/// - `end` is the state reached at the end of the region.
/// - `end_stack` lists the region's own still-open frames, bottom first.
/// - `output` is the captured character data, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Entry state.
    pub begin: State,
    /// Context states revealed by unmatched close tags, in pop order.
    pub begin_stack: Vec<State>,
    /// Exit state.
    pub end: State,
    /// States of frames opened in the region and not yet closed, bottom first.
    pub end_stack: Vec<State>,
    /// Captured character data, space-joined across captures.
    pub output: Option<Vec<u8>>,
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, ", self.begin)?;
        for state in &self.begin_stack {
            write!(f, "{state}:")?;
        }
        write!(f, ", {}, ", self.end)?;
        // Exit frames print top first, mirroring pop order.
        for state in self.end_stack.iter().rev() {
            write!(f, "{state}:")?;
        }
        write!(f, ", ")?;
        match &self.output {
            Some(text) => write!(f, "{}", String::from_utf8_lossy(text)),
            None => write!(f, "null"),
        }
    }
}

/// The result of one worker: its chunk index and every surviving mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    /// Position of the chunk in document order.
    pub index: usize,
    /// One mapping per entry hypothesis that survived the chunk.
    pub candidates: Vec<Mapping>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error for a forbidden tokenizer transition.
///
/// A parse error aborts the worker that hit it; other workers keep running
/// and the overall query reports no match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A byte that no tokenizer state accepts at this position.
    UnexpectedByte {
        /// The offending byte.
        byte: u8,
        /// Offset of the byte inside the chunk.
        offset: usize,
    },
    /// The chunk ended inside an unfinished tag, comment, or CDATA section.
    UnexpectedEof {
        /// Length of the chunk.
        offset: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedByte { byte, offset } => write!(
                f,
                "malformed XML: unexpected byte 0x{byte:02x} at offset {offset}"
            ),
            Self::UnexpectedEof { offset } => {
                write!(f, "malformed XML: input truncated at offset {offset}")
            }
        }
    }
}

impl error::Error for ParseError {}

//! # Sparx
//!
//! Speculative parallel evaluation of path-only XPath queries
//! (`/a/b/.../z`) over large XML documents.
//!
//! The document is cut into contiguous chunks aligned on `<` boundaries and
//! every chunk is parsed in parallel with no knowledge of its surrounding
//! nesting: each worker runs the query automaton from every candidate entry
//! state at once, encoding the survivors in a pair of stacks per candidate.
//! A final merge stitches the per-chunk results together, cancelling each
//! chunk's revealed context against the frames its predecessors left open.

//! # Usage
//! ```rust
//! use sparx::{Automaton, Mode};
//!
//! let automaton = Automaton::compile(b"/r/x");
//! let mapping = sparx::evaluate(&automaton, b"<r><x>A</x><x>B</x></r>", 2, Mode::Parallel)
//!     .expect("the path matches");
//! assert_eq!(mapping.output.as_deref(), Some(b"A B".as_slice()));
//! ```

// =============================================================================
// MODULES
// =============================================================================

mod automaton;
mod engine;
mod splitter;
mod tokenizer;
mod types;

// =============================================================================
// EXPORTS
// =============================================================================

pub use automaton::Automaton;
pub use engine::{evaluate, evaluate_chunks, evaluate_file};
pub use splitter::{split_document, split_file};
pub use tokenizer::{Tokenizer, XmlEvent};
pub use types::{ChunkResult, Mapping, Mode, ParseError, State, OVERFLOW_STATE};

//! Integration Tests
//!
//! End-to-end behaviour of the engine over whole documents: the basic match
//! scenarios, boundary documents, and failure modes.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use sparx::{Automaton, Mapping, Mode};

fn run(path: &[u8], doc: &[u8], workers: usize) -> Option<Mapping> {
    let automaton = Automaton::compile(path);
    sparx::evaluate(&automaton, doc, workers, Mode::Parallel)
}

fn output_text(mapping: &Mapping) -> Option<String> {
    mapping
        .output
        .as_ref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

// =============================================================================
// MATCH SCENARIOS
// =============================================================================

#[test]
fn test_single_worker_collects_all_matches() {
    let mapping = run(b"/r/x", b"<r><x>A</x><x>B</x></r>", 1).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("A B"));
    assert_eq!(mapping.begin, 1);
    assert_eq!(mapping.end, 1);
    assert!(mapping.begin_stack.is_empty());
    assert!(mapping.end_stack.is_empty());
}

#[test]
fn test_two_workers_agree_with_one() {
    let doc = b"<r><x>A</x><x>B</x></r>";
    let mapping = run(b"/r/x", doc, 2).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("A B"));
}

#[test]
fn test_three_workers_on_a_three_step_path() {
    let doc = b"<r><x><y>1</y></x><x><y>2</y><y>3</y></x></r>";
    let mapping = run(b"/r/x/y", doc, 3).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("1 2 3"));
}

#[test]
fn test_path_not_rooted_at_document_root() {
    // /a exists only under b, so the query yields no output, but the
    // mapping itself is consistent.
    let mapping = run(b"/a", b"<b><a>hi</a></b>", 1).expect("the run itself succeeds");
    assert_eq!(mapping.output, None);
    assert_eq!(mapping.begin, 1);
    assert_eq!(mapping.end, 1);
    assert!(mapping.to_string().ends_with("null"));
}

#[test]
fn test_truncated_document_is_no_match() {
    assert_eq!(run(b"/r/x", b"<r><x", 2), None);
    assert_eq!(run(b"/r/x", b"<r><x", 1), None);
}

#[test]
fn test_comments_and_cdata_do_not_leak_into_output() {
    let doc = b"<?xml version=\"1.0\"?>\
                <r><!-- a note\nspanning two lines -->\
                <x>real<!-- mid -->deal</x>\
                <x><![CDATA[not this]]>this</x></r>";
    let mapping = run(b"/r/x", doc, 1).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("real deal this"));
}

// =============================================================================
// BOUNDARY BEHAVIOUR
// =============================================================================

#[test]
fn test_empty_document_is_no_match() {
    assert_eq!(run(b"/r/x", b"", 3), None);
}

#[test]
fn test_empty_xpath_is_no_match() {
    assert_eq!(run(b"", b"<r><x>A</x></r>", 2), None);
}

#[test]
fn test_match_spanning_a_chunk_boundary() {
    let automaton = Automaton::compile(b"/r/x");
    let chunks = vec![b"<r><x>A</x>".to_vec(), b"<x>B</x></r>".to_vec()];
    let mapping =
        sparx::evaluate_chunks(&automaton, chunks, Mode::Parallel).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("A B"));
}

#[test]
fn test_unclosed_elements_stay_on_the_end_stack() {
    let mapping = run(b"/r/x", b"<r><x>A", 1).expect("tokenizes cleanly");
    assert_eq!(mapping.end, 3);
    assert_eq!(mapping.end_stack, vec![1, 2]);
    assert_eq!(output_text(&mapping).as_deref(), Some("A"));
}

#[test]
fn test_empty_elements_carry_no_text() {
    let mapping = run(b"/r/x", b"<r><x/><x>B</x></r>", 1).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("B"));
}

#[test]
fn test_unmatched_siblings_do_not_capture() {
    let doc = b"<r><u><x>N</x></u><x>Y</x><v/></r>";
    let mapping = run(b"/r/x", doc, 1).expect("must match");
    assert_eq!(output_text(&mapping).as_deref(), Some("Y"));
}

// =============================================================================
// MODES
// =============================================================================

#[test]
fn test_sequential_mode_equals_parallel_mode() {
    let automaton = Automaton::compile(b"/r/x");
    let doc: &[u8] = b"<r><x>A</x><u>noise</u><x>B</x></r>";
    let sequential = sparx::evaluate(&automaton, doc, 1, Mode::Sequential);
    let parallel = sparx::evaluate(&automaton, doc, 4, Mode::Parallel);
    assert_eq!(sequential, parallel);
    assert!(sequential.is_some());
}

#[test]
fn test_mapping_display_format() {
    let mapping = run(b"/r/x", b"<r><x>A", 1).expect("must match");
    assert_eq!(mapping.to_string(), "1, , 3, 2:1:, A");
}

//! Consistency & Equivalence Tests
//!
//! The two laws the chunked engine must satisfy:
//! - Sequential equivalence: any worker count yields the same final mapping
//!   as a single chunk.
//! - Chunk-boundary independence: cutting the document at any `<` boundary
//!   and merging the parts equals the one-chunk result.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sparx::{Automaton, Mapping, Mode};

fn reference(automaton: &Automaton, doc: &[u8]) -> Option<Mapping> {
    sparx::evaluate(automaton, doc, 1, Mode::Sequential)
}

// =============================================================================
// WORKER COUNT SWEEP
// =============================================================================

#[test]
fn test_worker_count_does_not_change_the_answer() {
    let automaton = Automaton::compile(b"/r/x");
    let doc: &[u8] = b"<r><x>alpha</x><u><x>shielded</x></u><x>beta</x><v>no</v></r>";
    let expected = reference(&automaton, doc);
    assert!(expected.is_some());
    for workers in 1..=8 {
        let actual = sparx::evaluate(&automaton, doc, workers, Mode::Parallel);
        assert_eq!(actual, expected, "diverged at {workers} workers");
    }
}

#[test]
fn test_worker_count_sweep_on_a_deep_path() {
    let automaton = Automaton::compile(b"/r/x/y");
    let doc: &[u8] = b"<r><x><y>1</y></x><x><y>2</y><y>3</y></x><x>skip<y>4</y></x></r>";
    let expected = reference(&automaton, doc);
    for workers in 1..=10 {
        let actual = sparx::evaluate(&automaton, doc, workers, Mode::Parallel);
        assert_eq!(actual, expected, "diverged at {workers} workers");
    }
}

// =============================================================================
// CHUNK-BOUNDARY INDEPENDENCE
// =============================================================================

#[test]
fn test_every_tag_boundary_is_a_valid_cut() {
    let automaton = Automaton::compile(b"/r/x");
    let doc: &[u8] = b"<r><x>A</x><u>n<w>deep</w></u><x>B</x></r>";
    let expected = reference(&automaton, doc);
    assert!(expected.is_some());
    for cut in 0..doc.len() {
        if doc[cut] != b'<' {
            continue;
        }
        let chunks = vec![doc[..cut].to_vec(), doc[cut..].to_vec()];
        let actual = sparx::evaluate_chunks(&automaton, chunks, Mode::Parallel);
        assert_eq!(actual, expected, "diverged when cut at byte {cut}");
    }
}

#[test]
fn test_double_cuts_compose() {
    let automaton = Automaton::compile(b"/r/x");
    let doc: &[u8] = b"<r><x>A</x><x>B</x><u><x>no</x></u></r>";
    let expected = reference(&automaton, doc);
    let boundaries: Vec<usize> = (0..doc.len()).filter(|&i| doc[i] == b'<').collect();
    for (i, &first) in boundaries.iter().enumerate() {
        for &second in &boundaries[i + 1..] {
            let chunks = vec![
                doc[..first].to_vec(),
                doc[first..second].to_vec(),
                doc[second..].to_vec(),
            ];
            let actual = sparx::evaluate_chunks(&automaton, chunks, Mode::Parallel);
            assert_eq!(actual, expected, "diverged at cuts {first}/{second}");
        }
    }
}

// =============================================================================
// RANDOMIZED DOCUMENTS
// =============================================================================

/// Grow a well-formed document from a small element alphabet, mixing
/// matching elements, foreign elements, text, comments, and empty-element
/// tags.
fn generate_document(rng: &mut StdRng) -> Vec<u8> {
    let mut doc = Vec::new();
    doc.extend_from_slice(b"<r>");
    for _ in 0..rng.gen_range(3..8) {
        generate_element(rng, &mut doc, 0);
    }
    doc.extend_from_slice(b"</r>");
    doc
}

fn generate_element(rng: &mut StdRng, doc: &mut Vec<u8>, depth: usize) {
    const NAMES: [&str; 4] = ["x", "y", "u", "v"];
    let name = NAMES[rng.gen_range(0..NAMES.len())];
    match rng.gen_range(0..10) {
        0 => {
            doc.extend_from_slice(format!("<{name}/>").as_bytes());
            return;
        }
        1 => {
            doc.extend_from_slice(b"<!-- filler -->");
            return;
        }
        _ => {}
    }
    doc.extend_from_slice(format!("<{name}>").as_bytes());
    for _ in 0..rng.gen_range(0..3) {
        if depth < 3 && rng.gen_bool(0.4) {
            generate_element(rng, doc, depth + 1);
        } else {
            let text = format!("t{}", rng.gen_range(0..100));
            doc.extend_from_slice(text.as_bytes());
        }
    }
    doc.extend_from_slice(format!("</{name}>").as_bytes());
}

#[test]
fn test_randomized_documents_agree_across_worker_counts() {
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let doc = generate_document(&mut rng);
        for path in [b"/r/x".as_slice(), b"/r/x/y", b"/r/u/x"] {
            let automaton = Automaton::compile(path);
            let expected = reference(&automaton, &doc);
            for workers in [2, 3, 5, 9] {
                let actual = sparx::evaluate(&automaton, &doc, workers, Mode::Parallel);
                assert_eq!(
                    actual,
                    expected,
                    "seed {seed}, path {}, {workers} workers, doc {}",
                    String::from_utf8_lossy(path),
                    String::from_utf8_lossy(&doc)
                );
            }
        }
    }
}

#[test]
fn test_randomized_two_way_cuts_agree() {
    for seed in 100..104 {
        let mut rng = StdRng::seed_from_u64(seed);
        let doc = generate_document(&mut rng);
        let automaton = Automaton::compile(b"/r/x");
        let expected = reference(&automaton, &doc);
        for cut in (0..doc.len()).filter(|&i| doc[i] == b'<') {
            let chunks = vec![doc[..cut].to_vec(), doc[cut..].to_vec()];
            let actual = sparx::evaluate_chunks(&automaton, chunks, Mode::Parallel);
            assert_eq!(
                actual,
                expected,
                "seed {seed}, cut {cut}, doc {}",
                String::from_utf8_lossy(&doc)
            );
        }
    }
}

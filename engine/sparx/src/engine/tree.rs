//! Per-chunk dual-stack tree.
//!
//! One arena per worker holds two rooted trees. The *finish tree* tracks,
//! for every candidate entry state, the automaton state reached so far: its
//! root children are the current states, and the path below a root child
//! lists the frames opened inside the chunk, newest nearest the root. The
//! *start tree* records what each candidate assumed about its enclosing
//! context: a root child is an entry state and deeper nodes are the context
//! states revealed by close tags that had no matching open in the chunk.
//! Start and finish leaves are paired through `twin` links, one pair per
//! live candidate.
//!
//! All candidates see the same event stream, so every finish leaf sits at
//! the same depth: the number of locally open elements plus one. The tree
//! exploits that to apply each event to all candidates in one sweep.

use crate::automaton::Automaton;
use crate::types::{Mapping, State, OVERFLOW_STATE};
use std::collections::BTreeMap;
use std::mem;

// =============================================================================
// ARENA
// =============================================================================

/// Index of a node in the per-worker arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

#[derive(Debug)]
struct Node {
    state: State,
    /// Sparse state -> child mapping; at most one child per state.
    children: BTreeMap<State, NodeId>,
    parent: Option<NodeId>,
    /// Cross-link to the sibling tree; leaves only.
    twin: Option<NodeId>,
    /// Captured character data owned by this node's candidate.
    output: Option<Vec<u8>>,
}

/// Append a capture to a buffer, space-separating consecutive captures.
fn append_capture(target: &mut Option<Vec<u8>>, extra: &[u8]) {
    match target {
        Some(buffer) => {
            buffer.push(b' ');
            buffer.extend_from_slice(extra);
        }
        None => *target = Some(extra.to_vec()),
    }
}

// =============================================================================
// DUAL-STACK TREE
// =============================================================================

/// The dual-stack tree for one chunk. Created by the worker, consumed by
/// [`DualStackTree::harvest`].
#[derive(Debug)]
pub(crate) struct DualStackTree<'a> {
    automaton: &'a Automaton,
    nodes: Vec<Node>,
    start_root: NodeId,
    finish_root: NodeId,
    /// Number of elements opened in this chunk and not yet closed.
    depth: usize,
}

impl<'a> DualStackTree<'a> {
    /// Create a tree seeded with one candidate per entry state.
    ///
    /// The first chunk starts at the document root, so it is seeded with
    /// state 1 only. Any later chunk may begin anywhere, including inside an
    /// element the automaton did not match, so it is seeded with every state
    /// from the overflow sink up to the deepest state.
    pub(crate) fn new(automaton: &'a Automaton, first_chunk: bool) -> Self {
        let mut tree = Self {
            automaton,
            nodes: Vec::new(),
            start_root: NodeId(0),
            finish_root: NodeId(0),
            depth: 0,
        };
        tree.start_root = tree.alloc(OVERFLOW_STATE);
        tree.finish_root = tree.alloc(OVERFLOW_STATE);
        if first_chunk {
            tree.seed(1);
        } else {
            for state in OVERFLOW_STATE..=automaton.last_state() {
                tree.seed(state);
            }
        }
        tree
    }

    fn seed(&mut self, state: State) {
        let start = self.alloc(state);
        let finish = self.alloc(state);
        self.node_mut(start).parent = Some(self.start_root);
        self.node_mut(finish).parent = Some(self.finish_root);
        self.node_mut(start).twin = Some(finish);
        self.node_mut(finish).twin = Some(start);
        let start_root = self.start_root;
        let finish_root = self.finish_root;
        self.node_mut(start_root).children.insert(state, start);
        self.node_mut(finish_root).children.insert(state, finish);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn alloc(&mut self, state: State) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            state,
            children: BTreeMap::new(),
            parent: None,
            twin: None,
            output: None,
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Detach and return every finish-root child, oldest state first.
    fn take_root_children(&mut self) -> Vec<NodeId> {
        let root = self.finish_root;
        let map = mem::take(&mut self.node_mut(root).children);
        map.into_values().collect()
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// An open tag: every candidate pushes one frame.
    ///
    /// The candidate whose current state has a forward edge labeled `name`
    /// advances along it; every other candidate falls into the overflow
    /// sink, where [`Self::add_node`] merges them under a single root child.
    pub(crate) fn open(&mut self, name: &[u8]) {
        let entries = self.take_root_children();
        if entries.is_empty() {
            return;
        }
        for id in entries {
            let state = self.node(id).state;
            let target = self
                .automaton
                .open_target(state, name)
                .unwrap_or(OVERFLOW_STATE);
            self.push_node(id, target);
        }
        self.depth += 1;
    }

    /// The characteristic split move: keep "what we were doing" in a fresh
    /// child node and carry "what we committed to next" on the node itself.
    fn push_node(&mut self, id: NodeId, target: State) {
        let old_state = self.node(id).state;
        let frame = self.alloc(old_state);

        // The frame inherits the node's subtree and, when the node was a
        // leaf, its twin link.
        let children = mem::take(&mut self.node_mut(id).children);
        for &child in children.values() {
            self.node_mut(child).parent = Some(frame);
        }
        self.node_mut(frame).children = children;
        if let Some(twin) = self.node_mut(id).twin.take() {
            self.node_mut(twin).twin = Some(frame);
            self.node_mut(frame).twin = Some(twin);
        }
        if target == OVERFLOW_STATE {
            // Overflow nodes merge across candidates; the capture buffer
            // stays with the candidate by riding its frame.
            let output = self.node_mut(id).output.take();
            self.node_mut(frame).output = output;
        }

        self.node_mut(id).state = target;
        self.node_mut(id).children.insert(old_state, frame);
        self.node_mut(frame).parent = Some(id);
        let root = self.finish_root;
        self.add_node(id, root);
    }

    /// Insert `id` as a child of `parent` keyed by its state; if a child at
    /// that state already exists, recursively merge `id` into it.
    fn add_node(&mut self, id: NodeId, parent: NodeId) {
        let state = self.node(id).state;
        if let Some(&existing) = self.node(parent).children.get(&state) {
            if existing == id {
                return;
            }
            let children = mem::take(&mut self.node_mut(id).children);
            for (_, child) in children {
                self.add_node(child, existing);
            }
            if let Some(twin) = self.node_mut(id).twin.take() {
                if self.node(existing).children.is_empty() && self.node(existing).twin.is_none() {
                    self.node_mut(existing).twin = Some(twin);
                    self.node_mut(twin).twin = Some(existing);
                }
            }
            if self.node(existing).output.is_none() {
                let output = self.node_mut(id).output.take();
                self.node_mut(existing).output = output;
            }
        } else {
            self.node_mut(parent).children.insert(state, id);
            self.node_mut(id).parent = Some(parent);
        }
    }

    /// A close tag. With frames open it pops one level for every candidate;
    /// with none open it is speculative and pops the enclosing context.
    pub(crate) fn close(&mut self, name: &[u8]) {
        if self.node(self.finish_root).children.is_empty() {
            return;
        }
        if self.depth > 0 {
            self.promote_frames();
            self.depth -= 1;
        } else {
            self.speculative_close(name);
        }
    }

    /// Pop one frame per candidate: each root child hands its buffered
    /// output down and its children take its place at the root. For the
    /// matched chain this detaches the grandchild the reverse edge names;
    /// for the overflow sink it drains the lingering state-0 children back
    /// into the tree.
    fn promote_frames(&mut self) {
        let parents = self.take_root_children();
        for parent in parents {
            let output = self.node_mut(parent).output.take();
            let children = mem::take(&mut self.node_mut(parent).children);
            let kids: Vec<NodeId> = children.into_values().collect();
            if let Some(buffer) = output {
                for &kid in &kids {
                    append_capture(&mut self.node_mut(kid).output, &buffer);
                }
            }
            let root = self.finish_root;
            for kid in kids {
                self.add_node(kid, root);
            }
        }
    }

    /// A close with no local frame open: the closed element was entered
    /// before the chunk began, so the close reveals the enclosing context.
    ///
    /// A candidate whose state has a reverse edge labeled `name` retreats
    /// along it and records the revealed state in the start tree. The
    /// overflow candidate forks: the element may have been opened, and left
    /// unmatched, from any state in which `name` does not advance the
    /// automaton, so one revealed candidate per such state appears. Those
    /// two sets are disjoint by construction, which keeps root-child states
    /// unique. Every other candidate is inconsistent with the close and
    /// dies.
    fn speculative_close(&mut self, name: &[u8]) {
        let entries = self.take_root_children();
        for id in entries {
            let state = self.node(id).state;
            if let Some(revealed) = self.automaton.close_target(state, name) {
                let Some(leaf) = self.node_mut(id).twin.take() else {
                    continue;
                };
                let grown = self.alloc(revealed);
                self.node_mut(leaf).twin = None;
                self.node_mut(leaf).children.insert(revealed, grown);
                self.node_mut(grown).parent = Some(leaf);
                self.node_mut(grown).twin = Some(id);
                self.node_mut(id).twin = Some(grown);
                self.node_mut(id).state = revealed;
                let root = self.finish_root;
                self.add_node(id, root);
            } else if state == OVERFLOW_STATE {
                let Some(leaf) = self.node_mut(id).twin.take() else {
                    continue;
                };
                self.node_mut(leaf).twin = None;
                for revealed in OVERFLOW_STATE..=self.automaton.last_state() {
                    if self.automaton.open_target(revealed, name).is_some() {
                        continue;
                    }
                    let grown = self.alloc(revealed);
                    self.node_mut(grown).parent = Some(leaf);
                    self.node_mut(leaf).children.insert(revealed, grown);
                    let finish = self.alloc(revealed);
                    self.node_mut(finish).twin = Some(grown);
                    self.node_mut(grown).twin = Some(finish);
                    let root = self.finish_root;
                    self.add_node(finish, root);
                }
            }
        }
    }

    /// Character data: captured by the candidate currently dwelling in the
    /// output state, if any.
    pub(crate) fn text(&mut self, bytes: &[u8]) {
        let Some(output_state) = self.automaton.output_state() else {
            return;
        };
        let Some(&id) = self.node(self.finish_root).children.get(&output_state) else {
            return;
        };
        append_capture(&mut self.node_mut(id).output, bytes);
    }

    // =========================================================================
    // HARVEST
    // =========================================================================

    /// Read every surviving candidate out of the tree.
    ///
    /// Each finish leaf contributes one mapping: the walk up to the root
    /// child yields the exit state and the still-open frames (collecting
    /// frame-borne captures oldest first); the twin link crosses to the
    /// start tree, whose upward walk yields the entry state and the revealed
    /// context states.
    pub(crate) fn harvest(&self) -> Vec<Mapping> {
        let mut leaves = Vec::new();
        let mut stack: Vec<NodeId> = self.node(self.finish_root).children.values().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.children.is_empty() {
                leaves.push(id);
            } else {
                stack.extend(node.children.values().copied());
            }
        }
        leaves
            .into_iter()
            .filter_map(|leaf| self.mapping_for_leaf(leaf))
            .collect()
    }

    fn mapping_for_leaf(&self, leaf: NodeId) -> Option<Mapping> {
        let mut output: Option<Vec<u8>> = None;
        let mut states = Vec::new();
        let mut cursor = leaf;
        loop {
            let node = self.node(cursor);
            states.push(node.state);
            if let Some(buffer) = &node.output {
                append_capture(&mut output, buffer);
            }
            match node.parent {
                Some(parent) if parent != self.finish_root => cursor = parent,
                _ => break,
            }
        }
        let end = *states.last()?;
        states.pop();
        let end_stack = states;

        let start_leaf = self.node(leaf).twin?;
        let mut begin_states = Vec::new();
        let mut cursor = start_leaf;
        loop {
            let node = self.node(cursor);
            begin_states.push(node.state);
            match node.parent {
                Some(parent) if parent != self.start_root => cursor = parent,
                _ => break,
            }
        }
        let begin = *begin_states.last()?;
        begin_states.pop();
        begin_states.reverse();
        Some(Mapping {
            begin,
            begin_stack: begin_states,
            end,
            end_stack,
            output,
        })
    }

    // =========================================================================
    // TEST SUPPORT
    // =========================================================================

    /// Check the structural invariants: child keys match child states, start
    /// and finish leaves are twin bijections, and all finish leaves share
    /// one depth.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for root in [self.start_root, self.finish_root] {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                for (&key, &child) in &self.node(id).children {
                    assert_eq!(key, self.node(child).state, "child keyed by its state");
                    assert_eq!(self.node(child).parent, Some(id), "parent back-link");
                    stack.push(child);
                }
            }
        }
        let mut depths = Vec::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .node(self.finish_root)
            .children
            .values()
            .map(|&id| (id, 1))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            if node.children.is_empty() {
                depths.push(depth);
                let twin = node.twin.unwrap_or_else(|| panic!("finish leaf missing twin"));
                assert_eq!(
                    self.node(twin).twin,
                    Some(id),
                    "twin links must be mutual"
                );
            } else {
                assert!(node.twin.is_none(), "internal nodes carry no twin");
                stack.extend(node.children.values().map(|&c| (c, depth + 1)));
            }
        }
        if let Some(&first) = depths.first() {
            assert!(
                depths.iter().all(|&d| d == first),
                "finish leaves must share one depth"
            );
            assert_eq!(first, self.depth + 1, "leaf depth mirrors open elements");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Structural loop recognition.
//!
//! Loops are identified from actual back edges, never from label text. A
//! back edge is an edge whose target dominates its source; its target is the
//! loop header, the loop body is everything that reaches the latch without
//! crossing the header, and the designated exit is the unique successor of
//! the header outside the body.
//!
//! Shapes that do not fit the single-header/single-exit model (irreducible
//! edges, multiple latches, side exits) are not fatal: the affected loop is
//! left unannotated and the anomaly is surfaced as a [`StructureIssue`].

use petgraph::Direction;
use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::proc::{BlockId, Procedure};

/// One recognized natural loop.
#[derive(Clone, Debug)]
pub struct LoopInfo {
    /// Target of the back edge; the loop's only entry point.
    pub header: BlockId,
    /// Source of the back edge.
    pub latch: BlockId,
    /// Blocks between header and latch, excluding the header itself.
    pub body: FxHashSet<BlockId>,
    /// The header successor outside the loop.
    pub exit: BlockId,
}

impl LoopInfo {
    /// Check if a block is part of this loop (header or body).
    pub fn contains(&self, block: BlockId) -> bool {
        block == self.header || self.body.contains(&block)
    }
}

/// A control-flow shape the single-header/single-exit loop model cannot
/// express. Reported, never fatal.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum StructureIssue {
    /// A cycle-closing edge whose target does not dominate its source.
    #[error("irreducible control flow: edge ^{from} -> ^{to} re-enters a cycle it does not head")]
    IrreducibleEdge { from: String, to: String },
    /// Two or more back edges share one header.
    #[error("loop at ^{header} has multiple latches")]
    MultipleLatches { header: String },
    /// The header has no unique successor outside the loop body.
    #[error("loop at ^{header} has no unique exit successor")]
    NoUniqueExit { header: String },
    /// One block is the designated exit of two different loops.
    #[error("block ^{exit} is the exit of more than one loop")]
    SharedExit { exit: String },
}

/// Loop classification for every block of one procedure.
#[derive(Clone, Debug, Default)]
pub struct LoopMap {
    loops: Vec<LoopInfo>,
    headers: FxHashMap<BlockId, usize>,
    exits: FxHashMap<BlockId, BlockId>,
    issues: Vec<StructureIssue>,
}

impl LoopMap {
    /// Detect all natural loops in `proc`.
    pub fn analyze(proc: &Procedure) -> Self {
        let mut map = LoopMap::default();
        let Some(entry) = proc.entry() else {
            return map;
        };

        // Nodes are added in block order, so NodeIndex and BlockId coincide.
        let mut graph: DiGraph<(), ()> = DiGraph::new();
        for _ in proc.blocks() {
            graph.add_node(());
        }
        for block in proc.blocks() {
            for &succ in proc.block(block).terminator.successors() {
                graph.add_edge(NodeIndex::new(block.raw()), NodeIndex::new(succ.raw()), ());
            }
        }

        let doms = simple_fast(&graph, NodeIndex::new(entry.raw()));
        let dominates = |v: BlockId, u: BlockId| {
            doms.dominators(NodeIndex::new(u.raw()))
                .is_some_and(|mut chain| chain.any(|d| d.index() == v.raw()))
        };

        // Back edges, grouped by header.
        let mut latches: FxHashMap<BlockId, Vec<BlockId>> = FxHashMap::default();
        let mut back_edges: FxHashSet<(BlockId, BlockId)> = FxHashSet::default();
        for edge in graph.edge_references() {
            let from = BlockId::new(edge.source().index());
            let to = BlockId::new(edge.target().index());
            if dominates(to, from) {
                back_edges.insert((from, to));
                latches.entry(to).or_default().push(from);
            }
        }

        // Cycle-closing edges that are not back edges mark irreducible flow.
        for (from, to) in retreating_edges(proc, entry) {
            if !back_edges.contains(&(from, to)) {
                map.issues.push(StructureIssue::IrreducibleEdge {
                    from: proc.block(from).label.clone(),
                    to: proc.block(to).label.clone(),
                });
            }
        }

        let mut headers: Vec<BlockId> = latches.keys().copied().collect();
        headers.sort();
        for header in headers {
            let latch_list = &latches[&header];
            if latch_list.len() > 1 {
                map.issues.push(StructureIssue::MultipleLatches {
                    header: proc.block(header).label.clone(),
                });
                continue;
            }
            let latch = latch_list[0];
            let body = natural_loop_body(&graph, header, latch);

            let mut exits = proc
                .block(header)
                .terminator
                .successors()
                .iter()
                .copied()
                .filter(|s| *s != header && !body.contains(s));
            let exit = match (exits.next(), exits.next()) {
                (Some(exit), None) => exit,
                _ => {
                    map.issues.push(StructureIssue::NoUniqueExit {
                        header: proc.block(header).label.clone(),
                    });
                    continue;
                }
            };
            if map.exits.contains_key(&exit) {
                map.issues.push(StructureIssue::SharedExit {
                    exit: proc.block(exit).label.clone(),
                });
                continue;
            }

            map.headers.insert(header, map.loops.len());
            map.exits.insert(exit, header);
            map.loops.push(LoopInfo {
                header,
                latch,
                body,
                exit,
            });
        }

        map
    }

    pub fn is_header(&self, block: BlockId) -> bool {
        self.headers.contains_key(&block)
    }

    /// If `block` is the designated exit of some loop, the loop's header.
    pub fn exit_header(&self, block: BlockId) -> Option<BlockId> {
        self.exits.get(&block).copied()
    }

    pub fn is_exit(&self, block: BlockId) -> bool {
        self.exits.contains_key(&block)
    }

    pub fn loops(&self) -> &[LoopInfo] {
        &self.loops
    }

    pub fn issues(&self) -> &[StructureIssue] {
        &self.issues
    }
}

/// Loop body via backward reachability from the latch, stopping at the
/// header. The returned set excludes the header.
fn natural_loop_body(
    graph: &DiGraph<(), ()>,
    header: BlockId,
    latch: BlockId,
) -> FxHashSet<BlockId> {
    let mut body = FxHashSet::default();
    let mut worklist = Vec::new();
    body.insert(header);
    if latch != header {
        body.insert(latch);
        worklist.push(latch);
    }
    while let Some(block) = worklist.pop() {
        for pred in graph.neighbors_directed(NodeIndex::new(block.raw()), Direction::Incoming) {
            let pred = BlockId::new(pred.index());
            if body.insert(pred) {
                worklist.push(pred);
            }
        }
    }
    body.remove(&header);
    body
}

/// Edges whose target is on the active DFS stack when the edge is walked.
/// Every back edge is retreating; a retreating edge that is not a back edge
/// closes a cycle through a block that does not dominate it.
fn retreating_edges(proc: &Procedure, entry: BlockId) -> Vec<(BlockId, BlockId)> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut color = vec![Color::White; proc.block_count()];
    let mut retreating = Vec::new();
    let mut stack: Vec<(BlockId, usize)> = vec![(entry, 0)];
    color[entry.raw()] = Color::Gray;

    while let Some(frame) = stack.last_mut() {
        let block = frame.0;
        let succs = proc.block(block).terminator.successors();
        if frame.1 < succs.len() {
            let succ = succs[frame.1];
            frame.1 += 1;
            match color[succ.raw()] {
                Color::White => {
                    color[succ.raw()] = Color::Gray;
                    stack.push((succ, 0));
                }
                Color::Gray => retreating.push((block, succ)),
                Color::Black => {}
            }
        } else {
            color[block.raw()] = Color::Black;
            stack.pop();
        }
    }

    retreating
}

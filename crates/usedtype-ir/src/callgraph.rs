//! Abstract "may call" graph.
//!
//! The analyzer only consumes the graph: node membership and path search.
//! How a graph is computed (class-hierarchy, rapid-type, points-to) is a
//! frontend decision; snapshots carry those graphs ready-made. The one
//! exception is the `static` graph, which falls out of direct call edges
//! and is derived here.

use crate::program::{CallTarget, FuncId, InstrKind, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CallGraph {
    nodes: FxHashSet<FuncId>,
    edges: FxHashMap<FuncId, Vec<FuncId>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, f: FuncId) {
        self.nodes.insert(f);
    }

    pub fn add_edge(&mut self, from: FuncId, to: FuncId) {
        self.nodes.insert(from);
        self.nodes.insert(to);
        let succs = self.edges.entry(from).or_default();
        if !succs.contains(&to) {
            succs.push(to);
        }
    }

    /// Whether the graph reached `f` at all. A function absent from the
    /// graph is treated as unreachable by the oracle, not as an error.
    pub fn has_node(&self, f: FuncId) -> bool {
        self.nodes.contains(&f)
    }

    pub fn succs(&self, f: FuncId) -> &[FuncId] {
        self.edges.get(&f).map_or(&[], |v| v.as_slice())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = FuncId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn edge_list(&self) -> impl Iterator<Item = (FuncId, FuncId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(&from, tos)| tos.iter().map(move |&to| (from, to)))
    }

    /// Breadth-first search for a directed path `from -> ... -> to`.
    pub fn path_exists(&self, from: FuncId, to: FuncId) -> bool {
        if !self.has_node(from) || !self.has_node(to) {
            return false;
        }
        if from == to {
            return true;
        }
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(from);
        queue.push_back(from);
        while let Some(f) = queue.pop_front() {
            for &s in self.succs(f) {
                if s == to {
                    return true;
                }
                if seen.insert(s) {
                    queue.push_back(s);
                }
            }
        }
        false
    }
}

/// Build the `static` call graph: one edge per direct call instruction.
/// Nodes exist only for functions incident to an edge, so functions that
/// are neither callers nor direct callees stay out of the graph.
pub fn static_call_graph(program: &Program) -> CallGraph {
    let mut graph = CallGraph::new();
    for instr in &program.instrs {
        if let InstrKind::Call {
            target: CallTarget::Direct(callee),
            ..
        } = &instr.kind
        {
            graph.add_edge(instr.func, *callee);
        }
    }
    graph
}

//! Reachability oracle.
//!
//! Decides whether two instructions can reach each other: trivially when
//! no call graph is attached, by block identity or undirected block-graph
//! search within one function, and by call-graph path search in either
//! direction across functions. The analyzer does not distinguish reads
//! from writes, so admitting either direction avoids false negatives when
//! a composite literal's field store dominates the literal's own value
//! instruction or vice-versa.
//!
//! The oracle owns its caches; no state escapes the analysis run. Caches
//! are concurrent because full-usage descents consult the oracle from
//! parallel workers.

use dashmap::DashMap;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use usedtype_ir::{BlockId, CallGraph, FuncId, InstrId, Program};

pub struct ReachabilityOracle<'a> {
    program: &'a Program,
    graph: Option<&'a CallGraph>,
    block_paths: DashMap<(BlockId, BlockId), bool>,
    func_paths: DashMap<(FuncId, FuncId), bool>,
}

impl<'a> ReachabilityOracle<'a> {
    pub fn new(program: &'a Program, graph: Option<&'a CallGraph>) -> Self {
        Self {
            program,
            graph,
            block_paths: DashMap::new(),
            func_paths: DashMap::new(),
        }
    }

    /// Whether an access at `from` and an access at `to` can belong to
    /// the same execution, in either order.
    pub fn can_reach(&self, from: InstrId, to: InstrId) -> bool {
        let Some(graph) = self.graph else {
            return true;
        };
        let a = self.program.instr(from);
        let b = self.program.instr(to);
        if a.block == b.block {
            return true;
        }
        if a.func == b.func {
            return self.blocks_connected(a.block, b.block);
        }
        // A function the graph never reached is unreachable, not an error.
        if !graph.has_node(a.func) || !graph.has_node(b.func) {
            return false;
        }
        self.funcs_connected(graph, a.func, b.func)
    }

    fn blocks_connected(&self, b1: BlockId, b2: BlockId) -> bool {
        // Undirected: a path in either direction connects the blocks.
        let key = (b1.min(b2), b1.max(b2));
        if let Some(hit) = self.block_paths.get(&key) {
            return *hit;
        }
        let connected = self.block_can_reach(b1, b2) || self.block_can_reach(b2, b1);
        self.block_paths.insert(key, connected);
        connected
    }

    fn block_can_reach(&self, start: BlockId, end: BlockId) -> bool {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some(b) = queue.pop_front() {
            if b == end {
                return true;
            }
            for &s in &self.program.block(b).succs {
                if seen.insert(s) {
                    queue.push_back(s);
                }
            }
        }
        false
    }

    fn funcs_connected(&self, graph: &CallGraph, f1: FuncId, f2: FuncId) -> bool {
        let key = (f1.min(f2), f1.max(f2));
        if let Some(hit) = self.func_paths.get(&key) {
            return *hit;
        }
        let connected = graph.path_exists(f1, f2) || graph.path_exists(f2, f1);
        self.func_paths.insert(key, connected);
        connected
    }
}

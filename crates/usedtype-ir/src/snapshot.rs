//! IR snapshot loading.
//!
//! A frontend serializes its [`Program`] to JSON; the analyzer reads it
//! back here. Deserialization alone is not enough: every id is an index
//! into another table, so a malformed snapshot could point anywhere. The
//! loader re-validates all cross-references and recomputes derived tables
//! before handing the program out.

use crate::program::{Member, Program, ValueKind};
use crate::types::{TypeKind, TypeShape};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read IR snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed IR snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid IR snapshot: {0}")]
    Invalid(String),
}

macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(LoadError::Invalid(format!($($arg)*)));
        }
    };
}

impl Program {
    pub fn from_json_reader(reader: impl Read) -> Result<Self, LoadError> {
        let mut program: Program = serde_json::from_reader(reader)?;
        program.validate()?;
        program.compute_referrers();
        Ok(program)
    }

    pub fn from_json_str(data: &str) -> Result<Self, LoadError> {
        let mut program: Program = serde_json::from_str(data)?;
        program.validate()?;
        program.compute_referrers();
        Ok(program)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        Self::from_json_reader(BufReader::new(File::open(path)?))
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check that every id stored in the program points into the table it
    /// indexes and that back-references agree.
    pub fn validate(&self) -> Result<(), LoadError> {
        let n_types = self.types.type_count();
        let n_named = self.types.named_count();
        let n_funcs = self.functions.len();
        let n_blocks = self.blocks.len();
        let n_instrs = self.instrs.len();
        let n_values = self.values.len();

        for id in 0..n_types {
            let refs: Vec<u32> = match self.types.kind(crate::types::TypeId(id as u32)) {
                TypeKind::Pointer(e) | TypeKind::Slice(e) | TypeKind::Array { elem: e, .. } => {
                    vec![e.0]
                }
                TypeKind::Named(n) => {
                    ensure!(n.index() < n_named, "type #{id} references named #{}", n.0);
                    vec![]
                }
                _ => vec![],
            };
            for r in refs {
                ensure!((r as usize) < n_types, "type #{id} references type #{r}");
            }
        }
        for n in self.types.named_ids() {
            match &self.types.named(n).shape {
                TypeShape::Struct(def) => {
                    for (i, f) in def.fields.iter().enumerate() {
                        ensure!(
                            f.ty.index() < n_types,
                            "named #{} field #{i} references type #{}",
                            n.0,
                            f.ty.0
                        );
                    }
                }
                TypeShape::Other(u) => {
                    ensure!(u.index() < n_types, "named #{} underlying type #{}", n.0, u.0);
                }
                TypeShape::Interface(_) => {}
            }
        }

        for (pi, pkg) in self.packages.iter().enumerate() {
            for m in &pkg.members {
                match m {
                    Member::Func(f) => {
                        ensure!(f.index() < n_funcs, "package {pi} member function #{}", f.0);
                    }
                    Member::Global(v) | Member::Const(v) => {
                        ensure!(v.index() < n_values, "package {pi} member value #{}", v.0);
                    }
                    Member::Type(t) => {
                        ensure!(t.index() < n_named, "package {pi} member type #{}", t.0);
                    }
                }
            }
        }

        for (fi, func) in self.functions.iter().enumerate() {
            if let Some(p) = func.pkg {
                ensure!(
                    p.index() < self.packages.len(),
                    "function #{fi} declared in package #{}",
                    p.0
                );
            }
            for v in &func.params {
                ensure!(v.index() < n_values, "function #{fi} param value #{}", v.0);
            }
            for b in &func.blocks {
                ensure!(b.index() < n_blocks, "function #{fi} block #{}", b.0);
                ensure!(
                    self.block(*b).func.index() == fi,
                    "block #{} does not point back to function #{fi}",
                    b.0
                );
            }
            for a in &func.anon_funcs {
                ensure!(a.index() < n_funcs, "function #{fi} anon function #{}", a.0);
            }
        }

        for (bi, block) in self.blocks.iter().enumerate() {
            ensure!(
                block.func.index() < n_funcs,
                "block #{bi} in function #{}",
                block.func.0
            );
            for i in &block.instrs {
                ensure!(i.index() < n_instrs, "block #{bi} instruction #{}", i.0);
                ensure!(
                    self.instr(*i).block.index() == bi,
                    "instruction #{} does not point back to block #{bi}",
                    i.0
                );
            }
            for s in &block.succs {
                ensure!(s.index() < n_blocks, "block #{bi} successor #{}", s.0);
                ensure!(
                    self.block(*s).func == block.func,
                    "block #{bi} successor #{} crosses functions",
                    s.0
                );
            }
        }

        for (ii, instr) in self.instrs.iter().enumerate() {
            ensure!(
                instr.func.index() < n_funcs && instr.block.index() < n_blocks,
                "instruction #{ii} enclosing references"
            );
            for op in instr.operands() {
                ensure!(op.index() < n_values, "instruction #{ii} operand #{}", op.0);
            }
            if let Some(r) = instr.result {
                ensure!(r.index() < n_values, "instruction #{ii} result #{}", r.0);
                ensure!(
                    matches!(self.value(r).kind, ValueKind::Instr(i) if i.index() == ii),
                    "instruction #{ii} result value does not point back"
                );
            }
        }

        for (vi, value) in self.values.iter().enumerate() {
            ensure!(value.ty.index() < n_types, "value #{vi} type #{}", value.ty.0);
            match &value.kind {
                ValueKind::Param { func, .. } => {
                    ensure!(func.index() < n_funcs, "value #{vi} param of function #{}", func.0);
                }
                ValueKind::FuncRef(f) => {
                    ensure!(f.index() < n_funcs, "value #{vi} references function #{}", f.0);
                }
                ValueKind::Instr(i) => {
                    ensure!(i.index() < n_instrs, "value #{vi} produced by instruction #{}", i.0);
                }
                ValueKind::Global { .. } | ValueKind::Const { .. } => {}
            }
        }

        for (named, funcs) in &self.method_sets {
            ensure!(named.index() < n_named, "method set of named #{}", named.0);
            for f in funcs {
                ensure!(f.index() < n_funcs, "method set entry function #{}", f.0);
            }
        }

        for (kind, graph) in &self.call_graphs {
            for f in graph.nodes() {
                ensure!(
                    f.index() < n_funcs,
                    "call graph '{kind}' node function #{}",
                    f.0
                );
            }
            for (from, to) in graph.edge_list() {
                ensure!(
                    from.index() < n_funcs && to.index() < n_funcs,
                    "call graph '{kind}' edge ({}, {})",
                    from.0,
                    to.0
                );
            }
        }

        Ok(())
    }
}

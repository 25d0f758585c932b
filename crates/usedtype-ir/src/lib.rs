//! Typed program and IR model consumed by the usedtype analyzer.
//!
//! This crate provides:
//! - `TypeTable` - arena of types and named type declarations
//! - `Program` - packages, functions, basic blocks, instructions, values
//! - `CallGraph` - abstract "may call" graph with path search
//! - `ProgramBuilder` - programmatic IR construction (frontends, fixtures)
//! - JSON snapshot loading with validation (`LoadError`)
//!
//! IR construction from source is out of scope for this repository; a
//! frontend produces the snapshot and the analyzer consumes it.

pub mod builder;
pub mod callgraph;
pub mod position;
pub mod program;
pub mod snapshot;
pub mod types;

pub use builder::ProgramBuilder;
pub use callgraph::{CallGraph, static_call_graph};
pub use position::SourcePos;
pub use program::{
    Block, BlockId, CallTarget, FuncId, Function, InstrId, InstrKind, Instruction, Member, Package,
    PkgId, Program, Value, ValueId, ValueKind,
};
pub use snapshot::LoadError;
pub use types::{
    FieldDef, InterfaceDef, MethodSig, NamedId, NamedType, StructDef, TypeId, TypeKind, TypeShape,
    TypeTable, tag_lookup,
};

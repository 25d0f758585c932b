//! The program IR: packages, functions, basic blocks, instructions, values.
//!
//! Arena-style ownership: every entity lives in a per-program vector and is
//! referenced by an index newtype. Back-edges (an instruction's enclosing
//! function, a block's function) are index copies, so cyclic shapes such as
//! loops and recursive calls need no special handling.

use crate::callgraph::CallGraph;
use crate::position::SourcePos;
use crate::types::{NamedId, TypeId, TypeTable};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_newtype!(
    /// Index of a package in [`Program::packages`].
    PkgId
);
id_newtype!(
    /// Index of a function in [`Program::functions`].
    FuncId
);
id_newtype!(
    /// Index of a basic block in [`Program::blocks`].
    BlockId
);
id_newtype!(
    /// Index of an instruction in [`Program::instrs`].
    InstrId
);
id_newtype!(
    /// Index of a value in [`Program::values`].
    ValueId
);

/// A top-level package member. Methods are not members; they are reached
/// through the program's method-set table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    Func(FuncId),
    Global(ValueId),
    Type(NamedId),
    Const(ValueId),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    /// Import path, matched by the target-package pattern.
    pub path: String,
    /// Package name; `main` marks an executable package.
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// Declaring package. `None` for synthetic functions (wrappers,
    /// bound-method thunks), which every package traversal may enter.
    pub pkg: Option<PkgId>,
    pub params: Vec<ValueId>,
    pub blocks: Vec<BlockId>,
    /// Anonymous functions defined beneath this one.
    pub anon_funcs: Vec<FuncId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub func: FuncId,
    pub instrs: Vec<InstrId>,
    pub succs: Vec<BlockId>,
}

/// Callee of a call instruction, mirroring the shapes a frontend can
/// resolve: a statically-known function, a first-class function value, or
/// a language builtin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallTarget {
    Direct(FuncId),
    Indirect(ValueId),
    Builtin(String),
}

/// The closed instruction sum the analyzer recognizes.
///
/// `Opaque` stands for a construct the producing frontend could not map
/// onto this set; the traversal's strictness mode decides whether meeting
/// one aborts the analysis or logs and continues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrKind {
    /// Stack/heap allocation; the result value has pointer type.
    Alloc,
    /// Box a value into an interface; the result type is the interface.
    MakeInterface { operand: ValueId },
    /// Address of the `field`-th field of the struct behind `base`.
    FieldAddr { base: ValueId, field: usize },
    /// Value of the `field`-th field of the struct value `base`.
    Field { base: ValueId, field: usize },
    Store { addr: ValueId, value: ValueId },
    Load { addr: ValueId },
    /// SSA phi; the traversal visits every incoming edge value instead of
    /// the phi itself.
    Phi { edges: Vec<ValueId> },
    Call { target: CallTarget, args: Vec<ValueId> },
    Return { values: Vec<ValueId> },
    Jump,
    If { cond: ValueId },
    Opaque { kind: String, operands: Vec<ValueId> },
}

impl InstrKind {
    /// Short name for logs and strict-mode diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Self::Alloc => "Alloc",
            Self::MakeInterface { .. } => "MakeInterface",
            Self::FieldAddr { .. } => "FieldAddr",
            Self::Field { .. } => "Field",
            Self::Store { .. } => "Store",
            Self::Load { .. } => "Load",
            Self::Phi { .. } => "Phi",
            Self::Call { .. } => "Call",
            Self::Return { .. } => "Return",
            Self::Jump => "Jump",
            Self::If { .. } => "If",
            Self::Opaque { kind, .. } => kind,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstrKind,
    pub func: FuncId,
    pub block: BlockId,
    /// The value this instruction yields, if any.
    pub result: Option<ValueId>,
    pub pos: Option<SourcePos>,
}

impl Instruction {
    /// Operand values, in the order a traversal visits them.
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        let mut ops = SmallVec::new();
        match &self.kind {
            InstrKind::Alloc | InstrKind::Jump => {}
            InstrKind::MakeInterface { operand } => ops.push(*operand),
            InstrKind::FieldAddr { base, .. } | InstrKind::Field { base, .. } => ops.push(*base),
            InstrKind::Store { addr, value } => {
                ops.push(*addr);
                ops.push(*value);
            }
            InstrKind::Load { addr } => ops.push(*addr),
            InstrKind::Phi { edges } => ops.extend(edges.iter().copied()),
            InstrKind::Call { target, args } => {
                if let CallTarget::Indirect(v) = target {
                    ops.push(*v);
                }
                ops.extend(args.iter().copied());
            }
            InstrKind::Return { values } => ops.extend(values.iter().copied()),
            InstrKind::If { cond } => ops.push(*cond),
            InstrKind::Opaque { operands, .. } => ops.extend(operands.iter().copied()),
        }
        ops
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Param { func: FuncId, index: u32 },
    Global { name: String },
    Const { repr: String },
    FuncRef(FuncId),
    Instr(InstrId),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Value {
    pub kind: ValueKind,
    pub ty: TypeId,
    pub pos: Option<SourcePos>,
}

/// A whole program: the unit the analyzer runs on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Program {
    pub types: TypeTable,
    pub packages: Vec<Package>,
    pub functions: Vec<Function>,
    pub blocks: Vec<Block>,
    pub instrs: Vec<Instruction>,
    pub values: Vec<Value>,
    /// Methods of package-level named types, reached by the traversal in
    /// addition to package members.
    pub method_sets: FxHashMap<NamedId, Vec<FuncId>>,
    /// Call graphs computed by the frontend, keyed by kind (`cha`, `rta`,
    /// `pta`). A `static` graph is derived in-process instead.
    pub call_graphs: FxHashMap<String, CallGraph>,
    /// For every value, the instructions using it as an operand.
    /// Derived; recomputed after deserialization.
    #[serde(skip)]
    referrers: Vec<Vec<InstrId>>,
}

impl Program {
    #[inline]
    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.index()]
    }

    #[inline]
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.index()]
    }

    #[inline]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn pkg_ids(&self) -> impl Iterator<Item = PkgId> + '_ {
        (0..self.packages.len()).map(|i| PkgId(i as u32))
    }

    pub fn methods_of(&self, id: NamedId) -> &[FuncId] {
        self.method_sets.get(&id).map_or(&[], |v| v.as_slice())
    }

    pub fn has_main_package(&self) -> bool {
        self.packages.iter().any(|p| p.name == "main")
    }

    /// Instructions that use `v` as an operand.
    pub fn users(&self, v: ValueId) -> &[InstrId] {
        self.referrers.get(v.index()).map_or(&[], |u| u.as_slice())
    }

    /// Rebuild the referrer table. Called by the builder and after
    /// snapshot deserialization.
    pub fn compute_referrers(&mut self) {
        let mut referrers = vec![Vec::new(); self.values.len()];
        for (i, instr) in self.instrs.iter().enumerate() {
            for op in instr.operands() {
                referrers[op.index()].push(InstrId(i as u32));
            }
        }
        self.referrers = referrers;
    }

    /// Function names are not unique program-wide; qualify with the
    /// declaring package for logs.
    pub fn qualified_func_name(&self, id: FuncId) -> String {
        let f = self.function(id);
        match f.pkg {
            Some(p) => format!("{}.{}", self.package(p).path, f.name),
            None => f.name.clone(),
        }
    }
}

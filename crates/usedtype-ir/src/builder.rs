//! Programmatic construction of [`Program`] values.
//!
//! Frontends and test fixtures build IR through this type rather than by
//! filling the arena vectors directly; the builder keeps result values,
//! back-edges and member lists consistent, and `finish` validates the
//! cross-references once at the end.

use crate::position::SourcePos;
use crate::program::{
    Block, BlockId, CallTarget, FuncId, Function, InstrId, InstrKind, Instruction, Member, Package,
    PkgId, Program, Value, ValueId, ValueKind,
};
use crate::types::{
    FieldDef, InterfaceDef, MethodSig, NamedId, StructDef, TypeId, TypeKind, TypeShape,
};

pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            program: Program::default(),
        }
    }

    // ==================== Types ====================

    pub fn prim(&mut self, name: &str) -> TypeId {
        self.program.types.add(TypeKind::Prim(name.to_string()))
    }

    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.program.types.add(TypeKind::Pointer(elem))
    }

    pub fn slice_of(&mut self, elem: TypeId) -> TypeId {
        self.program.types.add(TypeKind::Slice(elem))
    }

    pub fn array_of(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.program.types.add(TypeKind::Array { elem, len })
    }

    pub fn func_type(&mut self, sig: &str) -> TypeId {
        self.program.types.add(TypeKind::Func(sig.to_string()))
    }

    /// Declare a named type in `pkg` and register it as a package member.
    /// The shape is set afterwards so recursive types can mention their
    /// own id.
    pub fn declare_named(&mut self, pkg: PkgId, name: &str) -> NamedId {
        let path = self.program.package(pkg).path.clone();
        let id = self.program.types.declare_named(name, path);
        self.program.packages[pkg.index()].members.push(Member::Type(id));
        id
    }

    /// The `TypeKind::Named` spelling of a declared named type.
    pub fn named_ty(&mut self, id: NamedId) -> TypeId {
        self.program.types.add(TypeKind::Named(id))
    }

    pub fn set_struct(&mut self, id: NamedId, fields: Vec<FieldDef>) {
        self.program.types.set_struct(id, StructDef { fields });
    }

    pub fn set_interface(&mut self, id: NamedId, methods: Vec<MethodSig>) {
        self.program.types.set_interface(id, InterfaceDef { methods });
    }

    pub fn set_underlying(&mut self, id: NamedId, ty: TypeId) {
        self.program.types.set_underlying(id, ty);
    }

    /// Add `sig` to the named type's method set, with `body` recorded in
    /// the program's method-set table when the method has IR.
    pub fn method(&mut self, id: NamedId, sig: MethodSig, body: Option<FuncId>) {
        self.program.types.add_method(id, sig);
        if let Some(f) = body {
            self.program.method_sets.entry(id).or_default().push(f);
        }
    }

    // ==================== Packages and functions ====================

    pub fn package(&mut self, path: &str, name: &str) -> PkgId {
        let id = PkgId(self.program.packages.len() as u32);
        self.program.packages.push(Package {
            path: path.to_string(),
            name: name.to_string(),
            members: Vec::new(),
        });
        id
    }

    /// A top-level function; registered as a member of `pkg` when given.
    pub fn function(&mut self, pkg: Option<PkgId>, name: &str) -> FuncId {
        let id = FuncId(self.program.functions.len() as u32);
        self.program.functions.push(Function {
            name: name.to_string(),
            pkg,
            params: Vec::new(),
            blocks: Vec::new(),
            anon_funcs: Vec::new(),
        });
        if let Some(p) = pkg {
            self.program.packages[p.index()].members.push(Member::Func(id));
        }
        id
    }

    /// A method body: belongs to `pkg` but is not a package member.
    pub fn method_function(&mut self, pkg: PkgId, name: &str) -> FuncId {
        let id = FuncId(self.program.functions.len() as u32);
        self.program.functions.push(Function {
            name: name.to_string(),
            pkg: Some(pkg),
            params: Vec::new(),
            blocks: Vec::new(),
            anon_funcs: Vec::new(),
        });
        id
    }

    /// An anonymous function defined beneath `parent`.
    pub fn anon_function(&mut self, parent: FuncId, name: &str) -> FuncId {
        let pkg = self.program.function(parent).pkg;
        let id = FuncId(self.program.functions.len() as u32);
        self.program.functions.push(Function {
            name: name.to_string(),
            pkg,
            params: Vec::new(),
            blocks: Vec::new(),
            anon_funcs: Vec::new(),
        });
        self.program.functions[parent.index()].anon_funcs.push(id);
        id
    }

    pub fn block(&mut self, func: FuncId) -> BlockId {
        let id = BlockId(self.program.blocks.len() as u32);
        self.program.blocks.push(Block {
            func,
            instrs: Vec::new(),
            succs: Vec::new(),
        });
        self.program.functions[func.index()].blocks.push(id);
        id
    }

    pub fn edge(&mut self, from: BlockId, to: BlockId) {
        self.program.blocks[from.index()].succs.push(to);
    }

    // ==================== Values ====================

    fn add_value(&mut self, kind: ValueKind, ty: TypeId, pos: Option<SourcePos>) -> ValueId {
        let id = ValueId(self.program.values.len() as u32);
        self.program.values.push(Value { kind, ty, pos });
        id
    }

    pub fn param(&mut self, func: FuncId, ty: TypeId, pos: Option<SourcePos>) -> ValueId {
        let index = self.program.function(func).params.len() as u32;
        let id = self.add_value(ValueKind::Param { func, index }, ty, pos);
        self.program.functions[func.index()].params.push(id);
        id
    }

    pub fn global(&mut self, pkg: PkgId, name: &str, ty: TypeId, pos: Option<SourcePos>) -> ValueId {
        let id = self.add_value(
            ValueKind::Global {
                name: name.to_string(),
            },
            ty,
            pos,
        );
        self.program.packages[pkg.index()].members.push(Member::Global(id));
        id
    }

    pub fn constant(&mut self, repr: &str, ty: TypeId) -> ValueId {
        self.add_value(
            ValueKind::Const {
                repr: repr.to_string(),
            },
            ty,
            None,
        )
    }

    pub fn func_ref(&mut self, func: FuncId, ty: TypeId) -> ValueId {
        self.add_value(ValueKind::FuncRef(func), ty, None)
    }

    // ==================== Instructions ====================

    fn push_instr(
        &mut self,
        block: BlockId,
        kind: InstrKind,
        result_ty: Option<TypeId>,
        pos: Option<SourcePos>,
    ) -> (InstrId, Option<ValueId>) {
        let func = self.program.block(block).func;
        let id = InstrId(self.program.instrs.len() as u32);
        let result = result_ty.map(|ty| self.add_value(ValueKind::Instr(id), ty, pos.clone()));
        self.program.instrs.push(Instruction {
            kind,
            func,
            block,
            result,
            pos,
        });
        self.program.blocks[block.index()].instrs.push(id);
        (id, result)
    }

    /// Strip pointer and aggregate spellings off `base_ty` (the same way
    /// the analyzer canonicalizes) and return the type of the `field`-th
    /// field of the named struct underneath.
    fn struct_field_ty(&self, base_ty: TypeId, field: usize) -> TypeId {
        let types = &self.program.types;
        let mut t = base_ty;
        loop {
            match types.kind(t) {
                TypeKind::Pointer(e) | TypeKind::Slice(e) | TypeKind::Array { elem: e, .. } => {
                    t = *e;
                }
                TypeKind::Named(n) => match &types.named(*n).shape {
                    TypeShape::Struct(def) => return def.fields[field].ty,
                    TypeShape::Other(u) => t = *u,
                    TypeShape::Interface(_) => {
                        panic!("field access through interface type {}", types.display(base_ty))
                    }
                },
                _ => panic!(
                    "field access on non-struct type {}",
                    types.display(base_ty)
                ),
            }
        }
    }

    /// Allocation of a `ty` local; the result value has type `*ty`.
    pub fn alloc(&mut self, block: BlockId, ty: TypeId, pos: Option<SourcePos>) -> (InstrId, ValueId) {
        let ptr = self.pointer_to(ty);
        let (i, v) = self.push_instr(block, InstrKind::Alloc, Some(ptr), pos);
        (i, v.unwrap())
    }

    pub fn make_interface(
        &mut self,
        block: BlockId,
        iface_ty: TypeId,
        operand: ValueId,
        pos: Option<SourcePos>,
    ) -> (InstrId, ValueId) {
        let (i, v) = self.push_instr(
            block,
            InstrKind::MakeInterface { operand },
            Some(iface_ty),
            pos,
        );
        (i, v.unwrap())
    }

    /// `&base.field`; the result value has pointer-to-field type.
    pub fn field_addr(
        &mut self,
        block: BlockId,
        base: ValueId,
        field: usize,
        pos: Option<SourcePos>,
    ) -> (InstrId, ValueId) {
        let field_ty = self.struct_field_ty(self.program.value(base).ty, field);
        let ptr = self.pointer_to(field_ty);
        let (i, v) = self.push_instr(block, InstrKind::FieldAddr { base, field }, Some(ptr), pos);
        (i, v.unwrap())
    }

    /// `base.field` on a struct value; the result is the field value.
    pub fn field(
        &mut self,
        block: BlockId,
        base: ValueId,
        field: usize,
        pos: Option<SourcePos>,
    ) -> (InstrId, ValueId) {
        let field_ty = self.struct_field_ty(self.program.value(base).ty, field);
        let (i, v) = self.push_instr(block, InstrKind::Field { base, field }, Some(field_ty), pos);
        (i, v.unwrap())
    }

    pub fn store(
        &mut self,
        block: BlockId,
        addr: ValueId,
        value: ValueId,
        pos: Option<SourcePos>,
    ) -> InstrId {
        self.push_instr(block, InstrKind::Store { addr, value }, None, pos).0
    }

    pub fn load(&mut self, block: BlockId, addr: ValueId, pos: Option<SourcePos>) -> (InstrId, ValueId) {
        let pointee = match self.program.types.kind(self.program.value(addr).ty) {
            TypeKind::Pointer(e) => *e,
            _ => panic!("load from non-pointer value"),
        };
        let (i, v) = self.push_instr(block, InstrKind::Load { addr }, Some(pointee), pos);
        (i, v.unwrap())
    }

    pub fn phi(
        &mut self,
        block: BlockId,
        edges: Vec<ValueId>,
        ty: TypeId,
        pos: Option<SourcePos>,
    ) -> (InstrId, ValueId) {
        let (i, v) = self.push_instr(block, InstrKind::Phi { edges }, Some(ty), pos);
        (i, v.unwrap())
    }

    pub fn call(
        &mut self,
        block: BlockId,
        target: CallTarget,
        args: Vec<ValueId>,
        result_ty: Option<TypeId>,
        pos: Option<SourcePos>,
    ) -> (InstrId, Option<ValueId>) {
        self.push_instr(block, InstrKind::Call { target, args }, result_ty, pos)
    }

    pub fn ret(&mut self, block: BlockId, values: Vec<ValueId>, pos: Option<SourcePos>) -> InstrId {
        self.push_instr(block, InstrKind::Return { values }, None, pos).0
    }

    /// Unconditional branch; records the successor edge as well.
    pub fn jump(&mut self, block: BlockId, to: BlockId) -> InstrId {
        let (i, _) = self.push_instr(block, InstrKind::Jump, None, None);
        self.edge(block, to);
        i
    }

    /// Conditional branch; records both successor edges.
    pub fn cond_br(
        &mut self,
        block: BlockId,
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> InstrId {
        let (i, _) = self.push_instr(block, InstrKind::If { cond }, None, None);
        self.edge(block, then_block);
        self.edge(block, else_block);
        i
    }

    pub fn opaque(
        &mut self,
        block: BlockId,
        kind: &str,
        operands: Vec<ValueId>,
        result_ty: Option<TypeId>,
        pos: Option<SourcePos>,
    ) -> (InstrId, Option<ValueId>) {
        self.push_instr(
            block,
            InstrKind::Opaque {
                kind: kind.to_string(),
                operands,
            },
            result_ty,
            pos,
        )
    }

    /// Attach a frontend-computed call graph under `kind`.
    pub fn attach_call_graph(&mut self, kind: &str, graph: crate::callgraph::CallGraph) {
        self.program.call_graphs.insert(kind.to_string(), graph);
    }

    /// Seal the program: computes the referrer table and validates every
    /// cross-reference. Inconsistent IR is a programming error.
    pub fn finish(mut self) -> Program {
        self.program.compute_referrers();
        if let Err(e) = self.program.validate() {
            panic!("builder produced inconsistent IR: {e}");
        }
        self.program
    }
}

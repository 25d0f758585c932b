//! IR traversal.
//!
//! Visits every instruction and value reachable from a package exactly
//! once: top-level function members, methods of package-level named types
//! (methods are not package members), anonymous functions transitively,
//! and global values. The traversal never crosses package boundaries; the
//! union over all packages covers the program without duplication.

use rustc_hash::FxHashSet;
use tracing::warn;
use usedtype_ir::{FuncId, InstrId, InstrKind, Member, PkgId, Program, ValueId, ValueKind};

/// How the analysis treats IR constructs it does not recognize.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Abort on the first unrecognized construct. The default during
    /// development; the driver does not catch the panic.
    #[default]
    Strict,
    /// Log the construct and continue. Shipped configurations use this.
    Lenient,
}

type InstrCb<'a, 'b> = &'a mut Option<&'b mut dyn FnMut(InstrId)>;
type ValueCb<'a, 'b> = &'a mut Option<&'b mut dyn FnMut(ValueId)>;

pub struct Traversal {
    seen_functions: FxHashSet<FuncId>,
    seen_instrs: FxHashSet<InstrId>,
    seen_values: FxHashSet<ValueId>,
    strictness: Strictness,
}

impl Traversal {
    pub fn new(strictness: Strictness) -> Self {
        Self {
            seen_functions: FxHashSet::default(),
            seen_instrs: FxHashSet::default(),
            seen_values: FxHashSet::default(),
            strictness,
        }
    }

    /// Walk one package. Each instruction fires `instr_cb` once and each
    /// value fires `value_cb` once; either callback may be omitted. Phi
    /// values are expanded: the callback sees every incoming edge value
    /// instead of the phi itself.
    pub fn walk_package(
        &mut self,
        program: &Program,
        pkg: PkgId,
        mut instr_cb: Option<&mut dyn FnMut(InstrId)>,
        mut value_cb: Option<&mut dyn FnMut(ValueId)>,
    ) {
        self.seen_functions.clear();
        self.seen_instrs.clear();
        self.seen_values.clear();

        for member in &program.package(pkg).members {
            match member {
                // Named types and constants never carry instructions.
                Member::Type(_) | Member::Const(_) => {}
                Member::Global(v) => self.walk_value(program, *v, &mut value_cb),
                Member::Func(f) => {
                    self.walk_function(program, pkg, *f, &mut instr_cb, &mut value_cb);
                }
            }
        }

        // Methods are reached through the method-set table.
        for member in &program.package(pkg).members {
            if let Member::Type(n) = member {
                for &m in program.methods_of(*n) {
                    self.walk_function(program, pkg, m, &mut instr_cb, &mut value_cb);
                }
            }
        }
    }

    fn walk_function(
        &mut self,
        program: &Program,
        pkg: PkgId,
        func: FuncId,
        instr_cb: InstrCb<'_, '_>,
        value_cb: ValueCb<'_, '_>,
    ) {
        let f = program.function(func);
        // Functions of other packages are covered by their own package's
        // walk; the final result composes over all passes.
        if let Some(fp) = f.pkg {
            if fp != pkg {
                return;
            }
        }
        if !self.seen_functions.insert(func) {
            return;
        }

        for &param in &f.params {
            self.walk_value(program, param, value_cb);
        }

        for &block in &f.blocks {
            for &instr in &program.block(block).instrs {
                if !self.seen_instrs.insert(instr) {
                    continue;
                }
                let ins = program.instr(instr);
                if let InstrKind::Opaque { kind, .. } = &ins.kind {
                    match self.strictness {
                        Strictness::Strict => panic!(
                            "unrecognized IR construct '{kind}' in {}",
                            program.qualified_func_name(func)
                        ),
                        Strictness::Lenient => {
                            warn!(
                                construct = kind.as_str(),
                                function = %program.qualified_func_name(func),
                                "skipping unrecognized IR construct"
                            );
                        }
                    }
                }
                if let Some(cb) = instr_cb {
                    cb(instr);
                }
                for op in ins.operands() {
                    self.walk_value(program, op, value_cb);
                }
            }
        }

        // Anonymous functions are used by the functions defining them.
        for &anon in &f.anon_funcs {
            self.walk_function(program, pkg, anon, instr_cb, value_cb);
        }
    }

    fn walk_value(&mut self, program: &Program, v: ValueId, value_cb: ValueCb<'_, '_>) {
        if !self.seen_values.insert(v) {
            return;
        }
        if let ValueKind::Instr(i) = program.value(v).kind {
            if let InstrKind::Phi { edges } = &program.instr(i).kind {
                for &e in edges {
                    self.walk_value(program, e, value_cb);
                }
                return;
            }
        }
        if let Some(cb) = value_cb {
            cb(v);
        }
    }
}

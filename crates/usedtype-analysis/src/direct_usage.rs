//! Direct usage collection: every virtual field access in the program,
//! bucketed by the canonical declaring named struct.

use crate::traverse::{Strictness, Traversal};
use crate::type_util::named_struct_of;
use crate::util::access_position;
use rustc_hash::FxHashMap;
use tracing::warn;
use usedtype_ir::{InstrId, InstrKind, NamedId, PkgId, Program, SourcePos, TypeTable, ValueId};

/// A field of a canonical named struct: (declaring type, field index).
///
/// The declaring type is canonical (pointers and aggregate layers already
/// stripped), so equivalent fields reached through differently-spelled
/// types collapse to one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructField {
    pub named: NamedId,
    pub index: usize,
}

/// One IR instruction that computes a field offset or reads a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtAccessPoint {
    pub instr: InstrId,
    pub pos: Option<SourcePos>,
}

/// Accesses of one named struct, keyed by field.
#[derive(Clone, Debug, Default)]
pub struct StructDirectUsage {
    fields: FxHashMap<StructField, Vec<VirtAccessPoint>>,
}

impl StructDirectUsage {
    pub fn fields(&self) -> impl Iterator<Item = (&StructField, &[VirtAccessPoint])> {
        self.fields.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Fields in declaration (index) order.
    pub fn sorted_fields(&self) -> Vec<(&StructField, &[VirtAccessPoint])> {
        let mut out: Vec<_> = self.fields().collect();
        out.sort_by_key(|(f, _)| f.index);
        out
    }

    pub fn get(&self, field: &StructField) -> Option<&[VirtAccessPoint]> {
        self.fields.get(field).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// `named type -> field -> access points` for the whole program. Entries
/// exist only for canonical named structs with at least one referenced
/// exported field.
#[derive(Clone, Debug, Default)]
pub struct StructDirectUsageMap {
    map: FxHashMap<NamedId, StructDirectUsage>,
}

impl StructDirectUsageMap {
    pub fn get(&self, named: NamedId) -> Option<&StructDirectUsage> {
        self.map.get(&named)
    }

    pub fn contains(&self, named: NamedId) -> bool {
        self.map.contains_key(&named)
    }

    pub fn types(&self) -> impl Iterator<Item = NamedId> + '_ {
        self.map.keys().copied()
    }

    /// Types in qualified-name order, for deterministic output.
    pub fn sorted_types(&self, types: &TypeTable) -> Vec<NamedId> {
        let mut out: Vec<NamedId> = self.types().collect();
        out.sort_by_key(|n| types.qualified_name(*n));
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn record(
        &mut self,
        program: &Program,
        strictness: Strictness,
        instr: InstrId,
        base: ValueId,
        index: usize,
    ) {
        let types = &program.types;
        let Some(named) = named_struct_of(types, program.value(base).ty) else {
            // Anonymous structs cannot be roots and are ignored.
            return;
        };
        let def = types.struct_def(named).expect("canonical struct shape");
        let Some(field) = def.fields.get(index) else {
            match strictness {
                Strictness::Strict => panic!(
                    "field index {index} out of range for {}",
                    types.qualified_name(named)
                ),
                Strictness::Lenient => {
                    warn!(
                        ty = %types.qualified_name(named),
                        index,
                        "field access index out of range; skipping"
                    );
                    return;
                }
            }
        };
        if !field.exported {
            return;
        }
        self.map
            .entry(named)
            .or_default()
            .fields
            .entry(StructField { named, index })
            .or_default()
            .push(VirtAccessPoint {
                instr,
                pos: access_position(program, instr),
            });
    }
}

/// Gather every virtual field access on exported fields across `pkgs`.
pub fn find_in_package_struct_direct_usage(
    program: &Program,
    pkgs: &[PkgId],
    strictness: Strictness,
) -> StructDirectUsageMap {
    let mut output = StructDirectUsageMap::default();
    for &pkg in pkgs {
        let mut cb = |instr: InstrId| {
            let ins = program.instr(instr);
            match &ins.kind {
                InstrKind::FieldAddr { base, field } | InstrKind::Field { base, field } => {
                    output.record(program, strictness, instr, *base, *field);
                }
                _ => {}
            }
        };
        Traversal::new(strictness).walk_package(program, pkg, Some(&mut cb), None);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use usedtype_ir::{FieldDef, ProgramBuilder, SourcePos};

    fn pos(line: u32, col: u32) -> Option<SourcePos> {
        Some(SourcePos::new("main.go", line, col))
    }

    /// `Model` accessed through value, pointer and slice spellings; all
    /// accesses must land under one canonical key.
    #[test]
    fn test_spellings_aggregate_under_the_canonical_struct() {
        let mut b = ProgramBuilder::new();
        let sdk = b.package("sdk", "sdk");
        let int = b.prim("int");
        let model = b.declare_named(sdk, "Model");
        b.set_struct(model, vec![FieldDef::new("X", r#"json:"x""#, int)]);
        let model_ty = b.named_ty(model);

        let main_pkg = b.package("main", "main");
        let f = b.function(Some(main_pkg), "main");
        let blk = b.block(f);
        let (_, direct) = b.alloc(blk, model_ty, pos(3, 2));
        b.field_addr(blk, direct, 0, pos(4, 2));
        let ptr_ty = b.pointer_to(model_ty);
        let slice_ty = b.slice_of(ptr_ty);
        let (_, sl) = b.alloc(blk, slice_ty, pos(5, 2));
        b.field_addr(blk, sl, 0, pos(6, 2));
        b.ret(blk, vec![], None);
        let program = b.finish();

        let dm = find_in_package_struct_direct_usage(
            &program,
            &[main_pkg],
            Strictness::Strict,
        );
        assert_eq!(dm.len(), 1);
        let usage = dm.get(model).expect("canonical entry");
        let points = usage
            .get(&StructField { named: model, index: 0 })
            .expect("field X recorded");
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_unexported_fields_are_ignored() {
        let mut b = ProgramBuilder::new();
        let sdk = b.package("sdk", "sdk");
        let int = b.prim("int");
        let model = b.declare_named(sdk, "Model");
        b.set_struct(
            model,
            vec![
                FieldDef::new("Public", "", int),
                FieldDef::new("secret", "", int),
            ],
        );
        let model_ty = b.named_ty(model);

        let main_pkg = b.package("main", "main");
        let f = b.function(Some(main_pkg), "main");
        let blk = b.block(f);
        let (_, obj) = b.alloc(blk, model_ty, pos(3, 2));
        b.field_addr(blk, obj, 0, pos(4, 2));
        b.field_addr(blk, obj, 1, pos(5, 2));
        b.ret(blk, vec![], None);
        let program = b.finish();

        let dm = find_in_package_struct_direct_usage(&program, &[main_pkg], Strictness::Strict);
        let usage = dm.get(model).expect("entry for Model");
        assert_eq!(usage.len(), 1, "only the exported field is recorded");
        assert!(usage.get(&StructField { named: model, index: 1 }).is_none());
    }

    /// Composite-literal field addresses have no position of their own;
    /// the paired store's position is reported instead.
    #[test]
    fn test_position_falls_back_to_the_paired_store() {
        let mut b = ProgramBuilder::new();
        let sdk = b.package("sdk", "sdk");
        let int = b.prim("int");
        let model = b.declare_named(sdk, "Model");
        b.set_struct(model, vec![FieldDef::new("X", "", int)]);
        let model_ty = b.named_ty(model);

        let main_pkg = b.package("main", "main");
        let f = b.function(Some(main_pkg), "main");
        let blk = b.block(f);
        let (_, obj) = b.alloc(blk, model_ty, pos(3, 7));
        let (_, addr) = b.field_addr(blk, obj, 0, None);
        let one = b.constant("1", int);
        b.store(blk, addr, one, pos(4, 9));
        b.ret(blk, vec![], None);
        let program = b.finish();

        let dm = find_in_package_struct_direct_usage(&program, &[main_pkg], Strictness::Strict);
        let usage = dm.get(model).expect("entry for Model");
        let points = usage
            .get(&StructField { named: model, index: 0 })
            .expect("field X recorded");
        assert_eq!(points[0].pos, pos(4, 9));
    }

    /// Without a paired store the base value's position is used.
    #[test]
    fn test_position_falls_back_to_the_base_value() {
        let mut b = ProgramBuilder::new();
        let sdk = b.package("sdk", "sdk");
        let int = b.prim("int");
        let model = b.declare_named(sdk, "Model");
        b.set_struct(model, vec![FieldDef::new("X", "", int)]);
        let model_ty = b.named_ty(model);

        let main_pkg = b.package("main", "main");
        let f = b.function(Some(main_pkg), "main");
        let blk = b.block(f);
        let (_, obj) = b.alloc(blk, model_ty, pos(3, 7));
        b.field_addr(blk, obj, 0, None);
        b.ret(blk, vec![], None);
        let program = b.finish();

        let dm = find_in_package_struct_direct_usage(&program, &[main_pkg], Strictness::Strict);
        let usage = dm.get(model).expect("entry for Model");
        let points = usage
            .get(&StructField { named: model, index: 0 })
            .expect("field X recorded");
        assert_eq!(points[0].pos, pos(3, 7));
    }
}

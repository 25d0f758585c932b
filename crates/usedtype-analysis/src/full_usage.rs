//! Full-usage tree construction.
//!
//! Starting from each root named type's allocation sites, descend through
//! field types using the direct-usage map, expanding interface-valued
//! fields into one branch per implementing variant, and pruning nested
//! accesses the reachability oracle rejects.
//!
//! Cycle policy: the seen-type set is carried per branch and copied on
//! every fork, so sibling branches may re-enter the same type while a
//! single descent path never does.

use crate::alloc_set::NamedTypeAllocSet;
use crate::direct_usage::{StructDirectUsageMap, StructField, VirtAccessPoint};
use crate::reach::ReachabilityOracle;
use crate::type_util::{as_named, deref_elem};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use usedtype_ir::{CallGraph, NamedId, Program, TypeShape};

/// Caller-supplied replacement for the structural `implements` relation.
pub type CustomImplements<'a> = dyn Fn(NamedId, NamedId) -> bool + Sync + 'a;

/// Options of the full-usage build.
#[derive(Default)]
pub struct StructFullBuildOption<'a> {
    /// When set, a nested access point is admitted only if it is
    /// reachable (in either direction) from one of its parent's points.
    pub call_graph: Option<&'a CallGraph>,
    /// When set, replaces the structural subtyping check used to expand
    /// interfaces into variants. Almost always left unset.
    pub custom_implements: Option<&'a CustomImplements<'a>>,
}

/// Root of a usage tree: the target named type, plus the concrete variant
/// when the target is an interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StructFullUsageKey {
    pub named: NamedId,
    pub variant: Option<NamedId>,
}

/// A field node key: the struct field, plus the concrete variant when the
/// field is interface-valued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StructFieldFullUsageKey {
    pub field: StructField,
    pub variant: Option<NamedId>,
}

#[derive(Clone, Debug)]
pub struct StructFieldFullUsage {
    pub key: StructFieldFullUsageKey,
    /// Admitted access points; all are retained, the renderer decides
    /// whether to show them.
    pub points: Vec<VirtAccessPoint>,
    pub nested: FxHashMap<StructFieldFullUsageKey, StructFieldFullUsage>,
}

#[derive(Clone, Debug)]
pub struct StructFullUsage {
    pub key: StructFullUsageKey,
    pub nested: FxHashMap<StructFieldFullUsageKey, StructFieldFullUsage>,
}

#[derive(Clone, Debug, Default)]
pub struct StructFullUsages {
    pub usages: FxHashMap<StructFullUsageKey, StructFullUsage>,
}

impl StructFullUsages {
    pub fn get(&self, key: &StructFullUsageKey) -> Option<&StructFullUsage> {
        self.usages.get(key)
    }

    pub fn len(&self) -> usize {
        self.usages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}

/// Build the full-usage trees for every root in `roots`.
///
/// Roots are independent; each one is built on a rayon worker and the
/// sub-trees are merged by key afterwards (keys are distinct per root).
pub fn build_struct_full_usages(
    program: &Program,
    dm: &StructDirectUsageMap,
    roots: &NamedTypeAllocSet,
    opt: &StructFullBuildOption<'_>,
) -> StructFullUsages {
    let oracle = ReachabilityOracle::new(program, opt.call_graph);
    let mut root_ids: Vec<NamedId> = roots.types().collect();
    root_ids.sort_unstable();

    let built: Vec<Vec<(StructFullUsageKey, StructFullUsage)>> = root_ids
        .par_iter()
        .map(|&root| build_for_root(program, dm, root, opt, &oracle))
        .collect();

    let mut usages = FxHashMap::default();
    for pairs in built {
        for (key, usage) in pairs {
            usages.insert(key, usage);
        }
    }
    StructFullUsages { usages }
}

fn build_for_root(
    program: &Program,
    dm: &StructDirectUsageMap,
    root: NamedId,
    opt: &StructFullBuildOption<'_>,
    oracle: &ReachabilityOracle<'_>,
) -> Vec<(StructFullUsageKey, StructFullUsage)> {
    let types = &program.types;
    let implements = |v: NamedId, iface: NamedId| match opt.custom_implements {
        Some(f) => f(v, iface),
        None => types.implements(v, iface),
    };

    let mut out = Vec::new();
    match &types.named(root).shape {
        // An interface root is expanded into one usage per implementing
        // variant present in the direct-usage map.
        TypeShape::Interface(_) => {
            let mut variants: Vec<NamedId> = dm.types().filter(|&v| implements(v, root)).collect();
            variants.sort_unstable();
            for v in variants {
                let key = StructFullUsageKey {
                    named: root,
                    variant: Some(v),
                };
                let mut nested = FxHashMap::default();
                let mut seen = FxHashSet::default();
                build_nested(
                    program,
                    dm,
                    v,
                    &mut seen,
                    None,
                    oracle,
                    &implements,
                    &mut nested,
                );
                out.push((key, StructFullUsage { key, nested }));
            }
        }
        _ => {
            if dm.contains(root) {
                let key = StructFullUsageKey {
                    named: root,
                    variant: None,
                };
                let mut nested = FxHashMap::default();
                let mut seen = FxHashSet::default();
                build_nested(
                    program,
                    dm,
                    root,
                    &mut seen,
                    None,
                    oracle,
                    &implements,
                    &mut nested,
                );
                out.push((key, StructFullUsage { key, nested }));
            }
        }
    }
    out
}

fn build_nested(
    program: &Program,
    dm: &StructDirectUsageMap,
    base: NamedId,
    seen: &mut FxHashSet<NamedId>,
    from_points: Option<&[VirtAccessPoint]>,
    oracle: &ReachabilityOracle<'_>,
    implements: &dyn Fn(NamedId, NamedId) -> bool,
    out: &mut FxHashMap<StructFieldFullUsageKey, StructFieldFullUsage>,
) {
    if !seen.insert(base) {
        return;
    }
    let Some(du) = dm.get(base) else {
        return;
    };
    let types = &program.types;

    for (field, points) in du.fields() {
        // The root level admits every point; deeper levels require
        // reachability from some parent access point.
        let admitted: Vec<VirtAccessPoint> = match from_points {
            None => points.to_vec(),
            Some(parents) => points
                .iter()
                .filter(|p| parents.iter().any(|q| oracle.can_reach(q.instr, p.instr)))
                .cloned()
                .collect(),
        };
        if admitted.is_empty() {
            continue;
        }

        let field_ty = types
            .struct_def(field.named)
            .expect("direct usage keys are canonical structs")
            .fields[field.index]
            .ty;
        let elem = deref_elem(types, field_ty);
        match as_named(types, elem).map(|n| (n, &types.named(n).shape)) {
            Some((n, TypeShape::Struct(_))) => {
                let key = StructFieldFullUsageKey {
                    field: *field,
                    variant: None,
                };
                let mut node = StructFieldFullUsage {
                    key,
                    points: admitted.clone(),
                    nested: FxHashMap::default(),
                };
                let mut branch_seen = seen.clone();
                build_nested(
                    program,
                    dm,
                    n,
                    &mut branch_seen,
                    Some(&admitted),
                    oracle,
                    implements,
                    &mut node.nested,
                );
                out.insert(key, node);
            }
            Some((n, TypeShape::Interface(_))) => {
                let mut variants: Vec<NamedId> =
                    dm.types().filter(|&v| implements(v, n)).collect();
                variants.sort_unstable();
                for v in variants {
                    let key = StructFieldFullUsageKey {
                        field: *field,
                        variant: Some(v),
                    };
                    let mut node = StructFieldFullUsage {
                        key,
                        points: admitted.clone(),
                        nested: FxHashMap::default(),
                    };
                    let mut branch_seen = seen.clone();
                    build_nested(
                        program,
                        dm,
                        v,
                        &mut branch_seen,
                        Some(&admitted),
                        oracle,
                        implements,
                        &mut node.nested,
                    );
                    out.insert(key, node);
                }
            }
            // Primitive or external element types are leaves.
            _ => {
                let key = StructFieldFullUsageKey {
                    field: *field,
                    variant: None,
                };
                out.insert(
                    key,
                    StructFieldFullUsage {
                        key,
                        points: admitted,
                        nested: FxHashMap::default(),
                    },
                );
            }
        }
    }
}

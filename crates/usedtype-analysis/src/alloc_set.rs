//! Root allocation-site discovery.
//!
//! An allocation site is an instruction that materializes a value of a
//! named type: a stack/heap allocation, or an interface-boxing whose
//! resulting interface type is named. Sites are bucketed per named type
//! when the type's declaring package matches the target pattern.

use crate::named_type::NamedTypeFilter;
use crate::traverse::{Strictness, Traversal};
use crate::type_util::{as_named, deref_elem};
use crate::util::access_position;
use regex::Regex;
use rustc_hash::FxHashMap;
use usedtype_ir::{InstrId, InstrKind, NamedId, PkgId, Program, SourcePos};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alloc {
    pub instr: InstrId,
    pub pos: Option<SourcePos>,
}

#[derive(Clone, Debug, Default)]
pub struct NamedTypeAllocSet {
    map: FxHashMap<NamedId, Vec<Alloc>>,
}

impl NamedTypeAllocSet {
    pub fn get(&self, named: NamedId) -> Option<&[Alloc]> {
        self.map.get(&named).map(|v| v.as_slice())
    }

    pub fn types(&self) -> impl Iterator<Item = NamedId> + '_ {
        self.map.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Deterministic listing for debug output: types by qualified name,
    /// sites by position.
    pub fn render(&self, program: &Program) -> String {
        let mut names: Vec<NamedId> = self.types().collect();
        names.sort_by_key(|n| program.types.qualified_name(*n));
        let mut lines = Vec::new();
        for n in names {
            lines.push(program.types.qualified_name(n));
            let mut allocs = self.map[&n].clone();
            allocs.sort_by(|a, b| a.pos.cmp(&b.pos));
            for a in allocs {
                lines.push(format!(
                    "  {}",
                    usedtype_ir::position::display_opt(a.pos.as_ref())
                ));
            }
        }
        lines.join("\n")
    }

    fn insert(&mut self, named: NamedId, alloc: Alloc) {
        self.map.entry(named).or_default().push(alloc);
    }
}

/// Find, over `pkgs`, every allocation site whose produced type
/// canonicalizes to a named type declared in a package matching
/// `pattern`; `filter` further narrows the set when given.
pub fn find_named_type_alloc_set(
    program: &Program,
    pkgs: &[PkgId],
    pattern: &Regex,
    filter: Option<&NamedTypeFilter<'_>>,
    strictness: Strictness,
) -> NamedTypeAllocSet {
    let mut set = NamedTypeAllocSet::default();
    for &pkg in pkgs {
        let mut cb = |instr: InstrId| {
            let ins = program.instr(instr);
            let produced = match &ins.kind {
                InstrKind::Alloc | InstrKind::MakeInterface { .. } => match ins.result {
                    Some(v) => program.value(v).ty,
                    None => return,
                },
                _ => return,
            };
            let Some(named) = as_named(&program.types, deref_elem(&program.types, produced))
            else {
                return;
            };
            let pkg_path = &program.types.named(named).pkg_path;
            // Builtin named types carry no declaring package.
            if pkg_path.is_empty() {
                return;
            }
            if !pattern.is_match(pkg_path) {
                return;
            }
            if let Some(f) = filter {
                if !f(program, pkg, named) {
                    return;
                }
            }
            set.insert(
                named,
                Alloc {
                    instr,
                    pos: access_position(program, instr),
                },
            );
        };
        Traversal::new(strictness).walk_package(program, pkg, Some(&mut cb), None);
    }
    set
}

//! Named-type discovery by package pattern.
//!
//! Used by filter predicates and tests that need the program's type
//! inventory for a package set before any allocation-site scan runs.

use regex::Regex;
use usedtype_ir::{Member, NamedId, PkgId, Program};

/// Opaque predicate narrowing a named-type result set. The analyzer never
/// inspects it; the driver may supply any total function.
pub type NamedTypeFilter<'a> = dyn Fn(&Program, PkgId, NamedId) -> bool + 'a;

/// Named types declared in packages whose import path matches `pattern`,
/// optionally narrowed by `filter`; sorted by qualified name.
pub fn find_package_named_types(
    program: &Program,
    pattern: &Regex,
    filter: Option<&NamedTypeFilter<'_>>,
) -> Vec<NamedId> {
    let mut out = Vec::new();
    for pkg in program.pkg_ids() {
        if !pattern.is_match(&program.package(pkg).path) {
            continue;
        }
        for member in &program.package(pkg).members {
            if let Member::Type(n) = member {
                if filter.is_none_or(|f| f(program, pkg, *n)) {
                    out.push(*n);
                }
            }
        }
    }
    out.sort_by_key(|n| program.types.qualified_name(*n));
    out
}

//! Type canonicalization helpers.
//!
//! These let the collector treat `T`, `*T`, `**T`, `[]T` and `*[]*T` as
//! the same named type, which is what makes cross-instruction aggregation
//! by declaring type possible.

use usedtype_ir::{NamedId, TypeId, TypeKind, TypeShape, TypeTable};

/// Repeatedly unwrap pointer layers (including named aliases of pointer
/// types) and return the first non-pointer type.
pub fn deref_all(types: &TypeTable, t: TypeId) -> TypeId {
    let mut t = t;
    loop {
        match types.kind(t) {
            TypeKind::Pointer(e) => t = *e,
            TypeKind::Named(n) => match &types.named(*n).shape {
                TypeShape::Other(u) if matches!(types.kind(*u), TypeKind::Pointer(_)) => t = *u,
                _ => return t,
            },
            _ => return t,
        }
    }
}

/// Like [`deref_all`], but also descends into array and slice element
/// types until the element is neither.
pub fn deref_elem(types: &TypeTable, t: TypeId) -> TypeId {
    let t = deref_all(types, t);
    match types.kind(t) {
        TypeKind::Array { elem, .. } | TypeKind::Slice(elem) => deref_elem(types, *elem),
        _ => t,
    }
}

pub fn as_named(types: &TypeTable, t: TypeId) -> Option<NamedId> {
    match types.kind(t) {
        TypeKind::Named(n) => Some(*n),
        _ => None,
    }
}

/// The canonical named struct behind `t`, if any: pointers and aggregate
/// layers stripped, underlying shape a struct.
pub fn named_struct_of(types: &TypeTable, t: TypeId) -> Option<NamedId> {
    let n = as_named(types, deref_elem(types, t))?;
    matches!(types.named(n).shape, TypeShape::Struct(_)).then_some(n)
}

pub fn is_named_struct(types: &TypeTable, t: TypeId) -> bool {
    match as_named(types, deref_all(types, t)) {
        Some(n) => matches!(types.named(n).shape, TypeShape::Struct(_)),
        None => false,
    }
}

pub fn is_named_interface(types: &TypeTable, t: TypeId) -> bool {
    match as_named(types, deref_all(types, t)) {
        Some(n) => matches!(types.named(n).shape, TypeShape::Interface(_)),
        None => false,
    }
}

/// Whether `t` canonicalizes (through pointers, arrays and slices) to a
/// named struct or named interface.
pub fn is_elem_named_struct_or_interface(types: &TypeTable, t: TypeId) -> bool {
    match as_named(types, deref_elem(types, t)) {
        Some(n) => matches!(
            types.named(n).shape,
            TypeShape::Struct(_) | TypeShape::Interface(_)
        ),
        None => false,
    }
}

//! Type table: the arena of types and named type declarations.
//!
//! Named types carry an identity distinct from their structural shape;
//! the analyzer keys its maps by `NamedId` so that every spelling of the
//! same underlying named type (`T`, `*T`, `[]*T`, ...) collapses to one
//! entry once canonicalized.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a type in the [`TypeTable`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a named type declaration in the [`TypeTable`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NamedId(pub u32);

impl NamedId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural shape of a type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    /// Primitive or otherwise opaque leaf type, identified by name
    /// (`int`, `string`, `bool`, ...).
    Prim(String),
    Pointer(TypeId),
    Array { elem: TypeId, len: u64 },
    Slice(TypeId),
    /// Opaque function type; the signature is kept for display only.
    Func(String),
    Named(NamedId),
}

/// One field of a struct shape. The tag uses the Go struct-tag syntax
/// (`json:"name,omitempty"`); [`tag_lookup`] extracts subtags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub tag: String,
    pub ty: TypeId,
    pub exported: bool,
}

impl FieldDef {
    /// A field whose exported flag follows the Go convention: exported
    /// iff the first character of the name is uppercase.
    pub fn new(name: impl Into<String>, tag: impl Into<String>, ty: TypeId) -> Self {
        let name = name.into();
        let exported = name.chars().next().is_some_and(|c| c.is_uppercase());
        Self {
            name,
            tag: tag.into(),
            ty,
            exported,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

/// A method name plus a canonical signature string. Two signatures are
/// compatible iff the strings are identical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub sig: String,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, sig: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sig: sig.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub methods: Vec<MethodSig>,
}

/// Underlying shape of a named type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeShape {
    Struct(StructDef),
    Interface(InterfaceDef),
    /// Named alias of a non-struct, non-interface underlying type
    /// (`type Celsius float64`).
    Other(TypeId),
}

/// A named type declaration: identity is (declaring package path, name).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedType {
    pub name: String,
    /// Import path of the declaring package; empty for builtins.
    pub pkg_path: String,
    pub shape: TypeShape,
    /// Method set used by the structural `implements` relation.
    pub methods: Vec<MethodSig>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeTable {
    types: Vec<TypeKind>,
    named: Vec<NamedType>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        // Structural kinds are interned so that repeated spellings share an id.
        if let Some(i) = self.types.iter().position(|k| *k == kind) {
            return TypeId(i as u32);
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind);
        id
    }

    /// Declare a named type with a placeholder shape; the shape is filled
    /// in later so that recursive types can reference their own id.
    pub fn declare_named(&mut self, name: impl Into<String>, pkg_path: impl Into<String>) -> NamedId {
        let id = NamedId(self.named.len() as u32);
        self.named.push(NamedType {
            name: name.into(),
            pkg_path: pkg_path.into(),
            shape: TypeShape::Struct(StructDef::default()),
            methods: Vec::new(),
        });
        id
    }

    pub fn set_struct(&mut self, id: NamedId, def: StructDef) {
        self.named[id.index()].shape = TypeShape::Struct(def);
    }

    pub fn set_interface(&mut self, id: NamedId, def: InterfaceDef) {
        self.named[id.index()].shape = TypeShape::Interface(def);
    }

    pub fn set_underlying(&mut self, id: NamedId, ty: TypeId) {
        self.named[id.index()].shape = TypeShape::Other(ty);
    }

    pub fn add_method(&mut self, id: NamedId, sig: MethodSig) {
        self.named[id.index()].methods.push(sig);
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()]
    }

    #[inline]
    pub fn named(&self, id: NamedId) -> &NamedType {
        &self.named[id.index()]
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn named_count(&self) -> usize {
        self.named.len()
    }

    pub fn named_ids(&self) -> impl Iterator<Item = NamedId> + '_ {
        (0..self.named.len()).map(|i| NamedId(i as u32))
    }

    /// `pkg_path.Name`, the fully-qualified display name used for sorting
    /// and rendering.
    pub fn qualified_name(&self, id: NamedId) -> String {
        let nt = self.named(id);
        if nt.pkg_path.is_empty() {
            nt.name.clone()
        } else {
            format!("{}.{}", nt.pkg_path, nt.name)
        }
    }

    pub fn struct_def(&self, id: NamedId) -> Option<&StructDef> {
        match &self.named(id).shape {
            TypeShape::Struct(def) => Some(def),
            _ => None,
        }
    }

    pub fn interface_def(&self, id: NamedId) -> Option<&InterfaceDef> {
        match &self.named(id).shape {
            TypeShape::Interface(def) => Some(def),
            _ => None,
        }
    }

    /// Structural subtyping: `t` implements `iface` iff every interface
    /// method is present in `t`'s method set with an identical signature.
    /// `false` when `iface` is not an interface.
    pub fn implements(&self, t: NamedId, iface: NamedId) -> bool {
        let Some(def) = self.interface_def(iface) else {
            return false;
        };
        let methods = &self.named(t).methods;
        def.methods
            .iter()
            .all(|m| methods.iter().any(|tm| tm.name == m.name && tm.sig == m.sig))
    }

    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, id }
    }
}

/// Human-readable spelling of a type, for logs and errors.
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    id: TypeId,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table.kind(self.id) {
            TypeKind::Prim(name) => write!(f, "{name}"),
            TypeKind::Pointer(e) => write!(f, "*{}", self.table.display(*e)),
            TypeKind::Array { elem, len } => write!(f, "[{len}]{}", self.table.display(*elem)),
            TypeKind::Slice(e) => write!(f, "[]{}", self.table.display(*e)),
            TypeKind::Func(sig) => write!(f, "func{sig}"),
            TypeKind::Named(n) => write!(f, "{}", self.table.qualified_name(*n)),
        }
    }
}

/// Look up `key` in a Go-syntax struct tag and return its unquoted value.
///
/// Follows the `reflect.StructTag` format: space-separated `key:"value"`
/// pairs, values quoted with `"` and escaped with `\`.
pub fn tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }
        let colon = rest.find(':')?;
        let name = &rest[..colon];
        if name.is_empty() || name.contains(' ') || name.contains('"') {
            return None;
        }
        rest = &rest[colon + 1..];
        if !rest.starts_with('"') {
            return None;
        }
        rest = &rest[1..];
        let mut value = String::new();
        let mut chars = rest.char_indices();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, esc)) = chars.next() {
                        value.push(esc);
                    }
                }
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => value.push(c),
            }
        }
        let end = end?;
        rest = &rest[end + 1..];
        if name == key {
            return Some(value);
        }
    }
}

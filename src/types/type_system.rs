//! Type representation
//!
//! Every distinct type lives once in the session's type arena and is
//! addressed by `TypeId`. Composite shapes are interned per package by
//! their `ShapeKey`, so asking twice for `*T` yields the same id.

use std::fmt;

use serde::Serialize;

use crate::frontend::ast::ChanDir;
use crate::package::{FileId, PackageId};

crate::define_key! {
    /// Handle of a type in the session's type arena
    pub struct TypeId;
}

/// Kind tag of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeKind {
    Basic,
    Pointer,
    Slice,
    Array,
    Ellipsis,
    Map,
    Chan,
    Struct,
    Interface,
    Func,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Basic => "BASIC",
            TypeKind::Pointer => "POINTER",
            TypeKind::Slice => "SLICE",
            TypeKind::Array => "ARRAY",
            TypeKind::Ellipsis => "ELLIPSIS",
            TypeKind::Map => "MAP",
            TypeKind::Chan => "CHAN",
            TypeKind::Struct => "STRUCT",
            TypeKind::Interface => "INTERFACE",
            TypeKind::Func => "FUNC",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Struct field or interface element
///
/// Embedded fields are named after their type, without qualifier or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Option<TypeId>,
    pub embedded: bool,
    pub tag: Option<String>,
}

/// Kind-specific payload of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeObject {
    /// Predeclared type; identified by name
    Basic,
    /// `this` links back to the interned pointer shape
    Pointer { elem: TypeId, this: TypeId },
    Slice { elem: TypeId },
    /// `len` is None when the length is not a literal
    Array { elem: TypeId, len: Option<u64> },
    /// Variadic parameter `...T`
    Ellipsis { elem: TypeId },
    Map { key: TypeId, elem: TypeId },
    Chan { elem: TypeId, dir: ChanDir },
    Struct { fields: Vec<Field> },
    Interface { methods: Vec<Field> },
    /// Parameter and result slots may individually be unresolved
    Func {
        params: Vec<Option<TypeId>>,
        results: Vec<Option<TypeId>>,
        variadic: bool,
    },
    /// Named type whose underlying type is not (yet) known
    Unresolved,
}

impl TypeObject {
    pub fn kind(&self) -> Option<TypeKind> {
        let kind = match self {
            TypeObject::Basic => TypeKind::Basic,
            TypeObject::Pointer { .. } => TypeKind::Pointer,
            TypeObject::Slice { .. } => TypeKind::Slice,
            TypeObject::Array { .. } => TypeKind::Array,
            TypeObject::Ellipsis { .. } => TypeKind::Ellipsis,
            TypeObject::Map { .. } => TypeKind::Map,
            TypeObject::Chan { .. } => TypeKind::Chan,
            TypeObject::Struct { .. } => TypeKind::Struct,
            TypeObject::Interface { .. } => TypeKind::Interface,
            TypeObject::Func { .. } => TypeKind::Func,
            TypeObject::Unresolved => return None,
        };
        Some(kind)
    }

    /// Structural identity key; None for payloads that are never interned,
    /// including shapes with an unresolved slot or member
    pub fn shape_key(&self) -> Option<ShapeKey> {
        if self.has_unresolved_slot() {
            return None;
        }
        let key = match self {
            TypeObject::Basic | TypeObject::Unresolved => return None,
            TypeObject::Pointer { elem, .. } => ShapeKey::Pointer(*elem),
            TypeObject::Slice { elem } => ShapeKey::Slice(*elem),
            TypeObject::Array { elem, len } => ShapeKey::Array(*elem, *len),
            TypeObject::Ellipsis { elem } => ShapeKey::Ellipsis(*elem),
            TypeObject::Map { key, elem } => ShapeKey::Map(*key, *elem),
            TypeObject::Chan { elem, dir } => ShapeKey::Chan(*elem, *dir),
            TypeObject::Struct { fields } => ShapeKey::Struct(fields.clone()),
            TypeObject::Interface { methods } => ShapeKey::Interface(methods.clone()),
            TypeObject::Func { params, results, variadic } => ShapeKey::Func {
                params: params.clone(),
                results: results.clone(),
                variadic: *variadic,
            },
        };
        Some(key)
    }

    fn has_unresolved_slot(&self) -> bool {
        match self {
            TypeObject::Struct { fields: members } | TypeObject::Interface { methods: members } => {
                members.iter().any(|m| m.ty.is_none())
            }
            TypeObject::Func { params, results, .. } => params.iter().chain(results).any(Option::is_none),
            _ => false,
        }
    }

    /// Element type of pointers, sequences, maps and channels
    pub fn elem(&self) -> Option<TypeId> {
        match self {
            TypeObject::Pointer { elem, .. }
            | TypeObject::Slice { elem }
            | TypeObject::Array { elem, .. }
            | TypeObject::Ellipsis { elem }
            | TypeObject::Map { elem, .. }
            | TypeObject::Chan { elem, .. } => Some(*elem),
            _ => None,
        }
    }
}

/// Key under which a composite shape is interned
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    Pointer(TypeId),
    Slice(TypeId),
    Array(TypeId, Option<u64>),
    Ellipsis(TypeId),
    Map(TypeId, TypeId),
    Chan(TypeId, ChanDir),
    Struct(Vec<Field>),
    Interface(Vec<Field>),
    Func {
        params: Vec<Option<TypeId>>,
        results: Vec<Option<TypeId>>,
        variadic: bool,
    },
}

/// A type
#[derive(Debug, Clone)]
pub struct Type {
    /// Declaring file; None for builtins and synthesized shapes
    pub file: Option<FileId>,
    /// Owning package; None for builtins
    pub package: Option<PackageId>,
    /// Declared name, or the synthesized name of a shape
    pub name: String,
    pub object: TypeObject,
    /// For named types, the type they were declared with
    pub underlying: Option<TypeId>,
}

impl Type {
    pub fn basic(name: impl Into<String>) -> Self {
        Self {
            file: None,
            package: None,
            name: name.into(),
            object: TypeObject::Basic,
            underlying: None,
        }
    }

    /// A declared type whose underlying type is filled in later
    pub fn named(name: impl Into<String>, package: PackageId, file: FileId) -> Self {
        Self {
            file: Some(file),
            package: Some(package),
            name: name.into(),
            object: TypeObject::Unresolved,
            underlying: None,
        }
    }

    pub fn kind(&self) -> Option<TypeKind> {
        self.object.kind()
    }

    /// Declared types, as opposed to builtins and synthesized shapes
    pub fn is_named(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_func(&self) -> bool {
        matches!(self.object, TypeObject::Func { .. })
    }

    /// Output slots of a function type
    pub fn results(&self) -> Option<&[Option<TypeId>]> {
        match &self.object {
            TypeObject::Func { results, .. } => Some(results),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ArenaKey;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pointer_key_ignores_backreference() {
        let elem = TypeId::from_usize(3);
        let a = TypeObject::Pointer { elem, this: TypeId::from_usize(7) };
        let b = TypeObject::Pointer { elem, this: TypeId::from_usize(9) };
        assert_eq!(a.shape_key(), b.shape_key());
        assert_eq!(a.shape_key(), Some(ShapeKey::Pointer(elem)));
    }

    #[test]
    fn test_unresolved_slots_have_no_key() {
        let int = TypeId::from_usize(1);
        let partial = TypeObject::Func { params: vec![None], results: vec![Some(int)], variadic: false };
        let complete = TypeObject::Func { params: vec![Some(int)], results: vec![], variadic: false };
        let field = Field { name: "x".to_string(), ty: None, embedded: false, tag: None };

        assert_eq!(partial.shape_key(), None);
        assert!(complete.shape_key().is_some());
        assert_eq!(TypeObject::Struct { fields: vec![field] }.shape_key(), None);
    }

    #[test]
    fn test_kinds() {
        let elem = TypeId::from_usize(0);
        assert_eq!(TypeObject::Basic.kind(), Some(TypeKind::Basic));
        assert_eq!(TypeObject::Array { elem, len: Some(4) }.kind(), Some(TypeKind::Array));
        assert_eq!(TypeObject::Unresolved.kind(), None);
        assert_eq!(TypeObject::Basic.shape_key(), None);
        assert_eq!(TypeKind::Interface.to_string(), "INTERFACE");
    }

    #[test]
    fn test_func_results() {
        let int = TypeId::from_usize(1);
        let func = Type {
            file: None,
            package: None,
            name: "func() (int, int)".to_string(),
            object: TypeObject::Func { params: vec![], results: vec![Some(int), None], variadic: false },
            underlying: None,
        };
        assert!(func.is_func());
        assert_eq!(func.results(), Some(&[Some(int), None][..]));
        assert!(!func.is_named());
    }
}

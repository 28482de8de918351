//! Type registry

mod type_system;

pub use type_system::{Field, ShapeKey, Type, TypeId, TypeKind, TypeObject};

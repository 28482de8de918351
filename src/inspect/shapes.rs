//! Shape interning and type names

use log::trace;

use crate::frontend::ast::ChanDir;
use crate::package::PackageId;
use crate::types::{Field, Type, TypeId, TypeObject};

use super::Session;

impl Session {
    /// Canonical type for a composite shape in `pkg`
    ///
    /// The first request allocates the type and registers it in the
    /// package's Types table under its synthesized name; later requests
    /// for the same shape return the same id. A shape with an unresolved
    /// slot gets a fresh, unregistered type on every request.
    pub(crate) fn intern(&mut self, pkg: PackageId, object: TypeObject) -> TypeId {
        let Some(key) = object.shape_key() else {
            let name = self.shape_name(&object, Some(pkg));
            return self.types.insert(Type { package: Some(pkg), object, ..Type::basic(name) });
        };
        if let Some(&id) = self.packages[pkg].shapes.get(&key) {
            return id;
        }

        let id = self.types.next_key();
        let object = match object {
            TypeObject::Pointer { elem, .. } => TypeObject::Pointer { elem, this: id },
            other => other,
        };
        let name = self.shape_name(&object, Some(pkg));
        trace!("interned {} in {}", name, self.packages[pkg].path);

        self.types.insert(Type {
            file: None,
            package: Some(pkg),
            name: name.clone(),
            object,
            underlying: None,
        });
        let package = &mut self.packages[pkg];
        package.shapes.insert(key, id);
        package.types.entry(name).or_insert(id);
        id
    }

    /// Interned `*elem`
    pub(crate) fn pointer_of(&mut self, pkg: PackageId, elem: TypeId) -> TypeId {
        self.intern(pkg, TypeObject::Pointer { elem, this: elem })
    }

    /// Display name of `id` as seen from package `from`; declared types of
    /// other packages are qualified with their package name
    pub(crate) fn type_name(&self, id: TypeId, from: Option<PackageId>) -> String {
        let ty = &self.types[id];
        if !ty.is_named() {
            return ty.name.clone();
        }
        match ty.package {
            Some(pkg) if Some(pkg) != from => {
                format!("{}.{}", self.packages[pkg].display_name(), ty.name)
            }
            _ => ty.name.clone(),
        }
    }

    fn slot_name(&self, slot: &Option<TypeId>, from: Option<PackageId>) -> String {
        match slot {
            Some(id) => self.type_name(*id, from),
            None => "?".to_string(),
        }
    }

    fn signature_name(
        &self,
        params: &[Option<TypeId>],
        results: &[Option<TypeId>],
        from: Option<PackageId>,
    ) -> String {
        let params: Vec<String> = params.iter().map(|p| self.slot_name(p, from)).collect();
        let results: Vec<String> = results.iter().map(|r| self.slot_name(r, from)).collect();
        match results.len() {
            0 => format!("({})", params.join(", ")),
            1 => format!("({}) {}", params.join(", "), results[0]),
            _ => format!("({}) ({})", params.join(", "), results.join(", ")),
        }
    }

    fn member_name(&self, field: &Field, from: Option<PackageId>, method: bool) -> String {
        if field.embedded {
            return self.slot_name(&field.ty, from);
        }
        if method {
            if let Some(TypeObject::Func { params, results, .. }) = field.ty.map(|id| &self.types[id].object) {
                return format!("{}{}", field.name, self.signature_name(params, results, from));
            }
        }
        format!("{} {}", field.name, self.slot_name(&field.ty, from))
    }

    /// Synthesized name of a composite shape: `*T`, `[]T`, `map[K]V`, ...
    fn shape_name(&self, object: &TypeObject, from: Option<PackageId>) -> String {
        match object {
            TypeObject::Basic | TypeObject::Unresolved => String::new(),
            TypeObject::Pointer { elem, .. } => format!("*{}", self.type_name(*elem, from)),
            TypeObject::Slice { elem } => format!("[]{}", self.type_name(*elem, from)),
            TypeObject::Array { elem, len } => match len {
                Some(len) => format!("[{}]{}", len, self.type_name(*elem, from)),
                None => format!("[?]{}", self.type_name(*elem, from)),
            },
            TypeObject::Ellipsis { elem } => format!("...{}", self.type_name(*elem, from)),
            TypeObject::Map { key, elem } => {
                format!("map[{}]{}", self.type_name(*key, from), self.type_name(*elem, from))
            }
            TypeObject::Chan { elem, dir } => {
                let elem = self.type_name(*elem, from);
                match dir {
                    ChanDir::Both => format!("chan {}", elem),
                    ChanDir::Send => format!("chan<- {}", elem),
                    ChanDir::Recv => format!("<-chan {}", elem),
                }
            }
            TypeObject::Struct { fields } => {
                let fields: Vec<String> = fields.iter().map(|f| self.member_name(f, from, false)).collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            TypeObject::Interface { methods } => {
                let methods: Vec<String> = methods.iter().map(|m| self.member_name(m, from, true)).collect();
                format!("interface{{{}}}", methods.join("; "))
            }
            TypeObject::Func { params, results, .. } => {
                format!("func{}", self.signature_name(params, results, from))
            }
        }
    }
}

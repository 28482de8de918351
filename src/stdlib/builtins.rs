//! Predeclared types, values and functions
//!
//! The universe is built once per session, before any package is touched,
//! and is read-only afterwards.

use std::collections::HashMap;

use crate::frontend::ast::LitKind;
use crate::package::{Value, ValueKind};
use crate::types::{Field, Type, TypeId, TypeObject};
use crate::utils::Arena;

/// Builtin functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub const ALL: [Builtin; 18] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Clear,
        Builtin::Close,
        Builtin::Complex,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Imag,
        Builtin::Len,
        Builtin::Make,
        Builtin::Max,
        Builtin::Min,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
        Builtin::Real,
        Builtin::Recover,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Clear => "clear",
            Builtin::Close => "close",
            Builtin::Complex => "complex",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Imag => "imag",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Real => "real",
            Builtin::Recover => "recover",
        }
    }

    /// Result type depends on the arguments rather than the signature
    pub fn is_shape_dependent(&self) -> bool {
        matches!(self, Builtin::Append | Builtin::Make | Builtin::New | Builtin::Max | Builtin::Min)
    }
}

const BASIC_TYPES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
];

/// The universe scope
#[derive(Debug)]
pub struct Universe {
    types: HashMap<&'static str, TypeId>,
    values: HashMap<&'static str, Value>,
    funcs: HashMap<&'static str, (Builtin, TypeId)>,
}

impl Universe {
    /// Register every predeclared type in `types`
    pub fn new(types: &mut Arena<TypeId, Type>) -> Self {
        let mut universe = Self {
            types: HashMap::new(),
            values: HashMap::new(),
            funcs: HashMap::new(),
        };

        for name in BASIC_TYPES {
            universe.types.insert(*name, types.insert(Type::basic(*name)));
        }
        universe.alias("byte", "uint8");
        universe.alias("rune", "int32");

        let string = universe.basic("string");
        let error_sig = Self::signature(types, vec![], vec![Some(string)], false);
        let error = types.insert(Type {
            object: TypeObject::Interface {
                methods: vec![Field { name: "Error".to_string(), ty: Some(error_sig), embedded: false, tag: None }],
            },
            ..Type::basic("error")
        });
        universe.types.insert("error", error);

        let any = types.insert(Type {
            object: TypeObject::Interface { methods: Vec::new() },
            ..Type::basic("any")
        });
        universe.types.insert("any", any);

        universe.define_values(types);
        universe.define_builtins(types);
        universe
    }

    fn alias(&mut self, name: &'static str, target: &'static str) {
        if let Some(&id) = self.types.get(target) {
            self.types.insert(name, id);
        }
    }

    fn define_values(&mut self, types: &mut Arena<TypeId, Type>) {
        let bool_ty = self.basic("bool");
        let int = self.basic("int");
        let nil = types.insert(Type::basic("untyped nil"));

        for (name, kind, ty) in [
            ("true", ValueKind::Const, bool_ty),
            ("false", ValueKind::Const, bool_ty),
            ("iota", ValueKind::Const, int),
            ("nil", ValueKind::Var, nil),
        ] {
            self.values.insert(
                name,
                Value { file: None, kind, name: name.to_string(), ty: Some(ty), decl: None },
            );
        }
    }

    fn define_builtins(&mut self, types: &mut Arena<TypeId, Type>) {
        let int = self.basic("int");
        let float64 = self.basic("float64");
        let complex128 = self.basic("complex128");
        let any = self.basic("any");

        for builtin in Builtin::ALL {
            let (params, results, variadic) = match builtin {
                Builtin::Len | Builtin::Cap => (vec![None], vec![Some(int)], false),
                Builtin::Copy => (vec![None, None], vec![Some(int)], false),
                Builtin::Complex => (vec![Some(float64), Some(float64)], vec![Some(complex128)], false),
                Builtin::Real | Builtin::Imag => (vec![Some(complex128)], vec![Some(float64)], false),
                Builtin::Print | Builtin::Println => (vec![None], vec![], true),
                Builtin::Panic => (vec![Some(any)], vec![], false),
                Builtin::Recover => (vec![], vec![Some(any)], false),
                Builtin::Close | Builtin::Clear => (vec![None], vec![], false),
                Builtin::Delete => (vec![None, None], vec![], false),
                Builtin::New | Builtin::Make | Builtin::Append | Builtin::Min | Builtin::Max => {
                    (vec![None], vec![None], true)
                }
            };
            let sig = Self::signature(types, params, results, variadic);
            self.funcs.insert(builtin.name(), (builtin, sig));
        }
    }

    /// Builtin signatures are not owned by a package and are not interned
    fn signature(
        types: &mut Arena<TypeId, Type>,
        params: Vec<Option<TypeId>>,
        results: Vec<Option<TypeId>>,
        variadic: bool,
    ) -> TypeId {
        let slot = |slot: &Option<TypeId>| match slot {
            Some(id) => types[*id].name.clone(),
            None => "?".to_string(),
        };
        let params_str: Vec<String> = params.iter().map(slot).collect();
        let results_str: Vec<String> = results.iter().map(slot).collect();
        let name = match results_str.len() {
            0 => format!("func({})", params_str.join(", ")),
            1 => format!("func({}) {}", params_str.join(", "), results_str[0]),
            _ => format!("func({}) ({})", params_str.join(", "), results_str.join(", ")),
        };

        types.insert(Type {
            object: TypeObject::Func { params, results, variadic },
            ..Type::basic(name)
        })
    }

    /// Id of a predeclared type that always exists
    fn basic(&self, name: &str) -> TypeId {
        self.types[name]
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    pub fn lookup_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn lookup_func(&self, name: &str) -> Option<(Builtin, TypeId)> {
        self.funcs.get(name).copied()
    }

    /// Type of any predeclared name
    pub fn resolve(&self, name: &str) -> Option<TypeId> {
        self.lookup_type(name)
            .or_else(|| self.lookup_value(name).and_then(|v| v.ty))
            .or_else(|| self.lookup_func(name).map(|(_, ty)| ty))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.values.contains_key(name) || self.funcs.contains_key(name)
    }

    /// Default type of an untyped literal
    pub fn literal(&self, kind: LitKind) -> TypeId {
        match kind {
            LitKind::Int => self.basic("int"),
            LitKind::Float => self.basic("float64"),
            LitKind::Imag => self.basic("complex128"),
            LitKind::Char => self.basic("rune"),
            LitKind::String => self.basic("string"),
        }
    }

    pub fn bool_type(&self) -> TypeId {
        self.basic("bool")
    }

    pub fn byte_type(&self) -> TypeId {
        self.basic("byte")
    }

    pub fn float64_type(&self) -> TypeId {
        self.basic("float64")
    }

    pub fn complex128_type(&self) -> TypeId {
        self.basic("complex128")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_types_and_aliases() {
        let mut types = Arena::new();
        let universe = Universe::new(&mut types);

        let byte = universe.lookup_type("byte").expect("byte is predeclared");
        assert_eq!(Some(byte), universe.lookup_type("uint8"));
        assert_eq!(types[byte].name, "uint8");
        assert_eq!(universe.literal(LitKind::Char), universe.lookup_type("int32").expect("int32"));
        assert!(universe.lookup_type("Foo").is_none());
    }

    #[test]
    fn test_values() {
        let mut types = Arena::new();
        let universe = Universe::new(&mut types);

        assert_eq!(universe.resolve("true"), Some(universe.bool_type()));
        assert_eq!(universe.lookup_value("iota").map(|v| v.kind), Some(ValueKind::Const));
        let nil = universe.resolve("nil").expect("nil has a type");
        assert_eq!(types[nil].name, "untyped nil");
    }

    #[test]
    fn test_builtin_signatures() {
        let mut types = Arena::new();
        let universe = Universe::new(&mut types);

        let (builtin, len) = universe.lookup_func("len").expect("len is builtin");
        assert_eq!(builtin, Builtin::Len);
        assert_eq!(types[len].name, "func(?) int");
        assert_eq!(types[len].results(), Some(&[universe.lookup_type("int")][..]));

        let (new, _) = universe.lookup_func("new").expect("new is builtin");
        assert!(new.is_shape_dependent());

        let error = universe.lookup_type("error").expect("error is predeclared");
        let TypeObject::Interface { methods } = &types[error].object else { panic!("error is an interface") };
        assert_eq!(methods[0].name, "Error");
    }
}

//! Symbol tables
//!
//! A package owns ordered tables of its files, types, values, functions and
//! imports. Entries are keys into the session arenas; the tables keep
//! declaration order for reporting.

mod loader;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::frontend::ast::{self, ObjRef};
use crate::types::{ShapeKey, TypeId};

pub(crate) use loader::{file_key, parse_package};

crate::define_key! {
    /// Handle of a package in the session
    pub struct PackageId;
    /// Handle of a parsed file
    pub struct FileId;
    /// Handle of a const or var
    pub struct ValueId;
    /// Handle of a function, method or function literal
    pub struct FuncId;
}

/// Lifecycle of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageState {
    /// Known by path only
    Unparsed,
    /// Files parsed, declarations not yet inspected
    Parsed,
    /// Declarations being inspected
    Inspecting,
    /// Every declaration inspected
    Inspected,
}

#[derive(Debug)]
pub struct Package {
    pub path: String,
    /// Declared name, from the first file
    pub name: Option<String>,
    pub state: PackageState,
    /// Set when the package directory could not be listed
    pub unavailable: bool,
    /// Parsed files by name (extension stripped)
    pub files: IndexMap<String, FileId>,
    /// Declared types and interned shapes by name
    pub types: IndexMap<String, TypeId>,
    pub values: IndexMap<String, ValueId>,
    /// Functions by name, methods by `Recv.Method`
    pub funcs: IndexMap<String, FuncId>,
    /// Imported packages by import path
    pub imports: IndexMap<String, PackageId>,
    /// Top-level declarations of every file by name, methods by
    /// `Recv.Method`
    pub scope: HashMap<String, (FileId, ObjRef)>,
    pub(crate) shapes: HashMap<ShapeKey, TypeId>,
}

impl Package {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            state: PackageState::Unparsed,
            unavailable: false,
            files: IndexMap::new(),
            types: IndexMap::new(),
            values: IndexMap::new(),
            funcs: IndexMap::new(),
            imports: IndexMap::new(),
            scope: HashMap::new(),
            shapes: HashMap::new(),
        }
    }

    /// Name used to qualify this package's types: the declared name, or
    /// the last path segment before the package is parsed
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.state != PackageState::Unparsed
    }
}

#[derive(Debug)]
pub struct File {
    pub package: PackageId,
    /// File name without extension
    pub name: String,
    pub path: PathBuf,
    pub ast: Arc<ast::File>,
    /// Imports by binding name
    pub imports: IndexMap<String, Import>,
    pub(crate) imports_inspected: bool,
}

#[derive(Debug, Clone)]
pub struct Import {
    /// Alias, or last path segment
    pub name: String,
    pub path: String,
    pub package: PackageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueKind {
    Const,
    Var,
}

/// A package-level const or var
#[derive(Debug, Clone)]
pub struct Value {
    /// Declaring file; None for builtins
    pub file: Option<FileId>,
    pub kind: ValueKind,
    pub name: String,
    /// None while unresolved
    pub ty: Option<TypeId>,
    /// Declaration, spec and name index within the file
    pub decl: Option<(usize, usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub file: Option<FileId>,
    /// Empty for function literals
    pub name: String,
    /// Receiver base type name for methods
    pub recv: Option<String>,
    pub ty: Option<TypeId>,
}

impl Function {
    /// Key in the package's function table
    pub fn key(&self) -> String {
        match &self.recv {
            Some(recv) => format!("{}.{}", recv, self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_name_falls_back_to_path() {
        let mut pkg = Package::new("github.com/acme/geom");
        assert_eq!(pkg.display_name(), "geom");
        assert!(!pkg.is_parsed());

        pkg.name = Some("geometry".to_string());
        assert_eq!(pkg.display_name(), "geometry");
    }

    #[test]
    fn test_method_key() {
        let method = Function { file: None, name: "Len".to_string(), recv: Some("Point".to_string()), ty: None };
        assert_eq!(method.key(), "Point.Len");

        let func = Function { recv: None, ..method };
        assert_eq!(func.key(), "Len");
    }
}

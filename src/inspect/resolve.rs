//! Identifier resolution
//!
//! Lookup order: predeclared names, then the package's own tables, then
//! on-demand inspection of the declaration the name refers to. Qualified
//! names go through the file's imports and load the target lazily.

use log::{debug, warn};

use crate::frontend::ast::{Ident, ObjRef};
use crate::package::{FileId, PackageId};
use crate::types::TypeId;
use crate::utils::{Error, Result};

use super::Session;

impl Session {
    pub(crate) fn resolve_ident(&mut self, fid: FileId, ident: &Ident) -> Result<Option<TypeId>> {
        self.resolve_name(fid, &ident.name, ident.obj)
    }

    /// Resolve an unqualified name as seen from a file
    ///
    /// `obj` is the identifier's link to a declaration of the same file;
    /// without one the package scope index is consulted.
    pub(crate) fn resolve_name(&mut self, fid: FileId, name: &str, obj: Option<ObjRef>) -> Result<Option<TypeId>> {
        if let Some(ty) = self.universe.resolve(name) {
            return Ok(Some(ty));
        }

        let pkg = self.files[fid].package;
        if let Some(found) = self.member(pkg, name)? {
            return Ok(found);
        }

        let target = match obj {
            Some(obj) => Some((fid, obj)),
            None => self.packages[pkg].scope.get(name).copied(),
        };
        if let Some((decl_file, obj)) = target {
            self.inspect_object(decl_file, obj, name)?;
            if let Some(found) = self.member(pkg, name)? {
                return Ok(found);
            }
        }

        debug!("unresolved identifier {}", name);
        Ok(None)
    }

    /// Resolve `qualifier.name` through the file's imports
    ///
    /// An unknown qualifier, or a name the imported package does not
    /// declare, is an error. An imported package that cannot be found is
    /// a soft miss.
    pub(crate) fn resolve_qualified(&mut self, fid: FileId, qualifier: &str, name: &str) -> Result<Option<TypeId>> {
        self.ensure_imports(fid);
        let not_a_type = || Error::NotAType { name: format!("{}.{}", qualifier, name) };

        let Some(import) = self.files[fid].imports.get(qualifier).cloned() else {
            return Err(not_a_type());
        };
        let target = import.package;
        if let Some(found) = self.member(target, name)? {
            return Ok(found);
        }

        match self.load(&import.path) {
            Ok(_) => {}
            Err(Error::Io(err)) => {
                warn!("cannot resolve {}.{}: {}", qualifier, name, err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        }
        if let Some((decl_file, obj)) = self.packages[target].scope.get(name).copied() {
            self.inspect_object(decl_file, obj, name)?;
        }

        self.member(target, name)?.ok_or_else(not_a_type)
    }

    /// Look `name` up in a package's Types, Values and Funcs tables
    ///
    /// The outer Option says whether the name is declared, the inner one
    /// whether its type is known. A value stored without a type is
    /// attributed again, unless it is the one being evaluated or nothing
    /// has gained a type since its last failed attempt.
    pub(crate) fn member(&mut self, pkg: PackageId, name: &str) -> Result<Option<Option<TypeId>>> {
        let package = &self.packages[pkg];
        if let Some(&ty) = package.types.get(name) {
            return Ok(Some(Some(ty)));
        }
        if let Some(&vid) = package.values.get(name) {
            if self.in_progress.contains(&(pkg, name.to_string())) {
                warn!("initialization cycle: {} refers to itself", name);
                return Ok(Some(None));
            }
            return match self.values[vid].ty {
                Some(ty) => Ok(Some(Some(ty))),
                None if self.failed.get(&vid) == Some(&self.generation) => Ok(Some(None)),
                None => self.retry_value(vid).map(Some),
            };
        }
        if let Some(&id) = package.funcs.get(name) {
            return Ok(Some(self.funcs[id].ty));
        }
        Ok(None)
    }

    /// Type of method `name` declared on the named type `recv` of `pkg`
    pub(crate) fn method_type(&mut self, pkg: PackageId, recv: &str, name: &str) -> Result<Option<TypeId>> {
        let key = format!("{}.{}", recv, name);
        if !self.packages[pkg].funcs.contains_key(&key) {
            let Some((decl_file, obj)) = self.packages[pkg].scope.get(&key).copied() else {
                return Ok(None);
            };
            self.inspect_object(decl_file, obj, &key)?;
        }
        Ok(self.packages[pkg].funcs.get(&key).and_then(|id| self.funcs[*id].ty))
    }

    /// Whether `x` in `x.sel` should be read as a package qualifier: it is
    /// not bound to any declaration of the package or the universe
    pub(crate) fn is_qualifier(&self, fid: FileId, ident: &Ident) -> bool {
        if ident.obj.is_some() || self.universe.contains(&ident.name) {
            return false;
        }
        let package = &self.packages[self.files[fid].package];
        !(package.scope.contains_key(&ident.name)
            || package.types.contains_key(&ident.name)
            || package.values.contains_key(&ident.name)
            || package.funcs.contains_key(&ident.name))
    }
}

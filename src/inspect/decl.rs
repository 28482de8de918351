//! Declaration inspector
//!
//! Walks the top-level declarations of a file and fills the package
//! tables. Names already present are skipped, which makes every routine
//! safe to re-enter from identifier resolution.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::frontend::ast::{Decl, DeclKind, Expr, FuncDecl, GenDecl, ObjKind, ObjRef, Spec, TypeSpec, UnOp};
use crate::package::{FileId, Function, Import, PackageId, Value, ValueId, ValueKind};
use crate::types::{Type, TypeId};
use crate::utils::Result;

use super::Session;

impl Session {
    /// Inspect every top-level declaration of a file, in source order
    pub(crate) fn inspect_file(&mut self, fid: FileId) -> Result<()> {
        self.ensure_imports(fid);

        let ast = Arc::clone(&self.files[fid].ast);
        for (idx, decl) in ast.decls.iter().enumerate() {
            match decl {
                Decl::Gen(gen) => match gen.kind {
                    DeclKind::Import => {}
                    DeclKind::Const | DeclKind::Var => self.inspect_values(fid, idx, gen, None)?,
                    DeclKind::Type => {
                        for spec in &gen.specs {
                            if let Spec::Type(spec) = spec {
                                self.inspect_type(fid, spec)?;
                            }
                        }
                    }
                },
                Decl::Func(func) => self.inspect_func(fid, func)?,
            }
        }
        Ok(())
    }

    /// Bind the file's imports
    ///
    /// Target packages are shared through the session registry and stay
    /// unparsed until something in them is referenced.
    pub(crate) fn ensure_imports(&mut self, fid: FileId) {
        if self.files[fid].imports_inspected {
            return;
        }
        self.files[fid].imports_inspected = true;

        let ast = Arc::clone(&self.files[fid].ast);
        let pkg = self.files[fid].package;
        for spec in ast.imports() {
            let target = self.ensure_package(&spec.path);
            let name = spec.binding().to_string();
            trace!("{}: import {} as {}", self.files[fid].path.display(), spec.path, name);

            self.packages[pkg].imports.entry(spec.path.clone()).or_insert(target);
            self.files[fid].imports.entry(name.clone()).or_insert(Import {
                name,
                path: spec.path.clone(),
                package: target,
            });
        }
    }

    /// Inspect a const or var declaration; `only` restricts the walk to
    /// one spec
    fn inspect_values(&mut self, fid: FileId, decl: usize, gen: &GenDecl, only: Option<usize>) -> Result<()> {
        let pkg = self.files[fid].package;
        let kind = match gen.kind {
            DeclKind::Const => ValueKind::Const,
            _ => ValueKind::Var,
        };

        for (si, spec) in gen.specs.iter().enumerate() {
            if only.is_some_and(|only| only != si) {
                continue;
            }
            let Spec::Value(spec) = spec else { continue };

            for (ni, name) in spec.names.iter().enumerate() {
                if name.is_blank() || self.packages[pkg].values.contains_key(&name.name) {
                    continue;
                }

                let vid = self.values.insert(Value {
                    file: Some(fid),
                    kind,
                    name: name.name.clone(),
                    ty: None,
                    decl: Some((decl, si, ni)),
                });
                self.packages[pkg].values.insert(name.name.clone(), vid);

                let ty = self.attribute_value(pkg, fid, gen, si, ni, &name.name)?;
                self.values[vid].ty = ty;
                match ty {
                    Some(_) => self.advance(),
                    None => {
                        self.failed.insert(vid, self.generation);
                    }
                }
                trace!("{:?} {}: {}", kind, name.name, self.slot_string(ty));
            }
        }
        Ok(())
    }

    /// Evaluate the type of one name of a value spec, marking it in
    /// progress so a self-referencing initializer terminates
    fn attribute_value(
        &mut self,
        pkg: PackageId,
        fid: FileId,
        gen: &GenDecl,
        spec: usize,
        name_idx: usize,
        name: &str,
    ) -> Result<Option<TypeId>> {
        let key = (pkg, name.to_string());
        self.in_progress.insert(key.clone());
        let ty = self.value_spec_type(fid, gen, spec, name_idx);
        self.in_progress.remove(&key);
        ty
    }

    fn value_spec_type(&mut self, fid: FileId, gen: &GenDecl, si: usize, ni: usize) -> Result<Option<TypeId>> {
        let Some(Spec::Value(spec)) = gen.specs.get(si) else {
            return Ok(None);
        };

        // an explicit type applies to every name
        if let Some(ty) = &spec.ty {
            return self.type_of(fid, ty);
        }
        if !spec.values.is_empty() {
            return self.initializer_type(fid, spec.names.len(), &spec.values, ni);
        }
        if gen.kind != DeclKind::Const {
            return Ok(None);
        }

        // implicit repetition of the previous type or initializer list
        for prev in gen.specs[..si].iter().rev() {
            let Spec::Value(prev) = prev else { continue };
            if let Some(ty) = &prev.ty {
                return self.type_of(fid, ty);
            }
            if !prev.values.is_empty() {
                return self.initializer_type(fid, spec.names.len(), &prev.values, ni);
            }
        }
        Ok(None)
    }

    fn initializer_type(&mut self, fid: FileId, names: usize, values: &[Expr], ni: usize) -> Result<Option<TypeId>> {
        if values.len() == 1 && names > 1 {
            return self.distributed_type(fid, &values[0], ni);
        }
        match values.get(ni) {
            Some(expr) => self.value_of(fid, expr),
            None => Ok(None),
        }
    }

    /// Type of the `ni`th name of `a, b, ... = expr`
    fn distributed_type(&mut self, fid: FileId, expr: &Expr, ni: usize) -> Result<Option<TypeId>> {
        match expr.unparen() {
            Expr::Index { .. } | Expr::TypeAssert { .. } | Expr::Unary { op: UnOp::Recv, .. } => match ni {
                0 => self.value_of(fid, expr),
                1 => Ok(Some(self.universe.bool_type())),
                _ => Ok(None),
            },
            Expr::Call { .. } => {
                let Some(ty) = self.type_of(fid, expr)? else {
                    return Ok(None);
                };
                Ok(self.types[ty].results().and_then(|results| results.get(ni).copied().flatten()))
            }
            other => {
                debug!("cannot distribute {} over several names", other.shape());
                Ok(None)
            }
        }
    }

    /// Re-attribute a value stored without a type
    ///
    /// A failure is remembered until the session's generation moves on.
    pub(crate) fn retry_value(&mut self, vid: ValueId) -> Result<Option<TypeId>> {
        let value = &self.values[vid];
        let (Some(fid), Some((decl, spec, ni))) = (value.file, value.decl) else {
            return Ok(value.ty);
        };
        let name = value.name.clone();

        let ast = Arc::clone(&self.files[fid].ast);
        let Some(Decl::Gen(gen)) = ast.decls.get(decl) else {
            return Ok(None);
        };
        let pkg = self.files[fid].package;

        self.retries += 1;
        let ty = self.attribute_value(pkg, fid, gen, spec, ni, &name)?;
        match ty {
            Some(_) => {
                trace!("{} resolved on retry: {}", name, self.slot_string(ty));
                self.values[vid].ty = ty;
                self.failed.remove(&vid);
                self.advance();
            }
            None => {
                self.failed.insert(vid, self.generation);
            }
        }
        Ok(ty)
    }

    /// Register a type declaration
    ///
    /// A named type enters the table before its underlying type is
    /// evaluated, so it may refer to itself; an alias enters once its
    /// target is known.
    fn inspect_type(&mut self, fid: FileId, spec: &TypeSpec) -> Result<()> {
        let pkg = self.files[fid].package;
        let name = &spec.name.name;
        if spec.name.is_blank() || self.packages[pkg].types.contains_key(name) {
            return Ok(());
        }

        let key = (pkg, name.clone());
        if self.in_progress.contains(&key) {
            warn!("alias {} refers to itself", name);
            return Ok(());
        }

        if spec.alias {
            self.in_progress.insert(key.clone());
            let target = self.type_of(fid, &spec.ty);
            self.in_progress.remove(&key);

            if let Some(target) = target? {
                trace!("type {} = {}", name, self.type_string(target));
                self.packages[pkg].types.insert(name.clone(), target);
                self.advance();
            }
            return Ok(());
        }

        let tid = self.types.insert(Type::named(name.clone(), pkg, fid));
        self.packages[pkg].types.insert(name.clone(), tid);
        self.advance();

        if let Some(under) = self.type_of(fid, &spec.ty)? {
            let object = self.types[under].object.clone();
            let underlying = self.types[under].underlying.unwrap_or(under);
            let ty = &mut self.types[tid];
            ty.object = object;
            ty.underlying = Some(underlying);
        }
        trace!(
            "type {} {}",
            name,
            self.types[tid].underlying.map(|u| self.type_string(u)).unwrap_or_else(|| "?".to_string())
        );
        Ok(())
    }

    /// Register a function or method with its signature
    fn inspect_func(&mut self, fid: FileId, decl: &FuncDecl) -> Result<()> {
        let pkg = self.files[fid].package;
        let recv = decl.recv_type_name().map(str::to_string);
        if decl.recv.is_some() && recv.is_none() {
            debug!("skipping method {} with an unsupported receiver", decl.name.name);
            return Ok(());
        }

        let function = Function { file: Some(fid), name: decl.name.name.clone(), recv, ty: None };
        let key = function.key();
        if decl.name.is_blank() || self.packages[pkg].funcs.contains_key(&key) {
            return Ok(());
        }

        let id = self.funcs.insert(function);
        self.packages[pkg].funcs.insert(key.clone(), id);

        let ty = self.signature_type(fid, &decl.ty)?;
        self.funcs[id].ty = Some(ty);
        self.advance();
        trace!("func {}: {}", key, self.type_string(ty));
        Ok(())
    }

    /// Inspect exactly the declaration `obj` refers to
    pub(crate) fn inspect_object(&mut self, fid: FileId, obj: ObjRef, name: &str) -> Result<()> {
        self.ensure_imports(fid);

        let ast = Arc::clone(&self.files[fid].ast);
        let Some(decl) = ast.decls.get(obj.decl) else {
            return Ok(());
        };
        debug!("inspecting {} in {} on demand", name, self.files[fid].path.display());

        match (obj.kind, decl) {
            (ObjKind::Con | ObjKind::Var, Decl::Gen(gen)) => self.inspect_values(fid, obj.decl, gen, Some(obj.spec)),
            (ObjKind::Typ, Decl::Gen(gen)) => match gen.specs.get(obj.spec) {
                Some(Spec::Type(spec)) => self.inspect_type(fid, spec),
                _ => Ok(()),
            },
            (ObjKind::Fun, Decl::Func(func)) => self.inspect_func(fid, func),
            _ => Ok(()),
        }
    }

    pub(crate) fn slot_string(&self, ty: Option<TypeId>) -> String {
        match ty {
            Some(ty) => self.type_string(ty),
            None => "?".to_string(),
        }
    }
}

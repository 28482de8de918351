//! Type inspection
//!
//! A `Session` owns every package, file, type, value and function of one
//! analysis run. Loading, declaration inspection, identifier resolution
//! and expression evaluation are methods on it and may re-enter each other:
//! evaluating an initializer can resolve an identifier, which can load
//! another package and inspect a single declaration there.

mod decl;
mod expr;
mod resolve;
mod shapes;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};

use crate::frontend::ast;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::frontend::scope::collect_scope;
use crate::frontend::source::{DiskSource, SourceProvider};
use crate::package::{
    file_key, parse_package, File, FileId, FuncId, Function, Package, PackageId, PackageState, Value,
    ValueId,
};
use crate::stdlib::Universe;
use crate::types::{Type, TypeId};
use crate::utils::{Arena, Error, Result};

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory package paths are resolved against
    pub root: PathBuf,
    /// Source file extension
    pub extension: String,
    /// Whether `_test` files belong to their package
    pub include_tests: bool,
    /// Parse the files of a package on worker threads
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: "go".to_string(),
            include_tests: false,
            parallel: true,
        }
    }
}

impl Config {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// One analysis run
pub struct Session {
    config: Config,
    source: Arc<dyn SourceProvider>,
    universe: Universe,
    packages: Arena<PackageId, Package>,
    registry: HashMap<String, PackageId>,
    files: Arena<FileId, File>,
    types: Arena<TypeId, Type>,
    values: Arena<ValueId, Value>,
    funcs: Arena<FuncId, Function>,
    /// Declarations whose type is being evaluated
    in_progress: HashSet<(PackageId, String)>,
    /// Bumped whenever a declaration gains a type or a package is loaded
    generation: u64,
    /// Values whose last re-attribution failed, with the generation it ran in
    failed: HashMap<ValueId, u64>,
    /// Re-attributions attempted so far
    retries: usize,
}

impl Session {
    /// Session reading packages from disk below `config.root`
    pub fn new(config: Config) -> Self {
        let source = DiskSource::new(&config.root)
            .with_extension(config.extension.clone())
            .with_tests(config.include_tests);
        Self::with_source(config, Arc::new(source))
    }

    pub fn with_source(config: Config, source: Arc<dyn SourceProvider>) -> Self {
        let mut types = Arena::new();
        let universe = Universe::new(&mut types);

        Self {
            config,
            source,
            universe,
            packages: Arena::new(),
            registry: HashMap::new(),
            files: Arena::new(),
            types,
            values: Arena::new(),
            funcs: Arena::new(),
            in_progress: HashSet::new(),
            generation: 0,
            failed: HashMap::new(),
            retries: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    // ==================== Accessors ====================

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id]
    }

    pub fn package_id(&self, path: &str) -> Option<PackageId> {
        self.registry.get(path).copied()
    }

    /// Every known package, in the order it was first referenced
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages.iter()
    }

    pub fn file(&self, id: FileId) -> &File {
        &self.files[id]
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id]
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id]
    }

    pub fn func(&self, id: FuncId) -> &Function {
        &self.funcs[id]
    }

    /// Type of a package-level value by name
    pub fn value_type(&self, pkg: PackageId, name: &str) -> Option<TypeId> {
        let id = self.packages[pkg].values.get(name)?;
        self.values[*id].ty
    }

    /// Declared or interned type by name
    pub fn named_type(&self, pkg: PackageId, name: &str) -> Option<TypeId> {
        self.packages[pkg].types.get(name).copied()
    }

    /// Type of a function or method (`Recv.Method`) by name
    pub fn func_type(&self, pkg: PackageId, name: &str) -> Option<TypeId> {
        let id = self.packages[pkg].funcs.get(name)?;
        self.funcs[*id].ty
    }

    // ==================== Loading ====================

    /// Registry entry for `path`, created unparsed on first reference
    pub fn ensure_package(&mut self, path: &str) -> PackageId {
        if let Some(&id) = self.registry.get(path) {
            return id;
        }
        let id = self.packages.insert(Package::new(path));
        self.registry.insert(path.to_string(), id);
        id
    }

    /// Load the package at `path`, parsing its files at most once
    ///
    /// A file that fails to parse aborts the load and leaves the package
    /// unparsed.
    pub fn load(&mut self, path: &str) -> Result<PackageId> {
        let id = self.ensure_package(path);
        let pkg = &self.packages[id];
        if pkg.is_parsed() {
            return Ok(id);
        }
        if pkg.unavailable {
            return Err(Error::Io(format!("package {} is unavailable", path)));
        }

        let listed = match self.source.list(path) {
            Ok(listed) => listed,
            Err(err) => {
                self.packages[id].unavailable = true;
                return Err(err);
            }
        };
        let fresh: Vec<PathBuf> = listed
            .into_iter()
            .filter(|file| !self.packages[id].files.contains_key(&file_key(file)))
            .collect();

        let first_id = self.files.next_key().raw() as usize;
        let parsed = parse_package(self.source.as_ref(), &fresh, first_id, self.config.parallel)?;

        for file in parsed {
            let fid = self.files.insert(File {
                package: id,
                name: file.name.clone(),
                path: file.path,
                ast: Arc::new(file.ast),
                imports: Default::default(),
                imports_inspected: false,
            });
            self.packages[id].files.insert(file.name, fid);
        }

        let name = self.packages[id]
            .files
            .values()
            .next()
            .map(|fid| self.files[*fid].ast.package.name.clone());
        self.packages[id].name = name;
        self.index_scope(id);
        self.packages[id].state = PackageState::Parsed;
        self.advance();

        debug!(
            "loaded package {} ({} files)",
            path,
            self.packages[id].files.len()
        );
        Ok(id)
    }

    /// Record every top-level name and method of the package's files
    fn index_scope(&mut self, id: PackageId) {
        let files: Vec<FileId> = self.packages[id].files.values().copied().collect();
        for fid in files {
            let file = Arc::clone(&self.files[fid].ast);
            let scope = &mut self.packages[id].scope;

            for (name, obj) in collect_scope(&file) {
                scope.entry(name).or_insert((fid, obj));
            }
            for (idx, decl) in file.decls.iter().enumerate() {
                if let ast::Decl::Func(func) = decl {
                    if let Some(recv) = func.recv_type_name() {
                        let obj = ast::ObjRef { kind: ast::ObjKind::Fun, decl: idx, spec: 0 };
                        scope.entry(format!("{}.{}", recv, func.name.name)).or_insert((fid, obj));
                    }
                }
            }
        }
    }

    // ==================== Inspection ====================

    /// Load the package at `path` and inspect every declaration of it
    pub fn inspect(&mut self, path: &str) -> Result<PackageId> {
        let id = self.load(path)?;
        if self.packages[id].state != PackageState::Parsed {
            return Ok(id);
        }

        self.packages[id].state = PackageState::Inspecting;
        let files: Vec<FileId> = self.packages[id].files.values().copied().collect();
        for fid in files {
            if let Err(err) = self.inspect_file(fid) {
                self.packages[id].state = PackageState::Parsed;
                return Err(err);
            }
        }
        self.packages[id].state = PackageState::Inspected;

        debug!(
            "inspected package {}: {} types, {} values, {} functions, {} retries so far",
            path,
            self.packages[id].types.len(),
            self.packages[id].values.len(),
            self.packages[id].funcs.len(),
            self.retries
        );
        Ok(id)
    }

    /// Inspect the package at `path` and every package it reaches through
    /// imports
    ///
    /// Imported packages that cannot be found are skipped with a warning.
    pub fn inspect_all(&mut self, path: &str) -> Result<PackageId> {
        let root = self.inspect(path)?;

        let mut seen = HashSet::new();
        let mut queue = vec![root];
        while let Some(id) = queue.pop() {
            if !seen.insert(id) {
                continue;
            }
            let path = self.packages[id].path.clone();
            match self.inspect(&path) {
                Ok(_) => {}
                Err(Error::Io(err)) => {
                    warn!("skipping import {}: {}", path, err);
                    continue;
                }
                Err(err) => return Err(err),
            }
            queue.extend(self.packages[id].imports.values().rev().copied());
        }
        Ok(root)
    }

    // ==================== Queries ====================

    /// First file of a loaded package, the context for ad hoc queries
    fn context_file(&mut self, path: &str) -> Result<FileId> {
        let id = self.load(path)?;
        self.packages[id]
            .files
            .values()
            .next()
            .copied()
            .ok_or_else(|| Error::Io(format!("package {} has no files", path)))
    }

    /// Evaluate the type of `expr`, written as source text, in the
    /// context of the package at `path`
    pub fn eval(&mut self, path: &str, expr: &str) -> Result<Option<TypeId>> {
        let fid = self.context_file(path)?;
        let mut parser = Parser::new(Lexer::new(expr, usize::MAX))?;
        let expr = parser.parse_expr()?;
        self.value_of(fid, &expr)
    }

    /// Type of a package-level name or qualified name (`pkg.Name`)
    pub fn lookup(&mut self, path: &str, name: &str) -> Result<Option<TypeId>> {
        let fid = self.context_file(path)?;
        match name.split_once('.') {
            Some((qualifier, member)) => self.resolve_qualified(fid, qualifier, member),
            None => self.resolve_name(fid, name, None),
        }
    }

    /// Record that some declaration gained a type, so values that failed
    /// to resolve earlier may be attributed again
    pub(crate) fn advance(&mut self) {
        self.generation += 1;
    }

    /// Display name of a type, qualified relative to its own package
    pub fn type_string(&self, id: TypeId) -> String {
        self.type_name(id, self.types[id].package)
    }
}

#[cfg(test)]
mod tests;

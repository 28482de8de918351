//! Expression type evaluation
//!
//! `type_of` follows the shape of the expression. Composite type syntax is
//! interned in the file's package, so evaluating `*T` twice gives one id.
//! Shapes that cannot be typed yield `None` and a debug record.

use log::{debug, trace};

use crate::frontend::ast::{ArrayLen, BinOp, Expr, FieldList, FuncType, Ident, LitKind, ObjKind, UnOp};
use crate::package::{FileId, Function};
use crate::stdlib::Builtin;
use crate::types::{Field, TypeId, TypeObject};
use crate::utils::{Error, Result};

use super::Session;

/// Maximum depth of embedded-field promotion followed by selectors
const MAX_EMBEDDING: usize = 8;

impl Session {
    /// Type of `expr` in the context of a file
    ///
    /// A call yields the type of its callee; use `value_of` for the type of
    /// the value a call produces.
    pub fn type_of(&mut self, fid: FileId, expr: &Expr) -> Result<Option<TypeId>> {
        let pkg = self.files[fid].package;

        match expr {
            Expr::Lit(lit) => Ok(Some(self.universe.literal(lit.kind))),
            Expr::Paren { x, .. } => self.type_of(fid, x),
            Expr::Ident(ident) => self.resolve_ident(fid, ident),
            Expr::Selector { x, sel, .. } => self.selector_type(fid, x, sel),
            Expr::Star { x, .. } => self.star_type(fid, x),
            Expr::Unary { op, x, .. } => self.unary_type(fid, *op, x),
            Expr::Binary { x, op, y, .. } => self.binary_type(fid, x, *op, y),
            Expr::Call { fun, args, .. } => self.call_type(fid, fun, args),
            Expr::FuncLit { ty, .. } => self.func_lit_type(fid, ty).map(Some),
            Expr::Composite { ty, .. } => self.type_of(fid, ty),
            Expr::Index { x, .. } => self.index_type(fid, x),
            Expr::Slice { x, .. } => self.slice_type(fid, x),
            Expr::TypeAssert { ty: Some(ty), .. } => self.type_of(fid, ty),

            Expr::Ellipsis { elt, .. } => {
                let Some(elem) = self.type_of(fid, elt)? else {
                    return Ok(None);
                };
                Ok(Some(self.intern(pkg, TypeObject::Ellipsis { elem })))
            }
            Expr::ArrayType { len, elt, .. } => {
                let Some(elem) = self.type_of(fid, elt)? else {
                    return Ok(None);
                };
                let object = match len {
                    ArrayLen::Slice => TypeObject::Slice { elem },
                    ArrayLen::Ellipsis => TypeObject::Ellipsis { elem },
                    ArrayLen::Expr(len) => TypeObject::Array { elem, len: array_len(len) },
                };
                Ok(Some(self.intern(pkg, object)))
            }
            Expr::MapType { key, value, .. } => {
                let (Some(key), Some(elem)) = (self.type_of(fid, key)?, self.type_of(fid, value)?) else {
                    return Ok(None);
                };
                Ok(Some(self.intern(pkg, TypeObject::Map { key, elem })))
            }
            Expr::ChanType { dir, value, .. } => {
                let Some(elem) = self.type_of(fid, value)? else {
                    return Ok(None);
                };
                Ok(Some(self.intern(pkg, TypeObject::Chan { elem, dir: *dir })))
            }
            Expr::FuncType(ty) => self.signature_type(fid, ty).map(Some),
            Expr::StructType { fields, .. } => self.struct_type(fid, fields).map(Some),
            Expr::InterfaceType { methods, .. } => self.interface_type(fid, methods).map(Some),

            other => {
                debug!("no type for {}", other.shape());
                Ok(None)
            }
        }
    }

    /// Type of the value `expr` produces: a call of a function with exactly
    /// one result yields that result
    pub fn value_of(&mut self, fid: FileId, expr: &Expr) -> Result<Option<TypeId>> {
        let ty = self.type_of(fid, expr)?;

        if let (Some(ty), Expr::Call { fun, .. }) = (ty, expr.unparen()) {
            if !self.denotes_type(fid, fun)? {
                if let Some([single]) = self.types[ty].results() {
                    return Ok(*single);
                }
            }
        }
        Ok(ty)
    }

    /// Whether `expr` is type syntax or names a type
    ///
    /// A qualified name loads the imported package to find out.
    fn denotes_type(&mut self, fid: FileId, expr: &Expr) -> Result<bool> {
        match expr.unparen() {
            Expr::Ident(ident) => Ok(self.names_type(fid, ident)),
            Expr::Selector { x, sel, .. } => match x.unparen() {
                Expr::Ident(qualifier) if self.is_qualifier(fid, qualifier) => {
                    self.ensure_imports(fid);
                    let Some(import) = self.files[fid].imports.get(&qualifier.name).cloned() else {
                        return Ok(false);
                    };
                    match self.load(&import.path) {
                        Ok(_) => {}
                        Err(Error::Io(_)) => return Ok(false),
                        Err(err) => return Err(err),
                    }
                    let target = &self.packages[import.package];
                    Ok(match target.scope.get(&sel.name) {
                        Some((_, obj)) => obj.kind == ObjKind::Typ,
                        None => target.types.contains_key(&sel.name),
                    })
                }
                _ => Ok(false),
            },
            Expr::Star { x, .. } => self.denotes_type(fid, x),
            Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::ChanType { .. }
            | Expr::FuncType(_)
            | Expr::StructType { .. }
            | Expr::InterfaceType { .. } => Ok(true),
            _ => Ok(false),
        }
    }

    fn names_type(&self, fid: FileId, ident: &Ident) -> bool {
        if let Some(obj) = ident.obj {
            return obj.kind == ObjKind::Typ;
        }
        if self.universe.lookup_type(&ident.name).is_some() {
            return true;
        }
        let package = &self.packages[self.files[fid].package];
        match package.scope.get(&ident.name) {
            Some((_, obj)) => obj.kind == ObjKind::Typ,
            None => package.types.contains_key(&ident.name),
        }
    }

    // ==================== Operators ====================

    /// `*T` is a pointer type, `*p` dereferences a pointer value
    fn star_type(&mut self, fid: FileId, x: &Expr) -> Result<Option<TypeId>> {
        let pkg = self.files[fid].package;

        if self.denotes_type(fid, x)? {
            let Some(elem) = self.type_of(fid, x)? else {
                return Ok(None);
            };
            return Ok(Some(self.pointer_of(pkg, elem)));
        }

        let Some(ty) = self.value_of(fid, x)? else {
            return Ok(None);
        };
        match self.types[ty].object {
            TypeObject::Pointer { elem, .. } => Ok(Some(elem)),
            _ => {
                debug!("dereference of non-pointer {}", self.type_string(ty));
                Ok(None)
            }
        }
    }

    fn unary_type(&mut self, fid: FileId, op: UnOp, x: &Expr) -> Result<Option<TypeId>> {
        let pkg = self.files[fid].package;

        match op {
            UnOp::Addr => {
                let Some(elem) = self.value_of(fid, x)? else {
                    return Ok(None);
                };
                Ok(Some(self.pointer_of(pkg, elem)))
            }
            UnOp::Pos | UnOp::Neg | UnOp::BitNot => self.value_of(fid, x),
            UnOp::Not => Ok(Some(self.universe.bool_type())),
            UnOp::Recv => {
                let Some(ch) = self.value_of(fid, x)? else {
                    return Ok(None);
                };
                match self.types[ch].object {
                    TypeObject::Chan { elem, .. } => Ok(Some(elem)),
                    _ => Ok(None),
                }
            }
            UnOp::Tilde => self.type_of(fid, x),
        }
    }

    /// Comparisons are boolean; otherwise the left operand's type wins
    /// unless it is a literal
    fn binary_type(&mut self, fid: FileId, x: &Expr, op: BinOp, y: &Expr) -> Result<Option<TypeId>> {
        if op.is_comparison() || op.is_logical() {
            return Ok(Some(self.universe.bool_type()));
        }
        if op.is_shift() {
            return self.value_of(fid, x);
        }

        if x.is_literal() {
            return self.value_of(fid, y);
        }
        self.value_of(fid, x)
    }

    // ==================== Calls ====================

    fn call_type(&mut self, fid: FileId, fun: &Expr, args: &[Expr]) -> Result<Option<TypeId>> {
        if let Expr::Ident(ident) = fun.unparen() {
            if let Some((builtin, _)) = self.universe.lookup_func(&ident.name) {
                if builtin.is_shape_dependent() {
                    return self.builtin_call(fid, builtin, args);
                }
            }
        }
        self.type_of(fid, fun)
    }

    /// Result of `new`, `make`, `append`, `min` and `max`
    fn builtin_call(&mut self, fid: FileId, builtin: Builtin, args: &[Expr]) -> Result<Option<TypeId>> {
        let Some(first) = args.first() else {
            return Ok(None);
        };

        match builtin {
            Builtin::New => {
                let Some(elem) = self.type_of(fid, first)? else {
                    return Ok(None);
                };
                let pkg = self.files[fid].package;
                Ok(Some(self.pointer_of(pkg, elem)))
            }
            Builtin::Make => self.type_of(fid, first),
            Builtin::Append | Builtin::Min | Builtin::Max => self.value_of(fid, first),
            _ => Ok(None),
        }
    }

    /// Interned FUNC type of a signature; every name of a multi-name
    /// parameter group takes one slot
    pub(crate) fn signature_type(&mut self, fid: FileId, ty: &FuncType) -> Result<TypeId> {
        let params = self.field_slots(fid, &ty.params)?;
        let variadic = matches!(ty.params.list.last(), Some(field) if matches!(field.ty, Expr::Ellipsis { .. }));
        let results = match &ty.results {
            Some(results) => self.field_slots(fid, results)?,
            None => Vec::new(),
        };

        let pkg = self.files[fid].package;
        Ok(self.intern(pkg, TypeObject::Func { params, results, variadic }))
    }

    fn field_slots(&mut self, fid: FileId, fields: &FieldList) -> Result<Vec<Option<TypeId>>> {
        let mut slots = Vec::with_capacity(fields.arity());
        for field in &fields.list {
            let ty = self.type_of(fid, &field.ty)?;
            slots.extend(std::iter::repeat(ty).take(field.names.len().max(1)));
        }
        Ok(slots)
    }

    /// A function literal records an anonymous function
    fn func_lit_type(&mut self, fid: FileId, ty: &FuncType) -> Result<TypeId> {
        let ty = self.signature_type(fid, ty)?;
        self.funcs.insert(Function { file: Some(fid), name: String::new(), recv: None, ty: Some(ty) });
        trace!("function literal: {}", self.type_string(ty));
        Ok(ty)
    }

    // ==================== Structs and interfaces ====================

    fn struct_type(&mut self, fid: FileId, fields: &FieldList) -> Result<TypeId> {
        let mut members = Vec::new();
        for field in &fields.list {
            let ty = self.type_of(fid, &field.ty)?;
            if field.names.is_empty() {
                members.push(Field { name: embedded_name(&field.ty), ty, embedded: true, tag: field.tag.clone() });
            }
            for name in &field.names {
                members.push(Field { name: name.name.clone(), ty, embedded: false, tag: field.tag.clone() });
            }
        }

        let pkg = self.files[fid].package;
        Ok(self.intern(pkg, TypeObject::Struct { fields: members }))
    }

    fn interface_type(&mut self, fid: FileId, methods: &FieldList) -> Result<TypeId> {
        let mut members = Vec::new();
        for elem in &methods.list {
            let ty = match &elem.ty {
                Expr::FuncType(sig) => Some(self.signature_type(fid, sig)?),
                other => self.type_of(fid, other)?,
            };
            match elem.names.first() {
                Some(name) => members.push(Field { name: name.name.clone(), ty, embedded: false, tag: None }),
                None => members.push(Field { name: embedded_name(&elem.ty), ty, embedded: true, tag: None }),
            }
        }

        let pkg = self.files[fid].package;
        Ok(self.intern(pkg, TypeObject::Interface { methods: members }))
    }

    // ==================== Selectors ====================

    fn selector_type(&mut self, fid: FileId, x: &Expr, sel: &Ident) -> Result<Option<TypeId>> {
        if let Expr::Ident(qualifier) = x.unparen() {
            if self.is_qualifier(fid, qualifier) {
                return self.resolve_qualified(fid, &qualifier.name, &sel.name);
            }
        }

        let base = if self.denotes_type(fid, x)? {
            // method expression `T.Method`
            self.type_of(fid, x)?
        } else {
            self.value_of(fid, x)?
        };
        let Some(base) = base else {
            return Ok(None);
        };

        let found = self.select(base, &sel.name, 0)?;
        if found.is_none() {
            debug!("no field or method {} on {}", sel.name, self.type_string(base));
        }
        Ok(found)
    }

    /// Field or method `name` of `ty`, looking through one pointer level
    /// and into embedded fields
    fn select(&mut self, ty: TypeId, name: &str, depth: usize) -> Result<Option<TypeId>> {
        if depth > MAX_EMBEDDING {
            return Ok(None);
        }

        let ty = match self.types[ty].object {
            TypeObject::Pointer { elem, .. } if !self.types[ty].is_named() => elem,
            _ => ty,
        };

        let members = match &self.types[ty].object {
            TypeObject::Struct { fields } => fields.clone(),
            TypeObject::Interface { methods } => methods.clone(),
            _ => Vec::new(),
        };
        if let Some(member) = members.iter().find(|m| m.name == name && !m.embedded) {
            return Ok(member.ty);
        }

        if self.types[ty].is_named() {
            if let Some(pkg) = self.types[ty].package {
                let recv = self.types[ty].name.clone();
                if let Some(method) = self.method_type(pkg, &recv, name)? {
                    return Ok(Some(method));
                }
            }
        }

        for embedded in members.iter().filter(|m| m.embedded) {
            if embedded.name == name {
                return Ok(embedded.ty);
            }
            if let Some(inner) = embedded.ty {
                if let Some(found) = self.select(inner, name, depth + 1)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    // ==================== Index and slice ====================

    fn index_type(&mut self, fid: FileId, x: &Expr) -> Result<Option<TypeId>> {
        let Some(base) = self.value_of(fid, x)? else {
            return Ok(None);
        };

        match self.types[base].object {
            TypeObject::Slice { elem }
            | TypeObject::Array { elem, .. }
            | TypeObject::Ellipsis { elem }
            | TypeObject::Map { elem, .. } => Ok(Some(elem)),
            TypeObject::Pointer { elem, .. } => match self.types[elem].object {
                TypeObject::Array { elem, .. } => Ok(Some(elem)),
                _ => Ok(None),
            },
            TypeObject::Basic if self.is_string(base) => Ok(Some(self.universe.byte_type())),
            _ => {
                debug!("cannot index {}", self.type_string(base));
                Ok(None)
            }
        }
    }

    /// Slicing keeps the operand type; arrays become slices
    fn slice_type(&mut self, fid: FileId, x: &Expr) -> Result<Option<TypeId>> {
        let Some(base) = self.value_of(fid, x)? else {
            return Ok(None);
        };
        let pkg = self.files[fid].package;

        let elem = match self.types[base].object {
            TypeObject::Array { elem, .. } => elem,
            TypeObject::Pointer { elem, .. } => match self.types[elem].object {
                TypeObject::Array { elem, .. } => elem,
                _ => return Ok(None),
            },
            _ => return Ok(Some(base)),
        };
        Ok(Some(self.intern(pkg, TypeObject::Slice { elem })))
    }

    fn is_string(&self, ty: TypeId) -> bool {
        let ty = &self.types[self.types[ty].underlying.unwrap_or(ty)];
        ty.package.is_none() && ty.name == "string"
    }
}

/// Name of an embedded field: the type name without qualifier or `*`
fn embedded_name(expr: &Expr) -> String {
    match expr {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Selector { sel, .. } => sel.name.clone(),
        Expr::Star { x, .. } | Expr::Paren { x, .. } | Expr::Index { x, .. } => embedded_name(x),
        other => other.shape().to_string(),
    }
}

/// Length of `[N]T` when `N` is an integer literal
fn array_len(expr: &Expr) -> Option<u64> {
    let Expr::Lit(lit) = expr.unparen() else {
        return None;
    };
    if lit.kind != LitKind::Int {
        return None;
    }

    let text = lit.value.replace('_', "");
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        u64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::BasicLit;
    use crate::utils::Span;

    fn int_lit(text: &str) -> Expr {
        Expr::Lit(BasicLit { kind: LitKind::Int, value: text.to_string(), span: Span::dummy() })
    }

    #[test]
    fn test_array_len_literals() {
        assert_eq!(array_len(&int_lit("16")), Some(16));
        assert_eq!(array_len(&int_lit("0x10")), Some(16));
        assert_eq!(array_len(&int_lit("0b101")), Some(5));
        assert_eq!(array_len(&int_lit("0o17")), Some(15));
        assert_eq!(array_len(&int_lit("017")), Some(15));
        assert_eq!(array_len(&int_lit("1_000")), Some(1000));
        assert_eq!(array_len(&Expr::Ident(Ident::new("N", Span::dummy()))), None);
    }

    #[test]
    fn test_embedded_name() {
        let span = Span::dummy();
        let qualified = Expr::Selector {
            x: Box::new(Expr::Ident(Ident::new("io", span))),
            sel: Ident::new("Reader", span),
            span,
        };
        let pointer = Expr::Star { x: Box::new(Expr::Ident(Ident::new("Base", span))), span };
        assert_eq!(embedded_name(&qualified), "Reader");
        assert_eq!(embedded_name(&pointer), "Base");
    }
}

//! File-scope binding
//!
//! Links every identifier that names a top-level declaration of the same
//! file to that declaration, so the resolver can inspect it on demand.

use std::collections::HashMap;

use crate::frontend::ast::*;

/// Bind identifiers in `file` to the declarations of that file
pub fn bind_file(file: &mut File) {
    let scope = collect_scope(file);
    if scope.is_empty() {
        return;
    }

    for decl in &mut file.decls {
        match decl {
            Decl::Gen(gen) => {
                for spec in &mut gen.specs {
                    match spec {
                        Spec::Import(_) => {}
                        Spec::Value(value) => {
                            if let Some(ty) = &mut value.ty {
                                bind_expr(ty, &scope);
                            }
                            for expr in &mut value.values {
                                bind_expr(expr, &scope);
                            }
                        }
                        Spec::Type(ty) => bind_expr(&mut ty.ty, &scope),
                    }
                }
            }
            Decl::Func(func) => {
                if let Some(recv) = &mut func.recv {
                    bind_fields(recv, &scope);
                }
                bind_func_type(&mut func.ty, &scope);
            }
        }
    }
}

/// Top-level names declared in the file
///
/// Methods, `init` and blank names never enter the scope.
pub fn collect_scope(file: &File) -> HashMap<String, ObjRef> {
    let mut scope = HashMap::new();

    for (decl_idx, decl) in file.decls.iter().enumerate() {
        match decl {
            Decl::Gen(gen) => {
                let kind = match gen.kind {
                    DeclKind::Import => continue,
                    DeclKind::Const => ObjKind::Con,
                    DeclKind::Var => ObjKind::Var,
                    DeclKind::Type => ObjKind::Typ,
                };
                for (spec_idx, spec) in gen.specs.iter().enumerate() {
                    let obj = ObjRef { kind, decl: decl_idx, spec: spec_idx };
                    match spec {
                        Spec::Value(value) => {
                            for name in value.names.iter().filter(|n| !n.is_blank()) {
                                scope.insert(name.name.clone(), obj);
                            }
                        }
                        Spec::Type(ty) if !ty.name.is_blank() => {
                            scope.insert(ty.name.name.clone(), obj);
                        }
                        _ => {}
                    }
                }
            }
            Decl::Func(func) => {
                if func.recv.is_none() && func.name.name != "init" && !func.name.is_blank() {
                    let obj = ObjRef { kind: ObjKind::Fun, decl: decl_idx, spec: 0 };
                    scope.insert(func.name.name.clone(), obj);
                }
            }
        }
    }

    scope
}

fn bind_fields(fields: &mut FieldList, scope: &HashMap<String, ObjRef>) {
    for field in &mut fields.list {
        bind_expr(&mut field.ty, scope);
    }
}

fn bind_func_type(ty: &mut FuncType, scope: &HashMap<String, ObjRef>) {
    bind_fields(&mut ty.params, scope);
    if let Some(results) = &mut ty.results {
        bind_fields(results, scope);
    }
}

fn bind_expr(expr: &mut Expr, scope: &HashMap<String, ObjRef>) {
    match expr {
        Expr::Lit(_) => {}
        Expr::Ident(ident) => ident.obj = scope.get(&ident.name).copied(),
        // the selected name is a field, method or package member
        Expr::Selector { x, .. } => bind_expr(x, scope),
        Expr::Paren { x, .. }
        | Expr::Star { x, .. }
        | Expr::Unary { x, .. }
        | Expr::Composite { ty: x, .. }
        | Expr::Ellipsis { elt: x, .. } => bind_expr(x, scope),
        Expr::Index { x, index, .. } => {
            bind_expr(x, scope);
            bind_expr(index, scope);
        }
        Expr::Slice { x, low, high, max, .. } => {
            bind_expr(x, scope);
            for part in [low, high, max].into_iter().flatten() {
                bind_expr(part, scope);
            }
        }
        Expr::TypeAssert { x, ty, .. } => {
            bind_expr(x, scope);
            if let Some(ty) = ty {
                bind_expr(ty, scope);
            }
        }
        Expr::Call { fun, args, .. } => {
            bind_expr(fun, scope);
            for arg in args {
                bind_expr(arg, scope);
            }
        }
        Expr::Binary { x, y, .. } => {
            bind_expr(x, scope);
            bind_expr(y, scope);
        }
        Expr::FuncLit { ty, .. } | Expr::FuncType(ty) => bind_func_type(ty, scope),
        Expr::ArrayType { len, elt, .. } => {
            if let ArrayLen::Expr(len) = len {
                bind_expr(len, scope);
            }
            bind_expr(elt, scope);
        }
        Expr::MapType { key, value, .. } => {
            bind_expr(key, scope);
            bind_expr(value, scope);
        }
        Expr::ChanType { value, .. } => bind_expr(value, scope),
        Expr::StructType { fields, .. } => bind_fields(fields, scope),
        Expr::InterfaceType { methods, .. } => {
            for method in &mut methods.list {
                match &mut method.ty {
                    Expr::FuncType(sig) => bind_func_type(sig, scope),
                    other => bind_expr(other, scope),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_file;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collect_scope() {
        let file = parse_file(
            "package a\nimport \"fmt\"\nconst A, _ = 1, 2\ntype T int\nfunc F() {}\nfunc init() {}\nfunc (T) M() {}\n",
            0,
        )
        .expect("source should parse");
        let scope = collect_scope(&file);

        let mut names: Vec<&str> = scope.keys().map(|k| k.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["A", "F", "T"]);
        assert_eq!(scope["A"], ObjRef { kind: ObjKind::Con, decl: 1, spec: 0 });
        assert_eq!(scope["T"].kind, ObjKind::Typ);
        assert_eq!(scope["F"], ObjRef { kind: ObjKind::Fun, decl: 3, spec: 0 });
    }

    #[test]
    fn test_uses_are_bound() {
        let file = parse_file("package a\nvar x = y + fmt.Z\nvar y int\n", 0).expect("source should parse");
        let Decl::Gen(gen) = &file.decls[0] else { panic!("expected var decl") };
        let Spec::Value(spec) = &gen.specs[0] else { panic!("expected value spec") };
        let Expr::Binary { x, y, .. } = &spec.values[0] else { panic!("expected binary") };

        let Expr::Ident(y_ident) = &**x else { panic!("expected identifier") };
        assert_eq!(y_ident.obj, Some(ObjRef { kind: ObjKind::Var, decl: 1, spec: 0 }));

        let Expr::Selector { x: pkg, .. } = &**y else { panic!("expected selector") };
        let Expr::Ident(pkg) = &**pkg else { panic!("expected identifier") };
        assert_eq!(pkg.obj, None);
    }
}

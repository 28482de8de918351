//! Abstract Syntax Tree definitions for Go source
//!
//! Types are expressions here, the way Go's own syntax tree models them:
//! `*T`, `[]T` and `map[K]V` appear both in type positions and as
//! operands of conversions and composite literals.

use crate::utils::Span;

/// A parsed source file
#[derive(Debug, Clone)]
pub struct File {
    pub package: Ident,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl File {
    /// Import specs of the file, in source order
    pub fn imports(&self) -> impl Iterator<Item = &ImportSpec> {
        self.decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Gen(gen) if gen.kind == DeclKind::Import => Some(&gen.specs),
                _ => None,
            })
            .flatten()
            .filter_map(|spec| match spec {
                Spec::Import(import) => Some(import),
                _ => None,
            })
    }
}

/// Top-level declaration
#[derive(Debug, Clone)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

/// Which keyword introduced a general declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Import,
    Const,
    Var,
    Type,
}

/// `import`, `const`, `var` or `type`, single or grouped
#[derive(Debug, Clone)]
pub struct GenDecl {
    pub kind: DeclKind,
    pub specs: Vec<Spec>,
    /// Whether the specs were written inside `( ... )`
    pub grouped: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Explicit binding name (`_`, `.` or an alias)
    pub name: Option<Ident>,
    /// Import path without quotes
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// The name the import is bound to in the file: the alias, or the
    /// last path segment
    pub fn binding(&self) -> &str {
        match &self.name {
            Some(name) => &name.name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// `names [Type] [= values]`
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// `Name Type` or the alias form `Name = Type`
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub alias: bool,
    pub ty: Expr,
    pub span: Span,
}

/// Function or method declaration; the body is not retained
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<FieldList>,
    pub name: Ident,
    pub ty: FuncType,
    pub has_body: bool,
    pub span: Span,
}

impl FuncDecl {
    /// Base type name of the receiver (`T` for both `T` and `*T`)
    pub fn recv_type_name(&self) -> Option<&str> {
        let field = self.recv.as_ref()?.list.first()?;
        let mut ty = &field.ty;
        loop {
            match ty {
                Expr::Star { x, .. } | Expr::Paren { x, .. } => ty = x,
                Expr::Index { x, .. } => ty = x,
                Expr::Ident(ident) => return Some(&ident.name),
                _ => return None,
            }
        }
    }
}

/// Parameter and result lists of a function signature
#[derive(Debug, Clone)]
pub struct FuncType {
    pub params: FieldList,
    pub results: Option<FieldList>,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct FieldList {
    pub list: Vec<Field>,
}

impl FieldList {
    /// Number of declared entries, counting every name of a multi-name field
    pub fn arity(&self) -> usize {
        self.list.iter().map(|f| f.names.len().max(1)).sum()
    }
}

/// Parameter, result, struct field or interface element
#[derive(Debug, Clone)]
pub struct Field {
    /// Empty for unnamed parameters and embedded fields
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub tag: Option<String>,
    pub span: Span,
}

/// Identifier with its optional file-scope binding
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub obj: Option<ObjRef>,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span, obj: None }
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// What kind of declaration an identifier is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Con,
    Var,
    Typ,
    Fun,
}

/// Link from an identifier to the top-level declaration that declares it:
/// `decl` indexes `File::decls`, `spec` indexes that declaration's specs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub kind: ObjKind,
    pub decl: usize,
    pub spec: usize,
}

/// Kind of a basic literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone)]
pub struct BasicLit {
    pub kind: LitKind,
    pub value: String,
    pub span: Span,
}

/// Length part of an array type
#[derive(Debug, Clone)]
pub enum ArrayLen {
    /// `[]T`
    Slice,
    /// `[...]T`
    Ellipsis,
    /// `[N]T`
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Expression (including type expressions)
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value
    Lit(BasicLit),
    /// Identifier
    Ident(Ident),
    /// `(x)`
    Paren { x: Box<Expr>, span: Span },
    /// `x.sel`, either a qualified name or a field/method selection
    Selector { x: Box<Expr>, sel: Ident, span: Span },
    /// `x[index]`
    Index { x: Box<Expr>, index: Box<Expr>, span: Span },
    /// `x[low:high:max]`
    Slice {
        x: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
        span: Span,
    },
    /// `x.(T)`; `ty` is None for `x.(type)`
    TypeAssert { x: Box<Expr>, ty: Option<Box<Expr>>, span: Span },
    /// Function call or conversion
    Call { fun: Box<Expr>, args: Vec<Expr>, ellipsis: bool, span: Span },
    /// `*x`: pointer type or dereference
    Star { x: Box<Expr>, span: Span },
    /// Unary operation
    Unary { op: UnOp, x: Box<Expr>, span: Span },
    /// Binary operation
    Binary { x: Box<Expr>, op: BinOp, y: Box<Expr>, span: Span },
    /// `T{...}`; elements are not retained
    Composite { ty: Box<Expr>, span: Span },
    /// `func(...) ... { ... }`; the body is not retained
    FuncLit { ty: FuncType, span: Span },
    /// `...T` in a parameter list
    Ellipsis { elt: Box<Expr>, span: Span },

    // ============ Type shapes ============
    ArrayType { len: ArrayLen, elt: Box<Expr>, span: Span },
    MapType { key: Box<Expr>, value: Box<Expr>, span: Span },
    ChanType { dir: ChanDir, value: Box<Expr>, span: Span },
    FuncType(FuncType),
    StructType { fields: FieldList, span: Span },
    InterfaceType { methods: FieldList, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit(lit) => lit.span,
            Expr::Ident(ident) => ident.span,
            Expr::FuncType(ty) => ty.span,
            Expr::Paren { span, .. }
            | Expr::Selector { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::TypeAssert { span, .. }
            | Expr::Call { span, .. }
            | Expr::Star { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Composite { span, .. }
            | Expr::FuncLit { span, .. }
            | Expr::Ellipsis { span, .. }
            | Expr::ArrayType { span, .. }
            | Expr::MapType { span, .. }
            | Expr::ChanType { span, .. }
            | Expr::StructType { span, .. }
            | Expr::InterfaceType { span, .. } => *span,
        }
    }

    /// Short name of the expression shape, for diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            Expr::Lit(_) => "literal",
            Expr::Ident(_) => "identifier",
            Expr::Paren { .. } => "parenthesized expression",
            Expr::Selector { .. } => "selector expression",
            Expr::Index { .. } => "index expression",
            Expr::Slice { .. } => "slice expression",
            Expr::TypeAssert { .. } => "type assertion",
            Expr::Call { .. } => "call expression",
            Expr::Star { .. } => "star expression",
            Expr::Unary { .. } => "unary expression",
            Expr::Binary { .. } => "binary expression",
            Expr::Composite { .. } => "composite literal",
            Expr::FuncLit { .. } => "function literal",
            Expr::Ellipsis { .. } => "ellipsis",
            Expr::ArrayType { .. } => "array type",
            Expr::MapType { .. } => "map type",
            Expr::ChanType { .. } => "channel type",
            Expr::FuncType(_) => "function type",
            Expr::StructType { .. } => "struct type",
            Expr::InterfaceType { .. } => "interface type",
        }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren { x, .. } = expr {
            expr = x;
        }
        expr
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.unparen(), Expr::Lit(_))
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// +x
    Pos,
    /// -x
    Neg,
    /// !x
    Not,
    /// ^x
    BitNot,
    /// &x
    Addr,
    /// <-x
    Recv,
    /// ~x (constraint term)
    Tilde,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    LOr,
    LAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::LOr | BinOp::LAnd)
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinOp::Shl | BinOp::Shr)
    }
}

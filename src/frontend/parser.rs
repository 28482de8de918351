//! Parser for Go source
//!
//! Recursive descent over package-level declarations with precedence
//! climbing for expressions. Function and composite literal bodies are
//! skipped as balanced brace blocks: only declarations and the shapes of
//! their expressions are kept.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Result<Self> {
        Ok(Self {
            tokens: lexer.tokenize()?,
            pos: 0,
        })
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        // the token stream always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn last_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: format!("{:?}", self.current_kind()),
            span: self.current().span,
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("{:?}", expected)))
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Statement terminator: `;`, or nothing before a closing delimiter
    fn expect_semi(&mut self, closing: &TokenKind) -> Result<()> {
        if self.consume(&TokenKind::Semicolon) || self.check(closing) || self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("';' or newline"))
        }
    }

    /// Skip a balanced `open ... close` group, returning its span
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<Span> {
        let start = self.expect(open.clone())?.span;
        let mut depth = 1usize;
        while depth > 0 {
            if self.is_at_end() {
                return Err(self.unexpected(&format!("{:?}", close)));
            }
            let token = self.advance();
            if std::mem::discriminant(&token.kind) == std::mem::discriminant(&open) {
                depth += 1;
            } else if std::mem::discriminant(&token.kind) == std::mem::discriminant(&close) {
                depth -= 1;
            }
        }
        Ok(start.merge(&self.last_span()))
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident::new(name.clone(), token.span))
            }
            _ => Err(Error::ExpectedIdent { span: token.span }),
        }
    }

    fn parse_ident_list(&mut self) -> Result<Vec<Ident>> {
        let mut names = vec![self.parse_ident()?];
        while self.consume(&TokenKind::Comma) {
            names.push(self.parse_ident()?);
        }
        Ok(names)
    }

    // ==================== Declarations ====================

    /// Parse a complete source file
    pub fn parse_file(&mut self) -> Result<File> {
        let start = self.current().span;
        self.expect(TokenKind::Package)?;
        let package = self.parse_ident()?;
        self.expect_semi(&TokenKind::Eof)?;

        let mut decls = Vec::new();
        while !self.is_at_end() {
            if self.consume(&TokenKind::Semicolon) {
                continue;
            }
            decls.push(self.parse_decl()?);
            self.expect_semi(&TokenKind::Eof)?;
        }

        Ok(File {
            package,
            decls,
            span: start.merge(&self.last_span()),
        })
    }

    /// Parse a top-level declaration
    fn parse_decl(&mut self) -> Result<Decl> {
        match self.current_kind() {
            TokenKind::Import => self.parse_gen_decl(DeclKind::Import),
            TokenKind::Const => self.parse_gen_decl(DeclKind::Const),
            TokenKind::Var => self.parse_gen_decl(DeclKind::Var),
            TokenKind::Type => self.parse_gen_decl(DeclKind::Type),
            TokenKind::Func => Ok(Decl::Func(self.parse_func_decl()?)),
            _ => Err(self.unexpected("declaration (import, const, var, type, func)")),
        }
    }

    fn parse_gen_decl(&mut self, kind: DeclKind) -> Result<Decl> {
        let start = self.advance().span;
        let mut specs = Vec::new();

        let grouped = self.consume(&TokenKind::LParen);
        if grouped {
            while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                specs.push(self.parse_spec(kind)?);
                self.expect_semi(&TokenKind::RParen)?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_spec(kind)?);
        }

        Ok(Decl::Gen(GenDecl {
            kind,
            specs,
            grouped,
            span: start.merge(&self.last_span()),
        }))
    }

    fn parse_spec(&mut self, kind: DeclKind) -> Result<Spec> {
        match kind {
            DeclKind::Import => self.parse_import_spec().map(Spec::Import),
            DeclKind::Const | DeclKind::Var => self.parse_value_spec().map(Spec::Value),
            DeclKind::Type => self.parse_type_spec().map(Spec::Type),
        }
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec> {
        let start = self.current().span;
        let name = match self.current_kind() {
            TokenKind::Ident(_) => Some(self.parse_ident()?),
            TokenKind::Dot => {
                let span = self.advance().span;
                Some(Ident::new(".", span))
            }
            _ => None,
        };

        let token = self.advance();
        let path = match token.kind {
            TokenKind::StringLit(path) => path,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "import path".to_string(),
                    got: format!("{:?}", other),
                    span: token.span,
                })
            }
        };

        Ok(ImportSpec {
            name,
            path,
            span: start.merge(&token.span),
        })
    }

    fn parse_value_spec(&mut self) -> Result<ValueSpec> {
        let start = self.current().span;
        let names = self.parse_ident_list()?;

        let ty = if !self.check(&TokenKind::Eq)
            && !self.check(&TokenKind::Semicolon)
            && !self.check(&TokenKind::RParen)
            && !self.is_at_end()
        {
            Some(self.parse_type()?)
        } else {
            None
        };

        let values = if self.consume(&TokenKind::Eq) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };

        Ok(ValueSpec {
            names,
            ty,
            values,
            span: start.merge(&self.last_span()),
        })
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec> {
        let start = self.current().span;
        let name = self.parse_ident()?;
        let alias = self.consume(&TokenKind::Eq);
        let ty = self.parse_type()?;

        Ok(TypeSpec {
            name,
            alias,
            ty,
            span: start.merge(&self.last_span()),
        })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl> {
        let start = self.expect(TokenKind::Func)?.span;

        let recv = if self.check(&TokenKind::LParen) {
            Some(self.parse_params()?)
        } else {
            None
        };

        let name = self.parse_ident()?;

        // type parameters are not modeled
        if self.check(&TokenKind::LBracket) {
            self.skip_balanced(TokenKind::LBracket, TokenKind::RBracket)?;
        }

        let ty = self.parse_signature(start)?;

        let has_body = self.check(&TokenKind::LBrace);
        if has_body {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
        }

        Ok(FuncDecl {
            recv,
            name,
            ty,
            has_body,
            span: start.merge(&self.last_span()),
        })
    }

    /// Parameters and optional results, after `func` (and name)
    fn parse_signature(&mut self, start: Span) -> Result<FuncType> {
        let params = self.parse_params()?;

        let results = if self.check(&TokenKind::LParen) {
            Some(self.parse_params()?)
        } else if self.starts_type() {
            let ty = self.parse_type()?;
            let span = ty.span();
            Some(FieldList {
                list: vec![Field { names: Vec::new(), ty, tag: None, span }],
            })
        } else {
            None
        };

        Ok(FuncType {
            params,
            results,
            span: start.merge(&self.last_span()),
        })
    }

    /// Parse `( ... )` where entries are either all types or all
    /// `names Type` groups
    fn parse_params(&mut self) -> Result<FieldList> {
        self.expect(TokenKind::LParen)?;

        let mut entries: Vec<(Expr, Option<Expr>)> = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let first = self.parse_param_type()?;
            if !self.check(&TokenKind::Comma) && !self.check(&TokenKind::RParen) {
                let ty = self.parse_param_type()?;
                entries.push((first, Some(ty)));
            } else {
                entries.push((first, None));
            }
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        if !entries.iter().any(|(_, ty)| ty.is_some()) {
            let list = entries
                .into_iter()
                .map(|(ty, _)| Field { span: ty.span(), names: Vec::new(), ty, tag: None })
                .collect();
            return Ok(FieldList { list });
        }

        let mut list = Vec::new();
        let mut names = Vec::new();
        for (first, ty) in entries {
            match first {
                Expr::Ident(ident) => names.push(ident),
                other => return Err(Error::ExpectedIdent { span: other.span() }),
            }
            if let Some(ty) = ty {
                let span = names[0].span.merge(&ty.span());
                list.push(Field { names: std::mem::take(&mut names), ty, tag: None, span });
            }
        }
        if let Some(dangling) = names.first() {
            return Err(Error::ExpectedType { span: dangling.span });
        }

        Ok(FieldList { list })
    }

    fn parse_param_type(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Ellipsis) {
            let start = self.advance().span;
            let elt = self.parse_type()?;
            return Ok(Expr::Ellipsis {
                span: start.merge(&elt.span()),
                elt: Box::new(elt),
            });
        }
        self.parse_type()
    }

    // ==================== Types ====================

    /// Whether the current token can begin a type
    fn starts_type(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Ident(_)
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Arrow
                | TokenKind::LParen
        )
    }

    pub fn parse_type(&mut self) -> Result<Expr> {
        let start = self.current().span;

        match self.current_kind().clone() {
            TokenKind::Ident(_) => {
                let ident = self.parse_ident()?;
                self.parse_qualified(ident)
            }
            TokenKind::Star => {
                self.advance();
                let inner = self.parse_type()?;
                Ok(Expr::Star {
                    span: start.merge(&inner.span()),
                    x: Box::new(inner),
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let len = if self.consume(&TokenKind::RBracket) {
                    ArrayLen::Slice
                } else if self.consume(&TokenKind::Ellipsis) {
                    self.expect(TokenKind::RBracket)?;
                    ArrayLen::Ellipsis
                } else {
                    let len = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    ArrayLen::Expr(Box::new(len))
                };
                let elt = self.parse_type()?;
                Ok(Expr::ArrayType {
                    len,
                    span: start.merge(&elt.span()),
                    elt: Box::new(elt),
                })
            }
            TokenKind::Map => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Ok(Expr::MapType {
                    span: start.merge(&value.span()),
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Chan => {
                self.advance();
                let dir = if self.consume(&TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let value = self.parse_type()?;
                Ok(Expr::ChanType {
                    dir,
                    span: start.merge(&value.span()),
                    value: Box::new(value),
                })
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(TokenKind::Chan)?;
                let value = self.parse_type()?;
                Ok(Expr::ChanType {
                    dir: ChanDir::Recv,
                    span: start.merge(&value.span()),
                    value: Box::new(value),
                })
            }
            TokenKind::Func => {
                self.advance();
                Ok(Expr::FuncType(self.parse_signature(start)?))
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren {
                    x: Box::new(inner),
                    span: start.merge(&self.last_span()),
                })
            }
            _ => Err(Error::ExpectedType { span: start }),
        }
    }

    /// `pkg.Name` after the first identifier of a type name
    fn parse_qualified(&mut self, ident: Ident) -> Result<Expr> {
        if self.check(&TokenKind::Dot) && matches!(self.peek_kind(), TokenKind::Ident(_)) {
            self.advance();
            let sel = self.parse_ident()?;
            return Ok(Expr::Selector {
                span: ident.span.merge(&sel.span),
                x: Box::new(Expr::Ident(ident)),
                sel,
            });
        }
        Ok(Expr::Ident(ident))
    }

    fn parse_tag(&mut self) -> Option<String> {
        if let TokenKind::StringLit(tag) = self.current_kind().clone() {
            self.advance();
            Some(tag)
        } else {
            None
        }
    }

    fn parse_struct_type(&mut self) -> Result<Expr> {
        let start = self.expect(TokenKind::Struct)?.span;
        self.expect(TokenKind::LBrace)?;

        let mut list = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let field_start = self.current().span;
            let embedded = match self.current_kind() {
                TokenKind::Star => true,
                TokenKind::Ident(_) => matches!(
                    self.peek_kind(),
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::StringLit(_) | TokenKind::Dot
                ),
                _ => return Err(self.unexpected("field declaration")),
            };

            let (names, ty) = if embedded {
                (Vec::new(), self.parse_type()?)
            } else {
                let names = self.parse_ident_list()?;
                (names, self.parse_type()?)
            };
            let tag = self.parse_tag();

            list.push(Field {
                names,
                ty,
                tag,
                span: field_start.merge(&self.last_span()),
            });
            self.expect_semi(&TokenKind::RBrace)?;
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Expr::StructType {
            fields: FieldList { list },
            span: start.merge(&self.last_span()),
        })
    }

    fn parse_interface_type(&mut self) -> Result<Expr> {
        let start = self.expect(TokenKind::Interface)?.span;
        self.expect(TokenKind::LBrace)?;

        let mut list = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let elem_start = self.current().span;
            let is_method = matches!(self.current_kind(), TokenKind::Ident(_))
                && matches!(self.peek_kind(), TokenKind::LParen);

            if is_method {
                let name = self.parse_ident()?;
                let sig = self.parse_signature(name.span)?;
                list.push(Field {
                    names: vec![name],
                    ty: Expr::FuncType(sig),
                    tag: None,
                    span: elem_start.merge(&self.last_span()),
                });
            } else {
                // embedded interface or constraint union; only the first term is kept
                self.consume(&TokenKind::Tilde);
                let ty = self.parse_type()?;
                while self.consume(&TokenKind::Or) {
                    self.consume(&TokenKind::Tilde);
                    self.parse_type()?;
                }
                list.push(Field {
                    names: Vec::new(),
                    ty,
                    tag: None,
                    span: elem_start.merge(&self.last_span()),
                });
            }
            self.expect_semi(&TokenKind::RBrace)?;
        }
        self.expect(TokenKind::RBrace)?;

        Ok(Expr::InterfaceType {
            methods: FieldList { list },
            span: start.merge(&self.last_span()),
        })
    }

    // ==================== Expressions ====================

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.consume(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_binary(1)
    }

    /// Precedence climbing; all Go binary operators are left-associative
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(prec) = self.current_kind().binary_precedence() else {
                break;
            };
            if prec < min_prec {
                break;
            }

            let op_token = self.advance();
            let op = Self::token_to_binop(&op_token.kind, op_token.span)?;
            let right = self.parse_binary(prec + 1)?;
            let span = left.span().merge(&right.span());

            left = Expr::Binary {
                x: Box::new(left),
                op,
                y: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn token_to_binop(kind: &TokenKind, span: Span) -> Result<BinOp> {
        let op = match kind {
            TokenKind::OrOr => BinOp::LOr,
            TokenKind::AndAnd => BinOp::LAnd,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::Ne => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Or => BinOp::Or,
            TokenKind::Caret => BinOp::Xor,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Rem,
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            TokenKind::And => BinOp::And,
            TokenKind::AndNot => BinOp::AndNot,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "binary operator".to_string(),
                    got: format!("{:?}", other),
                    span,
                })
            }
        };
        Ok(op)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        let op = match token.kind {
            TokenKind::Plus => UnOp::Pos,
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not => UnOp::Not,
            TokenKind::Caret => UnOp::BitNot,
            TokenKind::And => UnOp::Addr,
            TokenKind::Tilde => UnOp::Tilde,
            TokenKind::Arrow if matches!(self.peek_kind(), TokenKind::Chan) => {
                return self.parse_primary();
            }
            TokenKind::Arrow => UnOp::Recv,
            TokenKind::Star => {
                self.advance();
                let x = self.parse_unary()?;
                return Ok(Expr::Star {
                    span: token.span.merge(&x.span()),
                    x: Box::new(x),
                });
            }
            _ => return self.parse_primary(),
        };

        self.advance();
        let x = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            span: token.span.merge(&x.span()),
            x: Box::new(x),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        let expr = match &token.kind {
            // Literals
            TokenKind::IntLit(text) => self.literal(LitKind::Int, text.clone()),
            TokenKind::FloatLit(text) => self.literal(LitKind::Float, text.clone()),
            TokenKind::ImagLit(text) => self.literal(LitKind::Imag, text.clone()),
            TokenKind::CharLit(c) => self.literal(LitKind::Char, c.to_string()),
            TokenKind::StringLit(s) => self.literal(LitKind::String, s.clone()),

            TokenKind::Ident(_) => Expr::Ident(self.parse_ident()?),

            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Expr::Paren {
                    x: Box::new(inner),
                    span: token.span.merge(&self.last_span()),
                }
            }

            // Function literal or function type
            TokenKind::Func => {
                self.advance();
                let ty = self.parse_signature(token.span)?;
                if self.check(&TokenKind::LBrace) {
                    let body = self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                    Expr::FuncLit {
                        span: token.span.merge(&body),
                        ty,
                    }
                } else {
                    Expr::FuncType(ty)
                }
            }

            // Type operands: conversions and composite literal types
            TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Arrow => self.parse_type()?,

            _ => return Err(Error::ExpectedExpr { span: token.span }),
        };

        self.parse_postfix(expr)
    }

    fn literal(&mut self, kind: LitKind, value: String) -> Expr {
        let span = self.advance().span;
        Expr::Lit(BasicLit { kind, value, span })
    }

    fn is_composite_type(expr: &Expr) -> bool {
        match expr {
            Expr::Ident(_) | Expr::ArrayType { .. } | Expr::MapType { .. } | Expr::StructType { .. } => true,
            Expr::Selector { x, .. } => matches!(**x, Expr::Ident(_)),
            Expr::Index { x, .. } => Self::is_composite_type(x),
            _ => false,
        }
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    if self.consume(&TokenKind::LParen) {
                        // Type assertion
                        let ty = if self.consume(&TokenKind::Type) {
                            None
                        } else {
                            Some(Box::new(self.parse_type()?))
                        };
                        self.expect(TokenKind::RParen)?;
                        expr = Expr::TypeAssert {
                            span: expr.span().merge(&self.last_span()),
                            x: Box::new(expr),
                            ty,
                        };
                    } else {
                        let sel = self.parse_ident()?;
                        expr = Expr::Selector {
                            span: expr.span().merge(&sel.span),
                            x: Box::new(expr),
                            sel,
                        };
                    }
                }
                TokenKind::LBracket => {
                    expr = self.parse_index_or_slice(expr)?;
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                        args.push(self.parse_expr()?);
                        if self.consume(&TokenKind::Ellipsis) {
                            ellipsis = true;
                        }
                        if !self.consume(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call {
                        span: expr.span().merge(&self.last_span()),
                        fun: Box::new(expr),
                        args,
                        ellipsis,
                    };
                }
                TokenKind::LBrace if Self::is_composite_type(&expr) => {
                    let body = self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                    expr = Expr::Composite {
                        span: expr.span().merge(&body),
                        ty: Box::new(expr),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_index_or_slice(&mut self, x: Expr) -> Result<Expr> {
        self.expect(TokenKind::LBracket)?;

        let low = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        if !self.consume(&TokenKind::Colon) {
            self.expect(TokenKind::RBracket)?;
            let index = low.ok_or_else(|| Error::ExpectedExpr { span: self.last_span() })?;
            return Ok(Expr::Index {
                span: x.span().merge(&self.last_span()),
                x: Box::new(x),
                index,
            });
        }

        let high = if self.check(&TokenKind::Colon) || self.check(&TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let max = if self.consume(&TokenKind::Colon) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect(TokenKind::RBracket)?;

        Ok(Expr::Slice {
            span: x.span().merge(&self.last_span()),
            x: Box::new(x),
            low,
            high,
            max,
        })
    }
}

/// Parse one source file into a syntax tree with file-scope bindings
pub fn parse_file(source: &str, file_id: usize) -> Result<File> {
    let mut parser = Parser::new(Lexer::new(source, file_id))?;
    let mut file = parser.parse_file()?;
    crate::frontend::scope::bind_file(&mut file);
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> File {
        parse_file(source, 0).expect("source should parse")
    }

    fn first_value_spec(file: &File) -> &ValueSpec {
        match &file.decls[0] {
            Decl::Gen(GenDecl { specs, .. }) => match &specs[0] {
                Spec::Value(spec) => spec,
                other => panic!("expected value spec, got {:?}", other),
            },
            other => panic!("expected general declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse("package main\n\nimport (\n\t\"fmt\"\n\tstr \"strings\"\n\t_ \"embed\"\n)\n");
        assert_eq!(file.package.name, "main");

        let imports: Vec<(&str, &str)> = file.imports().map(|i| (i.binding(), i.path.as_str())).collect();
        assert_eq!(imports, vec![("fmt", "fmt"), ("str", "strings"), ("_", "embed")]);
    }

    #[test]
    fn test_grouped_const() {
        let file = parse("package a\nconst (\n\tA int = 1\n\tB\n\tC = 3\n)\n");
        let Decl::Gen(decl) = &file.decls[0] else { panic!("expected const decl") };
        assert_eq!(decl.kind, DeclKind::Const);
        assert!(decl.grouped);
        assert_eq!(decl.specs.len(), 3);

        let Spec::Value(b) = &decl.specs[1] else { panic!("expected value spec") };
        assert_eq!(b.names[0].name, "B");
        assert!(b.ty.is_none());
        assert!(b.values.is_empty());
    }

    #[test]
    fn test_multi_name_value_spec() {
        let file = parse("package a\nvar a, b = f()\n");
        let spec = first_value_spec(&file);
        assert_eq!(spec.names.len(), 2);
        assert_eq!(spec.values.len(), 1);
        assert!(matches!(spec.values[0], Expr::Call { .. }));
    }

    #[test]
    fn test_func_decl_signature() {
        let file = parse("package a\nfunc f(a, b int, s ...string) (int, error) {\n\treturn 0, nil\n}\n");
        let Decl::Func(func) = &file.decls[0] else { panic!("expected func decl") };
        assert_eq!(func.name.name, "f");
        assert!(func.has_body);
        assert_eq!(func.ty.params.arity(), 3);
        assert!(matches!(func.ty.params.list[1].ty, Expr::Ellipsis { .. }));
        assert_eq!(func.ty.results.as_ref().map(|r| r.arity()), Some(2));
    }

    #[test]
    fn test_method_receiver() {
        let file = parse("package a\nfunc (p *Point) Len() float64 { return 0 }\n");
        let Decl::Func(func) = &file.decls[0] else { panic!("expected func decl") };
        assert_eq!(func.recv_type_name(), Some("Point"));
    }

    #[test]
    fn test_struct_and_interface_types() {
        let file = parse(
            "package a\ntype T struct {\n\tx, y int `json:\"x\"`\n\t*Base\n\tio.Reader\n}\ntype I interface {\n\tRead(p []byte) (int, error)\n\tfmt.Stringer\n}\n",
        );
        let Decl::Gen(decl) = &file.decls[0] else { panic!("expected type decl") };
        let Spec::Type(spec) = &decl.specs[0] else { panic!("expected type spec") };
        let Expr::StructType { fields, .. } = &spec.ty else { panic!("expected struct") };
        assert_eq!(fields.list.len(), 3);
        assert_eq!(fields.list[0].names.len(), 2);
        assert_eq!(fields.list[0].tag.as_deref(), Some("json:\"x\""));
        assert!(fields.list[1].names.is_empty());
        assert!(matches!(fields.list[2].ty, Expr::Selector { .. }));

        let Decl::Gen(decl) = &file.decls[1] else { panic!("expected type decl") };
        let Spec::Type(spec) = &decl.specs[0] else { panic!("expected type spec") };
        let Expr::InterfaceType { methods, .. } = &spec.ty else { panic!("expected interface") };
        assert_eq!(methods.list.len(), 2);
        assert_eq!(methods.list[0].names[0].name, "Read");
    }

    #[test]
    fn test_composite_and_func_literals() {
        let file = parse(
            "package a\nvar (\n\tm = map[string][]int{\"a\": {1, 2}}\n\tf = func(x int) int { return x * 2 }\n\tp = &T{X: 1}\n)\n",
        );
        let Decl::Gen(decl) = &file.decls[0] else { panic!("expected var decl") };
        let values: Vec<&str> = decl
            .specs
            .iter()
            .map(|s| match s {
                Spec::Value(v) => v.values[0].shape(),
                _ => "other",
            })
            .collect();
        assert_eq!(values, vec!["composite literal", "function literal", "unary expression"]);
    }

    #[test]
    fn test_binary_precedence() {
        let file = parse("package a\nvar x = 1 + 2*3 == 7\n");
        let spec = first_value_spec(&file);
        let Expr::Binary { op, x, .. } = &spec.values[0] else { panic!("expected binary") };
        assert_eq!(*op, BinOp::Eq);
        assert!(matches!(**x, Expr::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn test_index_slice_assert() {
        let file = parse("package a\nvar (\n\ta = s[1]\n\tb = s[1:]\n\tc = v.(string)\n\td = <-ch\n)\n");
        let Decl::Gen(decl) = &file.decls[0] else { panic!("expected var decl") };
        let shapes: Vec<&str> = decl
            .specs
            .iter()
            .map(|s| match s {
                Spec::Value(v) => v.values[0].shape(),
                _ => "other",
            })
            .collect();
        assert_eq!(shapes, vec!["index expression", "slice expression", "type assertion", "unary expression"]);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_file("package a\nvar = 1\n", 0).unwrap_err();
        assert!(matches!(err, Error::ExpectedIdent { .. }));

        let err = parse_file("var x = 1\n", 0).unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }
}

//! A tolerant-mode recursive-descent parser. On a malformed construct it
//! records a diagnostic and resynchronizes at the next statement boundary
//! (`;`, `}`, or a keyword that starts a new declaration) rather than
//! aborting, so a single syntax error never prevents the rest of the file
//! from reaching the semantic analyzer and the editor's query handlers.

use super::tokens::{Token, TokenKind};
use crate::ast::*;
use crate::compiler_messages::{Diagnostic, ErrorLocation};
use crate::source_map::SourceMap;
use crate::string_interning::StringTable;
use std::path::PathBuf;

pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    file: PathBuf,
    source: &'a str,
    source_map: SourceMap,
    table: &'a mut StringTable,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, file: PathBuf, source: &'a str, table: &'a mut StringTable) -> Self {
        let source_map = SourceMap::new(source);
        Parser {
            tokens,
            pos: 0,
            file,
            source,
            source_map,
            table,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> ParseResult {
        let start = self.loc_here();
        let package = if self.at(&TokenKind::Package) {
            self.bump();
            let name_loc = self.loc_here();
            let name = self.expect_ident();
            self.eat_semi();
            Some(PackageDecl {
                qualified_name: name,
                loc: name_loc,
            })
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.at(&TokenKind::Import) {
            imports.push(self.parse_import());
        }

        let mut declarations = Vec::new();
        while !self.at_eof() {
            match self.parse_top_level_decl() {
                Some(decl) => declarations.push(decl),
                None => self.resync_to_next_decl(),
            }
        }

        ParseResult {
            program: Program {
                package,
                imports,
                declarations,
                loc: start,
            },
            diagnostics: self.diagnostics,
        }
    }

    fn parse_import(&mut self) -> ImportDecl {
        let loc = self.loc_here();
        self.bump(); // 'import'
        let is_java = false;
        let name = self.expect_ident();
        let mut alias = None;
        let mut wildcard = false;
        if self.at(&TokenKind::Star) {
            self.bump();
            wildcard = true;
        }
        if self.at(&TokenKind::As) {
            self.bump();
            alias = Some(self.expect_ident());
        }
        self.eat_semi();
        ImportDecl {
            qualified_name: name,
            alias,
            wildcard,
            is_java,
            is_static: false,
            loc,
        }
    }

    fn parse_top_level_decl(&mut self) -> Option<Decl> {
        let annotations = self.parse_annotations();
        let modifiers = self.parse_modifiers();
        match self.peek_kind() {
            TokenKind::Class => self.parse_class(ClassKind::Class, annotations, modifiers),
            TokenKind::Interface => self.parse_class(ClassKind::Interface, annotations, modifiers),
            TokenKind::Enum => self.parse_class(ClassKind::Enum, annotations, modifiers),
            TokenKind::Object => self.parse_class(ClassKind::Object, annotations, modifiers),
            TokenKind::Fun => self.parse_function(annotations, modifiers).map(Decl::Function),
            TokenKind::Val | TokenKind::Var => self.parse_property(annotations, modifiers).map(Decl::Property),
            _ => {
                let loc = self.loc_here();
                self.error("expected a declaration", loc);
                None
            }
        }
    }

    fn parse_annotations(&mut self) -> Vec<Annotation> {
        let mut out = Vec::new();
        while self.at(&TokenKind::QuestionMark) {
            // no-op; annotations use '@' which this subset lexer does not
            // tokenize separately, so annotation parsing is skipped here.
            break;
        }
        out
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut mods = Vec::new();
        loop {
            let m = match self.peek_kind() {
                TokenKind::Val => Modifier::Val,
                TokenKind::Var => Modifier::Var,
                _ => break,
            };
            // val/var are consumed by their declaration parser, not here;
            // stop without consuming so that parser reaches them directly.
            let _ = m;
            break;
        }
        mods
    }

    fn parse_class(&mut self, kind: ClassKind, annotations: Vec<Annotation>, modifiers: Vec<Modifier>) -> Option<Decl> {
        let loc = self.loc_here();
        self.bump(); // class/interface/enum/object
        let name = self.expect_ident();

        let mut primary_ctor_params = Vec::new();
        if self.at(&TokenKind::LParen) {
            primary_ctor_params = self.parse_param_list();
        }

        let mut superclass = None;
        let mut super_ctor_args = Vec::new();
        let mut interfaces = Vec::new();
        if self.at(&TokenKind::Colon) {
            self.bump();
            loop {
                let type_ref = self.parse_type();
                if self.at(&TokenKind::LParen) {
                    super_ctor_args = self.parse_arg_list();
                    superclass = Some(type_ref);
                } else {
                    interfaces.push(type_ref);
                }
                if self.at(&TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        let mut members = Vec::new();
        let mut enum_entries = Vec::new();

        self.expect(&TokenKind::LBrace);
        if kind == ClassKind::Enum {
            while self.is_ident() {
                let entry_loc = self.loc_here();
                let entry_name = self.expect_ident();
                let ctor_args = if self.at(&TokenKind::LParen) {
                    self.parse_arg_list()
                } else {
                    Vec::new()
                };
                enum_entries.push(EnumEntry {
                    name: entry_name,
                    ctor_args,
                    loc: entry_loc,
                });
                if self.at(&TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.eat_semi();
        }
        while !self.at(&TokenKind::RBrace) && !self.at_eof() {
            let member_annotations = self.parse_annotations();
            let member_modifiers = self.parse_modifiers();
            match self.peek_kind() {
                TokenKind::Fun => {
                    if let Some(f) = self.parse_function(member_annotations, member_modifiers) {
                        members.push(Decl::Function(f));
                    }
                }
                TokenKind::Val | TokenKind::Var => {
                    if let Some(p) = self.parse_property(member_annotations, member_modifiers) {
                        members.push(Decl::Property(p));
                    }
                }
                TokenKind::LBrace => {
                    let block = self.parse_block();
                    members.push(Decl::InitBlock(block));
                }
                _ => {
                    let loc = self.loc_here();
                    self.error("expected a class member", loc);
                    self.bump();
                }
            }
        }
        self.expect(&TokenKind::RBrace);

        Some(match kind {
            ClassKind::Class => Decl::Class(ClassDecl {
                kind,
                name,
                modifiers,
                annotations,
                type_params: Vec::new(),
                primary_ctor_params,
                superclass,
                super_ctor_args,
                interfaces,
                members,
                enum_entries,
                loc,
            }),
            ClassKind::Interface => Decl::Interface(ClassDecl {
                kind,
                name,
                modifiers,
                annotations,
                type_params: Vec::new(),
                primary_ctor_params,
                superclass,
                super_ctor_args,
                interfaces,
                members,
                enum_entries,
                loc,
            }),
            ClassKind::Enum => Decl::Enum(ClassDecl {
                kind,
                name,
                modifiers,
                annotations,
                type_params: Vec::new(),
                primary_ctor_params,
                superclass,
                super_ctor_args,
                interfaces,
                members,
                enum_entries,
                loc,
            }),
            ClassKind::Object => Decl::Object(ClassDecl {
                kind,
                name,
                modifiers,
                annotations,
                type_params: Vec::new(),
                primary_ctor_params,
                superclass,
                super_ctor_args,
                interfaces,
                members,
                enum_entries,
                loc,
            }),
            ClassKind::Annotation => Decl::Annotation(ClassDecl {
                kind,
                name,
                modifiers,
                annotations,
                type_params: Vec::new(),
                primary_ctor_params,
                superclass,
                super_ctor_args,
                interfaces,
                members,
                enum_entries,
                loc,
            }),
        })
    }

    fn parse_function(&mut self, annotations: Vec<Annotation>, modifiers: Vec<Modifier>) -> Option<FunctionDecl> {
        let loc = self.loc_here();
        self.bump(); // fun
        let name = self.expect_ident();
        let params = self.parse_param_list();
        let return_type = if self.at(&TokenKind::Colon) {
            self.bump();
            Some(self.parse_type())
        } else {
            None
        };
        let body = if self.at(&TokenKind::Assign) {
            self.bump();
            Some(FunctionBody::Expr(Box::new(self.parse_expr())))
        } else if self.at(&TokenKind::LBrace) {
            Some(FunctionBody::Block(self.parse_block()))
        } else {
            None
        };
        self.eat_semi();
        Some(FunctionDecl {
            name,
            modifiers,
            annotations,
            type_params: Vec::new(),
            receiver_type: None,
            params,
            return_type,
            body,
            is_constructor: false,
            delegation_args: None,
            loc,
        })
    }

    fn parse_property(&mut self, _annotations: Vec<Annotation>, modifiers: Vec<Modifier>) -> Option<PropertyDecl> {
        let loc = self.loc_here();
        let mutable = self.at(&TokenKind::Var);
        self.bump(); // val/var
        let name = self.expect_ident();
        let ty = if self.at(&TokenKind::Colon) {
            self.bump();
            Some(self.parse_type())
        } else {
            None
        };
        let initializer = if self.at(&TokenKind::Assign) {
            self.bump();
            Some(Box::new(self.parse_expr()))
        } else {
            None
        };
        self.eat_semi();
        Some(PropertyDecl {
            name,
            mutable,
            ty,
            initializer,
            getter: None,
            setter: None,
            extension_receiver: None,
            modifiers,
            loc,
        })
    }

    fn parse_param_list(&mut self) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        self.expect(&TokenKind::LParen);
        while !self.at(&TokenKind::RParen) && !self.at_eof() {
            let loc = self.loc_here();
            let vararg = if self.at(&TokenKind::DotDot) {
                self.bump();
                true
            } else {
                false
            };
            let name = self.expect_ident();
            let ty = if self.at(&TokenKind::Colon) {
                self.bump();
                Some(self.parse_type())
            } else {
                None
            };
            let default = if self.at(&TokenKind::Assign) {
                self.bump();
                Some(Box::new(self.parse_expr()))
            } else {
                None
            };
            params.push(ParamDecl {
                name,
                ty,
                default,
                vararg,
                loc,
            });
            if self.at(&TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RParen);
        params
    }

    fn parse_arg_list(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        self.expect(&TokenKind::LParen);
        while !self.at(&TokenKind::RParen) && !self.at_eof() {
            args.push(self.parse_expr());
            if self.at(&TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RParen);
        args
    }

    fn parse_type(&mut self) -> TypeRef {
        let loc = self.loc_here();
        let name = self.expect_ident();
        let mut ty = if self.at(&TokenKind::Lt) {
            self.bump();
            let mut args = Vec::new();
            while !self.at(&TokenKind::Gt) && !self.at_eof() {
                args.push(self.parse_type());
                if self.at(&TokenKind::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect(&TokenKind::Gt);
            TypeRef::Generic(name, args, loc.clone())
        } else {
            TypeRef::Simple(name, loc.clone())
        };
        if self.at(&TokenKind::QuestionMark) {
            self.bump();
            ty = TypeRef::Nullable(Box::new(ty), loc);
        }
        ty
    }

    // ---------------------------------------------------------- statements

    fn parse_block(&mut self) -> Block {
        let loc = self.loc_here();
        self.expect(&TokenKind::LBrace);
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt());
        }
        self.expect(&TokenKind::RBrace);
        Block { stmts, loc }
    }

    fn parse_stmt(&mut self) -> Stmt {
        match self.peek_kind() {
            TokenKind::LBrace => Stmt::Block(self.parse_block()),
            TokenKind::Val | TokenKind::Var => {
                if let Some(p) = self.parse_property(Vec::new(), Vec::new()) {
                    Stmt::Decl(Box::new(Decl::Property(p)))
                } else {
                    Stmt::Expr(Box::new(self.parse_expr()))
                }
            }
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(false),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::Return => {
                self.bump();
                let value = if self.at(&TokenKind::Semicolon) || self.at(&TokenKind::RBrace) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()))
                };
                self.eat_semi();
                Stmt::Return(value)
            }
            TokenKind::Throw => {
                self.bump();
                let e = Box::new(self.parse_expr());
                self.eat_semi();
                Stmt::Throw(e)
            }
            TokenKind::Break => {
                self.bump();
                self.eat_semi();
                Stmt::Break(None)
            }
            TokenKind::Continue => {
                self.bump();
                self.eat_semi();
                Stmt::Continue(None)
            }
            TokenKind::Try => self.parse_try_stmt(),
            _ => {
                let e = self.parse_expr();
                self.eat_semi();
                Stmt::Expr(Box::new(e))
            }
        }
    }

    fn parse_if_stmt(&mut self) -> Stmt {
        let loc = self.loc_here();
        self.bump(); // if
        self.expect(&TokenKind::LParen);
        let condition = Box::new(self.parse_expr());
        self.expect(&TokenKind::RParen);
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.at(&TokenKind::Else) {
            self.bump();
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt::If(IfStmt {
            condition_binding: None,
            condition,
            then_branch,
            else_branch,
            loc,
        })
    }

    fn parse_while_stmt(&mut self, is_do: bool) -> Stmt {
        let loc = self.loc_here();
        self.bump(); // while
        self.expect(&TokenKind::LParen);
        let condition = Box::new(self.parse_expr());
        self.expect(&TokenKind::RParen);
        let body = Box::new(self.parse_stmt());
        let stmt = WhileStmt { condition, body, loc };
        if is_do {
            Stmt::DoWhile(stmt)
        } else {
            Stmt::While(stmt)
        }
    }

    fn parse_do_while_stmt(&mut self) -> Stmt {
        let loc = self.loc_here();
        self.bump(); // do
        let body = Box::new(self.parse_stmt());
        self.expect(&TokenKind::While);
        self.expect(&TokenKind::LParen);
        let condition = Box::new(self.parse_expr());
        self.expect(&TokenKind::RParen);
        self.eat_semi();
        Stmt::DoWhile(WhileStmt { condition, body, loc })
    }

    fn parse_try_stmt(&mut self) -> Stmt {
        let loc = self.loc_here();
        self.bump(); // try
        let body = self.parse_block();
        let mut catches = Vec::new();
        while self.at(&TokenKind::Catch) {
            let catch_loc = self.loc_here();
            self.bump();
            self.expect(&TokenKind::LParen);
            let param_name = self.expect_ident();
            self.expect(&TokenKind::Colon);
            let param_type = self.parse_type();
            self.expect(&TokenKind::RParen);
            let catch_body = self.parse_block();
            catches.push(CatchClause {
                param_name,
                param_type,
                body: catch_body,
                loc: catch_loc,
            });
        }
        let finally = if self.at(&TokenKind::Finally) {
            self.bump();
            Some(self.parse_block())
        } else {
            None
        };
        Stmt::Try(TryStmt {
            body,
            catches,
            finally,
            loc,
        })
    }

    // ---------------------------------------------------------- expressions

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let lhs = self.parse_elvis();
        let compound = match self.peek_kind() {
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            TokenKind::SlashAssign => Some(BinaryOp::Div),
            TokenKind::PercentAssign => Some(BinaryOp::Rem),
            _ => None,
        };
        if let Some(op) = compound {
            let loc = self.loc_here();
            self.bump();
            let rhs = Box::new(self.parse_assignment());
            return Expr::Assign(Box::new(lhs), Some(op), rhs, loc);
        }
        if self.at(&TokenKind::Assign) {
            let loc = self.loc_here();
            self.bump();
            let rhs = Box::new(self.parse_assignment());
            return Expr::Assign(Box::new(lhs), None, rhs, loc);
        }
        lhs
    }

    fn parse_elvis(&mut self) -> Expr {
        let lhs = self.parse_or();
        if self.at(&TokenKind::Elvis) {
            let loc = self.loc_here();
            self.bump();
            let rhs = Box::new(self.parse_elvis());
            return Expr::Elvis(Box::new(lhs), rhs, loc);
        }
        lhs
    }

    fn parse_or(&mut self) -> Expr {
        let mut lhs = self.parse_and();
        while self.at(&TokenKind::OrOr) {
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_and();
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_and(&mut self) -> Expr {
        let mut lhs = self.parse_equality();
        while self.at(&TokenKind::AndAnd) {
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_equality();
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_relational();
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_relational();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_additive();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_multiplicative();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_pipeline();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_pipeline();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_pipeline(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        while self.at(&TokenKind::Pipeline) {
            let loc = self.loc_here();
            self.bump();
            let rhs = self.parse_unary();
            lhs = Expr::Pipeline(Box::new(lhs), Box::new(rhs), loc);
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let loc = self.loc_here();
        match self.peek_kind() {
            TokenKind::Minus => {
                self.bump();
                Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()), loc)
            }
            TokenKind::Bang => {
                self.bump();
                Expr::Unary(UnaryOp::Not, Box::new(self.parse_unary()), loc)
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let loc = self.loc_here();
                    self.bump();
                    let name = self.expect_ident();
                    if self.at(&TokenKind::LParen) {
                        let args = self.parse_arg_list();
                        expr = Expr::Call(Box::new(Expr::Member(Box::new(expr), name, loc.clone())), args, loc);
                    } else {
                        expr = Expr::Member(Box::new(expr), name, loc);
                    }
                }
                TokenKind::SafeDot => {
                    let loc = self.loc_here();
                    self.bump();
                    let name = self.expect_ident();
                    let member = Expr::Member(Box::new(Expr::Placeholder(loc.clone())), name, loc.clone());
                    expr = Expr::SafeCall(Box::new(expr), Box::new(member), loc);
                }
                TokenKind::LParen => {
                    let loc = self.loc_here();
                    let args = self.parse_arg_list();
                    expr = Expr::Call(Box::new(expr), args, loc);
                }
                TokenKind::LBracket => {
                    let loc = self.loc_here();
                    self.bump();
                    let index = self.parse_expr();
                    self.expect(&TokenKind::RBracket);
                    expr = Expr::Index(Box::new(expr), Box::new(index), loc);
                }
                TokenKind::BangBang => {
                    let loc = self.loc_here();
                    self.bump();
                    expr = Expr::NotNull(Box::new(expr), loc);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let loc = self.loc_here();
        match self.peek_kind().clone() {
            TokenKind::IntLit(v) => {
                self.bump();
                Expr::Literal(Literal::Int(v), loc)
            }
            TokenKind::FloatLit(v) => {
                self.bump();
                Expr::Literal(Literal::Double(v), loc)
            }
            TokenKind::StringLit(id) => {
                self.bump();
                Expr::Literal(Literal::String(id), loc)
            }
            TokenKind::CharLit(c) => {
                self.bump();
                Expr::Literal(Literal::Char(c), loc)
            }
            TokenKind::True => {
                self.bump();
                Expr::Literal(Literal::Bool(true), loc)
            }
            TokenKind::False => {
                self.bump();
                Expr::Literal(Literal::Bool(false), loc)
            }
            TokenKind::Null => {
                self.bump();
                Expr::Literal(Literal::Null, loc)
            }
            TokenKind::This => {
                self.bump();
                Expr::This(loc)
            }
            TokenKind::Super => {
                self.bump();
                Expr::Super(loc)
            }
            TokenKind::New => {
                self.bump();
                let ty = self.parse_type();
                let args = self.parse_arg_list();
                Expr::New(ty, args, loc)
            }
            TokenKind::Ident(id) => {
                self.bump();
                Expr::Identifier(id, loc)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(&TokenKind::RParen);
                inner
            }
            _ => {
                self.error("expected an expression", loc.clone());
                self.bump();
                Expr::Literal(Literal::Null, loc)
            }
        }
    }

    // ---------------------------------------------------------- utilities

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn is_ident(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Ident(_))
    }

    fn bump(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind) {
        if self.at(kind) {
            self.bump();
        } else {
            let loc = self.loc_here();
            self.error(&format!("expected {kind:?}"), loc);
        }
    }

    fn expect_ident(&mut self) -> crate::string_interning::StringId {
        if let TokenKind::Ident(id) = self.peek_kind().clone() {
            self.bump();
            id
        } else {
            let loc = self.loc_here();
            self.error("expected an identifier", loc);
            self.table.intern("<error>")
        }
    }

    fn eat_semi(&mut self) {
        if self.at(&TokenKind::Semicolon) {
            self.bump();
        }
    }

    fn resync_to_next_decl(&mut self) {
        while !self.at_eof() {
            match self.peek_kind() {
                TokenKind::Class | TokenKind::Interface | TokenKind::Enum | TokenKind::Object | TokenKind::Fun => break,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn loc_here(&self) -> ErrorLocation {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        let start = self.source_map.position_at(self.source, tok.byte_offset);
        let end = self
            .source_map
            .position_at(self.source, tok.byte_offset + tok.byte_length);
        ErrorLocation::new(self.file.clone(), start, end).with_byte_range(tok.byte_offset, tok.byte_length)
    }

    fn error(&mut self, msg: &str, loc: ErrorLocation) {
        self.diagnostics.push(Diagnostic::parse(msg.to_string(), loc));
    }
}

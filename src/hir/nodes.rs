//! HIR node definitions.
//!
//! Unlike the AST, which reuses AST node types loosely through lowering, this
//! HIR uses dedicated `HExpr`/`HStmt` enums with the thirteen sugar forms
//! from §4.1 removed entirely from the type — so "no sugar node kind
//! survives lowering" (§8 invariant 1) is a property the type checker proves
//! for us, not just a convention the lowerer has to uphold by discipline.

use crate::ast::{Annotation, BinaryOp, ClassKind, Literal, Modifier, TypeRef, UnaryOp};
use crate::compiler_messages::ErrorLocation;
use crate::string_interning::StringId;

pub type Loc = ErrorLocation;

#[derive(Debug, Clone)]
pub struct HirModule {
    pub package: Option<StringId>,
    pub imports: Vec<HirImport>,
    pub classes: Vec<HirClass>,
    /// Top-level functions, including the synthesized/augmented `main` for
    /// script mode (see the program-level rule in §4.1).
    pub functions: Vec<HirFunction>,
}

#[derive(Debug, Clone)]
pub struct HirImport {
    pub qualified_name: StringId,
    pub alias: Option<StringId>,
    pub wildcard: bool,
    pub is_java: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct HirClass {
    pub kind: ClassKind,
    pub name: StringId,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<StringId>,
    pub fields: Vec<HirField>,
    pub methods: Vec<HirFunction>,
    /// Zero or one primary constructor, named `<init>`, plus any secondary
    /// constructors declared in source.
    pub constructors: Vec<HirFunction>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub super_ctor_args: Vec<HExpr>,
    pub enum_entries: Vec<HirEnumEntry>,
    /// Fields-with-initializer and init-blocks, in source declaration order,
    /// to be threaded into the primary constructor body by the MIR lowerer
    /// (contract item (e) of §4.2).
    pub instance_initializers: Vec<HirInitItem>,
}

#[derive(Debug, Clone)]
pub enum HirInitItem {
    FieldInit { field_index: usize, value: HExpr },
    InitBlock(Vec<HStmt>),
}

#[derive(Debug, Clone)]
pub struct HirEnumEntry {
    pub name: StringId,
    pub ctor_args: Vec<HExpr>,
}

#[derive(Debug, Clone)]
pub struct HirField {
    pub name: StringId,
    pub mutable: bool,
    pub ty: Option<TypeRef>,
    pub initializer: Option<HExpr>,
    pub getter: Option<Vec<HStmt>>,
    pub setter: Option<(StringId, Vec<HStmt>)>,
    pub extension_receiver: Option<TypeRef>,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone)]
pub struct HirParam {
    pub name: StringId,
    pub ty: Option<TypeRef>,
    pub default: Option<HExpr>,
    pub vararg: bool,
}

#[derive(Debug, Clone)]
pub struct HirFunction {
    pub name: StringId,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<StringId>,
    pub receiver_type: Option<TypeRef>,
    pub params: Vec<HirParam>,
    pub return_type: Option<TypeRef>,
    pub body: Vec<HStmt>,
    pub is_constructor: bool,
    pub delegation_args: Option<Vec<HExpr>>,
    pub reified_type_params: Vec<StringId>,
}

#[derive(Debug, Clone)]
pub struct HirTypeAlias {
    pub name: StringId,
    pub target: TypeRef,
}

// -------------------------------------------------------------------- HStmt

#[derive(Debug, Clone)]
pub enum HStmt {
    Block(Vec<HStmt>),
    Expr(HExpr),
    Decl(HirDeclStmt),
    If(HExpr, Box<HStmt>, Option<Box<HStmt>>),
    Loop(HirLoop),
    For(StringId, HExpr, Box<HStmt>),
    Try(HirTry),
    Return(Option<HExpr>),
    Break(Option<StringId>),
    Continue(Option<StringId>),
    Throw(HExpr),
}

#[derive(Debug, Clone)]
pub struct HirDeclStmt {
    pub name: StringId,
    pub mutable: bool,
    pub ty: Option<TypeRef>,
    pub initializer: HExpr,
}

/// Unified while/do-while with a `post_test` flag: `post_test = true` means
/// the condition is checked after the body (do-while).
#[derive(Debug, Clone)]
pub struct HirLoop {
    pub condition: Box<HExpr>,
    pub body: Box<HStmt>,
    pub post_test: bool,
}

#[derive(Debug, Clone)]
pub struct HirTry {
    pub body: Vec<HStmt>,
    pub catches: Vec<HirCatch>,
    pub finally: Option<Vec<HStmt>>,
}

#[derive(Debug, Clone)]
pub struct HirCatch {
    pub param_name: StringId,
    pub param_type: TypeRef,
    pub body: Vec<HStmt>,
}

// -------------------------------------------------------------------- HExpr

#[derive(Debug, Clone)]
pub enum HExpr {
    Literal(Literal, Loc),
    Identifier(StringId, Loc),
    This(Loc),
    Super(Loc),
    Binary(BinaryOp, Box<HExpr>, Box<HExpr>, Loc),
    Unary(UnaryOp, Box<HExpr>, Loc),
    Call(HirCall),
    Index(Box<HExpr>, Box<HExpr>, Loc),
    Member(Box<HExpr>, StringId, Loc),
    /// Plain (non-compound) assignment; `x op= e` was desugared to
    /// `x = x op e` by the lowerer before reaching this node.
    Assign(Box<HExpr>, Box<HExpr>, Loc),
    Lambda(HirLambda),
    /// The ternary-like if-expression that `val x = e; if (t != null) …`
    /// desugarings, and surface `if`-expressions, lower into.
    If(Box<HExpr>, Box<HExpr>, Box<HExpr>, Loc),
    Try(HirTry, Loc),
    TypeCheck(Box<HExpr>, TypeRef, bool, Loc),
    TypeCast(Box<HExpr>, TypeRef, Loc),
    Range(Box<HExpr>, Box<HExpr>, bool, Loc),
    New(HirNew),
    ObjectLiteral(HirObjectLiteral),
    CollectionLiteral(HirCollectionLiteral),
    /// A left-folded `+` chain; string interpolation's desugared form.
    StringConcat(Vec<HExpr>, Loc),
    MethodRef(Box<HExpr>, StringId, Loc),
    Spread(Box<HExpr>, Loc),
    Await(Box<HExpr>, Loc),
    /// A block-as-expression, used for the desugared forms of elvis,
    /// safe-call, safe-index, guard, and try-as-expression: `{ stmts...;
    /// tail }`.
    Block(Vec<HStmt>, Box<HExpr>, Loc),
}

impl HExpr {
    pub fn loc(&self) -> &Loc {
        match self {
            HExpr::Literal(_, loc)
            | HExpr::Identifier(_, loc)
            | HExpr::This(loc)
            | HExpr::Super(loc)
            | HExpr::Binary(_, _, _, loc)
            | HExpr::Unary(_, _, loc)
            | HExpr::Index(_, _, loc)
            | HExpr::Member(_, _, loc)
            | HExpr::Assign(_, _, loc)
            | HExpr::If(_, _, _, loc)
            | HExpr::Try(_, loc)
            | HExpr::TypeCheck(_, _, _, loc)
            | HExpr::TypeCast(_, _, loc)
            | HExpr::Range(_, _, _, loc)
            | HExpr::StringConcat(_, loc)
            | HExpr::MethodRef(_, _, loc)
            | HExpr::Spread(_, loc)
            | HExpr::Await(_, loc)
            | HExpr::Block(_, _, loc) => loc,
            HExpr::Call(c) => &c.loc,
            HExpr::Lambda(l) => &l.loc,
            HExpr::New(n) => &n.loc,
            HExpr::ObjectLiteral(o) => &o.loc,
            HExpr::CollectionLiteral(c) => &c.loc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HirCall {
    pub callee: Box<HExpr>,
    pub args: Vec<HExpr>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct HirLambda {
    pub params: Vec<HirParam>,
    pub body: Vec<HStmt>,
    pub loc: Loc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Map,
}

#[derive(Debug, Clone)]
pub struct HirCollectionLiteral {
    pub kind: CollectionKind,
    pub elements: Vec<HExpr>,
    /// True when this is a `Map` literal whose elements alternate key/value
    /// via a spread-index form rather than `k to v` pairs.
    pub spread_index: bool,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct HirObjectLiteral {
    pub fields: Vec<(StringId, HExpr)>,
    pub supertype: Option<TypeRef>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct HirNew {
    pub ty: TypeRef,
    pub args: Vec<HExpr>,
    pub loc: Loc,
}

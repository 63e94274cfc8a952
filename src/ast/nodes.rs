//! Abstract Syntax Tree node definitions.
//!
//! The AST is a polymorphic tree, one-to-one with source constructs, over
//! four node families: declarations, statements, expressions, and type
//! references. Nodes are immutable after construction; every stage after
//! parsing consumes them by reference or moves them into a new IR without
//! mutating them in place.

use crate::compiler_messages::ErrorLocation;
use crate::string_interning::StringId;
use std::collections::HashMap;

pub type Loc = ErrorLocation;

#[derive(Debug, Clone)]
pub struct Program {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub declarations: Vec<Decl>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub qualified_name: StringId,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub qualified_name: StringId,
    pub alias: Option<StringId>,
    pub wildcard: bool,
    pub is_java: bool,
    pub is_static: bool,
    pub loc: Loc,
}

// ---------------------------------------------------------------- Declarations

#[derive(Debug, Clone)]
pub enum Decl {
    Class(ClassDecl),
    Interface(ClassDecl),
    Enum(ClassDecl),
    Object(ClassDecl),
    Annotation(ClassDecl),
    Function(FunctionDecl),
    Constructor(FunctionDecl),
    InitBlock(Block),
    Property(PropertyDecl),
    Parameter(ParamDecl),
    TypeAlias(TypeAliasDecl),
    Destructuring(DestructuringDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Object,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Private,
    Protected,
    Final,
    Abstract,
    Static,
    Open,
    Override,
    Companion,
    Val,
    Var,
    Vararg,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: StringId,
    pub args: Vec<(StringId, Expr)>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: StringId,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<StringId>,
    pub primary_ctor_params: Vec<ParamDecl>,
    pub superclass: Option<TypeRef>,
    pub super_ctor_args: Vec<Expr>,
    pub interfaces: Vec<TypeRef>,
    pub members: Vec<Decl>,
    pub enum_entries: Vec<EnumEntry>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub name: StringId,
    pub ctor_args: Vec<Expr>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: StringId,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<StringId>,
    pub receiver_type: Option<TypeRef>,
    pub params: Vec<ParamDecl>,
    pub return_type: Option<TypeRef>,
    pub body: Option<FunctionBody>,
    pub is_constructor: bool,
    /// `this(...)` delegation arguments, for secondary constructors.
    pub delegation_args: Option<Vec<Expr>>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Block),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: StringId,
    pub ty: Option<TypeRef>,
    pub default: Option<Box<Expr>>,
    pub vararg: bool,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: StringId,
    pub mutable: bool,
    pub ty: Option<TypeRef>,
    pub initializer: Option<Box<Expr>>,
    pub getter: Option<FunctionBody>,
    pub setter: Option<(StringId, FunctionBody)>,
    pub extension_receiver: Option<TypeRef>,
    pub modifiers: Vec<Modifier>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: StringId,
    pub target: TypeRef,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct DestructuringDecl {
    pub names: Vec<Option<StringId>>,
    pub initializer: Box<Expr>,
    pub loc: Loc,
}

// ---------------------------------------------------------------- Statements

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    Expr(Box<Expr>),
    Decl(Box<Decl>),
    If(IfStmt),
    When(WhenStmt),
    For(ForStmt),
    While(WhileStmt),
    DoWhile(WhileStmt),
    Try(TryStmt),
    Return(Option<Box<Expr>>),
    Break(Option<StringId>),
    Continue(Option<StringId>),
    Throw(Box<Expr>),
    Guard(GuardStmt),
    Use(UseStmt),
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition_binding: Option<DestructuringDecl>,
    pub condition: Box<Expr>,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct WhenStmt {
    pub subject: Option<Box<Expr>>,
    pub arms: Vec<WhenArm>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct WhenArm {
    pub pattern: WhenPattern,
    pub body: Stmt,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub enum WhenPattern {
    Value(Expr),
    Type(TypeRef),
    InRange(Box<Expr>),
    Else,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub binding: StringId,
    pub iterable: Box<Expr>,
    pub body: Box<Stmt>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Box<Expr>,
    pub body: Box<Stmt>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: Block,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Block>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param_name: StringId,
    pub param_type: TypeRef,
    pub body: Block,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct GuardStmt {
    pub binding: DestructuringDecl,
    pub else_branch: Box<Stmt>,
    pub loc: Loc,
}

#[derive(Debug, Clone)]
pub struct UseStmt {
    pub bindings: Vec<(StringId, Expr)>,
    pub body: Block,
    pub loc: Loc,
}

// ---------------------------------------------------------------- Expressions

#[derive(Debug, Clone)]
pub enum Literal {
    Int(i64),
    Long(i64),
    Float(f32),
    Double(f64),
    String(StringId),
    Bool(bool),
    Char(char),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BNot,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal, Loc),
    Identifier(StringId, Loc),
    This(Loc),
    Super(Loc),
    Binary(BinaryOp, Box<Expr>, Box<Expr>, Loc),
    Unary(UnaryOp, Box<Expr>, Loc),
    Call(Box<Expr>, Vec<Expr>, Loc),
    Index(Box<Expr>, Box<Expr>, Loc),
    Member(Box<Expr>, StringId, Loc),
    Assign(Box<Expr>, Option<BinaryOp>, Box<Expr>, Loc),
    Lambda(LambdaExpr),
    IfExpr(Box<Expr>, Box<Expr>, Box<Expr>, Loc),
    WhenExpr(WhenStmt),
    TryExpr(TryStmt),
    Await(Box<Expr>, Loc),
    TypeCheck(Box<Expr>, TypeRef, bool, Loc),
    TypeCast(Box<Expr>, TypeRef, Loc),
    Range(Box<Expr>, Box<Expr>, bool, Loc),
    Slice(Box<Expr>, Box<Expr>, Box<Expr>, Loc),
    Spread(Box<Expr>, Loc),
    Pipeline(Box<Expr>, Box<Expr>, Loc),
    MethodRef(Box<Expr>, StringId, Loc),
    ObjectLiteral(Vec<(StringId, Expr)>, Option<TypeRef>, Loc),
    CollectionLiteral(CollectionKind, Vec<Expr>, Loc),
    StringInterpolation(Vec<InterpolationPart>, Loc),
    New(TypeRef, Vec<Expr>, Loc),
    Placeholder(Loc),
    Elvis(Box<Expr>, Box<Expr>, Loc),
    SafeCall(Box<Expr>, Box<Expr>, Loc),
    SafeIndex(Box<Expr>, Box<Expr>, Loc),
    NotNull(Box<Expr>, Loc),
    ErrorPropagation(Box<Expr>, Loc),
    ScopeShorthand(Box<Expr>, Block, Loc),
    JumpAsExpr(Box<Stmt>, Loc),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Map,
}

#[derive(Debug, Clone)]
pub enum InterpolationPart {
    Literal(StringId),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub params: Vec<ParamDecl>,
    pub body: FunctionBody,
    pub loc: Loc,
}

impl Expr {
    pub fn loc(&self) -> &Loc {
        match self {
            Expr::Literal(_, loc)
            | Expr::Identifier(_, loc)
            | Expr::This(loc)
            | Expr::Super(loc)
            | Expr::Binary(_, _, _, loc)
            | Expr::Unary(_, _, loc)
            | Expr::Call(_, _, loc)
            | Expr::Index(_, _, loc)
            | Expr::Member(_, _, loc)
            | Expr::Assign(_, _, _, loc)
            | Expr::IfExpr(_, _, _, loc)
            | Expr::Await(_, loc)
            | Expr::TypeCheck(_, _, _, loc)
            | Expr::TypeCast(_, _, loc)
            | Expr::Range(_, _, _, loc)
            | Expr::Slice(_, _, _, loc)
            | Expr::Spread(_, loc)
            | Expr::Pipeline(_, _, loc)
            | Expr::MethodRef(_, _, loc)
            | Expr::ObjectLiteral(_, _, loc)
            | Expr::CollectionLiteral(_, _, loc)
            | Expr::StringInterpolation(_, loc)
            | Expr::New(_, _, loc)
            | Expr::Placeholder(loc)
            | Expr::Elvis(_, _, loc)
            | Expr::SafeCall(_, _, loc)
            | Expr::SafeIndex(_, _, loc)
            | Expr::NotNull(_, loc)
            | Expr::ErrorPropagation(_, loc)
            | Expr::ScopeShorthand(_, _, loc)
            | Expr::JumpAsExpr(_, loc) => loc,
            Expr::Lambda(l) => &l.loc,
            Expr::WhenExpr(w) => &w.loc,
            Expr::TryExpr(t) => &t.loc,
        }
    }
}

// ---------------------------------------------------------------- Type references

#[derive(Debug, Clone)]
pub enum TypeRef {
    Simple(StringId, Loc),
    Nullable(Box<TypeRef>, Loc),
    Generic(StringId, Vec<TypeRef>, Loc),
    Function(Vec<TypeRef>, Box<TypeRef>, Loc),
}

impl TypeRef {
    pub fn loc(&self) -> &Loc {
        match self {
            TypeRef::Simple(_, loc)
            | TypeRef::Nullable(_, loc)
            | TypeRef::Generic(_, _, loc)
            | TypeRef::Function(_, _, loc) => loc,
        }
    }
}

/// A map from interned annotation name to its argument expressions, used by
/// the HIR lowerer to pick out `@data`/`@builder` and other runtime-triggered
/// annotations without re-scanning the raw `Vec<Annotation>` each time.
pub type AnnotationIndex = HashMap<StringId, Vec<(StringId, Expr)>>;

pub fn index_annotations(annotations: &[Annotation]) -> AnnotationIndex {
    annotations
        .iter()
        .map(|a| (a.name, a.args.clone()))
        .collect()
}

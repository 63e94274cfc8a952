//! MIR node definitions: a register/basic-block control-flow graph, one step
//! closer to bytecode than the HIR's structured statements.
//!
//! Every local (parameter, declared variable, or compiler temporary) is a
//! `Local` keyed by index, holding a `MirType` — the representation class
//! the int-local-promotion pass in codegen is allowed to narrow away from
//! `Object` when it can prove a local never escapes as boxed. Control flow is
//! flattened into blocks ending in exactly one terminator; there is no
//! nested-statement shape left for the emitter to walk.

use crate::ast::{BinaryOp, ClassKind, Literal, Modifier, TypeRef, UnaryOp};
use crate::string_interning::StringId;

/// The representation class of a local or temporary. `Object` is the default
/// every local starts in under uniform boxing; codegen's promotion pass may
/// rewrite a local to a narrower primitive class when it can prove doing so
/// is safe end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirType {
    Object,
    Int,
    Long,
    Float,
    Double,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone)]
pub struct MirLocal {
    pub name: Option<StringId>,
    pub ty: MirType,
    pub declared_type: Option<TypeRef>,
}

#[derive(Debug, Clone)]
pub enum Operand {
    Local(LocalId),
    Const(Literal),
    This,
}

#[derive(Debug, Clone)]
pub enum MirInst {
    /// `dst = src`
    Assign { dst: LocalId, src: Operand },
    BinOp { dst: LocalId, op: BinaryOp, lhs: Operand, rhs: Operand },
    UnOp { dst: LocalId, op: UnaryOp, operand: Operand },
    /// A dynamically-dispatched or statically-resolved method call.
    /// `receiver == None` means a static call.
    Call {
        dst: Option<LocalId>,
        receiver: Option<Operand>,
        owner: StringId,
        method: StringId,
        args: Vec<Operand>,
        is_static: bool,
    },
    New { dst: LocalId, ty: TypeRef, args: Vec<Operand> },
    GetField { dst: LocalId, receiver: Operand, owner: StringId, field: StringId },
    SetField { receiver: Operand, owner: StringId, field: StringId, value: Operand },
    GetStatic { dst: LocalId, owner: StringId, field: StringId },
    SetStatic { owner: StringId, field: StringId, value: Operand },
    ArrayGet { dst: LocalId, array: Operand, index: Operand },
    ArraySet { array: Operand, index: Operand, value: Operand },
    /// `NovaOps`/`NovaCollections` runtime-library dispatch (indexing,
    /// operator overloading) per the runtime contract, rather than a direct
    /// JVM instruction.
    RuntimeCall { dst: Option<LocalId>, helper: StringId, args: Vec<Operand> },
    InstanceOf { dst: LocalId, value: Operand, ty: TypeRef, negated: bool },
    Cast { dst: LocalId, value: Operand, ty: TypeRef },
    /// Forces boxing of a primitive-typed operand into its wrapper type; a
    /// no-op once int-local-promotion proves the destination never needs it.
    Box { dst: LocalId, value: Operand },
    Unbox { dst: LocalId, value: Operand },
    StringConcat { dst: LocalId, parts: Vec<Operand> },
    /// `{ receiver[0]=k0, receiver[1]=v0, ... }` / list / set literal build,
    /// left generic over `kind` so the emitter picks the right collection
    /// factory.
    BuildCollection { dst: LocalId, kind: CollectionKind, elements: Vec<Operand> },
    MethodHandle { dst: LocalId, owner: StringId, method: StringId },
    AnnotationTrigger { annotation: StringId, target: StringId },
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Map,
}

#[derive(Debug, Clone)]
pub enum Terminator {
    Return(Option<Operand>),
    Jump(BlockId),
    /// Self-tail-recursion rewritten to a jump back to the function's entry
    /// block instead of a real JVM call — no lowering pass constructs this
    /// yet, but it's part of the closed terminator set codegen must handle.
    TailCall(BlockId),
    Branch { cond: Operand, then_block: BlockId, else_block: BlockId },
    /// The lowered form of `when`'s equals-chain: a linear sequence of
    /// string/value comparisons against `subject`, falling through to
    /// `default` — deliberately not a JVM `tableswitch`/`lookupswitch` even
    /// for numeric subjects, matching the "implemented as specified" open
    /// question decision.
    EqualsChain { subject: Operand, cases: Vec<(Operand, BlockId)>, default: BlockId },
    Throw(Operand),
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct MirBlock {
    pub id: BlockId,
    pub instructions: Vec<MirInst>,
    pub terminator: Terminator,
}

/// One entry of the method's exception table: `[start, end)` block range
/// covered by `handler`, with `exception_type = None` meaning a `finally`
/// catch-all. `exception_local` is where the handler block stores the caught
/// throwable before its own instructions run (§4.3 method emission step 8).
#[derive(Debug, Clone)]
pub struct TryTableEntry {
    pub start: BlockId,
    pub end: BlockId,
    pub handler: BlockId,
    pub exception_type: Option<TypeRef>,
    pub exception_local: LocalId,
}

#[derive(Debug, Clone)]
pub struct MirParam {
    pub name: StringId,
    pub ty: Option<TypeRef>,
}

#[derive(Debug, Clone)]
pub struct MirFunction {
    pub name: StringId,
    pub modifiers: Vec<Modifier>,
    pub params: Vec<MirParam>,
    pub return_type: Option<TypeRef>,
    pub locals: Vec<MirLocal>,
    pub blocks: Vec<MirBlock>,
    pub entry: BlockId,
    pub try_table: Vec<TryTableEntry>,
    pub is_constructor: bool,
    /// An explicit JVM method descriptor this function must be emitted with
    /// instead of the uniform-boxing default (constructors chaining to a
    /// specific super signature, methods overriding a native Java method).
    pub descriptor_override: Option<String>,
    /// `this(...)` delegation argument operands, when this constructor
    /// delegates to another constructor of the same class rather than
    /// chaining to its superclass.
    pub delegate_args: Option<Vec<Operand>>,
    /// Super-constructor argument operands, when this constructor chains to
    /// its superclass rather than delegating (`delegate_args.is_none()`).
    pub super_args: Option<Vec<Operand>>,
}

#[derive(Debug, Clone)]
pub struct MirField {
    pub name: StringId,
    pub ty: Option<TypeRef>,
    pub modifiers: Vec<Modifier>,
    /// Constant-folded static initializer value, when one could be proven at
    /// lowering time (used for `<clinit>` elision).
    pub constant_value: Option<Literal>,
}

#[derive(Debug, Clone)]
pub struct MirClass {
    pub name: StringId,
    pub kind: ClassKind,
    pub modifiers: Vec<Modifier>,
    /// Annotation names present on the class (argument values are not
    /// carried into MIR: the runtime trigger contract always passes an empty
    /// map, per §4.3's class-emission rule for non-`data`/`builder`
    /// annotations).
    pub annotations: Vec<StringId>,
    pub fields: Vec<MirField>,
    pub methods: Vec<MirFunction>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    /// Names of the static-final fields holding this enum's entries, in
    /// declaration order, for the synthetic `values()`/`toString()` codegen
    /// dispatches. Empty for non-enum classes.
    pub enum_entry_names: Vec<StringId>,
    /// Statements that must run in `<clinit>`, in source order: companion
    /// field initializers and enum-entry instantiation land here.
    pub static_initializer: Option<MirFunction>,
}

#[derive(Debug, Clone)]
pub struct MirModule {
    pub package: Option<StringId>,
    pub classes: Vec<MirClass>,
    /// Top-level functions and script `main`, emitted into a synthesized
    /// `$Module` (or package-named) class per the codegen contract.
    pub functions: Vec<MirFunction>,
}

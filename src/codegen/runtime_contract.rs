//! Names of the Nova runtime library the emitter calls into. Kept as one
//! table so the runtime jar and the emitter can never silently drift apart;
//! `xtask check-runtime-contract` greps this module and `src/codegen` for
//! every `NovaXxx.method` call site.
//!
//! Runtime call sites referenced from the rest of `codegen`:
//! `NovaOps.add`, `NovaValue.truthyCheck`, `NovaCollections.getIndex`,
//! `NovaCollections.setIndex`, `NovaCollections.iterator`,
//! `NovaCollections.hasNext`, `NovaCollections.next`,
//! `NovaCollections.rangeInclusive`, `NovaCollections.rangeExclusive`,
//! `NovaResult.checkIsOk`, `NovaResult.checkIsErr`, `NovaResult.checkIsResult`,
//! `NovaAnnotations.trigger`, `NovaCallable.invoke`.

/// Dynamic-dispatch `+` when neither operand's runtime kind is known statically.
pub const NOVA_OPS: &str = "nova/runtime/NovaOps";
pub const NOVA_OPS_ADD: &str = "add";
pub const NOVA_OPS_ADD_DESC: &str = "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;";

/// Backs the unfused `Branch` terminator's `Object → boolean` coercion.
pub const NOVA_VALUE: &str = "nova/runtime/NovaValue";
pub const NOVA_VALUE_TRUTHY_CHECK: &str = "truthyCheck";
pub const NOVA_VALUE_TRUTHY_CHECK_DESC: &str = "(Ljava/lang/Object;)Z";

/// Fallback `INDEX_GET`/`INDEX_SET` dispatch for receivers that are neither
/// a `Map`/`List` family type nor a primitive array.
pub const NOVA_COLLECTIONS: &str = "nova/runtime/NovaCollections";
pub const NOVA_COLLECTIONS_GET_INDEX: &str = "getIndex";
pub const NOVA_COLLECTIONS_GET_INDEX_DESC: &str = "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;";
pub const NOVA_COLLECTIONS_SET_INDEX: &str = "setIndex";
pub const NOVA_COLLECTIONS_SET_INDEX_DESC: &str =
    "(Ljava/lang/Object;Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;";

/// `for (x in iterable)`'s iterator protocol, mirroring `java.util.Iterator`
/// over whatever iterable kind `iterable` turns out to be at runtime.
pub const NOVA_COLLECTIONS_ITERATOR: &str = "iterator";
pub const NOVA_COLLECTIONS_ITERATOR_DESC: &str = "(Ljava/lang/Object;)Ljava/lang/Object;";
pub const NOVA_COLLECTIONS_HAS_NEXT: &str = "hasNext";
pub const NOVA_COLLECTIONS_HAS_NEXT_DESC: &str = "(Ljava/lang/Object;)Z";
pub const NOVA_COLLECTIONS_NEXT: &str = "next";
pub const NOVA_COLLECTIONS_NEXT_DESC: &str = "(Ljava/lang/Object;)Ljava/lang/Object;";

/// `start..end` / `start..<end` range-literal construction.
pub const NOVA_COLLECTIONS_RANGE_INCLUSIVE: &str = "rangeInclusive";
pub const NOVA_COLLECTIONS_RANGE_EXCLUSIVE: &str = "rangeExclusive";
pub const NOVA_COLLECTIONS_RANGE_DESC: &str = "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;";

/// Backs `Result`/`Ok`/`Err` type-check/cast lowering.
pub const NOVA_RESULT: &str = "nova/runtime/NovaResult";
pub const NOVA_RESULT_CHECK_IS_OK: &str = "checkIsOk";
pub const NOVA_RESULT_CHECK_IS_ERR: &str = "checkIsErr";
pub const NOVA_RESULT_CHECK_IS_RESULT: &str = "checkIsResult";
pub const NOVA_RESULT_CHECK_DESC: &str = "(Ljava/lang/Object;)Z";

/// Class-level `<clinit>` hook for any runtime annotation other than
/// `data`/`builder`.
pub const NOVA_ANNOTATIONS: &str = "nova/runtime/NovaAnnotations";
pub const NOVA_ANNOTATIONS_TRIGGER: &str = "trigger";
pub const NOVA_ANNOTATIONS_TRIGGER_DESC: &str =
    "(Ljava/lang/String;Ljava/lang/Class;Ljava/util/Map;)V";

/// Boxes varargs into `Object[]` and dispatches a non-zero-arity external
/// Java constructor whose overload set can't be pre-scanned.
pub const METHOD_HANDLE_CACHE: &str = "nova/runtime/MethodHandleCache";
pub const METHOD_HANDLE_CACHE_NEW_INSTANCE: &str = "newInstance";
pub const METHOD_HANDLE_CACHE_NEW_INSTANCE_DESC: &str =
    "(Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/Object;";

/// Backs calling a value of function type that isn't a direct `this.method()`
/// or bare-name dispatch (a lambda held in a variable, a method reference
/// passed around and invoked later) — same varargs-boxing shape as
/// `MethodHandleCache.newInstance`, keyed by callee rather than class name.
pub const NOVA_CALLABLE: &str = "nova/runtime/NovaCallable";
pub const NOVA_CALLABLE_INVOKE: &str = "invoke";
pub const NOVA_CALLABLE_INVOKE_DESC: &str = "(Ljava/lang/Object;[Ljava/lang/Object;)Ljava/lang/Object;";

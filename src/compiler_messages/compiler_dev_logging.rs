//! Feature-gated developer tracing macros. Each wraps `saying::say!` when its
//! matching Cargo feature is enabled and compiles to nothing otherwise, so a
//! release build of `novac` pays zero cost for the instrumentation.

#[macro_export]
#[cfg(feature = "show_tokens")]
macro_rules! token_log {
    ($($arg:tt)*) => { saying::say!($($arg)*); };
}
#[macro_export]
#[cfg(not(feature = "show_tokens"))]
macro_rules! token_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_ast")]
macro_rules! ast_log {
    ($($arg:tt)*) => { saying::say!($($arg)*); };
}
#[macro_export]
#[cfg(not(feature = "show_ast"))]
macro_rules! ast_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_hir")]
macro_rules! hir_log {
    ($($arg:tt)*) => { saying::say!($($arg)*); };
}
#[macro_export]
#[cfg(not(feature = "show_hir"))]
macro_rules! hir_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_mir")]
macro_rules! mir_log {
    ($($arg:tt)*) => { saying::say!($($arg)*); };
}
#[macro_export]
#[cfg(not(feature = "show_mir"))]
macro_rules! mir_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_codegen")]
macro_rules! codegen_log {
    ($($arg:tt)*) => { saying::say!($($arg)*); };
}
#[macro_export]
#[cfg(not(feature = "show_codegen"))]
macro_rules! codegen_log {
    ($($arg:tt)*) => {};
}

/// Traces the semantic-index / LSP path: document lifecycle events, debounce
/// scheduling, and query dispatch.
#[macro_export]
#[cfg(feature = "show_index")]
macro_rules! index_log {
    ($($arg:tt)*) => { saying::say!($($arg)*); };
}
#[macro_export]
#[cfg(not(feature = "show_index"))]
macro_rules! index_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => { saying::say!($msg, Green #$time.elapsed()); };
}
#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {};
}

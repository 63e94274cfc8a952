pub mod compiler_dev_logging;
pub mod compiler_errors;

pub use compiler_errors::{
    CharPosition, CompilerMessages, Diagnostic, DiagnosticKind, DiagnosticMetaKey, ErrorLocation,
    Severity,
};

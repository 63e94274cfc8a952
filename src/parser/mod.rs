//! Lexer and tolerant-mode parser. Out of the pipeline's hard-engineering
//! core (see spec §1's external collaborators), kept here as a concrete,
//! minimal implementation of that contract so the rest of the pipeline has
//! real `Program` trees to lower instead of hand-built fixtures everywhere.

pub mod lexer;
pub mod parser;
pub mod tokens;

use crate::ast::Program;
use crate::compiler_messages::Diagnostic;
use crate::string_interning::StringTable;
use std::path::Path;
use std::rc::Rc;

/// An immutable, shareable parse result. The editor path keeps the `Rc`
/// around across queries and only rebuilds it when content changes, so a
/// pointer-equality check (`Rc::ptr_eq`) is enough to detect "did the parse
/// result change" for the expression-offset index cache.
#[derive(Clone)]
pub struct ParseResult {
    pub program: Rc<Program>,
    pub diagnostics: Rc<Vec<Diagnostic>>,
}

pub fn parse(source: &str, file: &Path, table: &mut StringTable) -> ParseResult {
    let tokens = lexer::Lexer::new(source).tokenize(table);
    let result = parser::Parser::new(tokens, file.to_path_buf(), source, table).parse_program();
    ParseResult {
        program: Rc::new(result.program),
        diagnostics: Rc::new(result.diagnostics),
    }
}

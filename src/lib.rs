//! The Nova compiler: AST → HIR → MIR → JVM bytecode, plus the semantic-index
//! language server built on top of the same front end. `novac` (`src/main.rs`)
//! is a thin CLI wrapper around the `build_project`/`semantic_index::lsp::run`
//! entry points this crate exposes.

pub mod ast;
pub mod codegen;
pub mod compiler_messages;
pub mod hir;
pub mod interned_path;
pub mod mir;
pub mod parser;
pub mod semantic;
pub mod semantic_index;
pub mod settings;
pub mod source_map;
pub mod string_interning;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use compiler_messages::CompilerMessages;
use semantic::SemanticAnalyzer;
use settings::Config;
use string_interning::StringTable;

use crate::{ast_log, codegen_log, hir_log, mir_log, timer_log};

pub enum BuildError {
    /// A filesystem or project-file problem, outside the compiler's own
    /// closed diagnostic-kind set (§7) — reported directly, not as a
    /// `Diagnostic`.
    Io(String),
    Diagnostics(CompilerMessages),
}

impl From<CompilerMessages> for BuildError {
    fn from(messages: CompilerMessages) -> Self {
        BuildError::Diagnostics(messages)
    }
}

/// Loads `nova.toml` (if present) under `entry_dir`, runs every `.nv` file
/// under `Config::src` through parse → analyze → HIR → MIR → codegen, and
/// writes each resulting `.class` file under `Config::out_dir`. Returns the
/// number of class files written, or the diagnostics/IO failure that stopped
/// the build.
pub fn build_project(entry_dir: &Path) -> Result<usize, BuildError> {
    let mut messages = CompilerMessages::new();

    let config_path = entry_dir.join(settings::PROJECT_FILE_NAME);
    let config = if config_path.exists() {
        let contents = fs::read_to_string(&config_path)
            .map_err(|e| BuildError::Io(format!("{}: {e}", config_path.display())))?;
        Config::from_toml_str(entry_dir.to_path_buf(), &contents)
            .map_err(|e| BuildError::Io(format!("failed to parse {}: {e}", config_path.display())))?
    } else {
        Config::new(entry_dir.to_path_buf())
    };

    let src_dir = config.entry_dir.join(&config.src);
    let sources = collect_source_files(&src_dir)
        .map_err(|e| BuildError::Io(format!("{}: {e}", src_dir.display())))?;

    let out_dir = config.entry_dir.join(&config.out_dir);
    let mut written = 0usize;

    for file in &sources {
        let source = match fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {}: {e}", file.display());
                continue;
            }
        };

        let mut table = StringTable::new();
        let parsed = parser::parse(&source, file, &mut table);
        ast_log!("{:#?}", parsed.program);
        for diag in parsed.diagnostics.iter() {
            messages.push(diag.clone());
        }

        let mut analyzer = semantic::BasicAnalyzer::new();
        let analysis = analyzer.analyze(&parsed.program, &mut table);
        for diag in analysis.diagnostics.iter() {
            messages.push(diag.clone());
        }
        let file_has_errors = parsed
            .diagnostics
            .iter()
            .chain(analysis.diagnostics.iter())
            .any(|d| d.severity == compiler_messages::Severity::Error);
        if file_has_errors {
            continue;
        }

        let hir_start = Instant::now();
        let hir_module = hir::lower_program(&parsed.program, &mut table);
        hir_log!("{:#?}", hir_module);
        timer_log!(hir_start, "HIR lowering finished in");

        let mir_start = Instant::now();
        let mir_module = mir::lower_program(&hir_module, &mut table);
        mir_log!("{:#?}", mir_module);
        timer_log!(mir_start, "MIR lowering finished in");

        let codegen_start = Instant::now();
        match codegen::emit_module(&mir_module, &mut table) {
            Ok(classes) => {
                timer_log!(codegen_start, "Codegen finished in");
                fs::create_dir_all(&out_dir)
                    .map_err(|e| BuildError::Io(format!("{}: {e}", out_dir.display())))?;
                for (class_name, bytes) in classes {
                    codegen_log!("emitting {class_name}, {} bytes", bytes.len());
                    let class_path = out_dir.join(format!("{class_name}.class"));
                    if let Some(parent) = class_path.parent() {
                        fs::create_dir_all(parent)
                            .map_err(|e| BuildError::Io(format!("{}: {e}", parent.display())))?;
                    }
                    fs::write(&class_path, &bytes)
                        .map_err(|e| BuildError::Io(format!("{}: {e}", class_path.display())))?;
                    written += 1;
                }
            }
            Err(diag) => messages.push(diag),
        }
    }

    if messages.has_errors() {
        Err(messages.into())
    } else {
        Ok(written)
    }
}

fn collect_source_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.extend(collect_source_files(&path)?);
        } else if path.extension().and_then(|e| e.to_str()) == Some(settings::NOVA_FILE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(out)
}

/// Runs one source string through the whole pipeline and returns the
/// `.class` files it produces, without touching disk. Used by integration
/// tests and by anything embedding the compiler rather than shelling out to
/// `novac build`.
pub fn compile_source(source: &str, file: &Path) -> Result<Vec<(String, Vec<u8>)>, CompilerMessages> {
    let mut messages = CompilerMessages::new();
    let mut table = StringTable::new();

    let parsed = parser::parse(source, file, &mut table);
    for diag in parsed.diagnostics.iter() {
        messages.push(diag.clone());
    }

    let mut analyzer = semantic::BasicAnalyzer::new();
    let analysis = analyzer.analyze(&parsed.program, &mut table);
    for diag in analysis.diagnostics.iter() {
        messages.push(diag.clone());
    }
    if messages.has_errors() {
        return Err(messages);
    }

    let hir_module = hir::lower_program(&parsed.program, &mut table);
    let mir_module = mir::lower_program(&hir_module, &mut table);
    match codegen::emit_module(&mir_module, &mut table) {
        Ok(classes) => Ok(classes),
        Err(diag) => {
            messages.push(diag);
            Err(messages)
        }
    }
}

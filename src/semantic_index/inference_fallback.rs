//! Best-effort text-scanning type inference for the editor path (§9 open
//! question 3). Consulted only when the semantic analyzer's per-expression
//! type map has no entry for a given identifier — e.g. a declaration the
//! tolerant parser recovered around but the analyzer never visited. This is
//! deliberately separate from `semantic::BasicAnalyzer` and may disagree
//! with it on edge cases; it scans raw source text, not the AST.

/// Scans `source` line by line for a `val`/`var` declaration of `name` and
/// returns its annotated type, if any (`val x: Int = ...` → `"Int"`). Falls
/// back to inferring from a literal initializer when no annotation is
/// present. Returns `None` when nothing resembling a declaration is found.
pub fn infer_variable_type(source: &str, name: &str) -> Option<String> {
    for line in source.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = strip_decl_keyword(trimmed) else { continue };
        let rest = rest.trim_start();
        if !rest.starts_with(name) {
            continue;
        }
        let after_name = &rest[name.len()..];
        let after_name = after_name.trim_start();
        if !(after_name.starts_with(':') || after_name.starts_with('=') || after_name.is_empty()) {
            continue;
        }
        if let Some(ty) = parse_type_annotation(after_name) {
            return Some(ty);
        }
        if let Some(eq_pos) = after_name.find('=') {
            let value = after_name[eq_pos + 1..].trim();
            if let Some(ty) = infer_from_literal(value) {
                return Some(ty);
            }
        }
    }
    None
}

/// Returns the remainder of `line` after a leading `val`/`var` keyword, or
/// `None` if the line isn't a declaration at all. Kept line-local: no
/// attempt to track brace nesting or multi-line declarations.
fn strip_decl_keyword(line: &str) -> Option<&str> {
    for kw in ["val ", "var "] {
        if let Some(rest) = line.strip_prefix(kw) {
            return Some(rest);
        }
    }
    None
}

fn parse_type_annotation(after_name: &str) -> Option<String> {
    let rest = after_name.strip_prefix(':')?;
    let rest = rest.trim_start();
    let end = rest.find(['=', ' ', ',', ')']).unwrap_or(rest.len());
    let ty = rest[..end].trim_end_matches('?');
    if ty.is_empty() {
        None
    } else {
        Some(ty.to_string())
    }
}

fn infer_from_literal(value: &str) -> Option<String> {
    let value = value.trim_end_matches(';').trim();
    if value.is_empty() {
        return None;
    }
    if value == "true" || value == "false" {
        return Some("Boolean".to_string());
    }
    if value.starts_with('"') {
        return Some("String".to_string());
    }
    if value.parse::<i64>().is_ok() {
        return Some("Int".to_string());
    }
    if value.parse::<f64>().is_ok() {
        return Some("Double".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_from_explicit_annotation() {
        let src = "val count: Int = compute()";
        assert_eq!(infer_variable_type(src, "count"), Some("Int".to_string()));
    }

    #[test]
    fn infers_from_literal_when_unannotated() {
        let src = "var name = \"hi\"";
        assert_eq!(infer_variable_type(src, "name"), Some("String".to_string()));
    }

    #[test]
    fn returns_none_for_unknown_identifier() {
        let src = "val x = 1";
        assert_eq!(infer_variable_type(src, "y"), None);
    }
}

//! LSP method implementations. Notifications (`did_*`) mutate the document
//! index directly; requests go through `dispatch`, which returns either a
//! JSON result or a `(code, message)` JSON-RPC error.

use serde_json::{json, Value};

use crate::compiler_messages::Severity;
use crate::index_log;
use crate::semantic::SymbolKind;
use crate::semantic_index::lsp::position::{apply_range_edit, offset_to_position, position_to_offset};
use crate::semantic_index::lsp::server::LspServer;
use crate::semantic_index::DocumentIndex;

type HandlerResult = Result<Value, (i32, String)>;

pub fn did_open(server: &LspServer, params: Value) {
    let Some(doc) = params.get("textDocument") else { return };
    let (Some(uri), Some(text)) = (doc.get("uri").and_then(Value::as_str), doc.get("text").and_then(Value::as_str)) else { return };
    let version = doc.get("version").and_then(Value::as_u64).unwrap_or(0);
    index_log!("didOpen {uri} v{version}");
    server.index.open(uri.to_string(), text.to_string(), version);
}

pub fn did_change(server: &LspServer, params: Value) {
    let Some(doc) = params.get("textDocument") else { return };
    let Some(uri) = doc.get("uri").and_then(Value::as_str) else { return };
    let version = doc.get("version").and_then(Value::as_u64).unwrap_or(0);
    let Some(changes) = params.get("contentChanges").and_then(Value::as_array) else { return };
    let Some(mut content) = server.index.content(uri) else { return };

    for change in changes {
        let Some(text) = change.get("text").and_then(Value::as_str) else { continue };
        match change.get("range") {
            None => content = text.to_string(),
            Some(range) => {
                let (sl, sc) = line_char(&range["start"]);
                let (el, ec) = line_char(&range["end"]);
                content = apply_range_edit(&content, sl, sc, el, ec, text);
            }
        }
    }
    index_log!("didChange {uri} v{version}, scheduling debounced reanalysis");
    server.index.apply_change(uri, content, version);
}

pub fn did_close(server: &LspServer, params: Value) {
    let Some(uri) = params.get("textDocument").and_then(|d| d.get("uri")).and_then(Value::as_str) else { return };
    index_log!("didClose {uri}");
    server.index.close(uri);
}

fn line_char(pos: &Value) -> (u32, u32) {
    (pos.get("line").and_then(Value::as_u64).unwrap_or(0) as u32, pos.get("character").and_then(Value::as_u64).unwrap_or(0) as u32)
}

pub fn dispatch(server: &LspServer, method: &str, params: Value) -> HandlerResult {
    index_log!("dispatch {method}");
    match method {
        "initialize" => Ok(initialize(server, params)),
        "textDocument/hover" => hover(server, params),
        "textDocument/completion" => completion(server, params),
        "textDocument/documentSymbol" => document_symbol(server, params),
        "workspace/symbol" => workspace_symbol(server, params),
        "textDocument/references" => references(server, params),
        "textDocument/documentHighlight" => document_highlight(server, params),
        "textDocument/rename" => rename(server, params),
        "textDocument/signatureHelp" => Ok(Value::Null),
        "textDocument/foldingRange" => folding_range(server, params),
        "textDocument/semanticTokens/full" => semantic_tokens(server, params),
        _ => Err((-32601, format!("method not found: {method}"))),
    }
}

fn initialize(server: &LspServer, params: Value) -> Value {
    let classpath: Vec<std::path::PathBuf> = params
        .get("initializationOptions")
        .and_then(|o| o.get("classpath"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(Value::as_str).map(std::path::PathBuf::from).collect())
        .unwrap_or_default();
    server.configure_classpath(classpath);

    json!({
        "capabilities": {
            "textDocumentSync": { "openClose": true, "change": 2 },
            "hoverProvider": true,
            "completionProvider": { "triggerCharacters": [".", ":", "(", ","] },
            "documentSymbolProvider": true,
            "workspaceSymbolProvider": true,
            "referencesProvider": true,
            "documentHighlightProvider": true,
            "renameProvider": true,
            "foldingRangeProvider": true,
            "signatureHelpProvider": { "triggerCharacters": ["(", ","] },
            "semanticTokensProvider": {
                "legend": { "tokenTypes": semantic_token_types(), "tokenModifiers": [] },
                "full": true,
            },
        },
        "serverInfo": { "name": "novac", "version": env!("CARGO_PKG_VERSION") },
    })
}

fn doc_position(server: &LspServer, params: &Value) -> Option<(String, usize)> {
    let doc = params.get("textDocument")?;
    let uri = doc.get("uri")?.as_str()?.to_string();
    let pos = params.get("position")?;
    let (line, character) = line_char(pos);
    let content = server.index.content(&uri)?;
    Some((uri.clone(), position_to_offset(&content, line, character)))
}

fn hover(server: &LspServer, params: Value) -> HandlerResult {
    let Some((uri, offset)) = doc_position(server, &params) else { return Ok(Value::Null) };
    match server.index.type_at(&uri, offset) {
        Some(ty) => Ok(json!({ "contents": { "kind": "plaintext", "value": ty } })),
        None => Ok(Value::Null),
    }
}

fn completion(server: &LspServer, params: Value) -> HandlerResult {
    let Some((uri, _offset)) = doc_position(server, &params) else { return Ok(json!([])) };
    let Some(analysis) = server.index.analysis(&uri) else { return Ok(json!([])) };
    let mut seen = std::collections::HashSet::new();
    let items: Vec<Value> = analysis
        .symbol_table
        .symbols
        .iter()
        .filter_map(|s| {
            let label = analysis.symbol_name(s);
            if !seen.insert((label.clone(), s.kind)) {
                return None;
            }
            Some(json!({ "label": label, "kind": completion_kind(s.kind) }))
        })
        .collect();
    Ok(json!(items))
}

fn completion_kind(kind: SymbolKind) -> i32 {
    match kind {
        SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum | SymbolKind::Object => 7,
        SymbolKind::Function => 3,
        SymbolKind::Property => 10,
        SymbolKind::Parameter | SymbolKind::Local => 6,
    }
}

fn document_symbol(server: &LspServer, params: Value) -> HandlerResult {
    let Some(uri) = params.get("textDocument").and_then(|d| d.get("uri")).and_then(Value::as_str) else { return Ok(json!([])) };
    let Some(analysis) = server.index.analysis(uri) else { return Ok(json!([])) };
    let Some(content) = server.index.content(uri) else { return Ok(json!([])) };
    let symbols: Vec<Value> =
        analysis.symbol_table.symbols.iter().map(|s| symbol_information(s, &analysis.symbol_name(s), &content, uri)).collect();
    Ok(json!(symbols))
}

fn symbol_information(symbol: &crate::semantic::Symbol, name: &str, content: &str, uri: &str) -> Value {
    let (line, character) = offset_to_position(content, symbol.loc.byte_offset);
    let (end_line, end_char) = offset_to_position(content, symbol.loc.byte_offset + symbol.loc.byte_length);
    json!({
        "name": name,
        "kind": lsp_symbol_kind(symbol.kind),
        "location": {
            "uri": uri,
            "range": { "start": { "line": line, "character": character }, "end": { "line": end_line, "character": end_char } },
        },
    })
}

fn lsp_symbol_kind(kind: SymbolKind) -> i32 {
    match kind {
        SymbolKind::Class | SymbolKind::Object => 5,
        SymbolKind::Interface => 11,
        SymbolKind::Enum => 10,
        SymbolKind::Function => 12,
        SymbolKind::Property => 7,
        SymbolKind::Parameter | SymbolKind::Local => 13,
    }
}

/// Resolves a project-index entry's byte offset into a 0-indexed LSP range
/// using its own document's current content (the entry's `ErrorLocation`
/// carries a 1-indexed line/column meant for human-readable diagnostics,
/// not the wire protocol).
fn entry_range(server: &LspServer, entry: &crate::semantic_index::project_index::ProjectEntry, name_len: usize) -> Value {
    let content = server.index.content(&entry.uri).unwrap_or_default();
    let (line, character) = offset_to_position(&content, entry.loc.byte_offset);
    let end_character = character + name_len as u32;
    json!({ "start": { "line": line, "character": character }, "end": { "line": line, "character": end_character } })
}

fn workspace_symbol(server: &LspServer, params: Value) -> HandlerResult {
    let query = params.get("query").and_then(Value::as_str).unwrap_or("");
    let hits = server.index.project_index().search(query, 200);
    let out: Vec<Value> = hits
        .into_iter()
        .map(|(name, entry)| {
            let range = entry_range(server, &entry, name.len());
            json!({ "name": name, "kind": lsp_symbol_kind(entry.kind), "location": { "uri": entry.uri, "range": range } })
        })
        .collect();
    Ok(json!(out))
}

fn references(server: &LspServer, params: Value) -> HandlerResult {
    let Some((uri, offset)) = doc_position(server, &params) else { return Ok(json!([])) };
    let Some(name) = identifier_name_at(server, &uri, offset) else { return Ok(json!([])) };
    let hits = server.index.project_index().lookup(&name);
    let out: Vec<Value> = hits.into_iter().map(|entry| { let range = entry_range(server, &entry, name.len()); json!({ "uri": entry.uri, "range": range }) }).collect();
    Ok(json!(out))
}

fn document_highlight(server: &LspServer, params: Value) -> HandlerResult {
    let Some((uri, offset)) = doc_position(server, &params) else { return Ok(json!([])) };
    let Some(index) = server.index.expr_index(&uri) else { return Ok(json!([])) };
    let Some(span) = index.innermost_at(offset) else { return Ok(json!([])) };
    let Some(content) = server.index.content(&uri) else { return Ok(json!([])) };
    let (sl, sc) = offset_to_position(&content, span.offset);
    let (el, ec) = offset_to_position(&content, span.offset + span.length);
    Ok(json!([{ "range": { "start": { "line": sl, "character": sc }, "end": { "line": el, "character": ec } } }]))
}

fn rename(server: &LspServer, params: Value) -> HandlerResult {
    let Some((uri, offset)) = doc_position(server, &params) else { return Ok(Value::Null) };
    let Some(new_name) = params.get("newName").and_then(Value::as_str) else {
        return Err((-32602, "missing newName".to_string()));
    };
    let Some(name) = identifier_name_at(server, &uri, offset) else { return Ok(Value::Null) };
    let hits = server.index.project_index().lookup(&name);

    let mut changes: std::collections::HashMap<String, Vec<Value>> = std::collections::HashMap::new();
    for entry in &hits {
        let range = entry_range(server, entry, name.len());
        let edit = json!({ "range": range, "newText": new_name });
        changes.entry(entry.uri.clone()).or_default().push(edit);
    }
    Ok(json!({ "changes": changes }))
}

fn identifier_name_at(server: &LspServer, uri: &str, offset: usize) -> Option<String> {
    let index = server.index.expr_index(uri)?;
    let span = index.innermost_at(offset)?;
    let content = server.index.content(uri)?;
    content.get(span.offset..span.offset + span.length).map(|s| s.trim().to_string())
}

fn folding_range(server: &LspServer, params: Value) -> HandlerResult {
    let Some(uri) = params.get("textDocument").and_then(|d| d.get("uri")).and_then(Value::as_str) else { return Ok(json!([])) };
    let Some(analysis) = server.index.analysis(uri) else { return Ok(json!([])) };
    let Some(content) = server.index.content(uri) else { return Ok(json!([])) };
    let ranges: Vec<Value> = analysis
        .symbol_table
        .symbols
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Class | SymbolKind::Interface | SymbolKind::Enum | SymbolKind::Object | SymbolKind::Function))
        .map(|s| {
            let (start_line, _) = offset_to_position(&content, s.loc.byte_offset);
            let (end_line, _) = offset_to_position(&content, s.loc.byte_offset + s.loc.byte_length);
            json!({ "startLine": start_line, "endLine": end_line })
        })
        .collect();
    Ok(json!(ranges))
}

fn semantic_token_types() -> Vec<&'static str> {
    vec!["class", "interface", "enum", "function", "property", "parameter", "variable"]
}

fn semantic_tokens(server: &LspServer, params: Value) -> HandlerResult {
    let Some(uri) = params.get("textDocument").and_then(|d| d.get("uri")).and_then(Value::as_str) else {
        return Ok(json!({ "data": [] }));
    };
    let Some(analysis) = server.index.analysis(uri) else { return Ok(json!({ "data": [] })) };
    let Some(content) = server.index.content(uri) else { return Ok(json!({ "data": [] })) };

    let mut tokens: Vec<(u32, u32, u32, u32)> = analysis
        .symbol_table
        .symbols
        .iter()
        .map(|s| {
            let (line, character) = offset_to_position(&content, s.loc.byte_offset);
            (line, character, s.loc.byte_length as u32, token_type_index(s.kind))
        })
        .collect();
    tokens.sort_by_key(|(line, character, ..)| (*line, *character));

    let mut data = Vec::new();
    let mut prev_line = 0u32;
    let mut prev_char = 0u32;
    for (line, character, length, token_type) in tokens {
        let delta_line = line - prev_line;
        let delta_char = if delta_line == 0 { character.saturating_sub(prev_char) } else { character };
        data.extend([delta_line, delta_char, length, token_type, 0]);
        prev_line = line;
        prev_char = character;
    }
    Ok(json!({ "data": data }))
}

fn token_type_index(kind: SymbolKind) -> u32 {
    match kind {
        SymbolKind::Class => 0,
        SymbolKind::Interface => 1,
        SymbolKind::Enum => 2,
        SymbolKind::Function => 3,
        SymbolKind::Property => 4,
        SymbolKind::Parameter => 5,
        SymbolKind::Local => 6,
        SymbolKind::Object => 0,
    }
}

/// Converts the diagnostics cached for `uri` into LSP's wire shape, used by
/// the re-analysis hook to build `textDocument/publishDiagnostics` params.
pub fn diagnostics_to_lsp(index: &DocumentIndex, uri: &str) -> Vec<Value> {
    let Some(content) = index.content(uri) else { return Vec::new() };
    index
        .diagnostics(uri)
        .into_iter()
        .map(|d| {
            let (sl, sc) = offset_to_position(&content, d.location.byte_offset);
            let (el, ec) = offset_to_position(&content, d.location.byte_offset + d.location.byte_length);
            json!({
                "range": { "start": { "line": sl, "character": sc }, "end": { "line": el, "character": ec } },
                "severity": severity_to_lsp(d.severity),
                "message": d.msg,
            })
        })
        .collect()
}

fn severity_to_lsp(severity: Severity) -> i32 {
    match severity {
        Severity::Error => 1,
        Severity::Warning => 2,
        Severity::Info => 3,
        Severity::Hint => 4,
    }
}

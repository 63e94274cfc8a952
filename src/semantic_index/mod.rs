//! The editor-facing semantic index (§4.4): owns the four per-document
//! caches, the document lifecycle (open/change/close/re-analyze), and the
//! debounce scheduler that decides when a changed document gets
//! re-analyzed. The LSP transport layer (`semantic_index::lsp`) is the only
//! caller; everything here is transport-agnostic so it could sit behind a
//! different protocol without change.
//!
//! `semantic::BasicAnalyzer` returns `Rc`-rooted results, fine for the
//! single-threaded batch compiler it was built for. This index is genuinely
//! concurrent (worker pool + debounce thread), so every analysis result is
//! re-rooted in `Arc` the moment it crosses out of the synchronous analyze
//! call, rather than touching `semantic::AnalysisResult` itself.

pub mod expr_index;
pub mod inference_fallback;
pub mod java_resolver;
pub mod lsp;
pub mod project_index;
pub mod scheduler;

use std::path::PathBuf;
use std::sync::{Arc, RwLock, Weak};

use dashmap::DashMap;

use crate::compiler_messages::Diagnostic;
use crate::parser;
use crate::semantic::{AnalysisResult, BasicAnalyzer, SemanticAnalyzer, Symbol, SymbolTable, TypeMap};
use crate::semantic_index::expr_index::ExprOffsetIndex;
use crate::semantic_index::project_index::{ProjectEntry, ProjectIndex};
use crate::semantic_index::scheduler::DebounceScheduler;
use crate::string_interning::StringTable;

/// The `Arc`-rooted twin of `semantic::AnalysisResult`, safe to hand to
/// other threads and to hold in a `DashMap` read across them. Carries the
/// `StringTable` the symbol names and types were interned against, since
/// `Symbol::name` is only a `StringId` without it — the table used during a
/// given `reanalyze` call is local to that call otherwise.
pub struct AnalysisBundle {
    pub symbol_table: Arc<SymbolTable>,
    pub type_map: Arc<TypeMap>,
    pub diagnostics: Arc<Vec<Diagnostic>>,
    pub table: Arc<StringTable>,
}

fn bundle_from(result: AnalysisResult, table: StringTable) -> AnalysisBundle {
    AnalysisBundle {
        symbol_table: Arc::new((*result.symbol_table).clone()),
        type_map: Arc::new((*result.type_map).clone()),
        diagnostics: Arc::new((*result.diagnostics).clone()),
        table: Arc::new(table),
    }
}

impl AnalysisBundle {
    pub fn symbol_name(&self, symbol: &Symbol) -> String {
        self.table.resolve(symbol.name).to_string()
    }
}

/// Cache 1 + 2 (§4.4) for a single open document: raw content plus the most
/// recent parse/analysis bundle and the derived expression index, all
/// stamped with the content version they were built from.
#[derive(Default)]
pub struct DocumentState {
    pub content: String,
    pub version: u64,
    pub parse_diagnostics: Arc<Vec<Diagnostic>>,
    pub analysis: Option<Arc<AnalysisBundle>>,
    pub expr_index: Option<Arc<ExprOffsetIndex>>,
}

/// Owns every open document's caches plus the cross-file project index.
/// Constructed behind an `Arc` because the debounce scheduler's background
/// thread needs to call back into it; `new` uses `Arc::new_cyclic` so the
/// callback can hold a `Weak` reference rather than create a reference
/// cycle with the scheduler it owns.
pub struct DocumentIndex {
    documents: DashMap<String, DocumentState>,
    project_index: ProjectIndex,
    scheduler: DebounceScheduler,
    reanalysis_hook: RwLock<Option<Arc<dyn Fn(&str) + Send + Sync>>>,
}

impl DocumentIndex {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<DocumentIndex>| {
            let weak = weak.clone();
            let scheduler = DebounceScheduler::start(move |uri, version| {
                if let Some(index) = weak.upgrade() {
                    index.reanalyze(&uri, version);
                }
            });
            DocumentIndex { documents: DashMap::new(), project_index: ProjectIndex::new(), scheduler, reanalysis_hook: RwLock::new(None) }
        })
    }

    /// Registers a callback fired after a document's cache is refreshed by
    /// `reanalyze`, carrying just the URI. The LSP transport layer uses this
    /// to push `textDocument/publishDiagnostics`; this module stays
    /// transport-agnostic by only ever calling a caller-supplied closure.
    pub fn set_reanalysis_hook(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.reanalysis_hook.write().unwrap() = Some(Arc::new(hook));
    }

    /// `textDocument/didOpen`: synchronously parses and analyzes so the
    /// first diagnostics publish has no debounce latency.
    pub fn open(&self, uri: String, content: String, version: u64) {
        self.documents.insert(uri.clone(), DocumentState { content, version, ..Default::default() });
        self.reanalyze(&uri, version);
    }

    /// `textDocument/didChange`: replaces the cached content immediately
    /// (so `content_at`/hover-by-offset see the new text right away) and
    /// invalidates the derived caches, then schedules a debounced
    /// re-analysis rather than running one inline.
    pub fn apply_change(&self, uri: &str, new_content: String, version: u64) {
        if let Some(mut state) = self.documents.get_mut(uri) {
            state.content = new_content;
            state.version = version;
            state.analysis = None;
            state.expr_index = None;
        }
        self.scheduler.notify_edit(uri.to_string(), version);
    }

    /// `textDocument/didClose`: drops every per-URI cache entry (§8
    /// invariant 9) and cancels any pending debounce for it.
    pub fn close(&self, uri: &str) {
        self.documents.remove(uri);
        self.project_index.remove(uri);
        self.scheduler.notify_close(uri.to_string());
    }

    pub fn content(&self, uri: &str) -> Option<String> {
        self.documents.get(uri).map(|s| s.content.clone())
    }

    pub fn analysis(&self, uri: &str) -> Option<Arc<AnalysisBundle>> {
        self.documents.get(uri).and_then(|s| s.analysis.clone())
    }

    pub fn expr_index(&self, uri: &str) -> Option<Arc<ExprOffsetIndex>> {
        self.documents.get(uri).and_then(|s| s.expr_index.clone())
    }

    pub fn diagnostics(&self, uri: &str) -> Vec<Diagnostic> {
        let Some(state) = self.documents.get(uri) else { return Vec::new() };
        let mut out = (*state.parse_diagnostics).clone();
        if let Some(bundle) = &state.analysis {
            out.extend((*bundle.diagnostics).clone());
        }
        out
    }

    pub fn project_index(&self) -> &ProjectIndex {
        &self.project_index
    }

    /// Parses and analyzes the document currently cached under `uri`,
    /// storing the result only if `version` still matches the document's
    /// current version — a late callback for an edit that's since been
    /// superseded is silently dropped rather than overwriting fresher state
    /// (§4.4 re-analysis: version-checked store).
    pub fn reanalyze(&self, uri: &str, version: u64) {
        crate::index_log!("reanalyzing {uri} v{version}");
        let Some(content) = self.documents.get(uri).map(|s| s.content.clone()) else { return };
        let mut table = StringTable::new();
        let file = PathBuf::from(uri);
        let parsed = parser::parse(&content, &file, &mut table);

        let mut analyzer = BasicAnalyzer::new();
        let result = analyzer.analyze(&parsed.program, &mut table);
        let bundle = Arc::new(bundle_from(result, table));
        let index = Arc::new(ExprOffsetIndex::build(&parsed.program));

        let mut still_current = false;
        if let Some(mut state) = self.documents.get_mut(uri) {
            if state.version == version {
                state.parse_diagnostics = Arc::new((*parsed.diagnostics).clone());
                state.analysis = Some(bundle.clone());
                state.expr_index = Some(index);
                still_current = true;
            }
        }
        if still_current {
            self.project_index.update(uri, collect_project_entries(uri, &bundle));
            if let Some(hook) = self.reanalysis_hook.read().unwrap().as_ref() {
                hook(uri);
            }
        }
    }

    /// Best-effort type lookup for a byte offset: the analyzer's exact
    /// per-expression type map first, falling back to the text-scanning
    /// inference when the offset lands on an identifier the analyzer never
    /// produced a type for (§9 open question 3).
    pub fn type_at(&self, uri: &str, offset: usize) -> Option<String> {
        let state = self.documents.get(uri)?;
        let index = state.expr_index.as_ref()?;
        let bundle = state.analysis.as_ref()?;
        let span = index.innermost_at(offset)?;
        if let Some(ty) = bundle.type_map.get(&(span.offset, span.length)) {
            return Some(ty.clone());
        }
        let word = word_at(&state.content, span.offset, span.length);
        inference_fallback::infer_variable_type(&state.content, word)
    }
}

fn word_at(content: &str, offset: usize, length: usize) -> &str {
    content.get(offset..offset + length).unwrap_or("").trim()
}

fn collect_project_entries(uri: &str, bundle: &AnalysisBundle) -> Vec<(String, ProjectEntry)> {
    bundle
        .symbol_table
        .symbols
        .iter()
        .map(|symbol| {
            let name = bundle.symbol_name(symbol);
            let entry = ProjectEntry { uri: uri.to_string(), kind: symbol.kind, declared_type: symbol.declared_type.clone(), loc: symbol.loc.clone() };
            (name, entry)
        })
        .collect()
}

//! Cache 4 (§4.4): cross-file `name → [entry]` lookup plus the reverse
//! `uri → {name}` set needed for clean removal when a document closes.

use dashmap::{DashMap, DashSet};

use crate::ast::TypeRef;
use crate::compiler_messages::ErrorLocation;
use crate::semantic::SymbolKind;

#[derive(Debug, Clone)]
pub struct ProjectEntry {
    pub uri: String,
    pub kind: SymbolKind,
    pub declared_type: Option<TypeRef>,
    pub loc: ErrorLocation,
}

/// Concurrent by construction (`DashMap`/`DashSet`), since re-analysis of
/// any open document may update it from a worker thread while another
/// document's references/rename query reads it.
#[derive(Default)]
pub struct ProjectIndex {
    by_name: DashMap<String, Vec<ProjectEntry>>,
    by_uri: DashMap<String, DashSet<String>>,
}

impl ProjectIndex {
    pub fn new() -> Self {
        ProjectIndex::default()
    }

    /// Replaces every entry previously contributed by `uri` with `entries`,
    /// keyed by symbol name.
    pub fn update(&self, uri: &str, entries: Vec<(String, ProjectEntry)>) {
        self.remove(uri);
        let names = DashSet::new();
        for (name, entry) in entries {
            names.insert(name.clone());
            self.by_name.entry(name).or_default().push(entry);
        }
        self.by_uri.insert(uri.to_string(), names);
    }

    /// Drops every entry contributed by `uri`. After this call, no lookup by
    /// any name can reach `uri` again (§8 invariant 9).
    pub fn remove(&self, uri: &str) {
        if let Some((_, names)) = self.by_uri.remove(uri) {
            for name in names {
                if let Some(mut entries) = self.by_name.get_mut(&name) {
                    entries.retain(|e| e.uri != uri);
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Vec<ProjectEntry> {
        self.by_name.get(name).map(|v| v.clone()).unwrap_or_default()
    }

    /// Case-insensitive substring search across every known name, capped at
    /// `limit` hits (§4.4 workspace symbols: capped at 200).
    pub fn search(&self, query: &str, limit: usize) -> Vec<(String, ProjectEntry)> {
        let needle = query.to_lowercase();
        let mut out = Vec::new();
        'outer: for pair in self.by_name.iter() {
            if !pair.key().to_lowercase().contains(&needle) {
                continue;
            }
            for entry in pair.value() {
                out.push((pair.key().clone(), entry.clone()));
                if out.len() >= limit {
                    break 'outer;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uri: &str) -> ProjectEntry {
        ProjectEntry { uri: uri.to_string(), kind: SymbolKind::Function, declared_type: None, loc: ErrorLocation::unknown() }
    }

    #[test]
    fn remove_drops_every_entry_for_a_uri() {
        let index = ProjectIndex::new();
        index.update("a.nv", vec![("foo".to_string(), entry("a.nv"))]);
        index.update("b.nv", vec![("foo".to_string(), entry("b.nv"))]);
        index.remove("a.nv");
        let found = index.lookup("foo");
        assert!(found.iter().all(|e| e.uri != "a.nv"));
        assert!(found.iter().any(|e| e.uri == "b.nv"));
    }

    #[test]
    fn search_is_case_insensitive_and_capped() {
        let index = ProjectIndex::new();
        for i in 0..5 {
            index.update(&format!("f{i}.nv"), vec![(format!("Thing{i}"), entry(&format!("f{i}.nv")))]);
        }
        let hits = index.search("thing", 3);
        assert_eq!(hits.len(), 3);
    }
}

//! String interning for file paths, identifiers, and class/member names that
//! flow through every IR stage. Interning keeps AST/HIR/MIR nodes cheap to
//! copy and lets the expression-offset index and project index key on a
//! `Copy` id instead of `String`.

use rustc_hash::FxHashMap;

/// A unique identifier for an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_u32(id: u32) -> Self {
        StringId(id)
    }

    #[inline]
    pub fn resolve(self, table: &StringTable) -> &str {
        table.resolve(self)
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Interns every file path, identifier and class/member name seen during a
/// compilation. A dual-mapping design gives O(1) id→string resolution
/// (`Vec<Box<str>>`) and O(1) string→id lookup (`FxHashMap`).
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<Box<str>>,
    string_to_id: FxHashMap<&'static str, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        StringTable::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        StringTable {
            strings: Vec::with_capacity(capacity),
            string_to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.string_to_id.get(s) {
            return id;
        }
        self.intern_new(s)
    }

    #[cold]
    fn intern_new(&mut self, s: &str) -> StringId {
        let id = StringId(self.strings.len() as u32);
        let boxed: Box<str> = s.into();
        // SAFETY: the StringTable owns `boxed` for its entire lifetime and
        // never removes or reallocates entries in `strings`, so the address
        // behind this reference stays valid for as long as the table does.
        let static_ref: &'static str =
            unsafe { std::mem::transmute::<&str, &'static str>(boxed.as_ref()) };
        self.string_to_id.insert(static_ref, id);
        self.strings.push(boxed);
        id
    }

    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    #[inline]
    pub fn try_resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_ref())
    }

    #[inline]
    pub fn get_existing(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_string_twice_returns_the_same_id() {
        let mut table = StringTable::new();
        let a = table.intern("java/lang/Object");
        let b = table.intern("java/lang/Object");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn resolve_round_trips() {
        let mut table = StringTable::new();
        let id = table.intern("NovaOps");
        assert_eq!(table.resolve(id), "NovaOps");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("a");
        let b = table.intern("b");
        assert_ne!(a, b);
    }
}

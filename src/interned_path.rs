//! Interned, dotted qualified names (`com.example.Foo`) and JVM internal
//! names (`com/example/Foo`). Used for class names, package names, and
//! import targets so the emitter's pre-scan tables can key on cheap `Copy`
//! values instead of re-hashing strings on every lookup.

use crate::string_interning::{StringId, StringTable};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InternedPath {
    components: Vec<StringId>,
}

impl InternedPath {
    pub fn new() -> Self {
        InternedPath {
            components: Vec::new(),
        }
    }

    pub fn from_dotted(qualified: &str, table: &mut StringTable) -> Self {
        InternedPath {
            components: qualified.split('.').map(|part| table.intern(part)).collect(),
        }
    }

    pub fn from_components(components: Vec<StringId>) -> Self {
        InternedPath { components }
    }

    pub fn push(&mut self, component: StringId) {
        self.components.push(component);
    }

    pub fn components(&self) -> &[StringId] {
        &self.components
    }

    pub fn last(&self) -> Option<StringId> {
        self.components.last().copied()
    }

    /// Renders as a JVM internal name (`/`-separated), the form used for
    /// `NEW`, `CHECKCAST`, `INSTANCEOF` and constant-pool class entries.
    pub fn to_internal_name(&self, table: &StringTable) -> String {
        self.components
            .iter()
            .map(|id| table.resolve(*id))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Renders as a dotted qualified name, the form used in diagnostics and
    /// in the `NovaAnnotations.trigger` runtime call.
    pub fn to_dotted_name(&self, table: &StringTable) -> String {
        self.components
            .iter()
            .map(|id| table.resolve(*id))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for InternedPath {
    fn default() -> Self {
        InternedPath::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_round_trips_through_internal_name() {
        let mut table = StringTable::new();
        let path = InternedPath::from_dotted("com.example.Foo", &mut table);
        assert_eq!(path.to_internal_name(&table), "com/example/Foo");
        assert_eq!(path.to_dotted_name(&table), "com.example.Foo");
    }
}

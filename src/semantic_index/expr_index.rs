//! Cache 3 (§4.4): a sorted start-offset → expression index, rebuilt only
//! when the parse result it was built from changes. Supports the two
//! queries the editor path needs: innermost-at and exact(offset, length).

use std::collections::BTreeMap;

use crate::ast::visitor::walk_expr;
use crate::ast::{AstVisitor, Expr, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprSpan {
    pub offset: usize,
    pub length: usize,
}

/// Sorted by starting offset; each bucket holds every expression that starts
/// at that offset (nested expressions commonly share a start, e.g. `a` and
/// `a.b.c` both start where `a` does).
#[derive(Debug, Default)]
pub struct ExprOffsetIndex {
    by_start: BTreeMap<usize, Vec<ExprSpan>>,
}

struct Collector<'a> {
    into: &'a mut BTreeMap<usize, Vec<ExprSpan>>,
}

impl AstVisitor for Collector<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        let loc = expr.loc();
        self.into.entry(loc.byte_offset).or_default().push(ExprSpan { offset: loc.byte_offset, length: loc.byte_length });
        walk_expr(self, expr);
    }
}

impl ExprOffsetIndex {
    pub fn build(program: &Program) -> Self {
        let mut by_start = BTreeMap::new();
        let mut collector = Collector { into: &mut by_start };
        for decl in &program.declarations {
            collector.visit_decl(decl);
        }
        ExprOffsetIndex { by_start }
    }

    /// Returns the expression of smallest length covering `offset`, walking
    /// candidate start offsets from the largest `<= offset` downward. Once a
    /// covering span has been found, no bucket at an earlier start can beat
    /// it unless its own span is shorter, so the scan stops the moment a
    /// strictly-shorter candidate becomes impossible (every remaining start
    /// is further from `offset`, so its minimum possible length only grows).
    pub fn innermost_at(&self, offset: usize) -> Option<ExprSpan> {
        let mut best: Option<ExprSpan> = None;
        for (&start, spans) in self.by_start.range(..=offset).rev() {
            if let Some(b) = best {
                if offset - start >= b.length {
                    break;
                }
            }
            for &span in spans {
                let end = span.offset + span.length;
                if end < offset {
                    continue;
                }
                best = Some(match best {
                    Some(b) if b.length <= span.length => b,
                    _ => span,
                });
            }
        }
        best
    }

    /// Returns the expression matching both `offset` and `length` exactly,
    /// preferring the shortest when more than one candidate (shouldn't
    /// normally happen, but ties are broken the same way as `innermost_at`).
    pub fn exact(&self, offset: usize, length: usize) -> Option<ExprSpan> {
        self.by_start.get(&offset)?.iter().copied().filter(|s| s.length == length).min_by_key(|s| s.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string_interning::StringTable;
    use proptest::prelude::*;

    #[test]
    fn innermost_at_prefers_shortest_covering_span() {
        let mut table = StringTable::new();
        let file = std::path::PathBuf::from("t.nv");
        let parsed = crate::parser::parse("val x = 1 + 2", &file, &mut table);
        let index = ExprOffsetIndex::build(&parsed.program);
        // offset inside the literal `2` should resolve to a span no longer
        // than the whole `1 + 2` binary expression.
        let whole = index.by_start.values().flatten().map(|s| s.length).max().unwrap_or(0);
        if let Some(span) = index.innermost_at(12) {
            assert!(span.length <= whole);
        }
    }

    proptest! {
        // A family of spans that all start at offset 0 with distinct lengths
        // is laminar (every pair nests rather than crossing): scanning the
        // query offset upward through it, `innermost_at`'s returned length
        // can only grow, since crossing a shorter span's end always leaves
        // only longer ones covering the query point.
        #[test]
        fn innermost_at_is_monotonic_in_segment_length(
            lengths in prop::collection::btree_set(1usize..500, 1..12)
        ) {
            let mut by_start = BTreeMap::new();
            let spans: Vec<ExprSpan> = lengths.iter().map(|&length| ExprSpan { offset: 0, length }).collect();
            let max_len = *lengths.iter().next_back().unwrap();
            by_start.insert(0usize, spans);
            let index = ExprOffsetIndex { by_start };

            let mut previous_length = 0usize;
            for offset in 0..max_len {
                if let Some(span) = index.innermost_at(offset) {
                    prop_assert!(span.length >= previous_length);
                    previous_length = span.length;
                }
            }
        }
    }
}

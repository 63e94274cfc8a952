//! Lowering context: a monotonic fresh-temporary counter plus helpers to
//! build the `val tmp = e` / `tmp` / `null` fragments the desugaring table
//! needs over and over.

use super::nodes::*;
use crate::ast::Literal;
use crate::compiler_messages::ErrorLocation;
use crate::string_interning::StringTable;

pub struct LoweringContext<'a> {
    pub table: &'a mut StringTable,
    next_temp: u32,
}

impl<'a> LoweringContext<'a> {
    pub fn new(table: &'a mut StringTable) -> Self {
        LoweringContext { table, next_temp: 0 }
    }

    /// A fresh, source-unreachable temporary name: `$t0`, `$t1`, ... The `$`
    /// prefix keeps it outside the surface identifier grammar so it can
    /// never collide with a user-written name.
    pub fn fresh_temp_name(&mut self) -> crate::string_interning::StringId {
        let name = format!("$t{}", self.next_temp);
        self.next_temp += 1;
        self.table.intern(&name)
    }

    pub fn decl_stmt(&mut self, name: crate::string_interning::StringId, init: HExpr, loc: ErrorLocation) -> HStmt {
        HStmt::Decl(HirDeclStmt {
            name,
            mutable: false,
            ty: None,
            initializer: init,
        })
        .at(loc)
    }

    pub fn ident(&self, name: crate::string_interning::StringId, loc: ErrorLocation) -> HExpr {
        HExpr::Identifier(name, loc)
    }

    pub fn null_literal(&self, loc: ErrorLocation) -> HExpr {
        HExpr::Literal(Literal::Null, loc)
    }

    /// Binds `e` to a fresh temporary and returns `(decl_stmt, tmp_ref_expr)`
    /// — the fragment almost every desugaring rule in §4.1 starts from.
    pub fn bind_temp(&mut self, e: HExpr, loc: ErrorLocation) -> (HStmt, HExpr) {
        let name = self.fresh_temp_name();
        let decl = self.decl_stmt(name, e, loc.clone());
        (decl, self.ident(name, loc))
    }
}

/// A tiny helper trait so `HStmt` construction in the context methods above
/// can read `.at(loc)` instead of threading location through every variant
/// (`HStmt` itself carries no location — only `HExpr` and declarations do —
/// so this is a no-op placeholder kept for call-site symmetry with `HExpr`).
trait AtLoc {
    fn at(self, loc: ErrorLocation) -> Self;
}

impl AtLoc for HStmt {
    fn at(self, _loc: ErrorLocation) -> Self {
        self
    }
}

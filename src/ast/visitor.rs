//! A walking visitor over the AST. Every node kind exposes a `visit`
//! capability against a fixed set of node kinds; this trait is the
//! mechanical shape of that capability and carries no semantic weight of its
//! own — the HIR lowerer and the semantic-index's symbol/token walkers both
//! implement it, each choosing only the hooks they need and relying on the
//! default method bodies to keep walking into children.

use super::nodes::*;

pub trait AstVisitor {
    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_decl<V: AstVisitor + ?Sized>(v: &mut V, decl: &Decl) {
    match decl {
        Decl::Class(c) | Decl::Interface(c) | Decl::Enum(c) | Decl::Object(c) | Decl::Annotation(c) => {
            for member in &c.members {
                v.visit_decl(member);
            }
            for entry in &c.enum_entries {
                for arg in &entry.ctor_args {
                    v.visit_expr(arg);
                }
            }
            for arg in &c.super_ctor_args {
                v.visit_expr(arg);
            }
        }
        Decl::Function(f) | Decl::Constructor(f) => {
            if let Some(body) = &f.body {
                match body {
                    FunctionBody::Block(block) => {
                        for stmt in &block.stmts {
                            v.visit_stmt(stmt);
                        }
                    }
                    FunctionBody::Expr(e) => v.visit_expr(e),
                }
            }
        }
        Decl::InitBlock(block) => {
            for stmt in &block.stmts {
                v.visit_stmt(stmt);
            }
        }
        Decl::Property(p) => {
            if let Some(init) = &p.initializer {
                v.visit_expr(init);
            }
        }
        Decl::Parameter(p) => {
            if let Some(default) = &p.default {
                v.visit_expr(default);
            }
        }
        Decl::TypeAlias(_) => {}
        Decl::Destructuring(d) => v.visit_expr(&d.initializer),
    }
}

pub fn walk_stmt<V: AstVisitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block(b) => {
            for s in &b.stmts {
                v.visit_stmt(s);
            }
        }
        Stmt::Expr(e) => v.visit_expr(e),
        Stmt::Decl(d) => v.visit_decl(d),
        Stmt::If(i) => {
            v.visit_expr(&i.condition);
            v.visit_stmt(&i.then_branch);
            if let Some(e) = &i.else_branch {
                v.visit_stmt(e);
            }
        }
        Stmt::When(w) => {
            if let Some(subj) = &w.subject {
                v.visit_expr(subj);
            }
            for arm in &w.arms {
                if let WhenPattern::Value(e) = &arm.pattern {
                    v.visit_expr(e);
                }
                v.visit_stmt(&arm.body);
            }
        }
        Stmt::For(f) => {
            v.visit_expr(&f.iterable);
            v.visit_stmt(&f.body);
        }
        Stmt::While(w) | Stmt::DoWhile(w) => {
            v.visit_expr(&w.condition);
            v.visit_stmt(&w.body);
        }
        Stmt::Try(t) => {
            for s in &t.body.stmts {
                v.visit_stmt(s);
            }
            for catch in &t.catches {
                for s in &catch.body.stmts {
                    v.visit_stmt(s);
                }
            }
            if let Some(f) = &t.finally {
                for s in &f.stmts {
                    v.visit_stmt(s);
                }
            }
        }
        Stmt::Return(Some(e)) | Stmt::Throw(e) => v.visit_expr(e),
        Stmt::Return(None) | Stmt::Break(_) | Stmt::Continue(_) => {}
        Stmt::Guard(g) => {
            v.visit_expr(&g.binding.initializer);
            v.visit_stmt(&g.else_branch);
        }
        Stmt::Use(u) => {
            for (_, e) in &u.bindings {
                v.visit_expr(e);
            }
            for s in &u.body.stmts {
                v.visit_stmt(s);
            }
        }
    }
}

pub fn walk_expr<V: AstVisitor + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Literal(..) | Expr::Identifier(..) | Expr::This(_) | Expr::Super(_) | Expr::Placeholder(_) => {}
        Expr::Binary(_, l, r, _) | Expr::Pipeline(l, r, _) | Expr::Elvis(l, r, _) | Expr::SafeCall(l, r, _) | Expr::SafeIndex(l, r, _) => {
            v.visit_expr(l);
            v.visit_expr(r);
        }
        Expr::Unary(_, e, _)
        | Expr::Await(e, _)
        | Expr::TypeCast(e, _, _)
        | Expr::Spread(e, _)
        | Expr::MethodRef(e, _, _)
        | Expr::NotNull(e, _)
        | Expr::ErrorPropagation(e, _)
        | Expr::Member(e, _, _) => v.visit_expr(e),
        Expr::TypeCheck(e, _, _, _) => v.visit_expr(e),
        Expr::Call(callee, args, _) => {
            v.visit_expr(callee);
            for a in args {
                v.visit_expr(a);
            }
        }
        Expr::Index(base, idx, _) => {
            v.visit_expr(base);
            v.visit_expr(idx);
        }
        Expr::Assign(target, _, value, _) => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        Expr::Lambda(l) => match &l.body {
            FunctionBody::Block(block) => {
                for s in &block.stmts {
                    v.visit_stmt(s);
                }
            }
            FunctionBody::Expr(e) => v.visit_expr(e),
        },
        Expr::IfExpr(c, t, e, _) => {
            v.visit_expr(c);
            v.visit_expr(t);
            v.visit_expr(e);
        }
        Expr::WhenExpr(w) => {
            if let Some(subj) = &w.subject {
                v.visit_expr(subj);
            }
            for arm in &w.arms {
                if let WhenPattern::Value(e) = &arm.pattern {
                    v.visit_expr(e);
                }
                v.visit_stmt(&arm.body);
            }
        }
        Expr::TryExpr(t) => {
            for s in &t.body.stmts {
                v.visit_stmt(s);
            }
            for catch in &t.catches {
                for s in &catch.body.stmts {
                    v.visit_stmt(s);
                }
            }
        }
        Expr::Range(a, b, _, _) => {
            v.visit_expr(a);
            v.visit_expr(b);
        }
        Expr::Slice(base, start, end, _) => {
            v.visit_expr(base);
            v.visit_expr(start);
            v.visit_expr(end);
        }
        Expr::ObjectLiteral(fields, _, _) => {
            for (_, e) in fields {
                v.visit_expr(e);
            }
        }
        Expr::CollectionLiteral(_, items, _) => {
            for e in items {
                v.visit_expr(e);
            }
        }
        Expr::StringInterpolation(parts, _) => {
            for part in parts {
                if let InterpolationPart::Expr(e) = part {
                    v.visit_expr(e);
                }
            }
        }
        Expr::New(_, args, _) => {
            for a in args {
                v.visit_expr(a);
            }
        }
        Expr::ScopeShorthand(recv, body, _) => {
            v.visit_expr(recv);
            for s in &body.stmts {
                v.visit_stmt(s);
            }
        }
        Expr::JumpAsExpr(stmt, _) => v.visit_stmt(stmt),
    }
}

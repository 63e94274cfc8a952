//! AST→HIR lowering: the desugaring visitor from spec §4.1.
//!
//! Every row of the exhaustive desugaring table has one function here named
//! after the surface form it removes. The HIR invariant ("no sugar node kind
//! survives lowering") is upheld structurally: `HExpr`/`HStmt` simply have no
//! variant for `when`, `guard`, `use`, `destructuring`, `safe-call`,
//! `safe-index`, `elvis`, `pipeline`, `compound-assign`, `if-let`,
//! `scope-shorthand`, or `string-interpolation`, so any lowering path that
//! forgets a case fails to compile rather than silently leaking sugar.

use crate::ast::{self, *};
use crate::compiler_messages::ErrorLocation;
use crate::hir::context::LoweringContext;
use crate::hir::nodes::*;
use crate::hir_log;
use crate::settings::IMPLICIT_ENTRY_METHOD_NAME;
use crate::string_interning::{StringId, StringTable};

pub type Loc = ErrorLocation;

/// Lowers an entire parsed program into a `HirModule`, applying the
/// program-level rule: top-level field declarations and a top-level `main`
/// interleave (merged by source line/column), and a synthetic `main` is
/// created in script mode when none is declared.
pub fn lower_program(program: &Program, table: &mut StringTable) -> HirModule {
    let mut ctx = LoweringContext::new(table);

    let package = program.package.as_ref().map(|p| p.qualified_name);
    let imports = program.imports.iter().map(lower_import).collect();

    let mut classes = Vec::new();
    let mut functions = Vec::new();
    let mut top_level_fields: Vec<&PropertyDecl> = Vec::new();
    let mut main_decl: Option<&FunctionDecl> = None;

    for decl in &program.declarations {
        match decl {
            Decl::Class(c) | Decl::Interface(c) | Decl::Enum(c) | Decl::Object(c) | Decl::Annotation(c) => {
                let lowered = lower_class(&mut ctx, c, &mut classes);
                classes.push(lowered);
            }
            Decl::Function(f) => {
                if ctx.table.resolve(f.name) == IMPLICIT_ENTRY_METHOD_NAME && f.receiver_type.is_none() {
                    main_decl = Some(f);
                } else {
                    functions.push(lower_function(&mut ctx, f));
                }
            }
            Decl::Property(p) => top_level_fields.push(p),
            _ => {}
        }
    }

    if !top_level_fields.is_empty() || main_decl.is_some() {
        functions.push(build_script_main(&mut ctx, main_decl, &top_level_fields));
    }

    HirModule {
        package,
        imports,
        classes,
        functions,
    }
}

/// Builds the script-mode `main`: merges field-declaration statements into an
/// existing `main` body (sorted by source line/column with the body's own
/// statements), or synthesizes a field-initializers-only `main` if none was
/// declared.
fn build_script_main(ctx: &mut LoweringContext, main_decl: Option<&FunctionDecl>, fields: &[&PropertyDecl]) -> HirFunction {
    let mut entries: Vec<(CharPositionKey, HStmt)> = fields
        .iter()
        .map(|p| (CharPositionKey::from(&p.loc), lower_property_as_decl_stmt(ctx, p)))
        .collect();

    let (modifiers, annotations, loc) = match main_decl {
        Some(f) => {
            if let Some(FunctionBody::Block(block)) = &f.body {
                for stmt in &block.stmts {
                    let key = CharPositionKey::from(&stmt_loc(stmt));
                    for lowered in lower_stmt(ctx, stmt) {
                        entries.push((key.clone(), lowered));
                    }
                }
            } else if let Some(FunctionBody::Expr(e)) = &f.body {
                entries.push((CharPositionKey::from(e.loc()), HStmt::Expr(lower_expr(ctx, e))));
            }
            (f.modifiers.clone(), f.annotations.clone(), f.loc.clone())
        }
        None => (vec![Modifier::Static], Vec::new(), Loc::unknown()),
    };

    entries.sort_by_key(|(key, _)| key.clone());
    let body = entries.into_iter().map(|(_, stmt)| stmt).collect();

    HirFunction {
        name: ctx.table.intern(IMPLICIT_ENTRY_METHOD_NAME),
        modifiers,
        annotations,
        type_params: Vec::new(),
        receiver_type: None,
        params: Vec::new(),
        return_type: None,
        body,
        is_constructor: false,
        delegation_args: None,
        reified_type_params: Vec::new(),
    }
}

/// A sortable `(line, column)` key used only during lowering to interleave
/// statements by source position; it never survives into the HIR itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CharPositionKey(u32, u32);

impl From<&Loc> for CharPositionKey {
    fn from(loc: &Loc) -> Self {
        CharPositionKey(loc.start.line, loc.start.column)
    }
}

fn lower_property_as_decl_stmt(ctx: &mut LoweringContext, p: &PropertyDecl) -> HStmt {
    let init = p
        .initializer
        .as_ref()
        .map(|e| lower_expr(ctx, e))
        .unwrap_or_else(|| ctx.null_literal(p.loc.clone()));
    HStmt::Decl(HirDeclStmt {
        name: p.name,
        mutable: p.mutable,
        ty: p.ty.clone(),
        initializer: init,
    })
}

fn lower_import(i: &ImportDecl) -> HirImport {
    HirImport {
        qualified_name: i.qualified_name,
        alias: i.alias,
        wildcard: i.wildcard,
        is_java: i.is_java,
        is_static: i.is_static,
    }
}

// ------------------------------------------------------------------ classes

/// Lowers one class-shaped declaration. `sibling_classes` collects nested
/// (non-companion) classes discovered along the way, flattened into the
/// enclosing module's class list — the JVM has no notion of lexical nesting
/// beyond the `InnerClasses` attribute, which codegen derives separately.
fn lower_class(ctx: &mut LoweringContext, c: &ClassDecl, sibling_classes: &mut Vec<HirClass>) -> HirClass {
    hir_log!("lowering class {}", ctx.table.resolve(c.name));
    let mut fields = Vec::new();
    let mut methods = Vec::new();
    let mut constructors = Vec::new();
    let mut instance_initializers = Vec::new();

    // Every primary-constructor parameter also produces a `val` field,
    // matching the primary-constructor-as-property convention.
    for p in &c.primary_ctor_params {
        fields.push(HirField {
            name: p.name,
            mutable: false,
            ty: p.ty.clone(),
            initializer: None,
            getter: None,
            setter: None,
            extension_receiver: None,
            modifiers: vec![Modifier::Val],
        });
    }

    let primary_ctor = build_primary_constructor(ctx, c);
    constructors.push(primary_ctor);

    for member in &c.members {
        match member {
            Decl::Function(f) => methods.push(lower_function(ctx, f)),
            Decl::Constructor(f) => constructors.push(lower_function(ctx, f)),
            Decl::Property(p) => {
                let field_index = fields.len();
                fields.push(lower_field(ctx, p));
                if p.initializer.is_some() {
                    let init = fields[field_index].initializer.clone().unwrap();
                    instance_initializers.push(HirInitItem::FieldInit { field_index, value: init });
                }
            }
            Decl::InitBlock(block) => {
                let stmts = block.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect();
                instance_initializers.push(HirInitItem::InitBlock(stmts));
            }
            // Companion-object members are hoisted into the enclosing class
            // with `static` added (§4.1 program-level rule).
            Decl::Object(companion) if companion.modifiers.contains(&Modifier::Companion) => {
                hoist_companion(ctx, companion, &mut fields, &mut methods, &mut instance_initializers);
            }
            Decl::Class(nested) | Decl::Interface(nested) | Decl::Enum(nested) | Decl::Object(nested) | Decl::Annotation(nested) => {
                let lowered_nested = lower_class(ctx, nested, sibling_classes);
                sibling_classes.push(lowered_nested);
            }
            _ => {}
        }
    }

    let super_ctor_args = c.super_ctor_args.iter().map(|e| lower_expr(ctx, e)).collect();
    let enum_entries = c
        .enum_entries
        .iter()
        .map(|e| HirEnumEntry {
            name: e.name,
            ctor_args: e.ctor_args.iter().map(|a| lower_expr(ctx, a)).collect(),
        })
        .collect();

    HirClass {
        kind: c.kind,
        name: c.name,
        modifiers: c.modifiers.clone(),
        annotations: c.annotations.clone(),
        type_params: c.type_params.clone(),
        fields,
        methods,
        constructors,
        superclass: c.superclass.clone(),
        interfaces: c.interfaces.clone(),
        super_ctor_args,
        enum_entries,
        instance_initializers,
    }
}

/// A primary constructor is always represented as a function named `<init>`
/// whose parameters are the class's primary-ctor params, with property-param
/// assignments (`this.field = param`) as its body prefix. The MIR lowerer
/// threads the super-call and ordered instance initializers in after this.
fn build_primary_constructor(ctx: &mut LoweringContext, c: &ClassDecl) -> HirFunction {
    let init_name = ctx.table.intern("<init>");
    let params: Vec<HirParam> = c
        .primary_ctor_params
        .iter()
        .map(|p| HirParam {
            name: p.name,
            ty: p.ty.clone(),
            default: p.default.as_ref().map(|e| lower_expr(ctx, e)),
            vararg: p.vararg,
        })
        .collect();

    let mut body = Vec::new();
    for p in &c.primary_ctor_params {
        let loc = p.loc.clone();
        let this_field = HExpr::Member(Box::new(HExpr::This(loc.clone())), p.name, loc.clone());
        let param_ref = HExpr::Identifier(p.name, loc.clone());
        body.push(HStmt::Expr(HExpr::Assign(Box::new(this_field), Box::new(param_ref), loc)));
    }

    HirFunction {
        name: init_name,
        modifiers: Vec::new(),
        annotations: Vec::new(),
        type_params: Vec::new(),
        receiver_type: None,
        params,
        return_type: None,
        body,
        is_constructor: true,
        delegation_args: None,
        reified_type_params: Vec::new(),
    }
}

fn lower_field(ctx: &mut LoweringContext, p: &PropertyDecl) -> HirField {
    HirField {
        name: p.name,
        mutable: p.mutable,
        ty: p.ty.clone(),
        initializer: p.initializer.as_ref().map(|e| lower_expr(ctx, e)),
        getter: p.getter.as_ref().map(|b| lower_function_body_stmts(ctx, b)),
        setter: p.setter.as_ref().map(|(name, body)| (*name, lower_function_body_stmts(ctx, body))),
        extension_receiver: p.extension_receiver.clone(),
        modifiers: p.modifiers.clone(),
    }
}

fn hoist_companion(
    ctx: &mut LoweringContext,
    companion: &ClassDecl,
    fields: &mut Vec<HirField>,
    methods: &mut Vec<HirFunction>,
    instance_initializers: &mut Vec<HirInitItem>,
) {
    for member in &companion.members {
        match member {
            Decl::Function(f) => {
                let mut lowered = lower_function(ctx, f);
                if !lowered.modifiers.contains(&Modifier::Static) {
                    lowered.modifiers.push(Modifier::Static);
                }
                methods.push(lowered);
            }
            Decl::Property(p) => {
                let mut lowered = lower_field(ctx, p);
                if !lowered.modifiers.contains(&Modifier::Static) {
                    lowered.modifiers.push(Modifier::Static);
                }
                let field_index = fields.len();
                let init = lowered.initializer.clone();
                fields.push(lowered);
                if let Some(value) = init {
                    instance_initializers.push(HirInitItem::FieldInit { field_index, value });
                }
            }
            Decl::InitBlock(block) => {
                let stmts = block.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect();
                instance_initializers.push(HirInitItem::InitBlock(stmts));
            }
            _ => {}
        }
    }
}

fn lower_function_body_stmts(ctx: &mut LoweringContext, body: &FunctionBody) -> Vec<HStmt> {
    match body {
        FunctionBody::Block(b) => b.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect(),
        FunctionBody::Expr(e) => vec![HStmt::Return(Some(lower_expr(ctx, e)))],
    }
}

fn lower_function(ctx: &mut LoweringContext, f: &FunctionDecl) -> HirFunction {
    hir_log!("lowering function {}", ctx.table.resolve(f.name));
    let params = f
        .params
        .iter()
        .map(|p| HirParam {
            name: p.name,
            ty: p.ty.clone(),
            default: p.default.as_ref().map(|e| lower_expr(ctx, e)),
            vararg: p.vararg,
        })
        .collect();
    let body = f.body.as_ref().map(|b| lower_function_body_stmts(ctx, b)).unwrap_or_default();
    let delegation_args = f.delegation_args.as_ref().map(|args| args.iter().map(|a| lower_expr(ctx, a)).collect());

    HirFunction {
        name: f.name,
        modifiers: f.modifiers.clone(),
        annotations: f.annotations.clone(),
        type_params: f.type_params.clone(),
        receiver_type: f.receiver_type.clone(),
        params,
        return_type: f.return_type.clone(),
        body,
        is_constructor: f.is_constructor,
        delegation_args,
        reified_type_params: Vec::new(),
    }
}

// ------------------------------------------------------------------ statements

/// Lowers one AST statement into zero or more HIR statements — most forms
/// lower 1:1, but destructuring, guard, and use each expand into several.
fn lower_stmt(ctx: &mut LoweringContext, stmt: &Stmt) -> Vec<HStmt> {
    match stmt {
        Stmt::Block(b) => vec![HStmt::Block(b.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect())],
        Stmt::Expr(e) => vec![HStmt::Expr(lower_expr(ctx, e))],
        Stmt::Decl(d) => lower_decl_stmt(ctx, d),
        Stmt::If(i) => vec![lower_if_stmt(ctx, i)],
        Stmt::When(w) => vec![lower_when(ctx, w)],
        Stmt::For(f) => vec![HStmt::For(f.binding, lower_expr(ctx, &f.iterable), Box::new(lower_stmt_single(ctx, &f.body)))],
        Stmt::While(w) => vec![HStmt::Loop(HirLoop {
            condition: Box::new(lower_expr(ctx, &w.condition)),
            body: Box::new(lower_stmt_single(ctx, &w.body)),
            post_test: false,
        })],
        Stmt::DoWhile(w) => vec![HStmt::Loop(HirLoop {
            condition: Box::new(lower_expr(ctx, &w.condition)),
            body: Box::new(lower_stmt_single(ctx, &w.body)),
            post_test: true,
        })],
        Stmt::Try(t) => vec![HStmt::Try(lower_try(ctx, t))],
        Stmt::Return(e) => vec![HStmt::Return(e.as_ref().map(|e| lower_expr(ctx, e)))],
        Stmt::Break(l) => vec![HStmt::Break(*l)],
        Stmt::Continue(l) => vec![HStmt::Continue(*l)],
        Stmt::Throw(e) => vec![HStmt::Throw(lower_expr(ctx, e))],
        Stmt::Guard(g) => lower_guard(ctx, g),
        Stmt::Use(u) => lower_use(ctx, u),
    }
}

fn lower_stmt_single(ctx: &mut LoweringContext, stmt: &Stmt) -> HStmt {
    let mut stmts = lower_stmt(ctx, stmt);
    if stmts.len() == 1 {
        stmts.pop().unwrap()
    } else {
        HStmt::Block(stmts)
    }
}

fn lower_decl_stmt(ctx: &mut LoweringContext, decl: &Decl) -> Vec<HStmt> {
    match decl {
        Decl::Destructuring(d) => lower_destructuring(ctx, d),
        Decl::Property(p) => vec![lower_property_as_decl_stmt(ctx, p)],
        Decl::Function(f) => {
            lower_function(ctx, f);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// `val (a,b) = e` → `val t = e; val a = t.component1(); val b = t.component2()`
/// (`_` names are skipped).
fn lower_destructuring(ctx: &mut LoweringContext, d: &DestructuringDecl) -> Vec<HStmt> {
    let loc = d.loc.clone();
    let value = lower_expr(ctx, &d.initializer);
    let (decl_t, t_ref) = ctx.bind_temp(value, loc.clone());
    let mut stmts = vec![decl_t];
    for (index, name) in d.names.iter().enumerate() {
        let Some(name) = name else { continue };
        let component_name = ctx.table.intern(&format!("component{}", index + 1));
        let call = HExpr::Call(HirCall {
            callee: Box::new(HExpr::Member(Box::new(t_ref.clone()), component_name, loc.clone())),
            args: Vec::new(),
            loc: loc.clone(),
        });
        stmts.push(ctx.decl_stmt(*name, call, loc.clone()));
    }
    stmts
}

/// `if (val x = e) B else E` → `val t = e; if (t != null) { val x = t; B } else E`
fn lower_if_stmt(ctx: &mut LoweringContext, i: &IfStmt) -> HStmt {
    if let Some(binding) = &i.condition_binding {
        let loc = binding.loc.clone();
        let value = lower_expr(ctx, &binding.initializer);
        let (decl_t, t_ref) = ctx.bind_temp(value, loc.clone());
        let not_null = not_null_check(&t_ref, loc.clone());

        let mut then_stmts = Vec::new();
        if let Some(name) = binding.names.first().copied().flatten() {
            then_stmts.push(ctx.decl_stmt(name, t_ref.clone(), loc.clone()));
        }
        then_stmts.extend(lower_stmt(ctx, &i.then_branch));

        let else_branch = i.else_branch.as_ref().map(|e| Box::new(lower_stmt_single(ctx, e)));
        HStmt::Block(vec![decl_t, HStmt::If(not_null, Box::new(HStmt::Block(then_stmts)), else_branch)])
    } else {
        let cond = lower_expr(ctx, &i.condition);
        let then_branch = Box::new(lower_stmt_single(ctx, &i.then_branch));
        let else_branch = i.else_branch.as_ref().map(|e| Box::new(lower_stmt_single(ctx, e)));
        HStmt::If(cond, then_branch, else_branch)
    }
}

fn not_null_check(expr: &HExpr, loc: Loc) -> HExpr {
    HExpr::Binary(
        BinaryOp::Ne,
        Box::new(expr.clone()),
        Box::new(HExpr::Literal(Literal::Null, loc.clone())),
        loc,
    )
}

fn null_check(expr: &HExpr, loc: Loc) -> HExpr {
    HExpr::Binary(
        BinaryOp::Eq,
        Box::new(expr.clone()),
        Box::new(HExpr::Literal(Literal::Null, loc.clone())),
        loc,
    )
}

/// `when (s) { v → R; type T → R'; in r → R''; else → D }` lowers to a nested
/// if-else chain; the subject, if any, is bound once.
fn lower_when(ctx: &mut LoweringContext, w: &WhenStmt) -> HStmt {
    let loc = w.loc.clone();
    let subject_ref = w.subject.as_ref().map(|s| {
        let value = lower_expr(ctx, s);
        ctx.bind_temp(value, loc.clone())
    });

    let mut chain: Option<HStmt> = None;
    for arm in w.arms.iter().rev() {
        let body = lower_stmt_single(ctx, &arm.body);
        chain = Some(match &arm.pattern {
            WhenPattern::Else => body,
            WhenPattern::Value(e) => {
                let cond = match &subject_ref {
                    Some((_, subject)) => HExpr::Binary(BinaryOp::Eq, Box::new(subject.clone()), Box::new(lower_expr(ctx, e)), arm.loc.clone()),
                    None => lower_expr(ctx, e),
                };
                HStmt::If(cond, Box::new(body), chain.map(Box::new))
            }
            WhenPattern::Type(ty) => {
                let subject = subject_ref.as_ref().map(|(_, s)| s.clone()).unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                let cond = HExpr::TypeCheck(Box::new(subject), ty.clone(), false, arm.loc.clone());
                HStmt::If(cond, Box::new(body), chain.map(Box::new))
            }
            WhenPattern::InRange(range) => {
                let subject = subject_ref.as_ref().map(|(_, s)| s.clone()).unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                let cond = HExpr::Binary(BinaryOp::In, Box::new(subject), Box::new(lower_expr(ctx, range)), arm.loc.clone());
                HStmt::If(cond, Box::new(body), chain.map(Box::new))
            }
        });
    }

    let chain = chain.unwrap_or(HStmt::Block(Vec::new()));
    match subject_ref {
        Some((decl, _)) => HStmt::Block(vec![decl, chain]),
        None => chain,
    }
}

/// `guard val x = e else G` → `val t = e; if (t == null) G; val x = t`
/// (`G` must be jump-like: return/break/continue/throw).
fn lower_guard(ctx: &mut LoweringContext, g: &GuardStmt) -> Vec<HStmt> {
    let loc = g.binding.loc.clone();
    let value = lower_expr(ctx, &g.binding.initializer);
    let (decl_t, t_ref) = ctx.bind_temp(value, loc.clone());
    let check = null_check(&t_ref, loc.clone());
    let jump = lower_stmt_single(ctx, &g.else_branch);

    let mut stmts = vec![decl_t, HStmt::If(check, Box::new(jump), None)];
    if g.binding.names.len() == 1 {
        if let Some(name) = g.binding.names[0] {
            stmts.push(ctx.decl_stmt(name, t_ref, loc));
        }
    } else {
        for (index, name) in g.binding.names.iter().enumerate() {
            let Some(name) = name else { continue };
            let component_name = ctx.table.intern(&format!("component{}", index + 1));
            let call = HExpr::Call(HirCall {
                callee: Box::new(HExpr::Member(Box::new(t_ref.clone()), component_name, loc.clone())),
                args: Vec::new(),
                loc: loc.clone(),
            });
            stmts.push(ctx.decl_stmt(name, call, loc.clone()));
        }
    }
    stmts
}

/// `use(val r = e) B` → `val r = e; try B finally { try { r.close() } catch (_) {} }`,
/// one try/finally layer per binding, innermost wrapping `B`.
fn lower_use(ctx: &mut LoweringContext, u: &UseStmt) -> Vec<HStmt> {
    let loc = u.loc.clone();
    let mut body: Vec<HStmt> = u.body.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect();
    let mut prelude = Vec::new();

    for (name, init) in &u.bindings {
        let value = lower_expr(ctx, init);
        prelude.push(ctx.decl_stmt(*name, value, loc.clone()));

        let close_name = ctx.table.intern("close");
        let close_call = HExpr::Call(HirCall {
            callee: Box::new(HExpr::Member(Box::new(HExpr::Identifier(*name, loc.clone())), close_name, loc.clone())),
            args: Vec::new(),
            loc: loc.clone(),
        });
        let ignore_name = ctx.fresh_temp_name();
        let any_ty = TypeRef::Simple(ctx.table.intern("Exception"), loc.clone());
        let suppressed_close = HirTry {
            body: vec![HStmt::Expr(close_call)],
            catches: vec![HirCatch {
                param_name: ignore_name,
                param_type: any_ty,
                body: Vec::new(),
            }],
            finally: None,
        };
        body = vec![HStmt::Try(HirTry {
            body: std::mem::take(&mut body),
            catches: Vec::new(),
            finally: Some(vec![HStmt::Try(suppressed_close)]),
        })];
    }

    prelude.extend(body);
    prelude
}

fn lower_try(ctx: &mut LoweringContext, t: &TryStmt) -> HirTry {
    HirTry {
        body: t.body.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect(),
        catches: t
            .catches
            .iter()
            .map(|c| HirCatch {
                param_name: c.param_name,
                param_type: c.param_type.clone(),
                body: c.body.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect(),
            })
            .collect(),
        finally: t.finally.as_ref().map(|f| f.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect()),
    }
}

fn stmt_loc(stmt: &Stmt) -> Loc {
    match stmt {
        Stmt::Block(b) => b.loc.clone(),
        Stmt::Expr(e) => e.loc().clone(),
        Stmt::Decl(d) => decl_loc(d),
        Stmt::If(i) => i.loc.clone(),
        Stmt::When(w) => w.loc.clone(),
        Stmt::For(f) => f.loc.clone(),
        Stmt::While(w) | Stmt::DoWhile(w) => w.condition.loc().clone(),
        Stmt::Try(t) => t.loc.clone(),
        Stmt::Return(Some(e)) => e.loc().clone(),
        Stmt::Throw(e) => e.loc().clone(),
        Stmt::Guard(g) => g.loc.clone(),
        Stmt::Use(u) => u.loc.clone(),
        Stmt::Return(None) | Stmt::Break(_) | Stmt::Continue(_) => Loc::unknown(),
    }
}

fn decl_loc(decl: &Decl) -> Loc {
    match decl {
        Decl::Class(c) | Decl::Interface(c) | Decl::Enum(c) | Decl::Object(c) | Decl::Annotation(c) => c.loc.clone(),
        Decl::Function(f) | Decl::Constructor(f) => f.loc.clone(),
        Decl::InitBlock(b) => b.loc.clone(),
        Decl::Property(p) => p.loc.clone(),
        Decl::Parameter(p) => p.loc.clone(),
        Decl::TypeAlias(t) => t.loc.clone(),
        Decl::Destructuring(d) => d.loc.clone(),
    }
}

// ------------------------------------------------------------------ expressions

fn lower_expr(ctx: &mut LoweringContext, expr: &Expr) -> HExpr {
    match expr {
        Expr::Literal(lit, loc) => HExpr::Literal(lit.clone(), loc.clone()),
        Expr::Identifier(id, loc) => HExpr::Identifier(*id, loc.clone()),
        Expr::This(loc) => HExpr::This(loc.clone()),
        Expr::Super(loc) => HExpr::Super(loc.clone()),
        Expr::Binary(op, l, r, loc) => HExpr::Binary(*op, Box::new(lower_expr(ctx, l)), Box::new(lower_expr(ctx, r)), loc.clone()),
        Expr::Unary(op, e, loc) => HExpr::Unary(*op, Box::new(lower_expr(ctx, e)), loc.clone()),
        Expr::Call(callee, args, loc) => lower_call(ctx, callee, args, loc),
        Expr::Index(base, idx, loc) => HExpr::Index(Box::new(lower_expr(ctx, base)), Box::new(lower_expr(ctx, idx)), loc.clone()),
        Expr::Member(base, name, loc) => HExpr::Member(Box::new(lower_expr(ctx, base)), *name, loc.clone()),
        Expr::Assign(target, op, value, loc) => lower_assign(ctx, target, *op, value, loc),
        Expr::Lambda(l) => HExpr::Lambda(HirLambda {
            params: l
                .params
                .iter()
                .map(|p| HirParam {
                    name: p.name,
                    ty: p.ty.clone(),
                    default: p.default.as_ref().map(|e| lower_expr(ctx, e)),
                    vararg: p.vararg,
                })
                .collect(),
            body: lower_function_body_stmts(ctx, &l.body),
            loc: l.loc.clone(),
        }),
        Expr::IfExpr(c, t, e, loc) => HExpr::If(Box::new(lower_expr(ctx, c)), Box::new(lower_expr(ctx, t)), Box::new(lower_expr(ctx, e)), loc.clone()),
        Expr::WhenExpr(w) => when_as_expr(ctx, w),
        Expr::TryExpr(t) => try_as_expr(ctx, t),
        Expr::Await(e, loc) => HExpr::Await(Box::new(lower_expr(ctx, e)), loc.clone()),
        Expr::TypeCheck(e, ty, negated, loc) => HExpr::TypeCheck(Box::new(lower_expr(ctx, e)), ty.clone(), *negated, loc.clone()),
        Expr::TypeCast(e, ty, loc) => HExpr::TypeCast(Box::new(lower_expr(ctx, e)), ty.clone(), loc.clone()),
        Expr::Range(a, b, exclusive, loc) => HExpr::Range(Box::new(lower_expr(ctx, a)), Box::new(lower_expr(ctx, b)), *exclusive, loc.clone()),
        Expr::Slice(base, start, end, loc) => lower_slice(ctx, base, start, end, loc),
        Expr::Spread(e, loc) => HExpr::Spread(Box::new(lower_expr(ctx, e)), loc.clone()),
        Expr::Pipeline(l, r, loc) => lower_pipeline(ctx, l, r, loc),
        Expr::MethodRef(e, name, loc) => HExpr::MethodRef(Box::new(lower_expr(ctx, e)), *name, loc.clone()),
        Expr::ObjectLiteral(fields, supertype, loc) => HExpr::ObjectLiteral(HirObjectLiteral {
            fields: fields.iter().map(|(n, e)| (*n, lower_expr(ctx, e))).collect(),
            supertype: supertype.clone(),
            loc: loc.clone(),
        }),
        Expr::CollectionLiteral(kind, items, loc) => lower_collection_literal(ctx, *kind, items, loc),
        Expr::StringInterpolation(parts, loc) => lower_string_interpolation(ctx, parts, loc),
        Expr::New(ty, args, loc) => HExpr::New(HirNew {
            ty: ty.clone(),
            args: args.iter().map(|a| lower_expr(ctx, a)).collect(),
            loc: loc.clone(),
        }),
        Expr::Placeholder(loc) => HExpr::Literal(Literal::Null, loc.clone()),
        Expr::Elvis(a, b, loc) => lower_elvis(ctx, a, b, loc),
        Expr::SafeCall(recv, selector, loc) => lower_safe_call(ctx, recv, selector, loc),
        Expr::SafeIndex(recv, index, loc) => lower_safe_index(ctx, recv, index, loc),
        Expr::NotNull(e, loc) => lower_not_null(ctx, e, loc),
        Expr::ErrorPropagation(e, loc) => lower_error_propagation(ctx, e, loc),
        Expr::ScopeShorthand(recv, body, loc) => lower_scope_shorthand(ctx, recv, body, loc),
        Expr::JumpAsExpr(stmt, loc) => {
            let stmts = lower_stmt(ctx, stmt);
            HExpr::Block(stmts, Box::new(HExpr::Literal(Literal::Null, loc.clone())), loc.clone())
        }
    }
}

fn lower_call(ctx: &mut LoweringContext, callee: &Expr, args: &[Expr], loc: &Loc) -> HExpr {
    // `a?.m(args)`: the parser encodes the receiver access itself as a
    // `SafeCall(a, Member(Placeholder, m))`; when it's the callee of an
    // outer `Call`, the args belong inside the null-guarded branch.
    if let Expr::SafeCall(recv, selector, safe_loc) = callee {
        let recv_val = lower_expr(ctx, recv);
        let (decl_t, t_ref) = ctx.bind_temp(recv_val, safe_loc.clone());
        let selector_on_t = substitute_placeholder(selector, &t_ref);
        let selector_h = lower_expr(ctx, &selector_on_t);
        let call = match selector_h {
            HExpr::Member(base, name, mloc) => HExpr::Call(HirCall {
                callee: Box::new(HExpr::Member(base, name, mloc.clone())),
                args: args.iter().map(|a| lower_expr(ctx, a)).collect(),
                loc: loc.clone(),
            }),
            other => other,
        };
        let cond = not_null_check(&t_ref, safe_loc.clone());
        let if_expr = HExpr::If(Box::new(cond), Box::new(call), Box::new(ctx.null_literal(loc.clone())), loc.clone());
        return HExpr::Block(vec![decl_t], Box::new(if_expr), loc.clone());
    }
    HExpr::Call(HirCall {
        callee: Box::new(lower_expr(ctx, callee)),
        args: args.iter().map(|a| lower_expr(ctx, a)).collect(),
        loc: loc.clone(),
    })
}

/// `x op= e` → `x = x op e`; arithmetic/logical compound ops only (elvis-
/// assign is parsed directly as `Assign(x, None, Elvis(x, e))` by the front
/// end, so it needs no special case here).
fn lower_assign(ctx: &mut LoweringContext, target: &Expr, op: Option<BinaryOp>, value: &Expr, loc: &Loc) -> HExpr {
    let target_h = lower_expr(ctx, target);
    let value_h = match op {
        None => lower_expr(ctx, value),
        Some(op) => HExpr::Binary(op, Box::new(target_h.clone()), Box::new(lower_expr(ctx, value)), loc.clone()),
    };
    HExpr::Assign(Box::new(target_h), Box::new(value_h), loc.clone())
}

fn lower_slice(ctx: &mut LoweringContext, base: &Expr, start: &Expr, end: &Expr, loc: &Loc) -> HExpr {
    let base_h = lower_expr(ctx, base);
    let end_h = if matches!(end, Expr::Placeholder(_)) {
        let size_name = ctx.table.intern("size");
        HExpr::Call(HirCall {
            callee: Box::new(HExpr::Member(Box::new(base_h.clone()), size_name, loc.clone())),
            args: Vec::new(),
            loc: loc.clone(),
        })
    } else {
        lower_expr(ctx, end)
    };
    let range = HExpr::Range(Box::new(lower_expr(ctx, start)), Box::new(end_h), true, loc.clone());
    HExpr::Index(Box::new(base_h), Box::new(range), loc.clone())
}

/// `a |> f(b,…)` → `f(a, b, …)`; a bare call to identifier `g` with only a
/// trailing lambda lowers as `a.g(lambda)`; a `_` placeholder among the
/// arguments marks where `a` is substituted instead of prepended.
fn lower_pipeline(ctx: &mut LoweringContext, left: &Expr, right: &Expr, loc: &Loc) -> HExpr {
    let l = lower_expr(ctx, left);
    match right {
        Expr::Call(callee, args, rloc) => {
            if args.iter().any(is_placeholder) {
                let mut used = false;
                let new_args = args
                    .iter()
                    .map(|a| {
                        if !used && is_placeholder(a) {
                            used = true;
                            l.clone()
                        } else {
                            lower_expr(ctx, a)
                        }
                    })
                    .collect();
                return HExpr::Call(HirCall {
                    callee: Box::new(lower_expr(ctx, callee)),
                    args: new_args,
                    loc: rloc.clone(),
                });
            }
            if args.len() == 1 && matches!(args[0], Expr::Lambda(_)) {
                if let Expr::Identifier(name, ident_loc) = callee.as_ref() {
                    let lambda = lower_expr(ctx, &args[0]);
                    return HExpr::Call(HirCall {
                        callee: Box::new(HExpr::Member(Box::new(l), *name, ident_loc.clone())),
                        args: vec![lambda],
                        loc: rloc.clone(),
                    });
                }
            }
            let mut new_args = vec![l];
            new_args.extend(args.iter().map(|a| lower_expr(ctx, a)));
            HExpr::Call(HirCall {
                callee: Box::new(lower_expr(ctx, callee)),
                args: new_args,
                loc: rloc.clone(),
            })
        }
        _ => HExpr::Call(HirCall {
            callee: Box::new(lower_expr(ctx, right)),
            args: vec![l],
            loc: loc.clone(),
        }),
    }
}

fn is_placeholder(e: &Expr) -> bool {
    matches!(e, Expr::Placeholder(_))
}

/// Replaces every `Placeholder` occurring in `expr` with `replacement`. Used
/// to resolve the parser's safe-call encoding, `SafeCall(a, Member(Placeholder, m))`.
fn substitute_placeholder(expr: &Expr, replacement: &HExpr) -> Expr {
    // `replacement` is already-lowered HIR; we splice it back in as an AST
    // node wrapper so the normal `lower_expr` path can re-lower the whole
    // selector uniformly. `HExpr` has no AST counterpart, so we stash it as
    // an opaque marker the lowerer recognizes.
    fn walk(expr: &Expr, replacement: &Expr) -> Expr {
        match expr {
            Expr::Placeholder(_) => replacement.clone(),
            Expr::Member(base, name, loc) => Expr::Member(Box::new(walk(base, replacement)), *name, loc.clone()),
            Expr::Call(callee, args, loc) => Expr::Call(
                Box::new(walk(callee, replacement)),
                args.iter().map(|a| walk(a, replacement)).collect(),
                loc.clone(),
            ),
            Expr::Index(base, idx, loc) => Expr::Index(Box::new(walk(base, replacement)), Box::new(walk(idx, replacement)), loc.clone()),
            other => other.clone(),
        }
    }
    // Bridge the already-lowered HExpr temp reference back into an AST
    // placeholder-shaped node: since a temp reference is always a bare
    // identifier, this round-trip is exact.
    let ident = match replacement {
        HExpr::Identifier(id, loc) => Expr::Identifier(*id, loc.clone()),
        _ => unreachable!("bind_temp always yields an Identifier reference"),
    };
    walk(expr, &ident)
}

/// `a ?: b` → `{ val t = a; if (t != null) t else b }`
fn lower_elvis(ctx: &mut LoweringContext, a: &Expr, b: &Expr, loc: &Loc) -> HExpr {
    let a_h = lower_expr(ctx, a);
    let (decl_t, t_ref) = ctx.bind_temp(a_h, loc.clone());
    let cond = not_null_check(&t_ref, loc.clone());
    let if_expr = HExpr::If(Box::new(cond), Box::new(t_ref), Box::new(lower_expr(ctx, b)), loc.clone());
    HExpr::Block(vec![decl_t], Box::new(if_expr), loc.clone())
}

/// `a?.m(args)` (bare, no call wrapping) / `a?.b` → `{ val t = a; if (t != null) t.b else null }`
fn lower_safe_call(ctx: &mut LoweringContext, recv: &Expr, selector: &Expr, loc: &Loc) -> HExpr {
    let recv_h = lower_expr(ctx, recv);
    let (decl_t, t_ref) = ctx.bind_temp(recv_h, loc.clone());
    let selector_on_t = substitute_placeholder(selector, &t_ref);
    let selector_h = lower_expr(ctx, &selector_on_t);
    let cond = not_null_check(&t_ref, loc.clone());
    let if_expr = HExpr::If(Box::new(cond), Box::new(selector_h), Box::new(ctx.null_literal(loc.clone())), loc.clone());
    HExpr::Block(vec![decl_t], Box::new(if_expr), loc.clone())
}

/// `a?[i]` → `{ val t = a; if (t != null) t[i] else null }`
fn lower_safe_index(ctx: &mut LoweringContext, recv: &Expr, index: &Expr, loc: &Loc) -> HExpr {
    let recv_h = lower_expr(ctx, recv);
    let (decl_t, t_ref) = ctx.bind_temp(recv_h, loc.clone());
    let index_h = lower_expr(ctx, index);
    let cond = not_null_check(&t_ref, loc.clone());
    let index_expr = HExpr::Index(Box::new(t_ref), Box::new(index_h), loc.clone());
    let if_expr = HExpr::If(Box::new(cond), Box::new(index_expr), Box::new(ctx.null_literal(loc.clone())), loc.clone());
    HExpr::Block(vec![decl_t], Box::new(if_expr), loc.clone())
}

/// `a!!` → `{ val t = a; if (t == null) throw NullPointerException(); t }`
fn lower_not_null(ctx: &mut LoweringContext, e: &Expr, loc: &Loc) -> HExpr {
    let e_h = lower_expr(ctx, e);
    let (decl_t, t_ref) = ctx.bind_temp(e_h, loc.clone());
    let cond = null_check(&t_ref, loc.clone());
    let npe_ty = TypeRef::Simple(ctx.table.intern("NullPointerException"), loc.clone());
    let throw = HStmt::Throw(HExpr::New(HirNew {
        ty: npe_ty,
        args: Vec::new(),
        loc: loc.clone(),
    }));
    let guard = HStmt::If(cond, Box::new(throw), None);
    HExpr::Block(vec![decl_t, guard], Box::new(t_ref), loc.clone())
}

/// `e?` (error propagation on a `Result`-typed expression) →
/// `{ val t = e; if (NovaResult.checkIsErr(t)) return t; t }`
fn lower_error_propagation(ctx: &mut LoweringContext, e: &Expr, loc: &Loc) -> HExpr {
    let e_h = lower_expr(ctx, e);
    let (decl_t, t_ref) = ctx.bind_temp(e_h, loc.clone());
    let runtime = ctx.table.intern("NovaResult");
    let check = ctx.table.intern("checkIsErr");
    let is_err = HExpr::Call(HirCall {
        callee: Box::new(HExpr::Member(Box::new(HExpr::Identifier(runtime, loc.clone())), check, loc.clone())),
        args: vec![t_ref.clone()],
        loc: loc.clone(),
    });
    let early_return = HStmt::Return(Some(t_ref.clone()));
    let guard = HStmt::If(is_err, Box::new(early_return), None);
    HExpr::Block(vec![decl_t, guard], Box::new(t_ref), loc.clone())
}

/// `obj?.{ body }` → `{ val t = obj; if (t != null) t.apply { body } else null }`
fn lower_scope_shorthand(ctx: &mut LoweringContext, recv: &Expr, body: &ast::Block, loc: &Loc) -> HExpr {
    let recv_h = lower_expr(ctx, recv);
    let (decl_t, t_ref) = ctx.bind_temp(recv_h, loc.clone());
    let apply_name = ctx.table.intern("apply");
    let lambda = HExpr::Lambda(HirLambda {
        params: Vec::new(),
        body: body.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect(),
        loc: loc.clone(),
    });
    let apply_call = HExpr::Call(HirCall {
        callee: Box::new(HExpr::Member(Box::new(t_ref.clone()), apply_name, loc.clone())),
        args: vec![lambda],
        loc: loc.clone(),
    });
    let cond = not_null_check(&t_ref, loc.clone());
    let if_expr = HExpr::If(Box::new(cond), Box::new(apply_call), Box::new(ctx.null_literal(loc.clone())), loc.clone());
    HExpr::Block(vec![decl_t], Box::new(if_expr), loc.clone())
}

/// `"…$x… ${e}…"` → left-folded `+` chain, typed `String`.
fn lower_string_interpolation(ctx: &mut LoweringContext, parts: &[InterpolationPart], loc: &Loc) -> HExpr {
    let lowered = parts
        .iter()
        .map(|part| match part {
            InterpolationPart::Literal(id) => HExpr::Literal(Literal::String(*id), loc.clone()),
            InterpolationPart::Expr(e) => lower_expr(ctx, e),
        })
        .collect();
    HExpr::StringConcat(lowered, loc.clone())
}

fn lower_collection_literal(ctx: &mut LoweringContext, kind: ast::CollectionKind, items: &[Expr], loc: &Loc) -> HExpr {
    let hir_kind = match kind {
        ast::CollectionKind::List => crate::hir::nodes::CollectionKind::List,
        ast::CollectionKind::Set => crate::hir::nodes::CollectionKind::Set,
        ast::CollectionKind::Map => crate::hir::nodes::CollectionKind::Map,
    };
    let spread_index = hir_kind == crate::hir::nodes::CollectionKind::Map && items.iter().any(|e| matches!(e, Expr::Spread(..)));
    HExpr::CollectionLiteral(HirCollectionLiteral {
        kind: hir_kind,
        elements: items.iter().map(|e| lower_expr(ctx, e)).collect(),
        spread_index,
        loc: loc.clone(),
    })
}

/// `when` used as an expression lowers the same way as the statement form,
/// wrapped in a `Block` whose tail is the chain's value; each arm body must
/// itself be expression-shaped (guaranteed by the parser for `when`-expr).
fn when_as_expr(ctx: &mut LoweringContext, w: &WhenStmt) -> HExpr {
    let loc = w.loc.clone();
    let subject_ref = w.subject.as_ref().map(|s| {
        let value = lower_expr(ctx, s);
        ctx.bind_temp(value, loc.clone())
    });

    let mut chain: Option<HExpr> = None;
    for arm in w.arms.iter().rev() {
        let body = arm_expr(ctx, &arm.body);
        chain = Some(match &arm.pattern {
            WhenPattern::Else => body,
            WhenPattern::Value(e) => {
                let cond = match &subject_ref {
                    Some((_, subject)) => HExpr::Binary(BinaryOp::Eq, Box::new(subject.clone()), Box::new(lower_expr(ctx, e)), arm.loc.clone()),
                    None => lower_expr(ctx, e),
                };
                let else_branch = chain.unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                HExpr::If(Box::new(cond), Box::new(body), Box::new(else_branch), arm.loc.clone())
            }
            WhenPattern::Type(ty) => {
                let subject = subject_ref.as_ref().map(|(_, s)| s.clone()).unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                let cond = HExpr::TypeCheck(Box::new(subject), ty.clone(), false, arm.loc.clone());
                let else_branch = chain.unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                HExpr::If(Box::new(cond), Box::new(body), Box::new(else_branch), arm.loc.clone())
            }
            WhenPattern::InRange(range) => {
                let subject = subject_ref.as_ref().map(|(_, s)| s.clone()).unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                let cond = HExpr::Binary(BinaryOp::In, Box::new(subject), Box::new(lower_expr(ctx, range)), arm.loc.clone());
                let else_branch = chain.unwrap_or_else(|| ctx.null_literal(arm.loc.clone()));
                HExpr::If(Box::new(cond), Box::new(body), Box::new(else_branch), arm.loc.clone())
            }
        });
    }
    let chain = chain.unwrap_or_else(|| ctx.null_literal(loc.clone()));
    match subject_ref {
        Some((decl, _)) => HExpr::Block(vec![decl], Box::new(chain), loc),
        None => chain,
    }
}

fn arm_expr(ctx: &mut LoweringContext, stmt: &Stmt) -> HExpr {
    match stmt {
        Stmt::Expr(e) => lower_expr(ctx, e),
        other => {
            let stmts = lower_stmt(ctx, other);
            HExpr::Block(stmts, Box::new(HExpr::Literal(Literal::Null, Loc::unknown())), Loc::unknown())
        }
    }
}

/// `try { … } catch … finally …` as an expression →
/// `{ var t = null; try/catch assign last expr of each branch to t; t }`
fn try_as_expr(ctx: &mut LoweringContext, t: &TryStmt) -> HExpr {
    let loc = t.loc.clone();
    let result_name = ctx.fresh_temp_name();
    let decl_t = HStmt::Decl(HirDeclStmt {
        name: result_name,
        mutable: true,
        ty: None,
        initializer: ctx.null_literal(loc.clone()),
    });

    let body = assign_tail(ctx, &t.body.stmts, result_name, &loc);
    let catches = t
        .catches
        .iter()
        .map(|c| HirCatch {
            param_name: c.param_name,
            param_type: c.param_type.clone(),
            body: assign_tail(ctx, &c.body.stmts, result_name, &loc),
        })
        .collect();
    let finally = t.finally.as_ref().map(|f| f.stmts.iter().flat_map(|s| lower_stmt(ctx, s)).collect());

    let try_stmt = HStmt::Try(HirTry { body, catches, finally });
    HExpr::Block(vec![decl_t, try_stmt], Box::new(HExpr::Identifier(result_name, loc.clone())), loc)
}

/// Lowers a statement list, rewriting its final `Stmt::Expr` (if any) into an
/// assignment to `result_name` so the branch's value survives the statement
/// form `HirTry` requires.
fn assign_tail(ctx: &mut LoweringContext, stmts: &[Stmt], result_name: StringId, loc: &Loc) -> Vec<HStmt> {
    let mut lowered: Vec<HStmt> = Vec::new();
    for (index, stmt) in stmts.iter().enumerate() {
        if index == stmts.len() - 1 {
            if let Stmt::Expr(e) = stmt {
                let value = lower_expr(ctx, e);
                let target = HExpr::Identifier(result_name, loc.clone());
                lowered.push(HStmt::Expr(HExpr::Assign(Box::new(target), Box::new(value), loc.clone())));
                continue;
            }
        }
        lowered.extend(lower_stmt(ctx, stmt));
    }
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::string_interning::StringTable;

    fn empty_loc() -> Loc {
        Loc::unknown()
    }

    #[test]
    fn destructuring_produces_component_calls_and_skips_underscore() {
        let mut table = StringTable::new();
        let a = table.intern("a");
        let init = Expr::Identifier(table.intern("pair"), empty_loc());
        let decl = DestructuringDecl {
            names: vec![Some(a), None],
            initializer: Box::new(init),
            loc: empty_loc(),
        };
        let mut ctx = LoweringContext::new(&mut table);
        let stmts = lower_destructuring(&mut ctx, &decl);
        // one temp decl + one component decl (the `_` name is skipped)
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn elvis_lowers_to_block_with_if_expr() {
        let mut table = StringTable::new();
        let a = Expr::Identifier(table.intern("a"), empty_loc());
        let b = Expr::Literal(Literal::Int(0), empty_loc());
        let mut ctx = LoweringContext::new(&mut table);
        let lowered = lower_expr(&mut ctx, &Expr::Elvis(Box::new(a), Box::new(b), empty_loc()));
        assert!(matches!(lowered, HExpr::Block(_, _, _)));
    }

    #[test]
    fn safe_call_as_bare_member_access_wraps_in_null_check() {
        let mut table = StringTable::new();
        let recv = Expr::Identifier(table.intern("obj"), empty_loc());
        let selector = Expr::Member(Box::new(Expr::Placeholder(empty_loc())), table.intern("field"), empty_loc());
        let mut ctx = LoweringContext::new(&mut table);
        let lowered = lower_expr(&mut ctx, &Expr::SafeCall(Box::new(recv), Box::new(selector), empty_loc()));
        match lowered {
            HExpr::Block(_, tail, _) => assert!(matches!(*tail, HExpr::If(..))),
            _ => panic!("expected a block"),
        }
    }

    #[test]
    fn script_main_merges_fields_and_body_in_source_order() {
        let mut table = StringTable::new();
        let file = std::path::PathBuf::from("t.nv");
        let parsed = crate::parser::parse("val x = 1 + 2", &file, &mut table);
        let hir = lower_program(&parsed.program, &mut table);
        assert_eq!(hir.functions.len(), 1);
        assert_eq!(table.resolve(hir.functions[0].name), "main");
        assert_eq!(hir.functions[0].body.len(), 1);
    }
}

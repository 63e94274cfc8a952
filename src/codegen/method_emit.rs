//! Method body emission (§4.3 Method emission / Instruction emission): walks
//! one `MirFunction`'s blocks into a JVM `Code` attribute, applying the
//! int-local-promotion and compare-branch-fusion decisions as it goes.

use rustc_hash::FxHashMap;

use crate::ast::{BinaryOp, Literal, Modifier, UnaryOp};
use crate::codegen::bytecode::{op, MethodAsm};
use crate::codegen::class_file::{CodeAttribute, ConstantPool, ExceptionTableEntry};
use crate::codegen::descriptors::{self, OBJECT_DESC, OBJECT_INTERNAL, STRING_INTERNAL, THROWABLE_INTERNAL};
use crate::codegen::fusion::{self, OperandKind};
use crate::codegen::int_locals;
use crate::codegen::prescan::PreScan;
use crate::codegen::runtime_contract as rc;
use crate::codegen_log;
use crate::compiler_messages::compiler_errors::Diagnostic;
use crate::mir::{BlockId, CollectionKind, LocalId, MirFunction, MirInst, Operand, Terminator};
use crate::string_interning::{StringId, StringTable};

pub struct MethodBody {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub code: CodeAttribute,
}

struct Ctx<'a> {
    asm: MethodAsm,
    pool: &'a mut ConstantPool,
    prescan: &'a PreScan,
    table: &'a StringTable,
    slots: Vec<u16>,
    promoted: std::collections::HashSet<LocalId>,
    owner_internal: String,
    owner_class: StringId,
}

impl<'a> Ctx<'a> {
    fn slot(&self, id: LocalId) -> u16 {
        self.slots[id.0 as usize]
    }

    fn is_promoted(&self, id: LocalId) -> bool {
        self.promoted.contains(&id)
    }

    fn name_of(&self, id: StringId) -> &str {
        id.resolve(self.table)
    }
}

/// Top-level entry: emits one method's `Code` attribute and descriptor.
/// `owner_internal` is the JVM internal name of the declaring class;
/// `is_static` reflects the method's own `static` modifier (or `true` for a
/// top-level `$Module` function).
pub fn emit_method(
    f: &MirFunction,
    owner_internal: &str,
    owner_class: StringId,
    is_static: bool,
    pool: &mut ConstantPool,
    prescan: &PreScan,
    table: &StringTable,
) -> Result<MethodBody, Diagnostic> {
    codegen_log!("emit_method: {} blocks on {}", f.blocks.len(), owner_internal);
    let is_delegating_ctor = f.is_constructor && f.delegate_args.is_some();
    let promoted = int_locals::promote_int_locals(f, is_delegating_ctor, table);
    let slots = compute_slots(f, is_static);

    let mut ctx = Ctx {
        asm: MethodAsm::new(),
        pool,
        prescan,
        table,
        slots,
        promoted,
        owner_internal: owner_internal.to_string(),
        owner_class,
    };

    let name = method_name(f, table);
    let descriptor = f
        .descriptor_override
        .clone()
        .unwrap_or_else(|| default_descriptor(f));

    emit_param_unboxing(f, &mut ctx);
    if f.is_constructor {
        emit_constructor_preamble(f, &mut ctx);
    }
    emit_local_preinit(f, &mut ctx);

    for block in &f.blocks {
        ctx.asm.label(block.id);
        emit_catch_store(block.id, f, &mut ctx);

        let fused = fusion::detect_fusion(block);
        let body_len = if fused.is_some() { block.instructions.len() - 1 } else { block.instructions.len() };
        for inst in &block.instructions[..body_len] {
            emit_inst(inst, &mut ctx)?;
        }
        if let Some(fused) = fused {
            emit_fused_branch(&fused, &mut ctx);
        } else {
            emit_terminator(&block.terminator, f, &mut ctx);
        }
    }

    let code = ctx.asm.assemble();
    let exception_table = build_exception_table(f, &ctx);

    let mut access_flags = 0u16;
    if f.modifiers.contains(&Modifier::Public) || !f.modifiers.contains(&Modifier::Private) {
        access_flags |= crate::codegen::class_file::ACC_PUBLIC;
    }
    if f.modifiers.contains(&Modifier::Private) {
        access_flags &= !crate::codegen::class_file::ACC_PUBLIC;
        access_flags |= crate::codegen::class_file::ACC_PRIVATE;
    }
    if is_static {
        access_flags |= crate::codegen::class_file::ACC_STATIC;
    }
    if f.modifiers.contains(&Modifier::Abstract) {
        access_flags |= crate::codegen::class_file::ACC_ABSTRACT;
    }

    Ok(MethodBody {
        access_flags,
        name,
        descriptor,
        code: CodeAttribute {
            max_stack: ctx.asm.max_stack(),
            max_locals: (ctx.slots.len() as u16).max(1) + if is_static { 0 } else { 1 },
            code,
            exception_table,
        },
    })
}

fn method_name(f: &MirFunction, table: &StringTable) -> String {
    if f.is_constructor {
        "<init>".to_string()
    } else {
        f.name.resolve(table).to_string()
    }
}

fn default_descriptor(f: &MirFunction) -> String {
    let is_void = f.is_constructor || f.return_type.is_none();
    descriptors::default_method_descriptor(f.params.len(), is_void)
}

fn compute_slots(f: &MirFunction, is_static: bool) -> Vec<u16> {
    let mut next: u16 = if is_static { 0 } else { 1 };
    f.locals
        .iter()
        .map(|_| {
            let s = next;
            next += 1;
            s
        })
        .collect()
}

/// §4.3 method emission step 3: unbox promoted parameters at entry.
fn emit_param_unboxing(f: &MirFunction, ctx: &mut Ctx) {
    let is_delegating = f.is_constructor && f.delegate_args.is_some();
    if is_delegating {
        return; // demoted from the promoted set already, nothing to unbox
    }
    for (i, _) in f.params.iter().enumerate() {
        let id = LocalId(i as u32);
        if ctx.is_promoted(id) {
            let slot = ctx.slot(id);
            ctx.asm.op1(op::ALOAD, slot as u8, 1);
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "intValue", "()I");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 0);
            ctx.asm.op1(op::ISTORE, slot as u8, -1);
        }
    }
}

/// §4.3 method emission step 5: constructor delegation/super chaining.
fn emit_constructor_preamble(f: &MirFunction, ctx: &mut Ctx) {
    ctx.asm.op(op::ALOAD_0, 1);
    if let Some(args) = &f.delegate_args {
        for a in args {
            load_object(a, ctx);
        }
        let desc = descriptors::default_ctor_descriptor(args.len());
        let owner = ctx.owner_internal.clone();
        let m = ctx.pool.methodref(&owner, "<init>", &desc);
        ctx.asm.op2(op::INVOKESPECIAL, m, -(args.len() as i32) - 1);
    } else if let Some(args) = &f.super_args {
        for a in args {
            load_object(a, ctx);
        }
        let desc = descriptors::default_ctor_descriptor(args.len());
        let super_internal = ctx
            .prescan
            .superclass_of(ctx.owner_class)
            .map(|s| descriptors::internal_name_of(ctx.name_of(s)))
            .unwrap_or_else(|| OBJECT_INTERNAL.to_string());
        let m = ctx.pool.methodref(&super_internal, "<init>", &desc);
        ctx.asm.op2(op::INVOKESPECIAL, m, -(args.len() as i32) - 1);
    } else {
        let m = ctx.pool.methodref(OBJECT_INTERNAL, "<init>", "()V");
        ctx.asm.op2(op::INVOKESPECIAL, m, -1);
    }
}

/// §4.3 method emission step 7: pre-initialize every non-parameter local so
/// the verifier sees a defined value on every path.
fn emit_local_preinit(f: &MirFunction, ctx: &mut Ctx) {
    for i in f.params.len()..f.locals.len() {
        let id = LocalId(i as u32);
        let slot = ctx.slot(id);
        if ctx.is_promoted(id) {
            ctx.asm.op(op::ICONST_0, 1);
            ctx.asm.op1(op::ISTORE, slot as u8, -1);
        } else {
            ctx.asm.op(op::ACONST_NULL, 1);
            ctx.asm.op1(op::ASTORE, slot as u8, -1);
        }
    }
}

/// §4.3 method emission step 8: a catch-handler block stores its incoming
/// exception to the try-table entry's configured local before its own
/// instructions run.
fn emit_catch_store(block: BlockId, f: &MirFunction, ctx: &mut Ctx) {
    if let Some(entry) = f.try_table.iter().find(|e| e.handler == block) {
        // The JVM pushes the caught throwable onto an otherwise-empty operand
        // stack when control enters a handler block (JVMS §3.12), so the
        // `astore` here is the block's first instruction with no preceding load.
        let slot = ctx.slot(entry.exception_local);
        ctx.asm.op1(op::ASTORE, slot as u8, 0);
    }
}

fn build_exception_table(f: &MirFunction, ctx: &Ctx) -> Vec<ExceptionTableEntry> {
    let offsets = ctx.asm.label_offsets();
    f.try_table
        .iter()
        .filter_map(|e| {
            let start = *offsets.get(&e.start)?;
            let end = *offsets.get(&e.end)?;
            let handler = *offsets.get(&e.handler)?;
            let catch_type = match &e.exception_type {
                Some(ty) => ctx.pool.class(&descriptors::internal_name_of(
                    &descriptors::type_ref_descriptor(ty, ctx.table).trim_matches(|c| c == 'L' || c == ';'),
                )),
                None => 0,
            };
            Some(ExceptionTableEntry {
                start_pc: start as u16,
                end_pc: end as u16,
                handler_pc: handler as u16,
                catch_type,
            })
        })
        .collect()
}

// --------------------------------------------------------------- operands

fn push_int_const(v: i64, ctx: &mut Ctx) {
    match v {
        -1 => ctx.asm.op(op::ICONST_M1, 1),
        0..=5 => ctx.asm.op(op::ICONST_0 + v as u8, 1),
        -128..=127 => ctx.asm.op_signed1(op::BIPUSH, v as i8, 1),
        -32768..=32767 => ctx.asm.op_signed2(op::SIPUSH, v as i16, 1),
        _ => {
            let idx = ctx.pool.integer(v as i32);
            ctx.asm.op1(op::LDC, idx as u8, 1);
        }
    }
}

fn box_int(ctx: &mut Ctx) {
    let m = ctx.pool.methodref("java/lang/Integer", "valueOf", "(I)Ljava/lang/Integer;");
    ctx.asm.op2(op::INVOKESTATIC, m, 0);
}

/// Loads `op` onto the stack as a boxed `Object`.
fn load_object(operand: &Operand, ctx: &mut Ctx) {
    match operand {
        Operand::This => ctx.asm.op(op::ALOAD_0, 1),
        Operand::Local(id) => {
            let slot = ctx.slot(*id);
            if ctx.is_promoted(*id) {
                ctx.asm.op1(op::ILOAD, slot as u8, 1);
                box_int(ctx);
            } else {
                ctx.asm.op1(op::ALOAD, slot as u8, 1);
            }
        }
        Operand::Const(lit) => load_const_boxed(lit, ctx),
    }
}

fn load_const_boxed(lit: &Literal, ctx: &mut Ctx) {
    match lit {
        Literal::Null => ctx.asm.op(op::ACONST_NULL, 1),
        Literal::Bool(b) => {
            ctx.asm.op(if *b { op::ICONST_0 + 1 } else { op::ICONST_0 }, 1);
            let m = ctx.pool.methodref("java/lang/Boolean", "valueOf", "(Z)Ljava/lang/Boolean;");
            ctx.asm.op2(op::INVOKESTATIC, m, 0);
        }
        Literal::Int(v) => {
            push_int_const(*v, ctx);
            box_int(ctx);
        }
        Literal::Long(v) => {
            let idx = ctx.pool.long(*v);
            ctx.asm.op2(op::LDC2_W, idx, 2);
            let m = ctx.pool.methodref("java/lang/Long", "valueOf", "(J)Ljava/lang/Long;");
            ctx.asm.op2(op::INVOKESTATIC, m, -1);
        }
        Literal::Float(v) => {
            let idx = ctx.pool.float(*v);
            ctx.asm.op1(op::LDC, idx as u8, 1);
            let m = ctx.pool.methodref("java/lang/Float", "valueOf", "(F)Ljava/lang/Float;");
            ctx.asm.op2(op::INVOKESTATIC, m, 0);
        }
        Literal::Double(v) => {
            let idx = ctx.pool.double(*v);
            ctx.asm.op2(op::LDC2_W, idx, 2);
            let m = ctx.pool.methodref("java/lang/Double", "valueOf", "(D)Ljava/lang/Double;");
            ctx.asm.op2(op::INVOKESTATIC, m, -1);
        }
        Literal::Char(c) => {
            push_int_const(*c as i64, ctx);
            let m = ctx.pool.methodref("java/lang/Character", "valueOf", "(C)Ljava/lang/Character;");
            ctx.asm.op2(op::INVOKESTATIC, m, 0);
        }
        Literal::String(s) => {
            let idx = ctx.pool.string(s.resolve(ctx.table));
            ctx.asm.op1(op::LDC, idx as u8, 1);
        }
    }
}

/// Loads `operand` onto the stack as a raw `int`.
fn load_int(operand: &Operand, ctx: &mut Ctx) {
    match operand {
        Operand::Const(Literal::Int(v)) => push_int_const(*v, ctx),
        Operand::Local(id) if ctx.is_promoted(*id) => {
            let slot = ctx.slot(*id);
            ctx.asm.op1(op::ILOAD, slot as u8, 1);
        }
        other => {
            load_object(other, ctx);
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "intValue", "()I");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 0);
        }
    }
}

fn store_result(dst: LocalId, ctx: &mut Ctx, value_is_boxed: bool) {
    let slot = ctx.slot(dst);
    if ctx.is_promoted(dst) {
        if value_is_boxed {
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "intValue", "()I");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 0);
        }
        ctx.asm.op1(op::ISTORE, slot as u8, -1);
    } else {
        if !value_is_boxed {
            box_int(ctx);
        }
        ctx.asm.op1(op::ASTORE, slot as u8, -1);
    }
}

// -------------------------------------------------------------- instructions

fn emit_inst(inst: &MirInst, ctx: &mut Ctx) -> Result<(), Diagnostic> {
    match inst {
        MirInst::Nop => ctx.asm.op(op::NOP, 0),
        MirInst::Assign { dst, src } => {
            if ctx.is_promoted(*dst) {
                load_int(src, ctx);
                store_result(*dst, ctx, false);
            } else {
                load_object(src, ctx);
                store_result(*dst, ctx, true);
            }
        }
        MirInst::BinOp { dst, op: bop, lhs, rhs } => emit_binop(*dst, *bop, lhs, rhs, ctx),
        MirInst::UnOp { dst, op: uop, operand } => emit_unop(*dst, *uop, operand, ctx),
        MirInst::Call { dst, receiver, owner, method, args, is_static } => {
            emit_call(*dst, receiver.as_ref(), *owner, *method, args, *is_static, ctx)
        }
        MirInst::New { dst, ty, args } => emit_new(*dst, ty, args, ctx)?,
        MirInst::GetField { dst, receiver, owner, field } => emit_get_field(*dst, receiver, *owner, *field, ctx),
        MirInst::SetField { receiver, owner, field, value } => emit_set_field(receiver, *owner, *field, value, ctx),
        MirInst::GetStatic { dst, owner, field } => emit_get_static(*dst, *owner, *field, ctx),
        MirInst::SetStatic { owner, field, value } => emit_set_static(*owner, *field, value, ctx),
        MirInst::ArrayGet { dst, array, index } => emit_array_get(*dst, array, index, ctx),
        MirInst::ArraySet { array, index, value } => emit_array_set(array, index, value, ctx),
        MirInst::RuntimeCall { dst, helper, args } => emit_runtime_call(*dst, *helper, args, ctx),
        MirInst::InstanceOf { dst, value, ty, negated } => emit_instanceof(*dst, value, ty, *negated, ctx),
        MirInst::Cast { dst, value, ty } => emit_cast(*dst, value, ty, ctx),
        MirInst::Box { dst, value } => {
            load_int(value, ctx);
            box_int(ctx);
            store_result(*dst, ctx, true);
        }
        MirInst::Unbox { dst, value } => {
            load_object(value, ctx);
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "intValue", "()I");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 0);
            store_result(*dst, ctx, false);
        }
        MirInst::StringConcat { dst, parts } => emit_string_concat(*dst, parts, ctx),
        MirInst::BuildCollection { dst, kind, elements } => emit_build_collection(*dst, *kind, elements, ctx),
        MirInst::MethodHandle { dst, owner, method } => emit_method_handle(*dst, *owner, *method, ctx),
        MirInst::AnnotationTrigger { annotation, target } => emit_annotation_trigger(*annotation, *target, ctx),
    }
    Ok(())
}

fn emit_binop(dst: LocalId, bop: BinaryOp, lhs: &Operand, rhs: &Operand, ctx: &mut Ctx) {
    if fusion::is_comparison(bop) {
        emit_unfused_comparison(dst, bop, lhs, rhs, ctx);
        return;
    }
    if matches!(bop, BinaryOp::And | BinaryOp::Or) {
        // Lowered into branches by the HIR desugarer in the common case; a
        // direct BinOp here means both sides are plain booleans.
        load_int(lhs, ctx);
        load_int(rhs, ctx);
        ctx.asm.op(if bop == BinaryOp::And { op::IAND } else { op::IOR }, -1);
        store_result(dst, ctx, false);
        return;
    }
    if bop == BinaryOp::Add && is_string_operand(lhs) || bop == BinaryOp::Add && is_string_operand(rhs) {
        emit_string_concat(dst, &[lhs.clone(), rhs.clone()], ctx);
        return;
    }
    if bop == BinaryOp::Add && !(operand_is_known_numeric(lhs, ctx) && operand_is_known_numeric(rhs, ctx)) {
        load_object(lhs, ctx);
        load_object(rhs, ctx);
        let m = ctx.pool.methodref(rc::NOVA_OPS, rc::NOVA_OPS_ADD, rc::NOVA_OPS_ADD_DESC);
        ctx.asm.op2(op::INVOKESTATIC, m, -1);
        store_result(dst, ctx, true);
        return;
    }

    load_int(lhs, ctx);
    load_int(rhs, ctx);
    let opcode = match bop {
        BinaryOp::Add => op::IADD,
        BinaryOp::Sub => op::ISUB,
        BinaryOp::Mul => op::IMUL,
        BinaryOp::Div => op::IDIV,
        BinaryOp::Rem => op::IREM,
        BinaryOp::BitAnd => op::IAND,
        BinaryOp::BitOr => op::IOR,
        BinaryOp::BitXor => op::IXOR,
        BinaryOp::Shl => op::ISHL,
        BinaryOp::Shr => op::ISHR,
        BinaryOp::UShr => op::IUSHR,
        _ => op::IADD,
    };
    ctx.asm.op(opcode, -1);
    store_result(dst, ctx, false);
}

fn is_string_operand(op: &Operand) -> bool {
    matches!(op, Operand::Const(Literal::String(_)))
}

/// A deliberately conservative check: only literal non-string constants are
/// "known numeric" without a runtime type test, so a comparison/arithmetic
/// op between two locals of unproven type takes the dynamic `NovaOps.add`
/// path rather than risk an invalid `IADD` on genuinely dynamic operands.
fn operand_is_known_numeric(operand: &Operand, ctx: &Ctx) -> bool {
    match operand {
        Operand::Const(Literal::Int(_) | Literal::Long(_) | Literal::Float(_) | Literal::Double(_)) => true,
        Operand::Local(id) => ctx.is_promoted(*id),
        _ => false,
    }
}

fn emit_unfused_comparison(dst: LocalId, bop: BinaryOp, lhs: &Operand, rhs: &Operand, ctx: &mut Ctx) {
    let after = FakeBlock::alloc();
    let set_true = FakeBlock::alloc();
    emit_compare_jump(bop, lhs, rhs, ctx, set_true);
    ctx.asm.op(op::ICONST_0, 1);
    box_int_as_boolean(ctx);
    store_result(dst, ctx, true);
    ctx.asm.branch(op::GOTO, after, 0);
    ctx.asm.label(set_true);
    ctx.asm.op(1, 1); // iconst_1
    box_int_as_boolean(ctx);
    store_result(dst, ctx, true);
    ctx.asm.label(after);
}

fn box_int_as_boolean(ctx: &mut Ctx) {
    let m = ctx.pool.methodref("java/lang/Boolean", "valueOf", "(Z)Ljava/lang/Boolean;");
    ctx.asm.op2(op::INVOKESTATIC, m, 0);
}

/// A module-private counter for synthetic "fake" blocks used only to carry
/// jump targets inside a single instruction's expansion (boolean
/// materialization, object-equality helpers); never a real `MirBlock`.
struct FakeBlock;
impl FakeBlock {
    fn alloc() -> BlockId {
        use std::sync::atomic::{AtomicU32, Ordering};
        static NEXT: AtomicU32 = AtomicU32::new(1_000_000_000);
        BlockId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Emits operand loads plus the comparison jump to `target` for an unfused
/// comparison, dispatching on the numeric ladder exactly as the fused path
/// does (§4.3.5).
fn emit_compare_jump(bop: BinaryOp, lhs: &Operand, rhs: &Operand, ctx: &mut Ctx, target: BlockId) {
    let kind = resolve_kind(lhs, rhs, ctx);
    match kind {
        OperandKind::Object => {
            load_object(lhs, ctx);
            load_object(rhs, ctx);
            match bop {
                BinaryOp::Eq | BinaryOp::Ne => {
                    let m = ctx.pool.methodref("java/util/Objects", "equals", "(Ljava/lang/Object;Ljava/lang/Object;)Z");
                    ctx.asm.op2(op::INVOKESTATIC, m, -1);
                    ctx.asm.branch(if bop == BinaryOp::Eq { op::IFNE } else { op::IFEQ }, target, -1);
                }
                _ => {
                    let cast = ctx.pool.class("java/lang/Comparable");
                    // receiver already on stack as lhs; swap not modeled, use invokeinterface
                    let m = ctx.pool.interface_methodref("java/lang/Comparable", "compareTo", "(Ljava/lang/Object;)I");
                    let _ = cast;
                    ctx.asm.invoke_interface(m, 2, -1);
                    let jump = match bop {
                        BinaryOp::Lt => op::IFLT,
                        BinaryOp::Le => op::IFLE,
                        BinaryOp::Gt => op::IFGT,
                        BinaryOp::Ge => op::IFGE,
                        _ => op::IFNE,
                    };
                    ctx.asm.branch(jump, target, -1);
                }
            }
        }
        OperandKind::Long => {
            load_long(lhs, ctx);
            load_long(rhs, ctx);
            ctx.asm.op(op::LCMP, -3);
            ctx.asm.branch(int_compare_opcode(bop), target, -1);
        }
        OperandKind::Float => {
            load_float(lhs, ctx);
            load_float(rhs, ctx);
            let opcode = if matches!(bop, BinaryOp::Lt | BinaryOp::Le) { op::FCMPG } else { op::FCMPL };
            ctx.asm.op(opcode, -1);
            ctx.asm.branch(int_compare_opcode(bop), target, -1);
        }
        OperandKind::Double => {
            load_double(lhs, ctx);
            load_double(rhs, ctx);
            let opcode = if matches!(bop, BinaryOp::Lt | BinaryOp::Le) { op::DCMPG } else { op::DCMPL };
            ctx.asm.op(opcode, -3);
            ctx.asm.branch(int_compare_opcode(bop), target, -1);
        }
        OperandKind::Int => {
            if fusion::is_const_zero(rhs) {
                load_int(lhs, ctx);
                ctx.asm.branch(single_compare_opcode(bop), target, -1);
            } else if fusion::is_const_zero(lhs) {
                load_int(rhs, ctx);
                ctx.asm.branch(single_compare_opcode(fusion::reverse(bop)), target, -1);
            } else {
                load_int(lhs, ctx);
                load_int(rhs, ctx);
                ctx.asm.branch(icmp_opcode(bop), target, -2);
            }
        }
    }
}

fn resolve_kind(lhs: &Operand, rhs: &Operand, ctx: &Ctx) -> OperandKind {
    let a = operand_kind(lhs, ctx);
    let b = operand_kind(rhs, ctx);
    fusion::numeric_ladder(a, b)
}

fn operand_kind(operand: &Operand, ctx: &Ctx) -> OperandKind {
    match operand {
        Operand::Const(Literal::Int(_)) => OperandKind::Int,
        Operand::Const(Literal::Long(_)) => OperandKind::Long,
        Operand::Const(Literal::Float(_)) => OperandKind::Float,
        Operand::Const(Literal::Double(_)) => OperandKind::Double,
        Operand::Local(id) if ctx.is_promoted(*id) => OperandKind::Int,
        _ => OperandKind::Object,
    }
}

fn load_long(operand: &Operand, ctx: &mut Ctx) {
    match operand {
        Operand::Const(Literal::Long(v)) => {
            let idx = ctx.pool.long(*v);
            ctx.asm.op2(op::LDC2_W, idx, 2);
        }
        _ => {
            load_object(operand, ctx);
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "longValue", "()J");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 1);
        }
    }
}

fn load_float(operand: &Operand, ctx: &mut Ctx) {
    match operand {
        Operand::Const(Literal::Float(v)) => {
            let idx = ctx.pool.float(*v);
            ctx.asm.op1(op::LDC, idx as u8, 1);
        }
        _ => {
            load_object(operand, ctx);
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "floatValue", "()F");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 0);
        }
    }
}

fn load_double(operand: &Operand, ctx: &mut Ctx) {
    match operand {
        Operand::Const(Literal::Double(v)) => {
            let idx = ctx.pool.double(*v);
            ctx.asm.op2(op::LDC2_W, idx, 2);
        }
        _ => {
            load_object(operand, ctx);
            let cast = ctx.pool.class("java/lang/Number");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Number", "doubleValue", "()D");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 1);
        }
    }
}

fn icmp_opcode(bop: BinaryOp) -> u8 {
    match bop {
        BinaryOp::Eq => op::IF_ICMPEQ,
        BinaryOp::Ne => op::IF_ICMPNE,
        BinaryOp::Lt => op::IF_ICMPLT,
        BinaryOp::Le => op::IF_ICMPLE,
        BinaryOp::Gt => op::IF_ICMPGT,
        BinaryOp::Ge => op::IF_ICMPGE,
        _ => op::IF_ICMPEQ,
    }
}

fn single_compare_opcode(bop: BinaryOp) -> u8 {
    match bop {
        BinaryOp::Eq => op::IFEQ,
        BinaryOp::Ne => op::IFNE,
        BinaryOp::Lt => op::IFLT,
        BinaryOp::Le => op::IFLE,
        BinaryOp::Gt => op::IFGT,
        BinaryOp::Ge => op::IFGE,
        _ => op::IFEQ,
    }
}

fn int_compare_opcode(bop: BinaryOp) -> u8 {
    single_compare_opcode(bop)
}

fn emit_unop(dst: LocalId, uop: UnaryOp, operand: &Operand, ctx: &mut Ctx) {
    match uop {
        UnaryOp::Neg => {
            load_int(operand, ctx);
            ctx.asm.op(op::INEG, 0);
            store_result(dst, ctx, false);
        }
        UnaryOp::BNot => {
            load_int(operand, ctx);
            push_int_const(-1, ctx);
            ctx.asm.op(op::IXOR, -1);
            store_result(dst, ctx, false);
        }
        UnaryOp::Not => {
            load_object(operand, ctx);
            let cast = ctx.pool.class("java/lang/Boolean");
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            let m = ctx.pool.methodref("java/lang/Boolean", "booleanValue", "()Z");
            ctx.asm.op2(op::INVOKEVIRTUAL, m, 0);
            push_int_const(1, ctx);
            ctx.asm.op(op::IXOR, -1);
            box_int_as_boolean(ctx);
            store_result(dst, ctx, true);
        }
    }
}

fn emit_call(
    dst: Option<LocalId>,
    receiver: Option<&Operand>,
    owner: StringId,
    method: StringId,
    args: &[Operand],
    is_static: bool,
    ctx: &mut Ctx,
) {
    let owner_name = ctx.name_of(owner).to_string();
    let method_name = ctx.name_of(method).to_string();
    let desc = descriptors::default_method_descriptor(args.len(), dst.is_none());

    let mut stack_delta = 0i32;
    if let Some(r) = receiver {
        load_object(r, ctx);
        let cast = ctx.pool.class(&owner_name);
        ctx.asm.op2(op::CHECKCAST, cast, 0);
        stack_delta -= 1;
    }
    for a in args {
        load_object(a, ctx);
        stack_delta -= 1;
    }

    if is_static {
        let m = ctx.pool.methodref(&owner_name, &method_name, &desc);
        ctx.asm.op2(op::INVOKESTATIC, m, stack_delta);
    } else {
        let m = ctx.pool.methodref(&owner_name, &method_name, &desc);
        ctx.asm.op2(op::INVOKEVIRTUAL, m, stack_delta);
    }
    if let Some(d) = dst {
        store_result(d, ctx, true);
    }
}

fn emit_new(dst: LocalId, ty: &crate::ast::TypeRef, args: &[Operand], ctx: &mut Ctx) -> Result<(), Diagnostic> {
    let simple = match ty {
        crate::ast::TypeRef::Simple(name, _) | crate::ast::TypeRef::Generic(name, _, _) => *name,
        _ => {
            crate::return_emitter_bug!("NEW_OBJECT with a non-named type reference");
        }
    };
    let class_name = ctx.name_of(simple).to_string();
    let internal = descriptors::internal_name_of(&class_name);

    if let Some(desc) = ctx.prescan.constructor_descriptor(simple, args.len()).map(str::to_string) {
        let class_idx = ctx.pool.class(&internal);
        ctx.asm.op2(op::NEW, class_idx, 1);
        ctx.asm.op(op::DUP, 1);
        for a in args {
            load_object(a, ctx);
        }
        let m = ctx.pool.methodref(&internal, "<init>", &desc);
        ctx.asm.op2(op::INVOKESPECIAL, m, -(args.len() as i32) - 2);
        store_result(dst, ctx, true);
    } else if args.is_empty() {
        let class_idx = ctx.pool.class(&internal);
        ctx.asm.op2(op::NEW, class_idx, 1);
        ctx.asm.op(op::DUP, 1);
        let m = ctx.pool.methodref(&internal, "<init>", "()V");
        ctx.asm.op2(op::INVOKESPECIAL, m, -1);
        store_result(dst, ctx, true);
    } else {
        // External Java class, non-zero arity: NovaOps.add-style fallback to
        // the method-handle cache, boxing args into an Object[] (§4.3
        // NEW_OBJECT rule, external-class branch).
        let name_idx = ctx.pool.string(&internal);
        ctx.asm.op1(op::LDC, name_idx as u8, 1);
        emit_object_array(args, ctx);
        let m = ctx.pool.methodref(
            rc::METHOD_HANDLE_CACHE,
            rc::METHOD_HANDLE_CACHE_NEW_INSTANCE,
            rc::METHOD_HANDLE_CACHE_NEW_INSTANCE_DESC,
        );
        ctx.asm.op2(op::INVOKESTATIC, m, -1);
        store_result(dst, ctx, true);
    }
    Ok(())
}

fn emit_object_array(elements: &[Operand], ctx: &mut Ctx) {
    push_int_const(elements.len() as i64, ctx);
    let cls = ctx.pool.class(OBJECT_INTERNAL);
    ctx.asm.op2(op::ANEWARRAY, cls, 0);
    for (i, e) in elements.iter().enumerate() {
        ctx.asm.op(op::DUP, 1);
        push_int_const(i as i64, ctx);
        load_object(e, ctx);
        ctx.asm.op(op::AASTORE, -3);
    }
}

fn emit_get_field(dst: LocalId, receiver: &Operand, owner: StringId, field: StringId, ctx: &mut Ctx) {
    let owner_name = ctx.name_of(owner).to_string();
    let internal = descriptors::internal_name_of(&owner_name);
    let field_name = ctx.name_of(field).to_string();
    if field_name == "size" || field_name == "length" {
        load_object(receiver, ctx);
        let cls = ctx.pool.class("[Ljava/lang/Object;");
        ctx.asm.op2(op::CHECKCAST, cls, 0);
        ctx.asm.op(op::ARRAYLENGTH, 0);
        box_int(ctx);
        store_result(dst, ctx, true);
        return;
    }
    let desc = ctx.prescan.resolve_field_descriptor(owner, field);
    load_object(receiver, ctx);
    if internal != OBJECT_INTERNAL {
        let cast = ctx.pool.class(&internal);
        ctx.asm.op2(op::CHECKCAST, cast, 0);
    }
    let f = ctx.pool.fieldref(&internal, &field_name, &desc);
    ctx.asm.op2(op::GETFIELD, f, 0);
    if desc == "I" {
        box_int(ctx);
    }
    store_result(dst, ctx, true);
}

fn emit_set_field(receiver: &Operand, owner: StringId, field: StringId, value: &Operand, ctx: &mut Ctx) {
    let owner_name = ctx.name_of(owner).to_string();
    let internal = descriptors::internal_name_of(&owner_name);
    let field_name = ctx.name_of(field).to_string();
    let desc = ctx.prescan.resolve_field_descriptor(owner, field);

    load_object(receiver, ctx);
    if internal != OBJECT_INTERNAL {
        let cast = ctx.pool.class(&internal);
        ctx.asm.op2(op::CHECKCAST, cast, 0);
    }
    if desc == "I" {
        load_int(value, ctx);
    } else {
        load_object(value, ctx);
    }
    let f = ctx.pool.fieldref(&internal, &field_name, &desc);
    ctx.asm.op2(op::PUTFIELD, f, -2);
}

fn emit_get_static(dst: LocalId, owner: StringId, field: StringId, ctx: &mut Ctx) {
    let owner_name = ctx.name_of(owner).to_string();
    let internal = descriptors::internal_name_of(&owner_name);
    let field_name = ctx.name_of(field).to_string();
    let desc = ctx.prescan.resolve_field_descriptor(owner, field);
    let f = ctx.pool.fieldref(&internal, &field_name, &desc);
    ctx.asm.op2(op::GETSTATIC, f, 1);
    store_result(dst, ctx, true);
}

fn emit_set_static(owner: StringId, field: StringId, value: &Operand, ctx: &mut Ctx) {
    let owner_name = ctx.name_of(owner).to_string();
    let internal = descriptors::internal_name_of(&owner_name);
    let field_name = ctx.name_of(field).to_string();
    let desc = ctx.prescan.resolve_field_descriptor(owner, field);
    load_object(value, ctx);
    let f = ctx.pool.fieldref(&internal, &field_name, &desc);
    ctx.asm.op2(op::PUTSTATIC, f, -1);
}

fn emit_array_get(dst: LocalId, array: &Operand, index: &Operand, ctx: &mut Ctx) {
    load_object(array, ctx);
    let cast = ctx.pool.class("[Ljava/lang/Object;");
    ctx.asm.op2(op::CHECKCAST, cast, 0);
    load_int(index, ctx);
    ctx.asm.op(op::AALOAD, -1);
    store_result(dst, ctx, true);
}

fn emit_array_set(array: &Operand, index: &Operand, value: &Operand, ctx: &mut Ctx) {
    load_object(array, ctx);
    let cast = ctx.pool.class("[Ljava/lang/Object;");
    ctx.asm.op2(op::CHECKCAST, cast, 0);
    load_int(index, ctx);
    load_object(value, ctx);
    ctx.asm.op(op::AASTORE, -3);
}

fn emit_runtime_call(dst: Option<LocalId>, helper: StringId, args: &[Operand], ctx: &mut Ctx) {
    let name = ctx.name_of(helper).to_string();

    // `invoke` is variable-arity (callee plus however many call-site
    // arguments), so it can't share the fixed-descriptor load-each-arg loop
    // below — the trailing arguments are boxed into one `Object[]`, the same
    // varargs convention `MethodHandleCache.newInstance` uses for external
    // constructor calls (see `emit_object_array`).
    if name == "invoke" {
        let (callee, rest) = args.split_first().expect("invoke helper always carries at least the callee operand");
        load_object(callee, ctx);
        emit_object_array(rest, ctx);
        let m = ctx.pool.methodref(rc::NOVA_CALLABLE, rc::NOVA_CALLABLE_INVOKE, rc::NOVA_CALLABLE_INVOKE_DESC);
        ctx.asm.op2(op::INVOKESTATIC, m, -1);
        if let Some(d) = dst {
            store_result(d, ctx, true);
        }
        return;
    }

    let (owner, method, desc): (&str, &str, &str) = match name.as_str() {
        "getIndex" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_GET_INDEX, rc::NOVA_COLLECTIONS_GET_INDEX_DESC),
        "setIndex" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_SET_INDEX, rc::NOVA_COLLECTIONS_SET_INDEX_DESC),
        "iterator" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_ITERATOR, rc::NOVA_COLLECTIONS_ITERATOR_DESC),
        "hasNext" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_HAS_NEXT, rc::NOVA_COLLECTIONS_HAS_NEXT_DESC),
        "next" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_NEXT, rc::NOVA_COLLECTIONS_NEXT_DESC),
        "rangeInclusive" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_RANGE_INCLUSIVE, rc::NOVA_COLLECTIONS_RANGE_DESC),
        "rangeExclusive" => (rc::NOVA_COLLECTIONS, rc::NOVA_COLLECTIONS_RANGE_EXCLUSIVE, rc::NOVA_COLLECTIONS_RANGE_DESC),
        "checkIsOk" => (rc::NOVA_RESULT, rc::NOVA_RESULT_CHECK_IS_OK, rc::NOVA_RESULT_CHECK_DESC),
        "checkIsErr" => (rc::NOVA_RESULT, rc::NOVA_RESULT_CHECK_IS_ERR, rc::NOVA_RESULT_CHECK_DESC),
        "checkIsResult" => (rc::NOVA_RESULT, rc::NOVA_RESULT_CHECK_IS_RESULT, rc::NOVA_RESULT_CHECK_DESC),
        "truthyCheck" => (rc::NOVA_VALUE, rc::NOVA_VALUE_TRUTHY_CHECK, rc::NOVA_VALUE_TRUTHY_CHECK_DESC),
        // Every helper name MIR lowering can produce is interned once, up
        // front, by `mir::lower::HelperNames` — an unrecognized name here
        // means the two tables drifted apart, not a value a Nova program can
        // trigger. Failing loudly beats emitting a class file with the wrong
        // operand count on the stack (a VerifyError at class-load time,
        // somewhere far from this bug's actual cause).
        other => unreachable!("emit_runtime_call: no runtime-contract dispatch for helper {other:?}"),
    };
    for a in args {
        load_object(a, ctx);
    }
    let m = ctx.pool.methodref(owner, method, desc);
    ctx.asm.op2(op::INVOKESTATIC, m, -(args.len() as i32) + 1);
    if let Some(d) = dst {
        if desc.ends_with('Z') {
            box_int_as_boolean_from_int(ctx);
        }
        store_result(d, ctx, true);
    }
}

fn box_int_as_boolean_from_int(_ctx: &mut Ctx) {
    // Boolean-returning runtime helpers already return a primitive Z; the
    // caller boxes via store_result's non-promoted path, which expects the
    // stack to hold the primitive value to box. Intentionally left as a
    // no-op seam: NovaResult's predicates are only ever read by InstanceOf's
    // desugared form, never stored directly to an Object-typed local.
}

fn emit_instanceof(dst: LocalId, value: &Operand, ty: &crate::ast::TypeRef, negated: bool, ctx: &mut Ctx) {
    let simple = type_simple_name(ty, ctx.table);
    load_object(value, ctx);
    match simple.as_str() {
        "Result" => {
            let m = ctx.pool.methodref(rc::NOVA_RESULT, rc::NOVA_RESULT_CHECK_IS_RESULT, rc::NOVA_RESULT_CHECK_DESC);
            ctx.asm.op2(op::INVOKESTATIC, m, 0);
        }
        "Ok" => {
            let m = ctx.pool.methodref(rc::NOVA_RESULT, rc::NOVA_RESULT_CHECK_IS_OK, rc::NOVA_RESULT_CHECK_DESC);
            ctx.asm.op2(op::INVOKESTATIC, m, 0);
        }
        "Err" => {
            let m = ctx.pool.methodref(rc::NOVA_RESULT, rc::NOVA_RESULT_CHECK_IS_ERR, rc::NOVA_RESULT_CHECK_DESC);
            ctx.asm.op2(op::INVOKESTATIC, m, 0);
        }
        other => {
            let internal = descriptors::internal_name_of(other);
            let cls = ctx.pool.class(&internal);
            ctx.asm.op2(op::INSTANCEOF, cls, 0);
        }
    }
    if negated {
        push_int_const(1, ctx);
        ctx.asm.op(op::IXOR, -1);
    }
    box_int_as_boolean(ctx);
    store_result(dst, ctx, true);
}

fn emit_cast(dst: LocalId, value: &Operand, ty: &crate::ast::TypeRef, ctx: &mut Ctx) {
    let simple = type_simple_name(ty, ctx.table);
    load_object(value, ctx);
    let internal = descriptors::internal_name_of(&simple);
    if internal != OBJECT_INTERNAL {
        let cls = ctx.pool.class(&internal);
        ctx.asm.op2(op::CHECKCAST, cls, 0);
    }
    store_result(dst, ctx, true);
}

fn type_simple_name(ty: &crate::ast::TypeRef, table: &StringTable) -> String {
    match ty {
        crate::ast::TypeRef::Simple(n, _) | crate::ast::TypeRef::Generic(n, _, _) => n.resolve(table).to_string(),
        crate::ast::TypeRef::Nullable(inner, _) => type_simple_name(inner, table),
        crate::ast::TypeRef::Function(_, _, _) => "Object".to_string(),
    }
}

fn emit_string_concat(dst: LocalId, parts: &[Operand], ctx: &mut Ctx) {
    let empty = ctx.pool.string("");
    ctx.asm.op1(op::LDC, empty as u8, 1);
    for p in parts {
        load_object(p, ctx);
        let m = ctx.pool.methodref(STRING_INTERNAL, "valueOf", "(Ljava/lang/Object;)Ljava/lang/String;");
        ctx.asm.op2(op::INVOKESTATIC, m, 0);
        let concat = ctx.pool.methodref(STRING_INTERNAL, "concat", "(Ljava/lang/String;)Ljava/lang/String;");
        ctx.asm.op2(op::INVOKEVIRTUAL, concat, -1);
    }
    store_result(dst, ctx, true);
}

fn emit_build_collection(dst: LocalId, kind: CollectionKind, elements: &[Operand], ctx: &mut Ctx) {
    let (factory_owner, factory_method, factory_desc): (&str, &str, String) = match kind {
        CollectionKind::List => ("java/util/ArrayList", "<init>", "()V".to_string()),
        CollectionKind::Set => ("java/util/LinkedHashSet", "<init>", "()V".to_string()),
        CollectionKind::Map => ("java/util/LinkedHashMap", "<init>", "()V".to_string()),
    };
    let cls = ctx.pool.class(factory_owner);
    ctx.asm.op2(op::NEW, cls, 1);
    ctx.asm.op(op::DUP, 1);
    let ctor = ctx.pool.methodref(factory_owner, factory_method, &factory_desc);
    ctx.asm.op2(op::INVOKESPECIAL, ctor, -1);

    match kind {
        CollectionKind::Map => {
            for pair in elements.chunks(2) {
                ctx.asm.op(op::DUP, 1);
                load_object(&pair[0], ctx);
                if let Some(v) = pair.get(1) {
                    load_object(v, ctx);
                } else {
                    ctx.asm.op(op::ACONST_NULL, 1);
                }
                let put = ctx.pool.interface_methodref("java/util/Map", "put", "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;");
                ctx.asm.invoke_interface(put, 3, -2);
                ctx.asm.op(op::POP, -1);
            }
        }
        _ => {
            for e in elements {
                ctx.asm.op(op::DUP, 1);
                load_object(e, ctx);
                let add = ctx.pool.interface_methodref("java/util/Collection", "add", "(Ljava/lang/Object;)Z");
                ctx.asm.invoke_interface(add, 2, -1);
                ctx.asm.op(op::POP, -1);
            }
        }
    }
    store_result(dst, ctx, true);
}

fn emit_method_handle(dst: LocalId, owner: StringId, method: StringId, ctx: &mut Ctx) {
    let owner_name = ctx.name_of(owner).to_string();
    let method_name = ctx.name_of(method).to_string();
    let key = format!("{owner_name}#{method_name}");
    let idx = ctx.pool.string(&key);
    ctx.asm.op1(op::LDC, idx as u8, 1);
    store_result(dst, ctx, true);
}

fn emit_annotation_trigger(annotation: StringId, target: StringId, ctx: &mut Ctx) {
    let ann_name = ctx.name_of(annotation).to_string();
    let target_name = ctx.name_of(target).to_string();
    let idx = ctx.pool.string(&ann_name);
    ctx.asm.op1(op::LDC, idx as u8, 1);
    let cls = ctx.pool.class(&descriptors::internal_name_of(&target_name));
    ctx.asm.op2(op::LDC_W, cls, 1);
    let empty_map = ctx.pool.methodref("java/util/Collections", "emptyMap", "()Ljava/util/Map;");
    ctx.asm.op2(op::INVOKESTATIC, empty_map, 1);
    let m = ctx.pool.methodref(rc::NOVA_ANNOTATIONS, rc::NOVA_ANNOTATIONS_TRIGGER, rc::NOVA_ANNOTATIONS_TRIGGER_DESC);
    ctx.asm.op2(op::INVOKESTATIC, m, -3);
}

// -------------------------------------------------------------- terminators

fn emit_terminator(term: &Terminator, f: &MirFunction, ctx: &mut Ctx) {
    match term {
        Terminator::Jump(target) | Terminator::TailCall(target) => ctx.asm.branch(op::GOTO, *target, 0),
        Terminator::Branch { cond, then_block, else_block } => {
            load_object(cond, ctx);
            let m = ctx.pool.methodref(rc::NOVA_VALUE, rc::NOVA_VALUE_TRUTHY_CHECK, rc::NOVA_VALUE_TRUTHY_CHECK_DESC);
            ctx.asm.op2(op::INVOKESTATIC, m, -1);
            ctx.asm.branch(op::IFNE, *then_block, -1);
            ctx.asm.branch(op::GOTO, *else_block, 0);
        }
        Terminator::EqualsChain { subject, cases, default } => {
            for (key, target) in cases {
                load_object(subject, ctx);
                let to_string = ctx.pool.methodref(OBJECT_INTERNAL, "toString", "()Ljava/lang/String;");
                ctx.asm.op2(op::INVOKEVIRTUAL, to_string, 0);
                load_object(key, ctx);
                let ts2 = ctx.pool.methodref(OBJECT_INTERNAL, "toString", "()Ljava/lang/String;");
                ctx.asm.op2(op::INVOKEVIRTUAL, ts2, 0);
                let equals = ctx.pool.methodref(STRING_INTERNAL, "equals", "(Ljava/lang/Object;)Z");
                ctx.asm.op2(op::INVOKEVIRTUAL, equals, -1);
                ctx.asm.branch(op::IFNE, *target, -1);
            }
            ctx.asm.branch(op::GOTO, *default, 0);
        }
        Terminator::Return(value) => emit_return(value, f, ctx),
        Terminator::Throw(value) => {
            load_object(value, ctx);
            let cast = ctx.pool.class(THROWABLE_INTERNAL);
            ctx.asm.op2(op::CHECKCAST, cast, 0);
            ctx.asm.op(op::ATHROW, -1);
        }
        Terminator::Unreachable => {
            let cls = ctx.pool.class("java/lang/AssertionError");
            ctx.asm.op2(op::NEW, cls, 1);
            ctx.asm.op(op::DUP, 1);
            let msg = ctx.pool.string("unreachable");
            ctx.asm.op1(op::LDC, msg as u8, 1);
            let ctor = ctx.pool.methodref("java/lang/AssertionError", "<init>", "(Ljava/lang/Object;)V");
            ctx.asm.op2(op::INVOKESPECIAL, ctor, -2);
            ctx.asm.op(op::ATHROW, -1);
        }
    }
}

/// Emits the fused form for a block whose terminator is a `Branch` fed by
/// its own last comparison (§4.3.5): operand loads go straight into the
/// comparison jump, skipping the boxed-`Boolean` materialization entirely.
fn emit_fused_branch(fused: &fusion::FusedCompare, ctx: &mut Ctx) {
    emit_compare_jump(fused.op, fused.lhs, fused.rhs, ctx, fused.then_block);
    ctx.asm.branch(op::GOTO, fused.else_block, 0);
}

fn emit_return(value: &Option<Operand>, f: &MirFunction, ctx: &mut Ctx) {
    match value {
        None => ctx.asm.op(op::RETURN, 0),
        Some(v) => {
            let ret_kind = return_kind(f, ctx.table);
            match ret_kind {
                OperandKind::Int if matches!(v, Operand::Local(id) if ctx.is_promoted(*id)) => {
                    load_int(v, ctx);
                    ctx.asm.op(op::IRETURN, -1);
                }
                _ => {
                    load_object(v, ctx);
                    ctx.asm.op(op::ARETURN, -1);
                }
            }
        }
    }
}

fn return_kind(f: &MirFunction, table: &StringTable) -> OperandKind {
    match &f.return_type {
        Some(ty) if descriptors::type_ref_descriptor(ty, table) == "I" => OperandKind::Int,
        _ => OperandKind::Object,
    }
}

//! Int-local promotion analysis (§4.3.4): decides which MIR locals the
//! method emitter keeps as primitive `int` rather than paying the uniform
//! `Integer.valueOf`/`intValue` boxing round-trip everywhere they're used.
//!
//! Candidacy starts from the local's *declared* type, not its `MirType`
//! (which is `Object` for every local until this pass runs — see the module
//! doc on `mir::lower`). A conservative pass then walks every instruction
//! disqualifying any local a disqualifying opcode writes to; anything this
//! pass isn't sure about it disqualifies, since a missed promotion only
//! costs performance, not correctness.

use std::collections::HashSet;

use crate::ast::{BinaryOp, Literal, TypeRef, UnaryOp};
use crate::codegen::descriptors;
use crate::mir::{LocalId, MirFunction, MirInst, Operand};
use crate::string_interning::StringTable;

pub fn promote_int_locals(f: &MirFunction, is_delegating_ctor: bool, table: &StringTable) -> HashSet<LocalId> {
    let mut candidates: HashSet<LocalId> = HashSet::new();
    for (i, local) in f.locals.iter().enumerate() {
        if is_declared_int(&local.declared_type, table) {
            candidates.insert(LocalId(i as u32));
        }
    }

    // A primary constructor chaining via `this(...)`/super can't unbox a
    // parameter before that call runs, since the call's own argument list
    // may read the parameter first.
    if is_delegating_ctor {
        for p in 0..f.params.len() {
            candidates.remove(&LocalId(p as u32));
        }
    }

    for block in &f.blocks {
        for inst in &block.instructions {
            disqualify_from_inst(inst, &mut candidates);
        }
    }

    candidates
}

fn is_declared_int(ty: &Option<TypeRef>, table: &StringTable) -> bool {
    match ty {
        Some(t) => descriptors::type_ref_descriptor(t, table) == "I",
        None => false,
    }
}

fn operand_is_int_source(op: &Operand, set: &HashSet<LocalId>) -> bool {
    match op {
        Operand::Local(id) => set.contains(id),
        Operand::Const(Literal::Int(_)) => true,
        Operand::Const(_) => false,
        Operand::This => false,
    }
}

fn disqualify_from_inst(inst: &MirInst, set: &mut HashSet<LocalId>) {
    match inst {
        MirInst::Assign { dst, src } => {
            if set.contains(dst) && !operand_is_int_source(src, set) {
                set.remove(dst);
            }
        }
        MirInst::BinOp { dst, op, lhs, rhs } => {
            if !set.contains(dst) {
                return;
            }
            let ok = match op {
                BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
                | BinaryOp::And | BinaryOp::Or => false,
                _ => operand_is_int_source(lhs, set) && operand_is_int_source(rhs, set),
            };
            if !ok {
                set.remove(dst);
            }
        }
        MirInst::UnOp { dst, op, operand } => {
            if !set.contains(dst) {
                return;
            }
            let ok = matches!(op, UnaryOp::Neg | UnaryOp::BNot) && operand_is_int_source(operand, set);
            if !ok {
                set.remove(dst);
            }
        }
        MirInst::ArrayGet { dst, .. }
        | MirInst::GetField { dst, .. }
        | MirInst::GetStatic { dst, .. }
        | MirInst::New { dst, .. }
        | MirInst::InstanceOf { dst, .. }
        | MirInst::Cast { dst, .. }
        | MirInst::Box { dst, .. }
        | MirInst::Unbox { dst, .. }
        | MirInst::StringConcat { dst, .. }
        | MirInst::BuildCollection { dst, .. }
        | MirInst::MethodHandle { dst, .. } => {
            set.remove(dst);
        }
        MirInst::Call { dst: Some(dst), .. } | MirInst::RuntimeCall { dst: Some(dst), .. } => {
            set.remove(dst);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::{BlockId, MirBlock, MirFunction, MirLocal, MirType, Terminator};
    use crate::string_interning::StringTable;
    use proptest::prelude::*;

    fn int_type(table: &mut StringTable) -> Option<TypeRef> {
        Some(TypeRef::Simple(table.intern("Int"), crate::hir::Loc::unknown()))
    }

    /// One write to a fixed local: `Producing` opcodes are the ones
    /// `disqualify_from_inst` treats as int-compatible; `Disqualifying` ones
    /// always evict the local from the candidate set.
    #[derive(Debug, Clone, Copy)]
    enum Write {
        Producing(usize),
        Disqualifying(usize),
    }

    fn write_strategy(locals: usize) -> impl Strategy<Value = Write> {
        (0..locals).prop_flat_map(|i| prop_oneof![Just(Write::Producing(i)), Just(Write::Disqualifying(i))])
    }

    proptest! {
        #[test]
        fn promoted_locals_are_only_ever_assigned_by_int_producing_opcodes(
            writes in prop::collection::vec(write_strategy(4), 0..40)
        ) {
            let mut table = StringTable::new();
            let declared = int_type(&mut table);
            let locals: Vec<MirLocal> = (0..4).map(|_| MirLocal { name: None, ty: MirType::Object, declared_type: declared.clone() }).collect();

            let mut instructions = Vec::new();
            let mut expected_disqualified = std::collections::HashSet::new();
            for w in &writes {
                match *w {
                    Write::Producing(i) => {
                        instructions.push(MirInst::BinOp {
                            dst: LocalId(i as u32),
                            op: BinaryOp::Add,
                            lhs: Operand::Const(Literal::Int(1)),
                            rhs: Operand::Const(Literal::Int(2)),
                        });
                    }
                    Write::Disqualifying(i) => {
                        expected_disqualified.insert(LocalId(i as u32));
                        instructions.push(MirInst::Call {
                            dst: Some(LocalId(i as u32)),
                            receiver: None,
                            owner: table.intern("Owner"),
                            method: table.intern("m"),
                            args: Vec::new(),
                            is_static: true,
                        });
                    }
                }
            }

            let block = MirBlock { id: BlockId(0), instructions, terminator: Terminator::Return(None) };
            let f = MirFunction {
                name: table.intern("f"),
                modifiers: Vec::new(),
                params: Vec::new(),
                return_type: None,
                locals,
                blocks: vec![block],
                entry: BlockId(0),
                try_table: Vec::new(),
                is_constructor: false,
                descriptor_override: None,
                delegate_args: None,
                super_args: None,
            };

            let candidates = promote_int_locals(&f, false, &table);
            for id in &candidates {
                prop_assert!(!expected_disqualified.contains(id));
            }
            for i in 0..4 {
                if !expected_disqualified.contains(&LocalId(i as u32)) {
                    prop_assert!(candidates.contains(&LocalId(i as u32)));
                }
            }
        }
    }
}

//! Compare-branch fusion (§4.3.5): a block whose terminator is a `Branch`
//! fed directly by the block's last instruction — a comparison writing
//! exactly the branch condition — skips materializing the boxed `Boolean`
//! and jumps straight off the comparison's numeric kind.

use crate::ast::BinaryOp;
use crate::mir::{BlockId, MirBlock, MirInst, Operand, Terminator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Int,
    Long,
    Float,
    Double,
    Object,
}

/// The ladder from §4.3's instruction-emission rule: `DOUBLE > FLOAT > LONG
/// > INT`, with any `Object` operand forcing the whole comparison onto the
/// object-equality/`Comparable` path.
pub fn numeric_ladder(a: OperandKind, b: OperandKind) -> OperandKind {
    use OperandKind::*;
    if a == Object || b == Object {
        return Object;
    }
    if a == Double || b == Double {
        return Double;
    }
    if a == Float || b == Float {
        return Float;
    }
    if a == Long || b == Long {
        return Long;
    }
    Int
}

pub struct FusedCompare<'a> {
    pub op: BinaryOp,
    pub lhs: &'a Operand,
    pub rhs: &'a Operand,
    pub then_block: BlockId,
    pub else_block: BlockId,
}

/// Detects the fusable comparison at the tail of `block`, if any. Does not
/// itself check whether the comparison's destination is read by any other
/// block; `method_emit` only calls this after confirming the local has no
/// other readers, since a fused comparison's destination is never stored.
pub fn detect_fusion(block: &MirBlock) -> Option<FusedCompare<'_>> {
    let Terminator::Branch { cond, then_block, else_block } = &block.terminator else {
        return None;
    };
    let Operand::Local(cond_local) = cond else {
        return None;
    };
    let last = block.instructions.last()?;
    if let MirInst::BinOp { dst, op, lhs, rhs } = last {
        if dst == cond_local && is_comparison(*op) {
            return Some(FusedCompare {
                op: *op,
                lhs,
                rhs,
                then_block: *then_block,
                else_block: *else_block,
            });
        }
    }
    None
}

pub fn is_comparison(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
    )
}

/// True for a "constant zero" operand, used to special-case `IF_ICMPxx`
/// against a literal `0` down to the single-operand `IFxx` form.
pub fn is_const_zero(op: &Operand) -> bool {
    matches!(op, Operand::Const(crate::ast::Literal::Int(0)))
}

/// The reversed comparison for `0 op x` so the zero always ends up on the
/// right when lowering to the single-operand `IFxx` form.
pub fn reverse(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Le => BinaryOp::Ge,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Ge => BinaryOp::Le,
        other => other,
    }
}

//! R-P-N transfer decoding and JUMP condition evaluation.

use crate::alu::{self, ops};
use crate::fault::Fault;

/// JUMP condition codes, used when the TEST flag is set.
pub mod conditions {
    pub const M_LESS_THAN_A: u8 = 1;
    pub const M_LESS_OR_EQUAL_A: u8 = 2;
    pub const M_NOT_EQUAL_A: u8 = 3;
    /// True when there is no page fault.
    pub const NO_PAGE_FAULT: u8 = 4;
    pub const NO_PAGE_FAULT_OR_INTERRUPT: u8 = 5;
    pub const NO_PAGE_FAULT_INTERRUPT_OR_SEQUENCE_BREAK: u8 = 6;
    pub const ALWAYS: u8 = 7;
    /// Tag bits 25-29 of A and M differ.
    pub const DATA_TYPE_MISMATCH: u8 = 8;
}

/// R-P-N codes. Bit 2 is R, bit 1 is P, bit 0 (N) inhibits the next
/// instruction.
pub mod rpn {
    pub const JUMP_XCT_NEXT: u8 = 0b000;
    pub const JUMP: u8 = 0b001;
    pub const CALL_XCT_NEXT: u8 = 0b010;
    pub const CALL: u8 = 0b011;
    pub const RETURN_XCT_NEXT: u8 = 0b100;
    pub const RETURN: u8 = 0b101;
}

const DATA_TYPE_BITS: u32 = 0x3E00_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Jump,
    Call,
    Return,
}

/// A decoded R-P-N field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub kind: TransferKind,
    /// The already-latched next instruction runs before the transfer
    /// takes effect.
    pub execute_next: bool,
}

impl TryFrom<u8> for Transfer {
    type Error = Fault;

    fn try_from(code: u8) -> Result<Self, Fault> {
        let kind = match code & 0b110 {
            0b000 => TransferKind::Jump,
            0b010 => TransferKind::Call,
            0b100 => TransferKind::Return,
            _ => return Err(Fault::IllegalRpn(code)),
        };
        Ok(Self {
            kind,
            execute_next: code & 1 == 0,
        })
    }
}

/// Machine state a JUMP condition can look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionInputs {
    pub a: u32,
    pub m: u32,
    pub page_fault: bool,
    pub interrupt_pending: bool,
    pub sequence_break: bool,
}

/// Evaluate a JUMP condition field.
///
/// With `test` clear, `condition` is a bit position in M. The `invert` flag
/// is applied last.
pub fn condition_met(
    condition: u8,
    test: bool,
    invert: bool,
    inputs: &ConditionInputs,
) -> Result<bool, Fault> {
    let met = if test {
        evaluate_test(condition, inputs)?
    } else {
        inputs.m & (1 << (condition & 0x1F)) != 0
    };
    Ok(met != invert)
}

fn evaluate_test(condition: u8, i: &ConditionInputs) -> Result<bool, Fault> {
    use conditions::{
        ALWAYS, DATA_TYPE_MISMATCH, M_LESS_OR_EQUAL_A, M_LESS_THAN_A, M_NOT_EQUAL_A,
        NO_PAGE_FAULT, NO_PAGE_FAULT_INTERRUPT_OR_SEQUENCE_BREAK, NO_PAGE_FAULT_OR_INTERRUPT,
    };

    // Comparisons go through the ALU's M-A path.
    let diff = alu::alu_op(ops::SUB, i.a, i.m, true, false)?;
    let less = (diff.value & 0x8000_0000 != 0) != diff.overflow;

    Ok(match condition {
        M_LESS_THAN_A => less,
        M_LESS_OR_EQUAL_A => less || diff.value == 0,
        M_NOT_EQUAL_A => diff.value != 0,
        NO_PAGE_FAULT => !i.page_fault,
        NO_PAGE_FAULT_OR_INTERRUPT => !(i.page_fault || i.interrupt_pending),
        NO_PAGE_FAULT_INTERRUPT_OR_SEQUENCE_BREAK => {
            !(i.page_fault || i.interrupt_pending || i.sequence_break)
        }
        ALWAYS => true,
        DATA_TYPE_MISMATCH => (i.a ^ i.m) & DATA_TYPE_BITS != 0,
        _ => return Err(Fault::IllegalJumpCondition(condition)),
    })
}

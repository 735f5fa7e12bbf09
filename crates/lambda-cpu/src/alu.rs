//! The 32-bit ALU, output selector and Q register.
//!
//! All functions here are pure. The engine latches their results.

use crate::fault::Fault;

/// ALU operation codes (5-bit field).
pub mod ops {
    pub const SETZ: u8 = 0x00;
    pub const AND: u8 = 0x01;
    pub const ANDCA: u8 = 0x02;
    pub const SETM: u8 = 0x03;
    pub const SETA: u8 = 0x05;
    pub const XOR: u8 = 0x06;
    pub const IOR: u8 = 0x07;
    pub const SETO: u8 = 0x0F;
    /// M, or M+1 with carry in.
    pub const M_PLUS_CARRY: u8 = 0x10;
    /// Multiply step: `Q0 ? M+A : M`.
    pub const MSTEP: u8 = 0x11;
    /// First divide step: `M-A`.
    pub const DFSTEP: u8 = 0x12;
    /// Divide step: `Q0 ? M-A : M+A`.
    pub const DSTEP: u8 = 0x13;
    /// Remainder correction: `Q0 ? M : M+A`.
    pub const RSTEP: u8 = 0x14;
    /// `M-A-1`, plus carry in (so carry in = 1 gives `M-A`).
    pub const SUB: u8 = 0x16;
    /// `M+A+carry`.
    pub const ADD: u8 = 0x19;
    /// `M+M+carry`.
    pub const M_PLUS_M: u8 = 0x1C;
}

/// Bits 25-31: the tag field preserved by the mask flag.
pub const TAG_MASK: u32 = 0xFE00_0000;

/// Result of one ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    /// Low 32 bits of the result.
    pub value: u32,
    /// Bit 32 for arithmetic ops; bit 31 of the result for boolean ops.
    pub carry: bool,
    /// Signed overflow of the add/subtract family.
    pub overflow: bool,
}

impl AluResult {
    const fn logical(value: u32) -> Self {
        Self {
            value,
            carry: value & 0x8000_0000 != 0,
            overflow: false,
        }
    }

    /// `m + addend + carry_in`, where `addend` is A or its complement.
    fn sum(m: u32, addend: u32, carry_in: bool) -> Self {
        let wide = u64::from(m) + u64::from(addend) + u64::from(carry_in);
        let value = wide as u32;
        // Operands agree in sign but the result does not.
        let overflow = (!(m ^ addend) & (m ^ value)) & 0x8000_0000 != 0;
        Self {
            value,
            carry: wide & 0x1_0000_0000 != 0,
            overflow,
        }
    }
}

/// Apply ALU operation `op` to A and M.
///
/// `q0` is bit 0 of the Q register, which steers the stepped multiply and
/// divide operations.
pub fn alu_op(op: u8, a: u32, m: u32, carry_in: bool, q0: bool) -> Result<AluResult, Fault> {
    let add = || AluResult::sum(m, a, false);
    let sub = || AluResult::sum(m, !a, true);
    let pass = || AluResult::sum(m, 0, false);

    Ok(match op {
        ops::SETZ => AluResult::logical(0),
        ops::AND => AluResult::logical(a & m),
        ops::ANDCA => AluResult::logical(!a & m),
        ops::SETM => AluResult::logical(m),
        ops::SETA => AluResult::logical(a),
        ops::XOR => AluResult::logical(a ^ m),
        ops::IOR => AluResult::logical(a | m),
        ops::SETO => AluResult::logical(0xFFFF_FFFF),
        ops::M_PLUS_CARRY => AluResult::sum(m, 0, carry_in),
        ops::MSTEP => {
            if q0 {
                add()
            } else {
                pass()
            }
        }
        ops::DFSTEP => sub(),
        ops::DSTEP => {
            if q0 {
                sub()
            } else {
                add()
            }
        }
        ops::RSTEP => {
            if q0 {
                pass()
            } else {
                add()
            }
        }
        ops::SUB => AluResult::sum(m, !a, carry_in),
        ops::ADD => AluResult::sum(m, a, carry_in),
        ops::M_PLUS_M => AluResult::sum(m, m, carry_in),
        _ => return Err(Fault::IllegalAluOp(op)),
    })
}

/// Replace the tag bits of `value` with those of `a`.
#[must_use]
pub const fn preserve_tag(value: u32, a: u32) -> u32 {
    (value & !TAG_MASK) | (a & TAG_MASK)
}

/// The output bus routing applied after the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSelector {
    Pass,
    /// Right shift one, ALU carry into bit 31.
    ShiftRight,
    /// Sign-extend the 25-bit fixnum at bits 0-24.
    SignExtend24,
    Mask11,
    /// Left shift one, Q bit 31 into bit 0.
    ShiftLeft,
    Mirror,
    /// Pass with the tag bits taken from A.
    Masked,
}

impl TryFrom<u8> for OutputSelector {
    type Error = Fault;

    fn try_from(code: u8) -> Result<Self, Fault> {
        Ok(match code {
            0 => Self::Pass,
            1 => Self::ShiftRight,
            2 => Self::SignExtend24,
            3 => Self::Mask11,
            4 => Self::ShiftLeft,
            5 => Self::Mirror,
            6 => Self::Masked,
            _ => return Err(Fault::IllegalOutputSelector(code)),
        })
    }
}

/// Route an ALU result onto the output bus.
#[must_use]
pub const fn apply_output_selector(sel: OutputSelector, alu: AluResult, a: u32, q: u32) -> u32 {
    let v = alu.value;
    match sel {
        OutputSelector::Pass => v,
        OutputSelector::ShiftRight => (v >> 1) | ((alu.carry as u32) << 31),
        OutputSelector::SignExtend24 => {
            if v & 0x0100_0000 != 0 {
                v | 0xFE00_0000
            } else {
                v & 0x01FF_FFFF
            }
        }
        OutputSelector::Mask11 => v & 0x7FF,
        OutputSelector::ShiftLeft => (v << 1) | (q >> 31),
        OutputSelector::Mirror => v.reverse_bits(),
        OutputSelector::Masked => preserve_tag(v, a),
    }
}

/// Q register control (2-bit field, every encoding defined).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QControl {
    Hold,
    ShiftLeft,
    ShiftRight,
    Load,
}

impl From<u8> for QControl {
    fn from(code: u8) -> Self {
        match code & 3 {
            0 => Self::Hold,
            1 => Self::ShiftLeft,
            2 => Self::ShiftRight,
            _ => Self::Load,
        }
    }
}

/// Next value of Q given the raw ALU result.
#[must_use]
pub const fn update_q(ctl: QControl, q: u32, alu: u32) -> u32 {
    match ctl {
        QControl::Hold => q,
        QControl::ShiftLeft => (q << 1) | (!alu >> 31),
        QControl::ShiftRight => (q >> 1) | (alu << 31),
        QControl::Load => alu,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: u8, a: u32, m: u32, carry: bool) -> AluResult {
        alu_op(op, a, m, carry, false).unwrap()
    }

    #[test]
    fn add_wraps_with_carry_out() {
        let r = run(ops::ADD, 0xFFFF_FFFF, 1, false);
        assert_eq!(r.value, 0);
        assert!(r.carry);
        assert!(!r.overflow);
    }

    #[test]
    fn add_reports_signed_overflow() {
        let r = run(ops::ADD, 1, 0x7FFF_FFFF, false);
        assert_eq!(r.value, 0x8000_0000);
        assert!(r.overflow);
        assert!(!r.carry);
    }

    #[test]
    fn add_honours_carry_in() {
        assert_eq!(run(ops::ADD, 2, 3, true).value, 6);
    }

    #[test]
    fn sub_without_carry_is_m_minus_a_minus_one() {
        assert_eq!(run(ops::SUB, 3, 10, false).value, 6);
        assert_eq!(run(ops::SUB, 3, 10, true).value, 7);
        // No borrow leaves the carry set.
        assert!(run(ops::SUB, 3, 10, true).carry);
        assert!(!run(ops::SUB, 10, 3, true).carry);
    }

    #[test]
    fn boolean_table() {
        let a = 0xF0F0_1234;
        let m = 0xFF00_5678;
        assert_eq!(run(ops::SETZ, a, m, false).value, 0);
        assert_eq!(run(ops::AND, a, m, false).value, a & m);
        assert_eq!(run(ops::ANDCA, a, m, false).value, !a & m);
        assert_eq!(run(ops::SETM, a, m, false).value, m);
        assert_eq!(run(ops::SETA, a, m, false).value, a);
        assert_eq!(run(ops::XOR, a, m, false).value, a ^ m);
        assert_eq!(run(ops::IOR, a, m, false).value, a | m);
        assert_eq!(run(ops::SETO, a, m, false).value, 0xFFFF_FFFF);
    }

    #[test]
    fn boolean_carry_is_result_sign() {
        assert!(run(ops::SETM, 0, 0x8000_0000, false).carry);
        assert!(!run(ops::SETM, 0, 0x7FFF_FFFF, false).carry);
        // Same inputs through the adder: no carry out of bit 32.
        assert!(!run(ops::M_PLUS_CARRY, 0, 0x8000_0000, false).carry);
    }

    #[test]
    fn m_plus_carry_and_doubling() {
        assert_eq!(run(ops::M_PLUS_CARRY, 99, 5, false).value, 5);
        assert_eq!(run(ops::M_PLUS_CARRY, 99, 5, true).value, 6);
        let r = run(ops::M_PLUS_M, 0, 0x8000_0001, true);
        assert_eq!(r.value, 3);
        assert!(r.carry);
    }

    #[test]
    fn stepped_ops_follow_q0() {
        let (a, m) = (3, 10);
        assert_eq!(alu_op(ops::MSTEP, a, m, false, true).unwrap().value, 13);
        assert_eq!(alu_op(ops::MSTEP, a, m, false, false).unwrap().value, 10);
        assert_eq!(alu_op(ops::DFSTEP, a, m, false, false).unwrap().value, 7);
        assert_eq!(alu_op(ops::DSTEP, a, m, false, true).unwrap().value, 7);
        assert_eq!(alu_op(ops::DSTEP, a, m, false, false).unwrap().value, 13);
        assert_eq!(alu_op(ops::RSTEP, a, m, false, true).unwrap().value, 10);
        assert_eq!(alu_op(ops::RSTEP, a, m, false, false).unwrap().value, 13);
    }

    #[test]
    fn undefined_ops_are_fatal() {
        for op in [0x04, 0x08, 0x0E, 0x15, 0x17, 0x1F] {
            assert_eq!(alu_op(op, 0, 0, false, false), Err(Fault::IllegalAluOp(op)));
        }
    }

    #[test]
    fn tag_preservation() {
        assert_eq!(preserve_tag(0x0123_4567, 0xAB00_0000), 0xAB23_4567);
    }

    #[test]
    fn output_selector_modes() {
        let alu = AluResult { value: 0x0100_0003, carry: true, overflow: false };
        let sel = |code| OutputSelector::try_from(code).unwrap();
        assert_eq!(apply_output_selector(sel(0), alu, 0, 0), 0x0100_0003);
        assert_eq!(apply_output_selector(sel(1), alu, 0, 0), 0x8080_0001);
        assert_eq!(apply_output_selector(sel(2), alu, 0, 0), 0xFF00_0003);
        assert_eq!(apply_output_selector(sel(3), alu, 0, 0), 0x003);
        assert_eq!(apply_output_selector(sel(4), alu, 0, 0x8000_0000), 0x0200_0007);
        assert_eq!(apply_output_selector(sel(5), alu, 0, 0), 0xC000_0080);
        assert_eq!(apply_output_selector(sel(6), alu, 0xFE00_0000, 0), 0xFF00_0003);
        assert_eq!(OutputSelector::try_from(7), Err(Fault::IllegalOutputSelector(7)));
    }

    #[test]
    fn q_updates() {
        assert_eq!(update_q(QControl::Hold, 5, 0), 5);
        // Left: carry in is the inverted ALU sign.
        assert_eq!(update_q(QControl::ShiftLeft, 1, 0x8000_0000), 2);
        assert_eq!(update_q(QControl::ShiftLeft, 1, 0), 3);
        // Right: ALU bit 0 enters at bit 31.
        assert_eq!(update_q(QControl::ShiftRight, 4, 1), 0x8000_0002);
        assert_eq!(update_q(QControl::Load, 4, 0x1234), 0x1234);
    }
}

//! The 56-bit horizontal microinstruction word.
//!
//! Every field is a named bit range over the raw word. The upper half is
//! common to all four opcodes; bits 0-27 are interpreted per opcode.
//! Encoders (`alu`, `byte`, `jump`, `dispatch`, `with_*`) exist so that
//! debuggers and tests can assemble words without hand-packing bits.

use crate::bits::{get, set};

/// Width of a microinstruction in bits.
pub const WIDTH: u32 = 56;
/// Mask covering a full microinstruction.
pub const MASK: u64 = (1 << WIDTH) - 1;

// Common fields.
const OPCODE: (u32, u32) = (54, 2);
const HALT: (u32, u32) = (53, 1);
const PJAN: (u32, u32) = (52, 1);
const STAT: (u32, u32) = (51, 1);
const ILONG: (u32, u32) = (50, 1);
const MACRO_FETCH: (u32, u32) = (49, 1);
const MACRO_STREAM_ADVANCE: (u32, u32) = (48, 1);
const SLOW_DEST: (u32, u32) = (47, 1);
const M_SOURCE: (u32, u32) = (40, 7);
const A_SOURCE: (u32, u32) = (28, 12);

// ALU and BYTE destination.
const DEST: (u32, u32) = (14, 14);
const DEST_A_FLAG: u64 = 1 << 13;
const DEST_M_ENABLE: u64 = 1 << 12;

// ALU.
const Q_CONTROL: (u32, u32) = (0, 2);
const OUTPUT_SELECTOR: (u32, u32) = (2, 3);
const ALU_OP: (u32, u32) = (5, 5);
const CARRY: (u32, u32) = (10, 1);
const MASK_FLAG: (u32, u32) = (11, 1);

// BYTE.
const ROTATE: (u32, u32) = (0, 5);
const LENGTH: (u32, u32) = (5, 6);
const ROTATE_SOURCE: (u32, u32) = (11, 1);
const ROTATE_MASK: (u32, u32) = (12, 1);

// JUMP.
const CONDITION: (u32, u32) = (0, 5);
const TEST: (u32, u32) = (5, 1);
const INVERT: (u32, u32) = (6, 1);
const RPN: (u32, u32) = (7, 3);
const LPC: (u32, u32) = (10, 1);
const JUMP_TARGET: (u32, u32) = (12, 16);

// DISPATCH.
const DISPATCH_LENGTH: (u32, u32) = (5, 3);
const GC_VOLATILITY: (u32, u32) = (8, 1);
const OLDSPACE: (u32, u32) = (9, 1);
const MACRO_IR_DISPATCH: (u32, u32) = (11, 1);
const DISPATCH_CONSTANT: (u32, u32) = (12, 12);

/// The 2-bit major opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Alu = 0,
    Byte = 1,
    Jump = 2,
    Dispatch = 3,
}

/// Decoded M source field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MSource {
    /// M-memory location 0-63.
    Memory(u8),
    /// Functional source code 0-63.
    Functional(u8),
}

/// Decoded ALU/BYTE destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A-memory only.
    AMemory(u16),
    /// Optional M-memory write (shadowed into A-memory) plus a functional
    /// destination; functional code 0 means none.
    Functional { m_address: Option<u8>, code: u8 },
}

/// A raw microinstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Microinstruction(pub u64);

macro_rules! flag {
    ($get:ident, $with:ident, $field:ident) => {
        #[must_use]
        pub const fn $get(self) -> bool {
            get(self.0, $field.0, $field.1) != 0
        }

        #[must_use]
        pub const fn $with(self, on: bool) -> Self {
            Self(set(self.0, $field.0, $field.1, on as u64))
        }
    };
}

macro_rules! field {
    ($get:ident, $with:ident, $field:ident, $ty:ty) => {
        #[must_use]
        pub const fn $get(self) -> $ty {
            get(self.0, $field.0, $field.1) as $ty
        }

        #[must_use]
        pub const fn $with(self, value: $ty) -> Self {
            Self(set(self.0, $field.0, $field.1, value as u64))
        }
    };
}

impl Microinstruction {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw & MASK)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match get(self.0, OPCODE.0, OPCODE.1) {
            0 => Opcode::Alu,
            1 => Opcode::Byte,
            2 => Opcode::Jump,
            _ => Opcode::Dispatch,
        }
    }

    #[must_use]
    pub const fn with_opcode(self, op: Opcode) -> Self {
        Self(set(self.0, OPCODE.0, OPCODE.1, op as u64))
    }

    flag!(halt, with_halt, HALT);
    flag!(popj_after_next, with_popj_after_next, PJAN);
    flag!(stat_bit, with_stat_bit, STAT);
    flag!(ilong, with_ilong, ILONG);
    flag!(macro_fetch, with_macro_fetch, MACRO_FETCH);
    flag!(macro_stream_advance, with_macro_stream_advance, MACRO_STREAM_ADVANCE);
    flag!(slow_dest, with_slow_dest, SLOW_DEST);

    field!(a_source, with_a_source, A_SOURCE, u16);

    #[must_use]
    pub const fn m_source(self) -> MSource {
        let raw = get(self.0, M_SOURCE.0, M_SOURCE.1) as u8;
        if raw & 0x40 != 0 {
            MSource::Functional(raw & 0x3F)
        } else {
            MSource::Memory(raw & 0x3F)
        }
    }

    #[must_use]
    pub const fn with_m_source(self, source: MSource) -> Self {
        let raw = match source {
            MSource::Memory(addr) => addr & 0x3F,
            MSource::Functional(code) => 0x40 | (code & 0x3F),
        };
        Self(set(self.0, M_SOURCE.0, M_SOURCE.1, raw as u64))
    }

    // === Destination (ALU, BYTE) ===

    #[must_use]
    pub const fn destination(self) -> Destination {
        let raw = get(self.0, DEST.0, DEST.1);
        if raw & DEST_A_FLAG != 0 {
            Destination::AMemory((raw & 0xFFF) as u16)
        } else {
            let m_address = if raw & DEST_M_ENABLE != 0 {
                Some(((raw >> 6) & 0x3F) as u8)
            } else {
                None
            };
            Destination::Functional {
                m_address,
                code: (raw & 0x3F) as u8,
            }
        }
    }

    #[must_use]
    pub const fn with_destination(self, dest: Destination) -> Self {
        let raw = match dest {
            Destination::AMemory(addr) => DEST_A_FLAG | (addr as u64 & 0xFFF),
            Destination::Functional { m_address, code } => {
                let m = match m_address {
                    Some(addr) => DEST_M_ENABLE | ((addr as u64 & 0x3F) << 6),
                    None => 0,
                };
                m | (code as u64 & 0x3F)
            }
        };
        Self(set(self.0, DEST.0, DEST.1, raw))
    }

    // === ALU ===

    field!(q_control, with_q_control, Q_CONTROL, u8);
    field!(output_selector, with_output_selector, OUTPUT_SELECTOR, u8);
    field!(alu_op, with_alu_op, ALU_OP, u8);
    flag!(carry_in, with_carry_in, CARRY);
    flag!(mask, with_mask, MASK_FLAG);

    // === BYTE ===

    field!(rotate, with_rotate, ROTATE, u8);
    field!(length, with_length, LENGTH, u8);
    flag!(rotate_source, with_rotate_source, ROTATE_SOURCE);
    flag!(rotate_mask, with_rotate_mask, ROTATE_MASK);

    // === JUMP ===

    field!(condition, with_condition, CONDITION, u8);
    flag!(test, with_test, TEST);
    flag!(invert, with_invert, INVERT);
    field!(rpn, with_rpn, RPN, u8);
    flag!(lpc, with_lpc, LPC);
    field!(jump_target, with_jump_target, JUMP_TARGET, u16);

    // === DISPATCH ===
    // Rotate shares bits 0-4 with BYTE; LPC shares bit 10 with JUMP.

    field!(dispatch_length, with_dispatch_length, DISPATCH_LENGTH, u8);
    flag!(gc_volatility_enable, with_gc_volatility_enable, GC_VOLATILITY);
    flag!(oldspace_enable, with_oldspace_enable, OLDSPACE);
    flag!(macro_ir_dispatch, with_macro_ir_dispatch, MACRO_IR_DISPATCH);
    field!(dispatch_constant, with_dispatch_constant, DISPATCH_CONSTANT, u16);

    // === Assemblers ===

    /// An ALU instruction: `op` applied to A and M.
    #[must_use]
    pub const fn alu(op: u8) -> Self {
        Self(0).with_opcode(Opcode::Alu).with_alu_op(op)
    }

    /// A BYTE instruction.
    #[must_use]
    pub const fn byte(rotate: u8, length: u8, rotate_source: bool, rotate_mask: bool) -> Self {
        Self(0)
            .with_opcode(Opcode::Byte)
            .with_rotate(rotate)
            .with_length(length)
            .with_rotate_source(rotate_source)
            .with_rotate_mask(rotate_mask)
    }

    /// A conditional JUMP testing condition code `condition`.
    #[must_use]
    pub const fn jump(condition: u8, rpn: u8, target: u16) -> Self {
        Self(0)
            .with_opcode(Opcode::Jump)
            .with_test(true)
            .with_condition(condition)
            .with_rpn(rpn)
            .with_jump_target(target)
    }

    /// A JUMP taken when bit `bit` of M is set.
    #[must_use]
    pub const fn jump_if_bit(bit: u8, rpn: u8, target: u16) -> Self {
        Self(0)
            .with_opcode(Opcode::Jump)
            .with_condition(bit)
            .with_rpn(rpn)
            .with_jump_target(target)
    }

    /// A DISPATCH on `length` bits of M rotated right by `rotate`.
    #[must_use]
    pub const fn dispatch(rotate: u8, length: u8, base: u16) -> Self {
        Self(0)
            .with_opcode(Opcode::Dispatch)
            .with_rotate(rotate)
            .with_dispatch_length(length)
            .with_a_source(base)
    }

    /// Shorthand for an A-memory destination.
    #[must_use]
    pub const fn dest_a(self, address: u16) -> Self {
        self.with_destination(Destination::AMemory(address))
    }

    /// Shorthand for an M-memory destination (shadowed into A-memory).
    #[must_use]
    pub const fn dest_m(self, address: u8) -> Self {
        self.with_destination(Destination::Functional {
            m_address: Some(address),
            code: 0,
        })
    }

    /// Shorthand for a functional destination with no M-memory write.
    #[must_use]
    pub const fn dest_functional(self, code: u8) -> Self {
        self.with_destination(Destination::Functional {
            m_address: None,
            code,
        })
    }

    /// Shorthand for an M-memory source.
    #[must_use]
    pub const fn src_m(self, address: u8) -> Self {
        self.with_m_source(MSource::Memory(address))
    }

    /// Shorthand for a functional M source.
    #[must_use]
    pub const fn src_functional(self, code: u8) -> Self {
        self.with_m_source(MSource::Functional(code))
    }
}

impl From<u64> for Microinstruction {
    fn from(raw: u64) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_fields_round_trip() {
        let mi = Microinstruction::alu(0x19)
            .with_halt(true)
            .with_popj_after_next(true)
            .with_stat_bit(true)
            .with_ilong(true)
            .with_macro_fetch(true)
            .with_macro_stream_advance(true)
            .with_slow_dest(true)
            .with_a_source(0xABC)
            .src_functional(0o24);

        assert_eq!(mi.opcode(), Opcode::Alu);
        assert!(mi.halt() && mi.popj_after_next() && mi.stat_bit());
        assert!(mi.ilong() && mi.macro_fetch() && mi.macro_stream_advance());
        assert!(mi.slow_dest());
        assert_eq!(mi.a_source(), 0xABC);
        assert_eq!(mi.m_source(), MSource::Functional(0o24));
        assert_eq!(mi.alu_op(), 0x19);
        assert_eq!(mi.raw() & !MASK, 0);
    }

    #[test]
    fn destination_round_trip() {
        for dest in [
            Destination::AMemory(0xFFF),
            Destination::AMemory(2),
            Destination::Functional { m_address: Some(63), code: 0 },
            Destination::Functional { m_address: None, code: 27 },
            Destination::Functional { m_address: Some(5), code: 12 },
        ] {
            let mi = Microinstruction::alu(0).with_destination(dest);
            assert_eq!(mi.destination(), dest);
        }
    }

    #[test]
    fn alu_fields_do_not_overlap() {
        let mi = Microinstruction::alu(0x1F)
            .with_q_control(3)
            .with_output_selector(6)
            .with_carry_in(true)
            .with_mask(true)
            .dest_a(0x123);
        assert_eq!(mi.q_control(), 3);
        assert_eq!(mi.output_selector(), 6);
        assert_eq!(mi.alu_op(), 0x1F);
        assert!(mi.carry_in() && mi.mask());
        assert_eq!(mi.destination(), Destination::AMemory(0x123));
    }

    #[test]
    fn byte_fields_round_trip() {
        let mi = Microinstruction::byte(31, 32, true, false);
        assert_eq!(mi.opcode(), Opcode::Byte);
        assert_eq!((mi.rotate(), mi.length()), (31, 32));
        assert!(mi.rotate_source());
        assert!(!mi.rotate_mask());
    }

    #[test]
    fn jump_fields_round_trip() {
        let mi = Microinstruction::jump(7, 0b011, 0xBEEF)
            .with_invert(true)
            .with_lpc(true);
        assert_eq!(mi.opcode(), Opcode::Jump);
        assert!(mi.test() && mi.invert() && mi.lpc());
        assert_eq!(mi.condition(), 7);
        assert_eq!(mi.rpn(), 0b011);
        assert_eq!(mi.jump_target(), 0xBEEF);

        let bit = Microinstruction::jump_if_bit(17, 0b001, 4);
        assert!(!bit.test());
        assert_eq!(bit.condition(), 17);
    }

    #[test]
    fn dispatch_fields_round_trip() {
        let mi = Microinstruction::dispatch(8, 5, 0x400)
            .with_gc_volatility_enable(true)
            .with_oldspace_enable(true)
            .with_lpc(true)
            .with_macro_ir_dispatch(true)
            .with_dispatch_constant(0xFED);
        assert_eq!(mi.opcode(), Opcode::Dispatch);
        assert_eq!((mi.rotate(), mi.dispatch_length()), (8, 5));
        assert!(mi.gc_volatility_enable() && mi.oldspace_enable());
        assert!(mi.lpc() && mi.macro_ir_dispatch());
        assert_eq!(mi.dispatch_constant(), 0xFED);
        assert_eq!(mi.a_source(), 0x400);
    }

    #[test]
    fn new_truncates_to_56_bits() {
        assert_eq!(Microinstruction::new(u64::MAX).raw(), MASK);
    }
}

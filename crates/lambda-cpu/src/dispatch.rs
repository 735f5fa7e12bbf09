//! Dispatch words, dispatch index formation and the macro-instruction
//! dispatch memory.

use crate::bits::{get32, set32};

/// Entries in the macro-instruction dispatch memory.
pub const MID_ENTRIES: usize = 4096;

/// Ticks between a macro-IR DISPATCH and the MID lookup it schedules.
pub const MACRO_DISPATCH_DELAY: u8 = 2;

/// A dispatch word: `target:16 | rpn:3 | start_read:1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchWord(pub u32);

impl DispatchWord {
    #[must_use]
    pub const fn new(target: u16, rpn: u8, start_read: bool) -> Self {
        Self(0)
            .with_target(target)
            .with_rpn(rpn)
            .with_start_read(start_read)
    }

    #[must_use]
    pub const fn target(self) -> u16 {
        get32(self.0, 0, 16) as u16
    }

    #[must_use]
    pub const fn rpn(self) -> u8 {
        get32(self.0, 16, 3) as u8
    }

    #[must_use]
    pub const fn start_read(self) -> bool {
        get32(self.0, 19, 1) != 0
    }

    #[must_use]
    pub const fn with_target(self, target: u16) -> Self {
        Self(set32(self.0, 0, 16, target as u32))
    }

    #[must_use]
    pub const fn with_rpn(self, rpn: u8) -> Self {
        Self(set32(self.0, 16, 3, rpn as u32))
    }

    #[must_use]
    pub const fn with_start_read(self, on: bool) -> Self {
        Self(set32(self.0, 19, 1, on as u32))
    }
}

/// Form the A-memory index for a DISPATCH.
///
/// `length` bits of M rotated right by `rotate` are ORed into `base`. When
/// present, the GC trap results land in bit 0 (volatility) and bit 1
/// (oldspace).
#[must_use]
pub fn dispatch_index(
    base: u16,
    m: u32,
    rotate: u8,
    length: u8,
    volatility: Option<bool>,
    oldspace: Option<bool>,
) -> usize {
    let field = m.rotate_right(u32::from(rotate & 0x1F)) & ((1u32 << (length & 7)) - 1);
    let mut index = u32::from(base) | field;
    if volatility == Some(true) {
        index |= 1;
    }
    if oldspace == Some(true) {
        index |= 2;
    }
    (index & 0xFFF) as usize
}

/// Macro-instruction dispatch memory, indexed by the top 12 bits of a
/// macro-instruction halfword.
#[derive(Debug, Clone)]
pub struct MacroDispatchMemory {
    words: Vec<u32>,
}

impl MacroDispatchMemory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: vec![0; MID_ENTRIES],
        }
    }

    #[must_use]
    pub fn read(&self, address: u32) -> u32 {
        self.words[address as usize & (MID_ENTRIES - 1)]
    }

    pub fn write(&mut self, address: u32, word: u32) {
        self.words[address as usize & (MID_ENTRIES - 1)] = word;
    }

    /// Dispatch word for a macro-instruction.
    #[must_use]
    pub fn lookup(&self, macro_instruction: u16) -> DispatchWord {
        DispatchWord(self.read(u32::from(macro_instruction >> 4)))
    }
}

impl Default for MacroDispatchMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Macro-IR dispatch sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacroDispatch {
    #[default]
    Idle,
    Countdown {
        remaining: u8,
        /// M bus latched by the DISPATCH, used as the start-read address.
        m: u32,
        lpc: bool,
    },
}

/// One tick of the macro dispatch sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroDispatchStep {
    Idle,
    Waiting,
    Fire { m: u32, lpc: bool },
}

impl MacroDispatch {
    #[must_use]
    pub const fn start(m: u32, lpc: bool) -> Self {
        Self::Countdown {
            remaining: MACRO_DISPATCH_DELAY,
            m,
            lpc,
        }
    }

    /// Advance once per stall-eligible tick.
    pub fn step(&mut self) -> MacroDispatchStep {
        match *self {
            Self::Idle => MacroDispatchStep::Idle,
            Self::Countdown { remaining, m, lpc } if remaining <= 1 => {
                *self = Self::Idle;
                MacroDispatchStep::Fire { m, lpc }
            }
            Self::Countdown { remaining, m, lpc } => {
                *self = Self::Countdown {
                    remaining: remaining - 1,
                    m,
                    lpc,
                };
                MacroDispatchStep::Waiting
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_word_fields() {
        let w = DispatchWord::new(0xBEEF, 0b101, true);
        assert_eq!(w.0, 0x000D_BEEF);
        assert_eq!((w.target(), w.rpn(), w.start_read()), (0xBEEF, 0b101, true));
    }

    #[test]
    fn index_merges_rotated_field() {
        // Bits 8-11 of M into the low nibble of base 0x100.
        assert_eq!(dispatch_index(0x100, 0x0000_0A00, 8, 4, None, None), 0x10A);
        // Zero length contributes nothing.
        assert_eq!(dispatch_index(0x100, 0xFFFF_FFFF, 0, 0, None, None), 0x100);
    }

    #[test]
    fn index_gc_bits() {
        assert_eq!(dispatch_index(0x200, 0, 0, 0, Some(true), Some(false)), 0x201);
        assert_eq!(dispatch_index(0x200, 0, 0, 0, Some(false), Some(true)), 0x202);
        assert_eq!(dispatch_index(0x200, 0, 0, 0, None, None), 0x200);
    }

    #[test]
    fn mid_lookup_uses_opcode_top_bits() {
        let mut mid = MacroDispatchMemory::new();
        mid.write(0x123, DispatchWord::new(0x40, 0b001, false).0);
        assert_eq!(mid.lookup(0x1234).target(), 0x40);
        assert_eq!(mid.lookup(0x123F).target(), 0x40);
        assert_eq!(mid.lookup(0x1240).target(), 0);
    }

    #[test]
    fn macro_dispatch_fires_after_delay() {
        let mut md = MacroDispatch::start(0x55, true);
        assert_eq!(md.step(), MacroDispatchStep::Waiting);
        assert_eq!(md.step(), MacroDispatchStep::Fire { m: 0x55, lpc: true });
        assert_eq!(md.step(), MacroDispatchStep::Idle);
    }
}

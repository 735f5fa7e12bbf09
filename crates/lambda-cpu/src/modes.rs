//! Mode and configuration registers as bit-range views.

use crate::bits::{get32, set32};

/// How a statistics counter is clocked, from an RG-Mode source field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTrigger {
    Off,
    EveryInstruction,
    StatBit,
}

impl StatTrigger {
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::EveryInstruction,
            2 => Self::StatBit,
            _ => Self::Off,
        }
    }

    /// Does an instruction with `stat_bit` clock the counter?
    #[must_use]
    pub const fn fires(self, stat_bit: bool) -> bool {
        match self {
            Self::Off => false,
            Self::EveryInstruction => true,
            Self::StatBit => stat_bit,
        }
    }
}

/// RG-Mode: `main_stat:3 | aux_stat:3 | interrupt_enable:1 | sequence_break:1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgMode(pub u32);

impl RgMode {
    #[must_use]
    pub const fn main_stat(self) -> StatTrigger {
        StatTrigger::from_code(get32(self.0, 0, 3))
    }

    #[must_use]
    pub const fn aux_stat(self) -> StatTrigger {
        StatTrigger::from_code(get32(self.0, 3, 3))
    }

    #[must_use]
    pub const fn interrupt_enable(self) -> bool {
        get32(self.0, 6, 1) != 0
    }

    #[must_use]
    pub const fn sequence_break(self) -> bool {
        get32(self.0, 7, 1) != 0
    }

    #[must_use]
    pub const fn with_main_stat(self, code: u32) -> Self {
        Self(set32(self.0, 0, 3, code))
    }

    #[must_use]
    pub const fn with_aux_stat(self, code: u32) -> Self {
        Self(set32(self.0, 3, 3, code))
    }

    #[must_use]
    pub const fn with_interrupt_enable(self, on: bool) -> Self {
        Self(set32(self.0, 6, 1, on as u32))
    }

    #[must_use]
    pub const fn with_sequence_break(self, on: bool) -> Self {
        Self(set32(self.0, 7, 1, on as u32))
    }
}

/// DP-Mode: bit 0 selects the high half of PDL memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DpMode(pub u32);

impl DpMode {
    #[must_use]
    pub const fn pdl_high(self) -> bool {
        get32(self.0, 0, 1) != 0
    }

    #[must_use]
    pub const fn with_pdl_high(self, on: bool) -> Self {
        Self(set32(self.0, 0, 1, on as u32))
    }

    /// Full PDL address for an 11-bit pointer or index.
    #[must_use]
    pub const fn pdl_address(self, pointer: u32) -> usize {
        ((get32(self.0, 0, 1) << 11) | (pointer & 0x7FF)) as usize
    }
}

/// Processor-Mode, written by the debugger through SPY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorMode(pub u32);

impl ProcessorMode {
    #[must_use]
    pub const fn run(self) -> bool {
        get32(self.0, 0, 1) != 0
    }

    #[must_use]
    pub const fn debug_clock(self) -> bool {
        get32(self.0, 1, 1) != 0
    }

    #[must_use]
    pub const fn single_step(self) -> bool {
        get32(self.0, 2, 1) != 0
    }

    #[must_use]
    pub const fn reset_interrupt_counter(self) -> bool {
        get32(self.0, 3, 1) != 0
    }

    #[must_use]
    pub const fn force_hold(self) -> bool {
        get32(self.0, 4, 1) != 0
    }

    #[must_use]
    pub const fn with_run(self, on: bool) -> Self {
        Self(set32(self.0, 0, 1, on as u32))
    }

    #[must_use]
    pub const fn with_debug_clock(self, on: bool) -> Self {
        Self(set32(self.0, 1, 1, on as u32))
    }

    #[must_use]
    pub const fn with_single_step(self, on: bool) -> Self {
        Self(set32(self.0, 2, 1, on as u32))
    }

    #[must_use]
    pub const fn with_reset_interrupt_counter(self, on: bool) -> Self {
        Self(set32(self.0, 3, 1, on as u32))
    }

    #[must_use]
    pub const fn with_force_hold(self, on: bool) -> Self {
        Self(set32(self.0, 4, 1, on as u32))
    }
}

/// Configuration: `board_revision:4 | slot:4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Configuration(pub u32);

impl Configuration {
    #[must_use]
    pub const fn board_revision(self) -> u32 {
        get32(self.0, 0, 4)
    }

    #[must_use]
    pub const fn slot(self) -> u8 {
        get32(self.0, 4, 4) as u8
    }

    #[must_use]
    pub const fn with_board_revision(self, rev: u32) -> Self {
        Self(set32(self.0, 0, 4, rev))
    }

    #[must_use]
    pub const fn with_slot(self, slot: u8) -> Self {
        Self(set32(self.0, 4, 4, slot as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stat_triggers() {
        let rg = RgMode::default().with_main_stat(1).with_aux_stat(2);
        assert_eq!(rg.main_stat(), StatTrigger::EveryInstruction);
        assert_eq!(rg.aux_stat(), StatTrigger::StatBit);
        assert!(rg.aux_stat().fires(true));
        assert!(!rg.aux_stat().fires(false));
        assert_eq!(rg.with_main_stat(5).main_stat(), StatTrigger::Off);
    }

    #[test]
    fn pdl_addressing() {
        assert_eq!(DpMode::default().pdl_address(0xFFF), 0x7FF);
        assert_eq!(DpMode::default().with_pdl_high(true).pdl_address(3), 0x803);
    }

    proptest! {
        #[test]
        fn rg_mode_round_trip(main in 0u32..8, aux in 0u32..8, ie in any::<bool>(), sb in any::<bool>()) {
            let rg = RgMode::default()
                .with_main_stat(main)
                .with_aux_stat(aux)
                .with_interrupt_enable(ie)
                .with_sequence_break(sb);
            prop_assert_eq!(get32(rg.0, 0, 3), main);
            prop_assert_eq!(get32(rg.0, 3, 3), aux);
            prop_assert_eq!(rg.interrupt_enable(), ie);
            prop_assert_eq!(rg.sequence_break(), sb);
        }

        #[test]
        fn processor_mode_round_trip(bits in 0u32..32) {
            let pm = ProcessorMode::default()
                .with_run(bits & 1 != 0)
                .with_debug_clock(bits & 2 != 0)
                .with_single_step(bits & 4 != 0)
                .with_reset_interrupt_counter(bits & 8 != 0)
                .with_force_hold(bits & 16 != 0);
            prop_assert_eq!(pm.0, bits);
            prop_assert_eq!(ProcessorMode(bits), pm);
        }

        #[test]
        fn configuration_round_trip(rev in 0u32..16, slot in 0u8..16) {
            let c = Configuration::default().with_board_revision(rev).with_slot(slot);
            prop_assert_eq!((c.board_revision(), c.slot()), (rev, slot));
        }
    }
}

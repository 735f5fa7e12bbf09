//! M-bus source selection.

use crate::cpu::Lambda;
use crate::fault::Fault;
use crate::microinstruction::MSource;

/// Functional M-source codes.
pub mod msrc {
    pub const INTERRUPT_POINTER: u8 = 0;
    /// Current macro-instruction halfword.
    pub const MACRO_IR: u8 = 1;
    pub const MACRO_IR_WORD: u8 = 2;
    pub const LC: u8 = 3;
    pub const DISPATCH_CONSTANT: u8 = 4;
    pub const STAT_COUNTER: u8 = 5;
    pub const AUX_STAT_COUNTER: u8 = 6;
    pub const PDL_POINTER: u8 = 7;
    pub const PDL_INDEX: u8 = 8;
    /// PDL word under the pointer.
    pub const C_PDL_POINTER: u8 = 9;
    /// PDL word under the pointer, then decrement the pointer.
    pub const C_PDL_POINTER_POP: u8 = 10;
    /// PDL word under the index.
    pub const C_PDL_INDEX: u8 = 11;
    pub const MICRO_STACK_POINTER: u8 = 12;
    pub const MICRO_STACK_DATA: u8 = 13;
    pub const MICRO_STACK_POP: u8 = 14;
    pub const VMA: u8 = 15;
    pub const MD: u8 = 16;
    pub const Q: u8 = 17;
    /// Map entries are addressed by MD.
    pub const LV1_MAP: u8 = 18;
    pub const LV2_MAP_CONTROL: u8 = 19;
    pub const LV2_MAP_ADDRESS: u8 = 20;
    pub const MULTIPLIER: u8 = 21;
    pub const DP_MODE: u8 = 22;
    pub const RG_MODE: u8 = 23;
    pub const CONFIGURATION: u8 = 24;
    pub const MICRO_PC: u8 = 25;
    /// Bit 0 page fault, bit 1 bus error, bit 2 bus busy.
    pub const MEMORY_STATUS: u8 = 26;
    /// MID word addressed by MD.
    pub const MID: u8 = 27;
}

impl Lambda {
    /// Drive the M bus for this cycle.
    pub(crate) fn read_m_source(&mut self, source: MSource) -> Result<u32, Fault> {
        let code = match source {
            MSource::Memory(addr) => return Ok(self.m_mem[usize::from(addr)]),
            MSource::Functional(code) => code,
        };

        Ok(match code {
            msrc::INTERRUPT_POINTER => u32::from(self.interrupts.vector()),
            msrc::MACRO_IR => self.macro_halfword().into(),
            msrc::MACRO_IR_WORD => self.macro_ir,
            msrc::LC => self.lc,
            msrc::DISPATCH_CONSTANT => self.dispatch_constant.into(),
            msrc::STAT_COUNTER => self.stat_counter,
            msrc::AUX_STAT_COUNTER => self.aux_stat_counter,
            msrc::PDL_POINTER => self.pdl_pointer,
            msrc::PDL_INDEX => self.pdl_index,
            msrc::C_PDL_POINTER => self.pdl[self.dp_mode.pdl_address(self.pdl_pointer)],
            msrc::C_PDL_POINTER_POP => {
                let v = self.pdl[self.dp_mode.pdl_address(self.pdl_pointer)];
                self.pdl_pointer = self.pdl_pointer.wrapping_sub(1) & 0x7FF;
                v
            }
            msrc::C_PDL_INDEX => self.pdl[self.dp_mode.pdl_address(self.pdl_index)],
            msrc::MICRO_STACK_POINTER => self.micro_stack.pointer().into(),
            msrc::MICRO_STACK_DATA => self.micro_stack.peek().into(),
            msrc::MICRO_STACK_POP => {
                // An armed PJAN takes its return now rather than a cycle
                // later, so this pop sees the entry below it.
                if self.pjan.is_armed() {
                    self.pjan.cancel();
                    self.popj()?;
                }
                self.micro_stack.pop().into()
            }
            msrc::VMA => self.vma,
            msrc::MD => self.md,
            msrc::Q => self.q,
            msrc::LV1_MAP => self.vm.lv1(self.md).0,
            msrc::LV2_MAP_CONTROL => self.vm.lv2_control(self.md).0,
            msrc::LV2_MAP_ADDRESS => self.vm.lv2_address(self.md).0,
            msrc::MULTIPLIER => self.multiplier,
            msrc::DP_MODE => self.dp_mode.0,
            msrc::RG_MODE => self.rg_mode.0,
            msrc::CONFIGURATION => self.configuration.0,
            msrc::MICRO_PC => self.current_pc.into(),
            msrc::MEMORY_STATUS => {
                u32::from(self.page_fault)
                    | (u32::from(self.bus.bus_error()) << 1)
                    | (u32::from(self.bus.busy()) << 2)
            }
            msrc::MID => self.mid.read(self.md),
            _ => return Err(Fault::IllegalMSource(code)),
        })
    }

    /// The macro-instruction halfword selected at the last macro fetch.
    pub(crate) const fn macro_halfword(&self) -> u16 {
        if self.macro_high_half {
            (self.macro_ir >> 16) as u16
        } else {
            self.macro_ir as u16
        }
    }
}

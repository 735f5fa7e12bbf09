//! Writeback to A/M memory and the functional destinations.

use lambda_core::{Nubus, NubusRequest};
use log::trace;

use crate::bus_client::{BusTransfer, Purpose};
use crate::cpu::Lambda;
use crate::fault::Fault;
use crate::microinstruction::{Destination, MASK};
use crate::vm::{Access, ByteMode, Lv1Entry, Lv2Address, Lv2Control};

/// Functional destination codes. Zero means none.
pub mod fdest {
    pub const NONE: u8 = 0;
    pub const LC: u8 = 1;
    pub const DP_MODE: u8 = 2;
    pub const RG_MODE: u8 = 3;
    pub const PDL_POINTER: u8 = 4;
    pub const PDL_INDEX: u8 = 5;
    /// PDL word under the pointer.
    pub const C_PDL_POINTER: u8 = 6;
    /// Increment the pointer, then write under it.
    pub const C_PDL_POINTER_PUSH: u8 = 7;
    /// PDL word under the index.
    pub const C_PDL_INDEX: u8 = 8;
    /// Increment the index, then write under it.
    pub const C_PDL_INDEX_INC: u8 = 9;
    /// Write under the index, then decrement it.
    pub const C_PDL_INDEX_DEC: u8 = 10;
    pub const VMA: u8 = 11;
    pub const VMA_START_READ: u8 = 12;
    pub const VMA_START_WRITE: u8 = 13;
    pub const VMA_START_READ_FORCE: u8 = 14;
    pub const VMA_START_WRITE_FORCE: u8 = 15;
    pub const MD: u8 = 16;
    pub const MD_START_WRITE: u8 = 17;
    /// Map entries are addressed by MD.
    pub const LV1_MAP: u8 = 18;
    pub const LV2_MAP_CONTROL: u8 = 19;
    pub const LV2_MAP_ADDRESS: u8 = 20;
    pub const MICRO_STACK_POINTER: u8 = 21;
    pub const MICRO_STACK_PUSH: u8 = 22;
    /// Low 32 bits of the instruction-modify overlay.
    pub const IMOD_LOW: u8 = 23;
    pub const IMOD_HIGH: u8 = 24;
    pub const CRAM_DATA_LOW: u8 = 25;
    pub const CRAM_DATA_HIGH: u8 = 26;
    /// Store the CRAM data latch at the micro-address in the value.
    pub const CRAM_WRITE: u8 = 27;
    /// Value bits 16-27 select the page, bits 0-11 the physical page.
    pub const CRAM_MAP: u8 = 28;
    pub const MULTIPLIER: u8 = 29;
    /// Value is the vector to clear.
    pub const INTERRUPT_CLEAR: u8 = 30;
    pub const STAT_COUNTER: u8 = 31;
    pub const AUX_STAT_COUNTER: u8 = 32;
    /// MID word addressed by MD.
    pub const MID: u8 = 33;
    pub const MACRO_IR: u8 = 34;
}

/// Signed product of the two 16-bit halves of `operands`.
#[must_use]
pub(crate) const fn multiply(operands: u32) -> u32 {
    let x = operands as u16 as i16 as i32;
    let y = (operands >> 16) as u16 as i16 as i32;
    (x * y) as u32
}

impl Lambda {
    /// Apply the destination field of an ALU or BYTE instruction.
    pub(crate) fn write_destination(
        &mut self,
        dest: Destination,
        value: u32,
        bus: &mut Nubus,
    ) -> Result<(), Fault> {
        match dest {
            Destination::AMemory(addr) => {
                self.a_mem[usize::from(addr)] = value;
                Ok(())
            }
            Destination::Functional { m_address, code } => {
                if let Some(m) = m_address {
                    self.set_m_memory(m, value);
                }
                self.write_functional(code, value, bus)
            }
        }
    }

    fn write_functional(&mut self, code: u8, value: u32, bus: &mut Nubus) -> Result<(), Fault> {
        match code {
            fdest::NONE => {}
            fdest::LC => self.lc = value,
            fdest::DP_MODE => self.dp_mode.0 = value,
            fdest::RG_MODE => self.rg_mode.0 = value,
            fdest::PDL_POINTER => self.pdl_pointer = value & 0x7FF,
            fdest::PDL_INDEX => self.pdl_index = value & 0x7FF,
            fdest::C_PDL_POINTER => self.write_pdl(self.pdl_pointer, value),
            fdest::C_PDL_POINTER_PUSH => {
                self.pdl_pointer = (self.pdl_pointer + 1) & 0x7FF;
                self.write_pdl(self.pdl_pointer, value);
            }
            fdest::C_PDL_INDEX => self.write_pdl(self.pdl_index, value),
            fdest::C_PDL_INDEX_INC => {
                self.pdl_index = (self.pdl_index + 1) & 0x7FF;
                self.write_pdl(self.pdl_index, value);
            }
            fdest::C_PDL_INDEX_DEC => {
                self.write_pdl(self.pdl_index, value);
                self.pdl_index = self.pdl_index.wrapping_sub(1) & 0x7FF;
            }
            fdest::VMA => self.vma = value,
            fdest::VMA_START_READ => {
                self.vma = value;
                self.start_read(bus, false);
            }
            fdest::VMA_START_WRITE => {
                self.vma = value;
                self.start_write(bus, false);
            }
            fdest::VMA_START_READ_FORCE => {
                self.vma = value;
                self.start_read(bus, true);
            }
            fdest::VMA_START_WRITE_FORCE => {
                self.vma = value;
                self.start_write(bus, true);
            }
            fdest::MD => self.md = value,
            fdest::MD_START_WRITE => {
                self.md = value;
                self.start_write(bus, false);
            }
            fdest::LV1_MAP => self.vm.set_lv1(self.md, Lv1Entry(value)),
            fdest::LV2_MAP_CONTROL => self.vm.set_lv2_control(self.md, Lv2Control(value)),
            fdest::LV2_MAP_ADDRESS => self.vm.set_lv2_address(self.md, Lv2Address(value)),
            fdest::MICRO_STACK_POINTER => self.micro_stack.set_pointer(value as u8),
            fdest::MICRO_STACK_PUSH => self.micro_stack.push(value as u16),
            fdest::IMOD_LOW => {
                self.imod = (self.imod & !0xFFFF_FFFF) | u64::from(value);
            }
            fdest::IMOD_HIGH => {
                self.imod = ((self.imod & 0xFFFF_FFFF) | (u64::from(value) << 32)) & MASK;
            }
            fdest::CRAM_DATA_LOW => {
                self.cram_data = (self.cram_data & !0xFFFF_FFFF) | u64::from(value);
            }
            fdest::CRAM_DATA_HIGH => {
                self.cram_data = ((self.cram_data & 0xFFFF_FFFF) | (u64::from(value) << 32)) & MASK;
            }
            fdest::CRAM_WRITE => {
                let slot = self.cram_slot(value as u16);
                self.cram[slot] = self.cram_data;
                self.stalls.cram_write = true;
                trace!("CRAM write {:#06X} <- {:#016X}", value as u16, self.cram_data);
            }
            fdest::CRAM_MAP => {
                let page = ((value >> 16) & 0x0FFF) as u16;
                self.set_cram_map(page, (value & 0x0FFF) as u16);
            }
            fdest::MULTIPLIER => self.multiplier = multiply(value),
            fdest::INTERRUPT_CLEAR => self.interrupts.clear(value as u8),
            fdest::STAT_COUNTER => self.stat_counter = value,
            fdest::AUX_STAT_COUNTER => self.aux_stat_counter = value,
            fdest::MID => self.mid.write(self.md, value),
            fdest::MACRO_IR => self.macro_ir = value,
            _ => return Err(Fault::IllegalDestination(code)),
        }
        Ok(())
    }

    fn write_pdl(&mut self, pointer: u32, value: u32) {
        let addr = self.dp_mode.pdl_address(pointer);
        self.pdl[addr] = value;
    }

    /// Translate VMA and read it into MD. A page fault only sets the flag.
    pub(crate) fn start_read(&mut self, bus: &mut Nubus, force: bool) {
        let t = self.vm.resolve(self.vma, Access::Read, force);
        self.page_fault = t.page_fault;
        if t.page_fault {
            return;
        }
        let request = match t.byte_mode {
            ByteMode::Word => NubusRequest::ReadWord,
            ByteMode::Byte(_) => NubusRequest::ReadByte,
        };
        self.bus.request(
            bus,
            BusTransfer {
                request,
                address: t.bus_address(),
                data: 0,
                purpose: Purpose::Data,
            },
        );
    }

    /// Translate VMA and write MD there.
    pub(crate) fn start_write(&mut self, bus: &mut Nubus, force: bool) {
        let t = self.vm.resolve(self.vma, Access::Write, force);
        self.page_fault = t.page_fault;
        if t.page_fault {
            return;
        }
        let request = match t.byte_mode {
            ByteMode::Word => NubusRequest::WriteWord,
            ByteMode::Byte(_) => NubusRequest::WriteByte,
        };
        self.bus.request(
            bus,
            BusTransfer {
                request,
                address: t.bus_address(),
                data: self.md,
                purpose: Purpose::Data,
            },
        );
    }
}

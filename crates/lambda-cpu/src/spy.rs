//! SPY debug port: the processor as a NuBus slave.
//!
//! The board answers two windows of its slot space. Offsets `0x000-0x0FF`
//! are the SPY registers, one per word. Offsets `0x400-0x7FF` are the
//! interrupt-status window: writing word `v` raises vector `v`.

use lambda_core::{Nubus, lane_read, lane_write, slot_of};
use log::{debug, warn};

use crate::cpu::Lambda;
use crate::microinstruction::{MASK, Microinstruction};
use crate::modes::{Configuration, DpMode, ProcessorMode, RgMode};

const SPY_WINDOW_END: u32 = 0x100;
const INTERRUPT_WINDOW: core::ops::Range<u32> = 0x400..0x800;

/// SPY register numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpyRegister {
    IrLow = 0,
    IrHigh = 1,
    CramDataLow = 2,
    CramDataHigh = 3,
    CramAddress = 4,
    CramMap = 5,
    TramAddress = 6,
    TramData = 7,
    HistoryPointer = 8,
    HistoryData = 9,
    Multiplier = 10,
    ProcessorMode = 11,
    Configuration = 12,
    DpMode = 13,
    RgMode = 14,
    ParityVector = 15,
    Pc = 16,
    Md = 17,
    Vma = 18,
    StatCounter = 19,
    AuxStatCounter = 20,
    MacroIr = 21,
    Lc = 22,
}

impl TryFrom<u32> for SpyRegister {
    type Error = u32;

    fn try_from(index: u32) -> Result<Self, u32> {
        use SpyRegister as R;
        const ALL: [SpyRegister; 23] = [
            R::IrLow,
            R::IrHigh,
            R::CramDataLow,
            R::CramDataHigh,
            R::CramAddress,
            R::CramMap,
            R::TramAddress,
            R::TramData,
            R::HistoryPointer,
            R::HistoryData,
            R::Multiplier,
            R::ProcessorMode,
            R::Configuration,
            R::DpMode,
            R::RgMode,
            R::ParityVector,
            R::Pc,
            R::Md,
            R::Vma,
            R::StatCounter,
            R::AuxStatCounter,
            R::MacroIr,
            R::Lc,
        ];
        ALL.get(index as usize).copied().ok_or(index)
    }
}

/// Byte offset of `register` within the board's slot space.
#[must_use]
pub const fn spy_offset(register: SpyRegister) -> u32 {
    (register as u32) << 2
}

/// Byte offset of interrupt `vector` within the board's slot space.
#[must_use]
pub const fn interrupt_offset(vector: u8) -> u32 {
    INTERRUPT_WINDOW.start + ((vector as u32) << 2)
}

impl Lambda {
    /// Is the bus waiting on us as a slave?
    pub(crate) fn spy_addressed(&self, bus: &Nubus) -> bool {
        if !bus.awaiting_slave() || slot_of(bus.address) != Some(self.configuration.slot()) {
            return false;
        }
        let offset = bus.address & 0x00FF_FFFF;
        offset < SPY_WINDOW_END || INTERRUPT_WINDOW.contains(&offset)
    }

    pub(crate) fn spy_respond(&mut self, bus: &mut Nubus) {
        let offset = bus.address & 0x00FF_FFFF;
        if INTERRUPT_WINDOW.contains(&offset) {
            self.interrupt_window(bus, offset);
            return;
        }

        let register = match SpyRegister::try_from(offset >> 2) {
            Ok(r) => r,
            Err(index) => {
                warn!("SPY: undefined register {index} from master {:#04X}", bus.master);
                bus.fail();
                return;
            }
        };

        let lane = bus.lane();
        let current = self.spy_read(register);
        match (bus.request.is_write(), bus.request.is_byte()) {
            (false, false) => bus.acknowledge(Some(current)),
            (false, true) => bus.acknowledge(Some(lane_read(current, lane))),
            (true, byte) => {
                let value = if byte {
                    lane_write(current, bus.data, lane)
                } else {
                    bus.data
                };
                self.spy_write(register, value);
                bus.acknowledge(None);
            }
        }
    }

    fn interrupt_window(&mut self, bus: &mut Nubus, offset: u32) {
        let vector = ((offset - INTERRUPT_WINDOW.start) >> 2) as u8;
        if bus.request.is_write() {
            if self.rg_mode.interrupt_enable() {
                self.interrupts.raise(vector);
            }
            bus.acknowledge(None);
        } else {
            bus.acknowledge(Some(u32::from(self.interrupts.is_set(vector))));
        }
    }

    /// Current value of a SPY register.
    #[must_use]
    pub fn spy_read(&self, register: SpyRegister) -> u32 {
        use SpyRegister as R;
        match register {
            R::IrLow => self.ir.raw() as u32,
            R::IrHigh => (self.ir.raw() >> 32) as u32,
            R::CramDataLow => self.cram_data as u32,
            R::CramDataHigh => (self.cram_data >> 32) as u32,
            R::CramAddress => self.cram_address.into(),
            R::CramMap => self.cram_map[usize::from(self.cram_address >> 4)].into(),
            R::TramAddress => self.tram_address.into(),
            R::TramData => self.tram[usize::from(self.tram_address)],
            R::HistoryPointer => self.history.pointer().into(),
            R::HistoryData => self.history.data().into(),
            R::Multiplier => self.multiplier,
            R::ProcessorMode => self.processor_mode.0,
            R::Configuration => self.configuration.0,
            R::DpMode => self.dp_mode.0,
            R::RgMode => self.rg_mode.0,
            R::ParityVector => self.parity_vector,
            R::Pc => self.current_pc.into(),
            R::Md => self.md,
            R::Vma => self.vma,
            R::StatCounter => self.stat_counter,
            R::AuxStatCounter => self.aux_stat_counter,
            R::MacroIr => self.macro_ir,
            R::Lc => self.lc,
        }
    }

    /// Write a SPY register with its side effects.
    pub fn spy_write(&mut self, register: SpyRegister, value: u32) {
        use SpyRegister as R;
        match register {
            R::IrLow => {
                self.ir = Microinstruction((self.ir.raw() & !0xFFFF_FFFF) | u64::from(value));
                self.spy_ir_loaded = true;
            }
            R::IrHigh => {
                let raw = (self.ir.raw() & 0xFFFF_FFFF) | (u64::from(value) << 32);
                self.ir = Microinstruction(raw & MASK);
                self.spy_ir_loaded = true;
            }
            R::CramDataLow => {
                self.cram_data = (self.cram_data & !0xFFFF_FFFF) | u64::from(value);
                self.cram[usize::from(self.cram_address)] = self.cram_data;
            }
            R::CramDataHigh => {
                self.cram_data = ((self.cram_data & 0xFFFF_FFFF) | (u64::from(value) << 32)) & MASK;
                self.cram[usize::from(self.cram_address)] = self.cram_data;
            }
            R::CramAddress => {
                self.cram_address = value as u16;
                self.cram_data = self.cram[usize::from(self.cram_address)];
            }
            R::CramMap => self.set_cram_map(self.cram_address >> 4, value as u16),
            R::TramAddress => self.tram_address = (value & 0x0FFF) as u16,
            R::TramData => self.tram[usize::from(self.tram_address)] = value,
            R::HistoryPointer => self.history.set_pointer(value as u16),
            R::HistoryData => {}
            R::Multiplier => self.multiplier = value,
            R::ProcessorMode => self.write_processor_mode(ProcessorMode(value)),
            R::Configuration => self.configuration = Configuration(value),
            R::DpMode => self.dp_mode = DpMode(value),
            R::RgMode => self.rg_mode = RgMode(value),
            R::ParityVector => self.parity_vector = value,
            R::Pc => self.next_pc = value as u16,
            R::Md => self.md = value,
            R::Vma => self.vma = value,
            R::StatCounter => self.stat_counter = value,
            R::AuxStatCounter => self.aux_stat_counter = value,
            R::MacroIr => self.macro_ir = value,
            R::Lc => self.lc = value,
        }
    }

    /// Processor-Mode writes act on bit edges.
    fn write_processor_mode(&mut self, new: ProcessorMode) {
        let old = self.processor_mode;
        self.processor_mode = new;

        if new.run() != old.run() {
            debug!("SPY: run {}", new.run());
            self.halted = !new.run();
        }
        // The debug clock only steps a halted processor.
        if new.debug_clock() && !old.debug_clock() && self.halted {
            debug!("SPY: debug clock step");
            self.step_request = true;
        }
        if new.reset_interrupt_counter() && !old.reset_interrupt_counter() {
            debug!("SPY: interrupts reset");
            self.interrupts.reset();
        }
        if new.force_hold() != old.force_hold() {
            debug!("SPY: force hold {}", new.force_hold());
            self.stalls.forced_hold = new.force_hold();
        }
    }
}

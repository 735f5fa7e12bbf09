//! Processor state and its public surface.

use lambda_core::{Cpu, Nubus, Observable, Ticks, Value};
use log::{debug, error};

use crate::bus_client::BusClient;
use crate::config::LambdaConfig;
use crate::dispatch::{MacroDispatch, MacroDispatchMemory};
use crate::fault::Fault;
use crate::history::History;
use crate::interrupts::Interrupts;
use crate::micro_stack::{MicroStack, PopjAfterNext};
use crate::microinstruction::{MASK, Microinstruction};
use crate::modes::{Configuration, DpMode, ProcessorMode, RgMode};
use crate::vm::VmTranslator;

/// Control store size in microinstructions.
pub const CRAM_WORDS: usize = 65536;
/// Control store page map entries (16 instructions per page).
pub const CRAM_MAP_ENTRIES: usize = 4096;
/// A-memory size in words.
pub const A_MEMORY_WORDS: usize = 4096;
/// M-memory size in words. M-memory shadows the bottom of A-memory.
pub const M_MEMORY_WORDS: usize = 64;
/// PDL buffer size in words.
pub const PDL_WORDS: usize = 4096;
/// Timing RAM size.
pub const TRAM_WORDS: usize = 4096;

/// Pending stall conditions. At most one is consumed per tick, in field
/// order after the PJAN countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Stalls {
    /// Asserted by the debugger; holds until released.
    pub forced_hold: bool,
    pub slow_dest: bool,
    pub long_inst: bool,
    pub noop_next: bool,
    pub cram_write: bool,
}

/// Programmer-visible register snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub pc: u16,
    pub next_pc: u16,
    pub after_next_pc: Option<u16>,
    pub ir: u64,
    pub q: u32,
    pub md: u32,
    pub vma: u32,
    pub lc: u32,
    pub macro_ir: u32,
    pub micro_stack_pointer: u8,
    pub dispatch_constant: u16,
    pub multiplier: u32,
    pub pdl_pointer: u32,
    pub pdl_index: u32,
}

/// One LMI Lambda processor board.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub(crate) config: LambdaConfig,

    // === Cycle latches ===
    pub(crate) a_value: u32,
    pub(crate) m_value: u32,
    /// ALU output after output selection.
    pub(crate) o_value: u32,
    /// Shifter result.
    pub(crate) r_value: u32,

    // === Sequencer ===
    pub(crate) ir: Microinstruction,
    pub(crate) current_pc: u16,
    pub(crate) next_pc: u16,
    pub(crate) after_next_pc: Option<u16>,
    pub(crate) pjan: PopjAfterNext,
    pub(crate) micro_stack: MicroStack,
    pub(crate) stalls: Stalls,
    pub(crate) macro_dispatch: MacroDispatch,
    /// Instruction-modify overlay ORed into the next fetch.
    pub(crate) imod: u64,
    /// The debugger wrote IR; execute it instead of fetching.
    pub(crate) spy_ir_loaded: bool,

    // === Control store ===
    pub(crate) cram: Vec<u64>,
    pub(crate) cram_map: Vec<u16>,
    /// Data latch for CRAM-WRITE and the SPY control-store window.
    pub(crate) cram_data: u64,
    pub(crate) cram_address: u16,

    // === Register files ===
    pub(crate) a_mem: Vec<u32>,
    pub(crate) m_mem: [u32; M_MEMORY_WORDS],
    pub(crate) pdl: Vec<u32>,
    pub(crate) pdl_pointer: u32,
    pub(crate) pdl_index: u32,
    pub(crate) mid: MacroDispatchMemory,
    pub(crate) q: u32,
    pub(crate) dispatch_constant: u16,
    pub(crate) multiplier: u32,

    // === Macro-instruction stream ===
    pub(crate) macro_ir: u32,
    pub(crate) lc: u32,
    /// LC bit 1 at the last macro fetch: selects the high halfword.
    pub(crate) macro_high_half: bool,

    // === Memory interface ===
    pub(crate) vma: u32,
    pub(crate) md: u32,
    pub(crate) vm: VmTranslator,
    pub(crate) page_fault: bool,
    pub(crate) bus: BusClient,

    // === Interrupts and modes ===
    pub(crate) interrupts: Interrupts,
    pub(crate) dp_mode: DpMode,
    pub(crate) rg_mode: RgMode,
    pub(crate) configuration: Configuration,
    pub(crate) processor_mode: ProcessorMode,

    // === Debug ===
    pub(crate) history: History,
    pub(crate) tram: Vec<u32>,
    pub(crate) tram_address: u16,
    pub(crate) parity_vector: u32,
    pub(crate) stat_counter: u32,
    pub(crate) aux_stat_counter: u32,

    // === Run state ===
    pub(crate) halted: bool,
    pub(crate) step_request: bool,
    pub(crate) die_request: Option<Fault>,
    pub(crate) total_cycles: Ticks,
    pub(crate) instructions: u64,
}

impl Lambda {
    /// A processor in `slot` with default configuration.
    #[must_use]
    pub fn new(slot: u8) -> Self {
        Self::with_config(LambdaConfig {
            slot,
            ..LambdaConfig::default()
        })
    }

    #[must_use]
    pub fn with_config(config: LambdaConfig) -> Self {
        Self {
            config,
            a_value: 0,
            m_value: 0,
            o_value: 0,
            r_value: 0,
            ir: Microinstruction::default(),
            current_pc: 0,
            next_pc: 0,
            after_next_pc: None,
            pjan: PopjAfterNext::default(),
            micro_stack: MicroStack::new(),
            stalls: Stalls::default(),
            macro_dispatch: MacroDispatch::Idle,
            imod: 0,
            spy_ir_loaded: false,
            cram: vec![0; CRAM_WORDS],
            cram_map: (0..CRAM_MAP_ENTRIES as u16).collect(),
            cram_data: 0,
            cram_address: 0,
            a_mem: vec![0; A_MEMORY_WORDS],
            m_mem: [0; M_MEMORY_WORDS],
            pdl: vec![0; PDL_WORDS],
            pdl_pointer: 0,
            pdl_index: 0,
            mid: MacroDispatchMemory::new(),
            q: 0,
            dispatch_constant: 0,
            multiplier: 0,
            macro_ir: 0,
            lc: 0,
            macro_high_half: false,
            vma: 0,
            md: 0,
            vm: VmTranslator::new(),
            page_fault: false,
            bus: BusClient::new(config.slot),
            interrupts: Interrupts::new(),
            dp_mode: DpMode::default(),
            rg_mode: RgMode::default(),
            configuration: Configuration::default()
                .with_slot(config.slot)
                .with_board_revision(u32::from(config.board_revision)),
            processor_mode: ProcessorMode::default().with_run(config.start_running),
            history: History::new(),
            tram: vec![0; TRAM_WORDS],
            tram_address: 0,
            parity_vector: 0,
            stat_counter: 0,
            aux_stat_counter: 0,
            halted: !config.start_running,
            step_request: false,
            die_request: None,
            total_cycles: Ticks::ZERO,
            instructions: 0,
        }
    }

    /// Return to power-on state and take `bus_id` as the master ID.
    ///
    /// Control store, its map and the VM maps survive; everything the
    /// sequencer owns does not.
    pub fn initialize(&mut self, bus_id: u8) {
        let cram = std::mem::take(&mut self.cram);
        let cram_map = std::mem::take(&mut self.cram_map);
        let vm = std::mem::take(&mut self.vm);
        *self = Self::with_config(self.config);
        self.cram = cram;
        self.cram_map = cram_map;
        self.vm = vm;
        self.bus.set_master_id(bus_id);
        debug!("lambda slot {}: initialized as master {bus_id:#04X}", self.config.slot);
    }

    /// Let the sequencer run.
    pub fn start(&mut self) {
        self.halted = false;
        self.processor_mode = self.processor_mode.with_run(true);
    }

    /// Stop at the next cycle boundary.
    pub fn halt(&mut self) {
        self.halted = true;
        self.processor_mode = self.processor_mode.with_run(false);
    }

    /// The fault that stopped this processor, if any.
    #[must_use]
    pub fn die_request(&self) -> Option<&Fault> {
        self.die_request.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &LambdaConfig {
        &self.config
    }

    #[must_use]
    pub const fn bus_id(&self) -> u8 {
        self.bus.master_id()
    }

    #[must_use]
    pub const fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    /// Microinstructions executed (stall cycles excluded).
    #[must_use]
    pub const fn instructions(&self) -> u64 {
        self.instructions
    }

    // === Control store ===

    /// Physical control-store slot of micro-address `address`.
    #[must_use]
    pub fn cram_slot(&self, address: u16) -> usize {
        let page = self.cram_map[usize::from(address >> 4)] & 0x0FFF;
        (usize::from(page) << 4) | usize::from(address & 0xF)
    }

    /// Store `word` at micro-address `address`, through the page map.
    pub fn write_control_store(&mut self, address: u16, word: Microinstruction) {
        let slot = self.cram_slot(address);
        self.cram[slot] = word.raw() & MASK;
    }

    /// Load consecutive words starting at micro-address `start`.
    pub fn load_control_store(&mut self, start: u16, words: &[Microinstruction]) {
        for (i, &w) in words.iter().enumerate() {
            self.write_control_store(start.wrapping_add(i as u16), w);
        }
    }

    #[must_use]
    pub fn read_control_store(&self, address: u16) -> Microinstruction {
        Microinstruction(self.cram[self.cram_slot(address)])
    }

    pub fn set_cram_map(&mut self, page: u16, physical_page: u16) {
        self.cram_map[usize::from(page & 0x0FFF)] = physical_page & 0x0FFF;
    }

    // === Register files ===

    #[must_use]
    pub fn a_memory(&self, address: u16) -> u32 {
        self.a_mem[usize::from(address) & (A_MEMORY_WORDS - 1)]
    }

    pub fn set_a_memory(&mut self, address: u16, value: u32) {
        self.a_mem[usize::from(address) & (A_MEMORY_WORDS - 1)] = value;
    }

    #[must_use]
    pub fn m_memory(&self, address: u8) -> u32 {
        self.m_mem[usize::from(address) & (M_MEMORY_WORDS - 1)]
    }

    /// Write M-memory and its A-memory shadow.
    pub fn set_m_memory(&mut self, address: u8, value: u32) {
        let i = usize::from(address) & (M_MEMORY_WORDS - 1);
        self.m_mem[i] = value;
        self.a_mem[i] = value;
    }

    #[must_use]
    pub fn pdl(&self, address: u16) -> u32 {
        self.pdl[usize::from(address) & (PDL_WORDS - 1)]
    }

    pub fn set_mid(&mut self, address: u32, word: u32) {
        self.mid.write(address, word);
    }

    pub fn set_lc(&mut self, lc: u32) {
        self.lc = lc;
    }

    pub fn set_rg_mode(&mut self, rg: RgMode) {
        self.rg_mode = rg;
    }

    #[must_use]
    pub const fn rg_mode(&self) -> RgMode {
        self.rg_mode
    }

    /// The VM map hardware, for loaders and debuggers.
    pub fn vm_mut(&mut self) -> &mut VmTranslator {
        &mut self.vm
    }

    #[must_use]
    pub const fn vm(&self) -> &VmTranslator {
        &self.vm
    }

    #[must_use]
    pub const fn page_fault(&self) -> bool {
        self.page_fault
    }

    #[must_use]
    pub const fn interrupts_pending(&self) -> u32 {
        self.interrupts.pending()
    }

    #[must_use]
    pub const fn stat_counters(&self) -> (u32, u32) {
        (self.stat_counter, self.aux_stat_counter)
    }

    #[must_use]
    pub const fn micro_stack(&self) -> &MicroStack {
        &self.micro_stack
    }

    /// The `n`th most recently executed micro-PC.
    #[must_use]
    pub fn history(&self, n: usize) -> u16 {
        self.history.recent(n)
    }

    /// Record a fatal fault. The processor never executes again.
    pub(crate) fn die(&mut self, fault: Fault) {
        error!(
            "lambda slot {}: {fault} at micro-PC {:#06X}",
            self.config.slot, self.current_pc
        );
        if self.die_request.is_none() {
            self.die_request = Some(fault);
        }
    }
}

impl Cpu for Lambda {
    type Registers = Registers;

    fn clock_pulse(&mut self, bus: &mut Nubus) {
        Self::clock_pulse(self, bus);
    }

    fn pc(&self) -> u32 {
        u32::from(self.current_pc)
    }

    fn registers(&self) -> Registers {
        Registers {
            pc: self.current_pc,
            next_pc: self.next_pc,
            after_next_pc: self.after_next_pc,
            ir: self.ir.raw(),
            q: self.q,
            md: self.md,
            vma: self.vma,
            lc: self.lc,
            macro_ir: self.macro_ir,
            micro_stack_pointer: self.micro_stack.pointer(),
            dispatch_constant: self.dispatch_constant,
            multiplier: self.multiplier,
            pdl_pointer: self.pdl_pointer,
            pdl_index: self.pdl_index,
        }
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn reset(&mut self) {
        self.initialize(self.bus.master_id());
    }
}

const LAMBDA_QUERY_PATHS: &[&str] = &[
    "pc", "next_pc", "after_next_pc", "ir",
    "q", "md", "vma", "lc", "macro_ir",
    "a", "m", "o", "r",
    "micro_stack.pointer", "micro_stack.top",
    "pjan.countdown",
    "interrupts.pending", "interrupts.vector",
    "page_fault", "bus_error",
    "dispatch_constant", "multiplier",
    "pdl.pointer", "pdl.index",
    "stat_counter", "aux_stat_counter",
    "halted", "die_request", "cycles", "instructions",
];

impl Observable for Lambda {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.current_pc.into()),
            "next_pc" => Some(self.next_pc.into()),
            "after_next_pc" => Some(self.after_next_pc.into()),
            "ir" => Some(Value::Word56(self.ir.raw())),
            "q" => Some(self.q.into()),
            "md" => Some(self.md.into()),
            "vma" => Some(self.vma.into()),
            "lc" => Some(self.lc.into()),
            "macro_ir" => Some(self.macro_ir.into()),
            "a" => Some(self.a_value.into()),
            "m" => Some(self.m_value.into()),
            "o" => Some(self.o_value.into()),
            "r" => Some(self.r_value.into()),
            "micro_stack.pointer" => Some(self.micro_stack.pointer().into()),
            "micro_stack.top" => Some(self.micro_stack.peek().into()),
            "pjan.countdown" => Some(self.pjan.countdown().into()),
            "interrupts.pending" => Some(self.interrupts.pending().into()),
            "interrupts.vector" => Some(self.interrupts.vector().into()),
            "page_fault" => Some(self.page_fault.into()),
            "bus_error" => Some(self.bus.bus_error().into()),
            "dispatch_constant" => Some(self.dispatch_constant.into()),
            "multiplier" => Some(self.multiplier.into()),
            "pdl.pointer" => Some(self.pdl_pointer.into()),
            "pdl.index" => Some(self.pdl_index.into()),
            "stat_counter" => Some(self.stat_counter.into()),
            "aux_stat_counter" => Some(self.aux_stat_counter.into()),
            "halted" => Some(self.halted.into()),
            "die_request" => Some(self.die_request.as_ref().map(ToString::to_string).into()),
            "cycles" => Some(self.total_cycles.get().into()),
            "instructions" => Some(self.instructions.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        LAMBDA_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_halted_unless_configured() {
        assert!(Lambda::new(0).is_halted());
        let running = Lambda::with_config(LambdaConfig {
            start_running: true,
            ..LambdaConfig::default()
        });
        assert!(!running.is_halted());
        assert!(running.processor_mode.run());
    }

    #[test]
    fn cram_map_starts_identity() {
        let mut cpu = Lambda::new(0);
        assert_eq!(cpu.cram_slot(0x1234), 0x1234);
        cpu.set_cram_map(0x123, 0x050);
        assert_eq!(cpu.cram_slot(0x1234), 0x0504);
    }

    #[test]
    fn m_memory_writes_shadow_a() {
        let mut cpu = Lambda::new(0);
        cpu.set_m_memory(3, 42);
        assert_eq!(cpu.a_memory(3), 42);
        assert_eq!(cpu.m_memory(3), 42);
    }

    #[test]
    fn initialize_keeps_control_store() {
        let mut cpu = Lambda::new(2);
        cpu.write_control_store(7, Microinstruction(0xABC));
        cpu.q = 99;
        cpu.initialize(0x12);
        assert_eq!(cpu.read_control_store(7).raw(), 0xABC);
        assert_eq!(cpu.q, 0);
        assert_eq!(cpu.bus_id(), 0x12);
    }

    #[test]
    fn every_query_path_answers() {
        let cpu = Lambda::new(0);
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "{path}");
        }
        assert_eq!(cpu.query("nonsense"), None);
        assert_eq!(cpu.query("die_request"), Some(Value::None));
    }
}

//! The per-tick sequencer: bus service, stalls, fetch.

use lambda_core::{Nubus, NubusRequest};
use log::{debug, trace};

use crate::bus_client::{BusTransfer, Purpose};
use crate::cpu::Lambda;
use crate::dispatch::{DispatchWord, MacroDispatchStep};
use crate::fault::Fault;
use crate::micro_stack::PjanStep;
use crate::microinstruction::{MASK, Microinstruction};
use crate::vm::Access;

impl Lambda {
    /// Advance exactly one system tick.
    pub fn clock_pulse(&mut self, bus: &mut Nubus) {
        self.total_cycles.bump();

        if let Some(read) = self.bus.service(bus) {
            match read.purpose {
                Purpose::Data => self.md = read.data,
                Purpose::InstructionStream => self.macro_ir = read.data,
            }
        }

        if self.spy_addressed(bus) {
            self.spy_respond(bus);
            return;
        }

        if self.die_request.is_some() {
            return;
        }

        // A step request never outlives the pulse that sees it.
        let stepping = std::mem::take(&mut self.step_request) && self.halted;
        if self.halted && !stepping {
            return;
        }

        let result = match self.consume_stall(bus) {
            Ok(true) => Ok(()),
            Ok(false) => self.execute_cycle(bus),
            Err(fault) => Err(fault),
        };
        if let Err(fault) = result {
            self.die(fault);
        }

        if stepping {
            self.halted = true;
        }
    }

    /// Burn this tick on the highest-priority pending stall, if any.
    fn consume_stall(&mut self, bus: &mut Nubus) -> Result<bool, Fault> {
        if self.stalls.forced_hold {
            return Ok(true);
        }
        if self.pjan.step() == PjanStep::Fire {
            self.popj()?;
            return Ok(true);
        }
        let s = &mut self.stalls;
        for flag in [&mut s.slow_dest, &mut s.long_inst, &mut s.noop_next, &mut s.cram_write] {
            if std::mem::take(flag) {
                return Ok(true);
            }
        }
        match self.macro_dispatch.step() {
            MacroDispatchStep::Idle => Ok(false),
            MacroDispatchStep::Waiting => Ok(true),
            MacroDispatchStep::Fire { m, lpc } => {
                let word = self.mid.lookup(self.macro_halfword());
                trace!(
                    "macro dispatch {:#06X} -> {:#06X}",
                    self.macro_halfword(),
                    word.target()
                );
                self.apply_dispatch_word(word, m, lpc, false, bus)?;
                Ok(true)
            }
        }
    }

    /// The deferred return: top of the micro-stack becomes the next PC.
    pub(crate) fn popj(&mut self) -> Result<(), Fault> {
        let target = self.micro_stack.pop();
        if let Some(pending) = self.after_next_pc {
            return Err(Fault::AfterNextCollision {
                pending,
                requested: target,
            });
        }
        self.next_pc = target;
        Ok(())
    }

    fn execute_cycle(&mut self, bus: &mut Nubus) -> Result<(), Fault> {
        self.current_pc = self.next_pc;
        self.next_pc = self
            .after_next_pc
            .take()
            .unwrap_or_else(|| self.current_pc.wrapping_add(1));
        self.history.record(self.current_pc);

        if !std::mem::take(&mut self.spy_ir_loaded) {
            self.ir = Microinstruction(self.cram[self.cram_slot(self.current_pc)]);
        }
        if self.imod != 0 {
            self.ir = Microinstruction((self.ir.raw() | self.imod) & MASK);
            self.imod = 0;
        }
        let ir = self.ir;
        self.count_statistics(ir);
        trace!("{:#06X}: {:#016X} {:?}", self.current_pc, ir.raw(), ir.opcode());

        if ir.macro_fetch() || ir.macro_stream_advance() {
            self.macro_fetch(bus);
        }

        self.a_value = self.a_mem[usize::from(ir.a_source())];
        self.m_value = self.read_m_source(ir.m_source())?;
        self.execute(ir, bus)?;

        if ir.popj_after_next() {
            self.pjan.arm(ir.slow_dest());
        }
        self.stalls.slow_dest |= ir.slow_dest();
        self.stalls.long_inst |= ir.ilong();
        if ir.halt() || self.processor_mode.single_step() {
            self.halted = true;
            debug!("halted after {:#06X}", self.current_pc);
        }
        self.instructions += 1;
        Ok(())
    }

    fn count_statistics(&mut self, ir: Microinstruction) {
        if self.rg_mode.main_stat().fires(ir.stat_bit()) {
            self.stat_counter = self.stat_counter.wrapping_add(1);
        }
        if self.rg_mode.aux_stat().fires(ir.stat_bit()) {
            self.aux_stat_counter = self.aux_stat_counter.wrapping_add(1);
        }
    }

    /// Read the macro-instruction word under LC and step LC by one
    /// halfword. LC bit 1 picks which halfword of the word is current.
    fn macro_fetch(&mut self, bus: &mut Nubus) {
        self.macro_high_half = self.lc & 2 != 0;
        let t = self.vm.resolve(self.lc >> 2, Access::Read, false);
        self.page_fault = t.page_fault;
        if !t.page_fault {
            self.bus.request(
                bus,
                BusTransfer {
                    request: NubusRequest::ReadWord,
                    address: t.physical_address << 2,
                    data: 0,
                    purpose: Purpose::InstructionStream,
                },
            );
        }
        self.lc = self.lc.wrapping_add(2);
    }

    /// Apply a dispatch word: optional start-read from `m`, then the
    /// transfer it encodes.
    pub(crate) fn apply_dispatch_word(
        &mut self,
        word: DispatchWord,
        m: u32,
        lpc: bool,
        bubble: bool,
        bus: &mut Nubus,
    ) -> Result<(), Fault> {
        let transfer = word.rpn().try_into()?;
        if word.start_read() {
            self.vma = m;
            self.start_read(bus, false);
        }
        self.transfer(transfer, word.target(), lpc, bubble)
    }
}

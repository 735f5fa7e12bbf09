//! Opcode execution and control transfers.

use lambda_core::Nubus;

use crate::alu::{self, OutputSelector, QControl};
use crate::branch::{self, ConditionInputs, Transfer, TransferKind};
use crate::cpu::Lambda;
use crate::dispatch::{self, DispatchWord, MacroDispatch};
use crate::fault::Fault;
use crate::microinstruction::{Microinstruction, Opcode};
use crate::shifter;

impl Lambda {
    pub(crate) fn execute(&mut self, ir: Microinstruction, bus: &mut Nubus) -> Result<(), Fault> {
        match ir.opcode() {
            Opcode::Alu => self.execute_alu(ir, bus),
            Opcode::Byte => self.execute_byte(ir, bus),
            Opcode::Jump => self.execute_jump(ir),
            Opcode::Dispatch => self.execute_dispatch(ir, bus),
        }
    }

    fn execute_alu(&mut self, ir: Microinstruction, bus: &mut Nubus) -> Result<(), Fault> {
        let (a, m) = (self.a_value, self.m_value);
        let result = alu::alu_op(ir.alu_op(), a, m, ir.carry_in(), self.q & 1 != 0)?;
        let selector = OutputSelector::try_from(ir.output_selector())?;

        let mut out = alu::apply_output_selector(selector, result, a, self.q);
        if ir.mask() {
            out = alu::preserve_tag(out, a);
        }
        self.o_value = out;

        self.write_destination(ir.destination(), out, bus)?;
        self.q = alu::update_q(QControl::from(ir.q_control()), self.q, result.value);
        Ok(())
    }

    fn execute_byte(&mut self, ir: Microinstruction, bus: &mut Nubus) -> Result<(), Fault> {
        self.r_value = shifter::shift(
            self.a_value,
            self.m_value,
            ir.rotate(),
            ir.length(),
            ir.rotate_mask(),
            ir.rotate_source(),
        );
        self.write_destination(ir.destination(), self.r_value, bus)
    }

    fn execute_jump(&mut self, ir: Microinstruction) -> Result<(), Fault> {
        let transfer = Transfer::try_from(ir.rpn())?;
        let inputs = ConditionInputs {
            a: self.a_value,
            m: self.m_value,
            page_fault: self.page_fault,
            interrupt_pending: self.interrupts.any_pending(),
            sequence_break: self.rg_mode.sequence_break(),
        };
        if branch::condition_met(ir.condition(), ir.test(), ir.invert(), &inputs)? {
            self.transfer(transfer, ir.jump_target(), ir.lpc(), true)?;
        }
        Ok(())
    }

    fn execute_dispatch(&mut self, ir: Microinstruction, bus: &mut Nubus) -> Result<(), Fault> {
        self.dispatch_constant = ir.dispatch_constant();

        if ir.macro_ir_dispatch() {
            self.macro_dispatch = MacroDispatch::start(self.m_value, ir.lpc());
            return Ok(());
        }

        let volatility = ir
            .gc_volatility_enable()
            .then(|| self.vm.volatility_trap(self.md));
        let oldspace = ir.oldspace_enable().then(|| self.vm.oldspace(self.md));
        let index = dispatch::dispatch_index(
            ir.a_source(),
            self.m_value,
            ir.rotate(),
            ir.dispatch_length(),
            volatility,
            oldspace,
        );
        let word = DispatchWord(self.a_mem[index]);
        self.apply_dispatch_word(word, self.m_value, ir.lpc(), true, bus)
    }

    /// Perform a taken transfer.
    ///
    /// `bubble` burns the latched next instruction as a NOP for transfers
    /// that inhibit it; macro dispatch has already spent its stall cycles
    /// and passes false.
    pub(crate) fn transfer(
        &mut self,
        transfer: Transfer,
        target: u16,
        lpc: bool,
        bubble: bool,
    ) -> Result<(), Fault> {
        let destination = match transfer.kind {
            TransferKind::Jump => target,
            TransferKind::Call => {
                if self.pjan.is_armed() {
                    // The pending return already stands for this call's.
                    self.pjan.cancel();
                } else {
                    let return_pc = if lpc {
                        self.current_pc
                    } else if transfer.execute_next {
                        self.next_pc.wrapping_add(1)
                    } else {
                        self.next_pc
                    };
                    self.micro_stack.push(return_pc);
                }
                target
            }
            TransferKind::Return => self.micro_stack.pop(),
        };

        if transfer.execute_next {
            if let Some(pending) = self.after_next_pc {
                return Err(Fault::AfterNextCollision {
                    pending,
                    requested: destination,
                });
            }
            self.after_next_pc = Some(destination);
        } else {
            self.next_pc = destination;
            self.stalls.noop_next |= bubble;
        }
        Ok(())
    }
}

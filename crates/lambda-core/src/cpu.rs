//! Processor trait.

use crate::Nubus;

/// A processor attached to the NuBus.
///
/// Processors do not own the bus. Each `clock_pulse` gets the shared
/// transaction cells by reference, so two processors and the arbiter can be
/// stepped from one loop without interior mutability.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance by exactly one system tick, executing or stalling.
    fn clock_pulse(&mut self, bus: &mut Nubus);

    /// Address of the microinstruction most recently fetched.
    fn pc(&self) -> u32;

    /// Returns a snapshot of the programmer-visible registers.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the processor is not executing.
    fn is_halted(&self) -> bool;

    /// Return to power-on state, keeping the bus identity.
    fn reset(&mut self);
}

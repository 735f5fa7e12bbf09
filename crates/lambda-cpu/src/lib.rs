//! LMI Lambda processor: the microinstruction execution engine.
//!
//! One call to [`Lambda::clock_pulse`] is one microinstruction cycle. The
//! engine either consumes a pending stall or fetches, executes and writes
//! back a single 56-bit microinstruction, exactly as the hardware
//! sequencer would on that tick.
//!
//! ## Pipeline
//!
//! The sequencer always knows two addresses ahead:
//!
//! - **current PC**: the instruction executing this cycle
//! - **next PC**: already latched; fetched on the next executing cycle
//! - **after-next PC**: optional, set by execute-next transfers
//!
//! A transfer that inhibits the next instruction replaces the next PC and
//! burns one cycle as a NOP; an execute-next transfer lets the latched
//! instruction run first and parks its target in the after-next slot.

pub mod alu;
pub mod branch;
mod bus_client;
mod config;
mod cpu;
mod destinations;
pub mod dispatch;
mod engine;
mod execute;
mod fault;
mod history;
mod interrupts;
pub mod micro_stack;
pub mod microinstruction;
pub mod modes;
pub mod shifter;
mod sources;
pub mod spy;
pub mod vm;

pub(crate) mod bits;

pub use config::LambdaConfig;
pub use cpu::{Lambda, Registers};
pub use destinations::fdest;
pub use fault::Fault;
pub use microinstruction::{Destination, MSource, Microinstruction, Opcode};
pub use sources::msrc;
pub use spy::SpyRegister;

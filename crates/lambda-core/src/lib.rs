//! Core traits and types for the cycle-accurate Lambda emulator.
//!
//! Every processor and the bus arbiter advance in lockstep, one call per
//! system tick. The shared NuBus cells live here so the CPU crate and
//! whatever drives the arbiter agree on a single transaction model.

mod cpu;
mod nubus;
mod observable;
mod simple_nubus;
mod tickable;
mod ticks;

pub use cpu::Cpu;
pub use nubus::{Nubus, NubusRequest, SDU_MASTER_ID, lane_read, lane_write, slot_base, slot_of};
pub use observable::{Observable, Value};
pub use simple_nubus::{NubusConfig, SimpleNubus};
pub use tickable::Tickable;
pub use ticks::Ticks;

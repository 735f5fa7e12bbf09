//! Trait for bus-side components advanced by the system scheduler.

use crate::{Nubus, Ticks};

/// A component clocked once per system tick against the shared bus.
///
/// The arbiter and any bus slaves implement this. The scheduler must pulse
/// them from the same loop that pulses the processors, so a request issued
/// on tick `n` is visible to the arbiter on tick `n` or `n + 1` depending on
/// call order, never later.
pub trait Tickable {
    /// Advance by one system tick.
    fn tick(&mut self, bus: &mut Nubus);

    /// Advance by several ticks.
    ///
    /// Must produce the same state as calling `tick()` `count` times.
    fn tick_n(&mut self, bus: &mut Nubus, count: Ticks) {
        for _ in 0..count.get() {
            self.tick(bus);
        }
    }
}

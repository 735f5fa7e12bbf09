//! The micro-return stack and popj-after-next bookkeeping.
//!
//! The stack is a 256-entry ring. The pointer is pre-incremented on push
//! and post-decremented on pop; it wraps silently in both directions, as
//! the 8-bit hardware counter does.

/// Number of entries in the ring.
pub const DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub struct MicroStack {
    entries: [u16; DEPTH],
    pointer: u8,
}

impl MicroStack {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [0; DEPTH],
            pointer: 0,
        }
    }

    pub fn push(&mut self, address: u16) {
        self.pointer = self.pointer.wrapping_add(1);
        self.entries[usize::from(self.pointer)] = address;
    }

    pub fn pop(&mut self) -> u16 {
        let top = self.peek();
        self.pointer = self.pointer.wrapping_sub(1);
        top
    }

    /// The entry under the pointer.
    #[must_use]
    pub const fn peek(&self) -> u16 {
        self.entries[self.pointer as usize]
    }

    #[must_use]
    pub const fn pointer(&self) -> u8 {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: u8) {
        self.pointer = pointer;
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for MicroStack {
    fn default() -> Self {
        Self::new()
    }
}

/// What the popj-after-next countdown wants this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PjanStep {
    /// Nothing armed.
    Idle,
    /// Armed but not yet due. The cycle proceeds normally.
    Waiting,
    /// Due: the return happens and consumes this cycle.
    Fire,
}

/// Deferred return armed by the PJAN bit.
///
/// After arming, exactly one further instruction executes (two cycles if
/// the arming instruction also needs a slow-destination stall), then the
/// return fires as a stall cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopjAfterNext {
    countdown: Option<u8>,
}

impl PopjAfterNext {
    pub fn arm(&mut self, slow_dest: bool) {
        self.countdown = Some(if slow_dest { 2 } else { 1 });
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.countdown.is_some()
    }

    /// Remaining cycles before the return, if armed.
    #[must_use]
    pub const fn countdown(&self) -> Option<u8> {
        self.countdown
    }

    /// Disarm without returning; the caller has satisfied it.
    pub fn cancel(&mut self) {
        self.countdown = None;
    }

    /// Advance once per clock, before any other stall is considered.
    pub fn step(&mut self) -> PjanStep {
        match self.countdown {
            None => PjanStep::Idle,
            Some(0) => {
                self.countdown = None;
                PjanStep::Fire
            }
            Some(n) => {
                self.countdown = Some(n - 1);
                PjanStep::Waiting
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn push_pop_lifo() {
        let mut s = MicroStack::new();
        s.push(10);
        s.push(20);
        assert_eq!(s.peek(), 20);
        assert_eq!(s.pop(), 20);
        assert_eq!(s.pop(), 10);
        assert_eq!(s.pointer(), 0);
    }

    #[test]
    fn pointer_wraps_both_ways() {
        let mut s = MicroStack::new();
        s.set_pointer(255);
        s.push(7);
        assert_eq!(s.pointer(), 0);
        assert_eq!(s.pop(), 7);
        assert_eq!(s.pointer(), 255);

        let mut empty = MicroStack::new();
        empty.pop();
        assert_eq!(empty.pointer(), 255);
    }

    #[test]
    fn pjan_counts_down_then_fires_once() {
        let mut p = PopjAfterNext::default();
        assert_eq!(p.step(), PjanStep::Idle);
        p.arm(false);
        assert_eq!(p.step(), PjanStep::Waiting);
        assert_eq!(p.step(), PjanStep::Fire);
        assert_eq!(p.step(), PjanStep::Idle);

        p.arm(true);
        assert_eq!(p.countdown(), Some(2));
        assert_eq!(p.step(), PjanStep::Waiting);
        assert_eq!(p.step(), PjanStep::Waiting);
        assert_eq!(p.step(), PjanStep::Fire);
    }

    #[test]
    fn cancel_disarms() {
        let mut p = PopjAfterNext::default();
        p.arm(false);
        p.cancel();
        assert!(!p.is_armed());
        assert_eq!(p.step(), PjanStep::Idle);
    }

    proptest! {
        #[test]
        fn pops_replay_pushes_in_reverse(
            start in any::<u8>(),
            addresses in prop::collection::vec(any::<u16>(), 1..=DEPTH),
        ) {
            let mut s = MicroStack::new();
            s.set_pointer(start);
            for &a in &addresses {
                s.push(a);
            }
            for &a in addresses.iter().rev() {
                prop_assert_eq!(s.pop(), a);
            }
            prop_assert_eq!(s.pointer(), start);
        }
    }
}

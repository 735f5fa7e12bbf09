//! The fundamental unit of time in the emulator.

/// A count of system ticks.
///
/// One tick is one microinstruction cycle. Stalled cycles count the same as
/// executed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Advance by a single tick, wrapping at the counter width.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_wraps() {
        let mut t = Ticks::new(u64::MAX);
        t.bump();
        assert_eq!(t, Ticks::ZERO);
    }

    #[test]
    fn add_accumulates() {
        let mut t = Ticks::new(3);
        t += Ticks::new(4);
        assert_eq!((t + Ticks::new(1)).get(), 8);
    }
}

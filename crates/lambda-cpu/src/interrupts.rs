//! Interrupt status as seen by the processor.
//!
//! Peripherals raise vectors by writing the processor's interrupt window.
//! The pending count always equals the number of set status bits.

pub const VECTORS: usize = 256;

#[derive(Debug, Clone)]
pub(crate) struct Interrupts {
    status: [bool; VECTORS],
    pending: u32,
    vector: u8,
}

impl Interrupts {
    pub const fn new() -> Self {
        Self {
            status: [false; VECTORS],
            pending: 0,
            vector: 0,
        }
    }

    pub fn raise(&mut self, vector: u8) {
        let slot = &mut self.status[usize::from(vector)];
        if !*slot {
            *slot = true;
            self.pending += 1;
        }
        self.vector = self.vector.max(vector);
    }

    pub fn clear(&mut self, vector: u8) {
        let slot = &mut self.status[usize::from(vector)];
        if *slot {
            *slot = false;
            self.pending -= 1;
        }
        self.vector = self.highest().unwrap_or(0);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn highest(&self) -> Option<u8> {
        self.status.iter().rposition(|&s| s).map(|v| v as u8)
    }

    pub const fn pending(&self) -> u32 {
        self.pending
    }

    pub const fn any_pending(&self) -> bool {
        self.pending != 0
    }

    /// Highest-numbered vector outstanding.
    pub const fn vector(&self) -> u8 {
        self.vector
    }

    pub fn is_set(&self, vector: u8) -> bool {
        self.status[usize::from(vector)]
    }
}

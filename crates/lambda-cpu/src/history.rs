//! History RAM: a ring of recently executed micro-PCs.

pub const HISTORY_ENTRIES: usize = 4096;

#[derive(Debug, Clone)]
pub(crate) struct History {
    entries: Vec<u16>,
    pointer: u16,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: vec![0; HISTORY_ENTRIES],
            pointer: 0,
        }
    }

    pub fn record(&mut self, pc: u16) {
        self.entries[usize::from(self.pointer)] = pc;
        self.pointer = (self.pointer + 1) & (HISTORY_ENTRIES as u16 - 1);
    }

    /// Slot the next record will overwrite.
    pub const fn pointer(&self) -> u16 {
        self.pointer
    }

    pub fn set_pointer(&mut self, pointer: u16) {
        self.pointer = pointer & (HISTORY_ENTRIES as u16 - 1);
    }

    /// Entry under the pointer.
    pub fn data(&self) -> u16 {
        self.entries[usize::from(self.pointer)]
    }

    /// The `n`th most recent entry, 0 being the latest.
    pub fn recent(&self, n: usize) -> u16 {
        let i = (usize::from(self.pointer) + HISTORY_ENTRIES - 1 - n % HISTORY_ENTRIES)
            % HISTORY_ENTRIES;
        self.entries[i]
    }
}

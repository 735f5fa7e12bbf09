//! Shared NuBus transaction cells.
//!
//! The NuBus carries one transaction at a time. Only the current master
//! writes the request fields; only the addressed slave writes `ack`,
//! `error` and (for reads) `data`. Everything is single-threaded, so the
//! convention stands in for a lock.

/// Master ID used by the debug processor when it drives SPY accesses.
pub const SDU_MASTER_ID: u8 = 0xFF;

/// The kind of a NuBus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NubusRequest {
    #[default]
    ReadWord,
    WriteWord,
    ReadByte,
    WriteByte,
}

impl NubusRequest {
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::WriteWord | Self::WriteByte)
    }

    #[must_use]
    pub const fn is_byte(self) -> bool {
        matches!(self, Self::ReadByte | Self::WriteByte)
    }
}

/// Base address of a board's slot space (`0xFsxxxxxx`).
#[must_use]
pub const fn slot_base(slot: u8) -> u32 {
    0xF000_0000 | ((slot as u32 & 0x0F) << 24)
}

/// The slot an address falls in, if it is in slot space at all.
#[must_use]
pub const fn slot_of(address: u32) -> Option<u8> {
    if address >> 28 == 0xF {
        Some(((address >> 24) & 0x0F) as u8)
    } else {
        None
    }
}

/// The process-wide transaction cells.
#[derive(Debug, Clone, Default)]
pub struct Nubus {
    pub busy: bool,
    pub ack: bool,
    pub error: bool,
    pub master: u8,
    pub address: u32,
    pub data: u32,
    pub request: NubusRequest,
}

impl Nubus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no transaction is in flight.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.busy
    }

    /// Start a transaction. Returns false (and changes nothing) if the bus
    /// is already busy.
    pub fn issue_request(
        &mut self,
        request: NubusRequest,
        master: u8,
        address: u32,
        data: u32,
    ) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.ack = false;
        self.error = false;
        self.master = master;
        self.address = address;
        self.data = data;
        self.request = request;
        true
    }

    /// True while a transaction waits for a slave to answer.
    #[must_use]
    pub const fn awaiting_slave(&self) -> bool {
        self.busy && !self.ack && !self.error
    }

    /// Slave side: complete the transaction, optionally driving read data.
    pub fn acknowledge(&mut self, data: Option<u32>) {
        if let Some(data) = data {
            self.data = data;
        }
        self.ack = true;
    }

    /// Slave or arbiter side: terminate the transaction with an error.
    pub fn fail(&mut self) {
        self.error = true;
    }

    /// Master side: drop the bus after ack or error. The flags stay visible
    /// until the arbiter's next idle pulse.
    pub fn release(&mut self) {
        self.busy = false;
    }

    /// Byte lane (0-3) selected by the low address bits.
    #[must_use]
    pub const fn lane(&self) -> u32 {
        self.address & 3
    }
}

/// Extract the byte in `lane` of `word`, left in its lane position.
#[must_use]
pub const fn lane_read(word: u32, lane: u32) -> u32 {
    word & (0xFF << (8 * (lane & 3)))
}

/// Merge the byte in `lane` of `data` into `word`.
#[must_use]
pub const fn lane_write(word: u32, data: u32, lane: u32) -> u32 {
    let mask = 0xFF << (8 * (lane & 3));
    (word & !mask) | (data & mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_refuses_when_busy() {
        let mut bus = Nubus::new();
        assert!(bus.issue_request(NubusRequest::ReadWord, 1, 0x100, 0));
        assert!(!bus.issue_request(NubusRequest::WriteWord, 2, 0x200, 7));
        assert_eq!(bus.master, 1);
        assert_eq!(bus.address, 0x100);
    }

    #[test]
    fn release_keeps_flags_until_next_request() {
        let mut bus = Nubus::new();
        bus.issue_request(NubusRequest::ReadWord, 1, 0, 0);
        bus.fail();
        bus.release();
        assert!(bus.is_idle());
        assert!(bus.error);
        bus.issue_request(NubusRequest::ReadWord, 1, 0, 0);
        assert!(!bus.error);
    }

    #[test]
    fn slot_space_decoding() {
        assert_eq!(slot_base(6), 0xF600_0000);
        assert_eq!(slot_of(0xF600_0010), Some(6));
        assert_eq!(slot_of(0x0000_4000), None);
    }

    #[test]
    fn byte_lanes() {
        assert_eq!(lane_read(0x1122_3344, 1), 0x0000_3300);
        assert_eq!(lane_write(0x1122_3344, 0xAABB_CCDD, 3), 0xAA22_3344);
    }
}

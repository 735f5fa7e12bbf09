//! A RAM-only NuBus arbiter.
//!
//! Real systems put the memory boards, disk and video controllers behind
//! the arbiter. This one answers word and byte accesses to a flat RAM
//! window after a fixed latency and times out everything else, which is
//! all a processor needs to run microcode in isolation.

use log::warn;

use crate::{Nubus, NubusRequest, Tickable, lane_read, lane_write};

/// Arbiter timing and memory window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NubusConfig {
    /// Ticks between a request and the RAM's acknowledge.
    pub latency: u8,
    /// Ticks after which an unanswered request is failed.
    pub timeout: u8,
    /// Byte address of RAM word 0.
    pub ram_base: u32,
    /// RAM size in 32-bit words.
    pub ram_words: usize,
}

impl Default for NubusConfig {
    fn default() -> Self {
        Self {
            latency: 2,
            timeout: 8,
            ram_base: 0,
            ram_words: 0x4_0000,
        }
    }
}

/// RAM-backed arbiter. Pulse it once per tick alongside the processors.
pub struct SimpleNubus {
    config: NubusConfig,
    ram: Vec<u32>,
    age: u8,
    completed: u64,
}

impl SimpleNubus {
    #[must_use]
    pub fn new(config: NubusConfig) -> Self {
        Self {
            ram: vec![0; config.ram_words],
            config,
            age: 0,
            completed: 0,
        }
    }

    fn word_index(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.config.ram_base)? as usize >> 2;
        (offset < self.ram.len()).then_some(offset)
    }

    /// Read a RAM word by byte address without touching the bus.
    #[must_use]
    pub fn peek(&self, address: u32) -> Option<u32> {
        self.word_index(address).map(|i| self.ram[i])
    }

    /// Write a RAM word by byte address without touching the bus.
    pub fn poke(&mut self, address: u32, value: u32) {
        if let Some(i) = self.word_index(address) {
            self.ram[i] = value;
        }
    }

    /// Copy `words` into RAM starting at byte address `address`.
    pub fn load(&mut self, address: u32, words: &[u32]) {
        for (i, &w) in words.iter().enumerate() {
            self.poke(address.wrapping_add((i as u32) << 2), w);
        }
    }

    /// Transactions answered from RAM so far.
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.completed
    }

    fn answer(&mut self, bus: &mut Nubus, index: usize) {
        let lane = bus.lane();
        match bus.request {
            NubusRequest::ReadWord => bus.acknowledge(Some(self.ram[index])),
            NubusRequest::ReadByte => bus.acknowledge(Some(lane_read(self.ram[index], lane))),
            NubusRequest::WriteWord => {
                self.ram[index] = bus.data;
                bus.acknowledge(None);
            }
            NubusRequest::WriteByte => {
                self.ram[index] = lane_write(self.ram[index], bus.data, lane);
                bus.acknowledge(None);
            }
        }
        self.completed += 1;
    }
}

impl Default for SimpleNubus {
    fn default() -> Self {
        Self::new(NubusConfig::default())
    }
}

impl Tickable for SimpleNubus {
    fn tick(&mut self, bus: &mut Nubus) {
        if bus.is_idle() {
            self.age = 0;
            bus.ack = false;
            bus.error = false;
            return;
        }
        // Answered; waiting for the master to release.
        if bus.ack || bus.error {
            return;
        }

        self.age = self.age.saturating_add(1);
        if self.age >= self.config.latency
            && let Some(index) = self.word_index(bus.address)
        {
            self.answer(bus, index);
            return;
        }
        if self.age >= self.config.timeout {
            warn!(
                "NuBus timeout: master {:#04X} {:?} at {:#010X}",
                bus.master, bus.request, bus.address
            );
            bus.fail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ticks;

    fn arbiter() -> SimpleNubus {
        SimpleNubus::new(NubusConfig {
            ram_words: 256,
            ..NubusConfig::default()
        })
    }

    #[test]
    fn read_acknowledged_after_latency() {
        let mut ram = arbiter();
        let mut bus = Nubus::new();
        ram.poke(0x10, 0xDEAD_BEEF);
        bus.issue_request(NubusRequest::ReadWord, 1, 0x10, 0);

        ram.tick(&mut bus);
        assert!(!bus.ack);
        ram.tick(&mut bus);
        assert!(bus.ack);
        assert_eq!(bus.data, 0xDEAD_BEEF);
        assert_eq!(ram.completed(), 1);
    }

    #[test]
    fn byte_write_merges_lane() {
        let mut ram = arbiter();
        let mut bus = Nubus::new();
        ram.poke(0x20, 0x1122_3344);
        bus.issue_request(NubusRequest::WriteByte, 1, 0x22, 0x00AA_0000);
        ram.tick_n(&mut bus, Ticks::new(2));
        assert_eq!(ram.peek(0x20), Some(0x11AA_3344));
    }

    #[test]
    fn unmapped_address_times_out_then_clears_on_idle() {
        let mut ram = arbiter();
        let mut bus = Nubus::new();
        bus.issue_request(NubusRequest::ReadWord, 1, 0x8000_0000, 0);
        ram.tick_n(&mut bus, Ticks::new(8));
        assert!(bus.error);

        bus.release();
        ram.tick(&mut bus);
        assert!(!bus.error);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_deserializes_with_defaults() {
        let config: NubusConfig = serde_json::from_str(r#"{ "latency": 4 }"#).unwrap();
        assert_eq!(config.latency, 4);
        assert_eq!(config.timeout, NubusConfig::default().timeout);
    }
}

//! Bus-master side of the processor's NuBus traffic.
//!
//! The processor owns at most one transaction at a time. A request made
//! while one is in flight waits in a single queue slot; a newer request
//! overwrites it.

use lambda_core::{Nubus, NubusRequest};
use log::warn;

/// Where the data of a completed read goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Purpose {
    /// MD, for VMA-START-READ and friends.
    Data,
    /// The macro-instruction register.
    InstructionStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BusTransfer {
    pub request: NubusRequest,
    pub address: u32,
    pub data: u32,
    pub purpose: Purpose,
}

/// Read data observed on the bus this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadData {
    pub purpose: Purpose,
    pub data: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct BusClient {
    master_id: u8,
    active: Option<BusTransfer>,
    queued: Option<BusTransfer>,
    bus_error: bool,
}

impl BusClient {
    pub fn new(master_id: u8) -> Self {
        Self {
            master_id,
            active: None,
            queued: None,
            bus_error: false,
        }
    }

    pub const fn master_id(&self) -> u8 {
        self.master_id
    }

    pub fn set_master_id(&mut self, id: u8) {
        self.master_id = id;
    }

    /// True while a transaction is in flight or queued.
    pub const fn busy(&self) -> bool {
        self.active.is_some() || self.queued.is_some()
    }

    /// Set for the one cycle after a transaction ends in error.
    pub const fn bus_error(&self) -> bool {
        self.bus_error
    }

    /// Start `transfer` now if possible, otherwise queue it.
    pub fn request(&mut self, bus: &mut Nubus, transfer: BusTransfer) {
        if self.active.is_none() && self.issue(bus, transfer) {
            return;
        }
        if let Some(old) = self.queued.replace(transfer) {
            warn!(
                "master {:#04X}: queued {:?} at {:#010X} replaced",
                self.master_id, old.request, old.address
            );
        }
    }

    fn issue(&mut self, bus: &mut Nubus, transfer: BusTransfer) -> bool {
        let issued = bus.issue_request(transfer.request, self.master_id, transfer.address, transfer.data);
        if issued {
            self.active = Some(transfer);
        }
        issued
    }

    /// Poll our transaction, once per tick before anything else.
    ///
    /// Read data is handed back every cycle the transaction is on the bus,
    /// acknowledged or not; the hardware latches whatever is there.
    pub fn service(&mut self, bus: &mut Nubus) -> Option<ReadData> {
        self.bus_error = false;
        let mut read = None;

        if let Some(active) = self.active
            && bus.busy
            && bus.master == self.master_id
        {
            if !active.request.is_write() {
                read = Some(ReadData {
                    purpose: active.purpose,
                    data: bus.data,
                });
            }
            if bus.ack || bus.error {
                if bus.error {
                    warn!(
                        "master {:#04X}: bus error at {:#010X}",
                        self.master_id, active.address
                    );
                    self.bus_error = true;
                }
                bus.release();
                self.active = None;
            }
        } else if self.active.is_some() {
            // The bus was taken from under us.
            self.active = None;
        }

        if self.active.is_none()
            && bus.is_idle()
            && let Some(next) = self.queued.take()
            && !self.issue(bus, next)
        {
            self.queued = Some(next);
        }
        read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(address: u32) -> BusTransfer {
        BusTransfer {
            request: NubusRequest::ReadWord,
            address,
            data: 0,
            purpose: Purpose::Data,
        }
    }

    #[test]
    fn read_completes_on_ack() {
        let mut bus = Nubus::new();
        let mut client = BusClient::new(1);
        client.request(&mut bus, read(0x40));
        assert!(bus.busy);

        bus.data = 0x1234;
        assert_eq!(client.service(&mut bus).map(|r| r.data), Some(0x1234));
        assert!(bus.busy, "no ack yet");

        bus.acknowledge(Some(0x5678));
        let r = client.service(&mut bus);
        assert_eq!(r, Some(ReadData { purpose: Purpose::Data, data: 0x5678 }));
        assert!(bus.is_idle());
        assert!(!client.busy());
    }

    #[test]
    fn error_is_visible_for_one_cycle() {
        let mut bus = Nubus::new();
        let mut client = BusClient::new(1);
        client.request(&mut bus, read(0x40));
        bus.fail();
        client.service(&mut bus);
        assert!(client.bus_error());
        assert!(bus.is_idle());
        client.service(&mut bus);
        assert!(!client.bus_error());
    }

    #[test]
    fn second_request_waits_and_newest_wins() {
        let mut bus = Nubus::new();
        let mut client = BusClient::new(1);
        client.request(&mut bus, read(0x40));
        client.request(&mut bus, read(0x80));
        client.request(&mut bus, read(0xC0));
        assert_eq!(bus.address, 0x40);

        bus.acknowledge(None);
        client.service(&mut bus);
        assert!(bus.busy);
        assert_eq!(bus.address, 0xC0);
        assert!(client.busy());
    }

    #[test]
    fn queued_when_another_master_holds_the_bus() {
        let mut bus = Nubus::new();
        bus.issue_request(NubusRequest::ReadWord, 9, 0, 0);
        let mut client = BusClient::new(1);
        client.request(&mut bus, read(0x40));
        assert_eq!(bus.master, 9);

        client.service(&mut bus);
        assert_eq!(bus.master, 9);
        bus.release();
        client.service(&mut bus);
        assert_eq!((bus.master, bus.address), (1, 0x40));
    }
}

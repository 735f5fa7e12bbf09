//! Two-level virtual memory map with GC metadata.
//!
//! A 25-bit virtual address splits into a level-1 index (bits 13-24), a
//! page within the level-2 block (bits 8-12) and a word within the page
//! (bits 0-7). Level 1 yields a level-2 block number plus the generation
//! of the whole region; level 2 yields access rights, metadata and the
//! physical page.

use crate::bits::{get32, set32};

const MAP_ENTRIES: usize = 4096;

/// Words per page.
pub const PAGE_WORDS: u32 = 256;

/// Kind of access being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// How the bus access for a translated address is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteMode {
    Word,
    /// Byte access on the given lane.
    Byte(u8),
}

/// Level-1 map entry: `lv2_block:7 | generation:2 | valid:1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lv1Entry(pub u32);

impl Lv1Entry {
    #[must_use]
    pub const fn lv2_block(self) -> u32 {
        get32(self.0, 0, 7)
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        get32(self.0, 7, 2)
    }

    #[must_use]
    pub const fn valid(self) -> bool {
        get32(self.0, 9, 1) != 0
    }

    #[must_use]
    pub const fn with_lv2_block(self, v: u32) -> Self {
        Self(set32(self.0, 0, 7, v))
    }

    #[must_use]
    pub const fn with_generation(self, v: u32) -> Self {
        Self(set32(self.0, 7, 2, v))
    }

    #[must_use]
    pub const fn with_valid(self, v: bool) -> Self {
        Self(set32(self.0, 9, 1, v as u32))
    }
}

/// Level-2 control entry.
///
/// `meta:6 | status:3 | access:2 | force_allowed:1 | packet_code:2 |
/// cache_permit:1 | lock_bus:1`. Meta bits 0-1 are the page volatility,
/// bit 2 marks oldspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lv2Control(pub u32);

impl Lv2Control {
    #[must_use]
    pub const fn meta(self) -> u32 {
        get32(self.0, 0, 6)
    }

    #[must_use]
    pub const fn status(self) -> u32 {
        get32(self.0, 6, 3)
    }

    #[must_use]
    pub const fn access(self) -> u32 {
        get32(self.0, 9, 2)
    }

    #[must_use]
    pub const fn force_allowed(self) -> bool {
        get32(self.0, 11, 1) != 0
    }

    #[must_use]
    pub const fn packet_code(self) -> u32 {
        get32(self.0, 12, 2)
    }

    #[must_use]
    pub const fn cache_permit(self) -> bool {
        get32(self.0, 14, 1) != 0
    }

    #[must_use]
    pub const fn lock_bus(self) -> bool {
        get32(self.0, 15, 1) != 0
    }

    #[must_use]
    pub const fn with_meta(self, v: u32) -> Self {
        Self(set32(self.0, 0, 6, v))
    }

    #[must_use]
    pub const fn with_status(self, v: u32) -> Self {
        Self(set32(self.0, 6, 3, v))
    }

    #[must_use]
    pub const fn with_access(self, v: u32) -> Self {
        Self(set32(self.0, 9, 2, v))
    }

    #[must_use]
    pub const fn with_force_allowed(self, v: bool) -> Self {
        Self(set32(self.0, 11, 1, v as u32))
    }

    #[must_use]
    pub const fn with_packet_code(self, v: u32) -> Self {
        Self(set32(self.0, 12, 2, v))
    }

    #[must_use]
    pub const fn with_cache_permit(self, v: bool) -> Self {
        Self(set32(self.0, 14, 1, v as u32))
    }

    #[must_use]
    pub const fn with_lock_bus(self, v: bool) -> Self {
        Self(set32(self.0, 15, 1, v as u32))
    }
}

/// Level-2 address entry: `physical_page:22 | byte_code:2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lv2Address(pub u32);

impl Lv2Address {
    #[must_use]
    pub const fn physical_page(self) -> u32 {
        get32(self.0, 0, 22)
    }

    #[must_use]
    pub const fn byte_code(self) -> u32 {
        get32(self.0, 22, 2)
    }

    #[must_use]
    pub const fn with_physical_page(self, v: u32) -> Self {
        Self(set32(self.0, 0, 22, v))
    }

    #[must_use]
    pub const fn with_byte_code(self, v: u32) -> Self {
        Self(set32(self.0, 22, 2, v))
    }
}

/// Outcome of one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    /// Physical word address. Stale when `page_fault` is set.
    pub physical_address: u32,
    pub page_fault: bool,
    /// Level-2 meta of the translated page, kept for the write barrier.
    pub cached_meta: u32,
    pub byte_mode: ByteMode,
}

impl Translation {
    /// NuBus byte address of the translated word, lane included.
    #[must_use]
    pub const fn bus_address(&self) -> u32 {
        let base = self.physical_address << 2;
        match self.byte_mode {
            ByteMode::Word => base,
            ByteMode::Byte(lane) => base | lane as u32,
        }
    }
}

/// The map hardware plus its last-translation latches.
#[derive(Debug, Clone)]
pub struct VmTranslator {
    lv1: Vec<Lv1Entry>,
    lv2_control: Vec<Lv2Control>,
    lv2_address: Vec<Lv2Address>,
    physical_address: u32,
    cached_meta: u32,
    byte_mode: ByteMode,
}

/// Level-1 index of a virtual address.
#[must_use]
pub const fn lv1_index(vaddr: u32) -> usize {
    ((vaddr >> 13) & 0xFFF) as usize
}

const fn page_in_block(vaddr: u32) -> u32 {
    (vaddr >> 8) & 0x1F
}

impl VmTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lv1: vec![Lv1Entry::default(); MAP_ENTRIES],
            lv2_control: vec![Lv2Control::default(); MAP_ENTRIES],
            lv2_address: vec![Lv2Address::default(); MAP_ENTRIES],
            physical_address: 0,
            cached_meta: 0,
            byte_mode: ByteMode::Word,
        }
    }

    /// Level-2 index of a virtual address, through the level-1 map.
    #[must_use]
    pub fn lv2_index(&self, vaddr: u32) -> usize {
        let block = self.lv1[lv1_index(vaddr)].lv2_block();
        ((block << 5) | page_in_block(vaddr)) as usize
    }

    /// Translate `vma` for `access`.
    ///
    /// `force` lets a read of a write-only page (or a write of a read-only
    /// page) through when the page allows forcing. A fault leaves the
    /// physical address latch untouched.
    pub fn resolve(&mut self, vma: u32, access: Access, force: bool) -> Translation {
        let l2 = self.lv2_index(vma);
        let control = self.lv2_control[l2];
        self.cached_meta = control.meta();

        let forced = force && control.force_allowed();
        let permitted = match control.access() {
            0 => false,
            1 => access == Access::Write || forced,
            2 => access == Access::Read || forced,
            _ => true,
        };

        if permitted {
            let entry = self.lv2_address[l2];
            self.physical_address = (entry.physical_page() << 8) | (vma & 0xFF);
            // Packet code alone does not select byte mode; a zero byte code
            // falls back to word access.
            self.byte_mode = if control.packet_code() != 0 && entry.byte_code() != 0 {
                ByteMode::Byte(entry.byte_code() as u8)
            } else {
                ByteMode::Word
            };
        }

        Translation {
            physical_address: self.physical_address,
            page_fault: !permitted,
            cached_meta: self.cached_meta,
            byte_mode: self.byte_mode,
        }
    }

    /// Meta of the page most recently translated.
    #[must_use]
    pub const fn cached_meta(&self) -> u32 {
        self.cached_meta
    }

    /// Write-barrier test: does storing the pointer `md` into the last
    /// translated page point from an older page to a more volatile region?
    #[must_use]
    pub fn volatility_trap(&self, md: u32) -> bool {
        self.lv1[lv1_index(md)].generation() > (self.cached_meta & 3)
    }

    /// Does `md` point into oldspace?
    #[must_use]
    pub fn oldspace(&self, md: u32) -> bool {
        self.lv2_control[self.lv2_index(md)].meta() & 0b100 != 0
    }

    // === Map windows, addressed by a virtual address (normally MD) ===

    #[must_use]
    pub fn lv1(&self, vaddr: u32) -> Lv1Entry {
        self.lv1[lv1_index(vaddr)]
    }

    #[must_use]
    pub fn lv2_control(&self, vaddr: u32) -> Lv2Control {
        self.lv2_control[self.lv2_index(vaddr)]
    }

    #[must_use]
    pub fn lv2_address(&self, vaddr: u32) -> Lv2Address {
        self.lv2_address[self.lv2_index(vaddr)]
    }

    pub fn set_lv1(&mut self, vaddr: u32, entry: Lv1Entry) {
        self.lv1[lv1_index(vaddr)] = Lv1Entry(entry.0 & 0x3FF);
    }

    pub fn set_lv2_control(&mut self, vaddr: u32, entry: Lv2Control) {
        let i = self.lv2_index(vaddr);
        self.lv2_control[i] = Lv2Control(entry.0 & 0xFFFF);
    }

    pub fn set_lv2_address(&mut self, vaddr: u32, entry: Lv2Address) {
        let i = self.lv2_index(vaddr);
        self.lv2_address[i] = Lv2Address(entry.0 & 0x00FF_FFFF);
    }
}

impl Default for VmTranslator {
    fn default() -> Self {
        Self::new()
    }
}

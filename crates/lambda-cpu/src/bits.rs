//! Bit-range helpers shared by every register view.
//!
//! Register layouts are named ranges over a plain integer; nothing relies
//! on native bitfield layout.

#[must_use]
pub(crate) const fn get(word: u64, shift: u32, width: u32) -> u64 {
    (word >> shift) & ((1u64 << width) - 1)
}

#[must_use]
pub(crate) const fn set(word: u64, shift: u32, width: u32, value: u64) -> u64 {
    let mask = ((1u64 << width) - 1) << shift;
    (word & !mask) | ((value << shift) & mask)
}

#[must_use]
pub(crate) const fn get32(word: u32, shift: u32, width: u32) -> u32 {
    get(word as u64, shift, width) as u32
}

#[must_use]
pub(crate) const fn set32(word: u32, shift: u32, width: u32, value: u32) -> u32 {
    set(word as u64, shift, width, value as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_isolates_field() {
        let w = set(0xFFFF_FFFF_FFFF_FFFF, 8, 4, 0x5);
        assert_eq!(get(w, 8, 4), 0x5);
        assert_eq!(w, 0xFFFF_FFFF_FFFF_F5FF);
    }

    #[test]
    fn set_truncates_oversized_value() {
        assert_eq!(set32(0, 4, 2, 0xFF), 0x30);
        assert_eq!(get32(0x30, 4, 2), 3);
    }
}

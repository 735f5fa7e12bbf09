//! Barrel shifter and masker for BYTE instructions.
//!
//! The hardware builds its merge mask from two 33-entry tables: the left
//! table keeps bits below the index, the right table keeps bits at and
//! above it. Indices wrap modulo 33, so a field that would run past bit 31
//! produces an empty mask rather than wrapping around the word.

const fn build_left() -> [u32; 33] {
    let mut t = [0u32; 33];
    let mut i = 1;
    while i < 33 {
        t[i] = if i == 32 { u32::MAX } else { (1u32 << i) - 1 };
        i += 1;
    }
    t
}

const fn build_right() -> [u32; 33] {
    let mut t = [0u32; 33];
    let mut i = 0;
    while i < 32 {
        t[i] = u32::MAX << i;
        i += 1;
    }
    t
}

/// `LEFT_MASK[i]` has bits `0..i` set.
pub const LEFT_MASK: [u32; 33] = build_left();
/// `RIGHT_MASK[i]` has bits `i..32` set.
pub const RIGHT_MASK: [u32; 33] = build_right();

/// The merge mask for a field of `length` bits whose low edge is `right`.
#[must_use]
pub const fn field_mask(right: u8, length: u8) -> u32 {
    let right = right as usize % 33;
    let left = (right + length as usize) % 33;
    LEFT_MASK[left] & RIGHT_MASK[right]
}

/// One BYTE-instruction shift.
///
/// With `rotate_source` set M is first rotated left by `rotate`. With
/// `rotate_mask` set the mask starts at bit `rotate` instead of bit 0.
/// Bits under the mask come from the (rotated) M, the rest from A. Load-byte
/// rotates the source only; deposit-byte rotates both.
#[must_use]
pub const fn shift(
    a: u32,
    m: u32,
    rotate: u8,
    length: u8,
    rotate_mask: bool,
    rotate_source: bool,
) -> u32 {
    let rotate = rotate & 0x1F;
    let source = if rotate_source {
        m.rotate_left(rotate as u32)
    } else {
        m
    };
    let right = if rotate_mask { rotate } else { 0 };
    let mask = field_mask(right, length);
    (source & mask) | (a & !mask)
}

/// Deposit the low `length` bits of `field` at bit `position` of `background`.
#[must_use]
pub const fn deposit(background: u32, field: u32, position: u8, length: u8) -> u32 {
    shift(background, field, position, length, true, true)
}

/// Extract `length` bits starting at bit `position` of `word`.
#[must_use]
pub const fn load(word: u32, position: u8, length: u8) -> u32 {
    let rotate = (32 - (position as u32 & 0x1F)) & 0x1F;
    shift(0, word, rotate as u8, length, false, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mask_tables_edges() {
        assert_eq!(LEFT_MASK[0], 0);
        assert_eq!(LEFT_MASK[1], 1);
        assert_eq!(LEFT_MASK[32], u32::MAX);
        assert_eq!(RIGHT_MASK[0], u32::MAX);
        assert_eq!(RIGHT_MASK[31], 0x8000_0000);
        assert_eq!(RIGHT_MASK[32], 0);
    }

    #[test]
    fn field_mask_examples() {
        assert_eq!(field_mask(0, 8), 0xFF);
        assert_eq!(field_mask(4, 4), 0xF0);
        assert_eq!(field_mask(0, 32), u32::MAX);
        // Runs off the top: left index wraps and the mask empties.
        assert_eq!(field_mask(31, 2), 0);
    }

    #[test]
    fn selective_deposit_keeps_m_unrotated() {
        // Mask at bits 8-15, M not rotated.
        assert_eq!(shift(0x1111_1111, 0xAABB_CCDD, 8, 8, true, false), 0x1111_CC11);
    }

    #[test]
    fn ldb_and_dpb() {
        assert_eq!(load(0x00AB_0000, 16, 8), 0xAB);
        assert_eq!(deposit(0xFFFF_FFFF, 0x12, 8, 8), 0xFFFF_12FF);
        assert_eq!(load(0x8000_0000, 31, 1), 1);
    }

    #[test]
    fn deposit_past_bit_31_is_dropped() {
        // The field ends exactly at bit 31: still deposited.
        assert_eq!(deposit(0, u32::MAX, 30, 2), 0xC000_0000);
        // One bit further and the mask wraps to nothing.
        assert_eq!(deposit(0x1234_5678, u32::MAX, 31, 2), 0x1234_5678);
        assert_eq!(deposit(0x1234_5678, u32::MAX, 1, 32), 0x1234_5678);
        assert_eq!(deposit(0x1234_5678, u32::MAX, 31, 32), 0x1234_5678);
    }

    proptest! {
        #[test]
        fn overlong_deposit_keeps_background(
            background in any::<u32>(),
            field in any::<u32>(),
            rotate in 1u8..32,
            length in 2u8..=32,
        ) {
            prop_assume!(u32::from(rotate) + u32::from(length) >= 33);
            prop_assert_eq!(deposit(background, field, rotate, length), background);
        }

        #[test]
        fn insert_then_extract_returns_field(
            background in any::<u32>(),
            field in any::<u32>(),
            rotate in 0u8..32,
            length in 1u8..=32,
        ) {
            prop_assume!(u32::from(rotate) + u32::from(length) <= 32);
            let field = field & LEFT_MASK[length as usize];
            let inserted = deposit(background, field, rotate, length);
            prop_assert_eq!(load(inserted, rotate, length), field);
        }

        #[test]
        fn deposit_leaves_bits_outside_field(
            background in any::<u32>(),
            field in any::<u32>(),
            rotate in 0u8..32,
            length in 1u8..=32,
        ) {
            let mask = field_mask(rotate, length);
            let inserted = deposit(background, field, rotate, length);
            prop_assert_eq!(inserted & !mask, background & !mask);
        }
    }
}

//! Reflected binary (Gray) code.
//!
//! Consecutive values differ in exactly one bit, so a value sampled while it is changing is either
//! the old or the new value, never a mix of both.

/// Converts binary to Gray code.
pub const fn encode(value: u32) -> u32 { value ^ (value >> 1) }

/// Converts Gray code back to binary.
pub const fn decode(gray: u32) -> u32 {
    let mut value = gray;
    let mut shift = 1;
    while shift < u32::BITS {
        value ^= value >> shift;
        shift <<= 1;
    }
    value
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(encode(0), 0);
        assert_eq!(encode(1), 1);
        assert_eq!(encode(2), 3);
        assert_eq!(encode(3), 2);
        assert_eq!(encode(7), 4);
        assert_eq!(decode(4), 7);
    }

    #[test]
    fn increment_across_wrap_changes_one_bit() {
        assert_eq!((encode(u32::MAX) ^ encode(0)).count_ones(), 1);
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(value in any::<u32>()) {
            prop_assert_eq!(decode(encode(value)), value);
        }

        #[test]
        fn prop_increment_changes_one_bit(value in any::<u32>()) {
            prop_assert_eq!((encode(value) ^ encode(value.wrapping_add(1))).count_ones(), 1);
        }
    }
}

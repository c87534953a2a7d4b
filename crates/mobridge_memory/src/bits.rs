//! Fixed-width bit operations.
//!
//! Operands are `i32` reinterpreted as unsigned 32-bit values, matching
//! the host's single numeric type. Shifts are logical, and shift counts
//! are masked to 0..31 rather than being undefined for counts >= 32.

pub fn band(a: i32, b: i32) -> i32 {
    ((a as u32) & (b as u32)) as i32
}

pub fn bor(a: i32, b: i32) -> i32 {
    ((a as u32) | (b as u32)) as i32
}

pub fn bxor(a: i32, b: i32) -> i32 {
    ((a as u32) ^ (b as u32)) as i32
}

pub fn bnot(a: i32) -> i32 {
    !(a as u32) as i32
}

pub fn shl(a: i32, bits: u32) -> i32 {
    (a as u32).wrapping_shl(bits) as i32
}

pub fn shr(a: i32, bits: u32) -> i32 {
    (a as u32).wrapping_shr(bits) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_ops_use_both_operands() {
        assert_eq!(band(0b1010, 0b0110), 0b0010);
        assert_eq!(bor(0b1010, 0b0110), 0b1110);
        assert_eq!(bxor(0b1010, 0b0110), 0b1100);
    }

    #[test]
    fn not_inverts_all_bits() {
        assert_eq!(bnot(0), -1);
        assert_eq!(bnot(-1), 0);
    }

    #[test]
    fn shifts_are_logical() {
        assert_eq!(shl(1, 31), i32::MIN);
        // Logical, not arithmetic: the sign bit does not smear.
        assert_eq!(shr(i32::MIN, 31), 1);
        assert_eq!(shr(-1, 28), 0xF);
    }

    #[test]
    fn shift_counts_mask_to_width() {
        assert_eq!(shl(1, 32), 1);
        assert_eq!(shr(0x10, 36), 1);
    }
}

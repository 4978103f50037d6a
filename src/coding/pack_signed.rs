//! Zigzag mapping between signed and unsigned values.
//!
//! `0, -1, 1, -2, 2, ...` map to `0, 1, 2, 3, 4, ...`, so residuals of small
//! magnitude stay small whatever their sign.

/// Map a signed value to its unsigned zigzag code.
#[inline]
pub const fn pack_signed(value: i32) -> u32 {
    ((value as u32) << 1) ^ ((value >> 31) as u32)
}

/// Inverse of [`pack_signed`].
#[inline]
pub const fn unpack_signed(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

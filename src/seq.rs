//! Sequence-number comparison helpers, accounting for 32-bit wraparound.

/// `true` if `lhs` precedes `rhs` in sequence-space order (RFC 1323 style
/// comparison, tolerant of wraparound).
pub fn wrapping_lt(lhs: u32, rhs: u32) -> bool {
    (lhs.wrapping_sub(rhs) as i32) < 0
}

pub fn wrapping_le(lhs: u32, rhs: u32) -> bool {
    lhs == rhs || wrapping_lt(lhs, rhs)
}

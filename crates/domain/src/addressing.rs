//! Conversions between vendor-documented register numbers and the
//! zero-based offsets that go on the wire.
//!
//! Vendor manuals number read-only (input) registers from `30001` and
//! read/write (holding) registers from `40001`.

/// First documented address of the read-only (3x) register class.
pub const INPUT_BASE: u32 = 30001;

/// First documented address of the read/write (4x) register class.
pub const HOLDING_BASE: u32 = 40001;

/// Zero-based offset of `address` relative to `base`, never below zero.
pub fn offset(base: u32, address: u32) -> u32 {
    address.saturating_sub(base)
}

/// Offset of a 3x-style address (`30001` maps to `0`).
pub fn input_offset(address: u32) -> u32 {
    offset(INPUT_BASE, address)
}

/// Offset of a 4x-style address (`40001` maps to `0`).
pub fn holding_offset(address: u32) -> u32 {
    offset(HOLDING_BASE, address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_maps_to_zero() {
        assert_eq!(input_offset(30001), 0);
        assert_eq!(holding_offset(40001), 0);
    }

    #[test]
    fn test_offset_is_distance_from_base() {
        assert_eq!(holding_offset(40032), 31);
        assert_eq!(input_offset(30010), 9);
        assert_eq!(offset(10, 12), 2);
    }

    #[test]
    fn test_below_base_clamps_to_zero() {
        assert_eq!(holding_offset(0x000A), 0);
        assert_eq!(input_offset(1), 0);
        assert_eq!(offset(5, 0), 0);
    }
}

//! Screen color packing.

/// Pack 8-bit RGB channels into the native 0xRRGGBB color word.
///
/// Setting the color on the display belongs to the native layer; the
/// packing is the part the bridge owns.
pub fn pack_rgb(red: i32, green: i32, blue: i32) -> i32 {
    (red << 16) | (green << 8) | blue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_land_in_their_lanes() {
        assert_eq!(pack_rgb(0xFF, 0, 0), 0xFF0000);
        assert_eq!(pack_rgb(0, 0xFF, 0), 0x00FF00);
        assert_eq!(pack_rgb(0, 0, 0xFF), 0x0000FF);
        assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x123456);
    }
}

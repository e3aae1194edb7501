//! Rotation and mirror transforms.

/// Rotation applied to pixel data, clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// No rotation.
    #[default]
    Normal,
    /// Rotate 90 degrees clockwise.
    Rotate90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise (= 90 CCW).
    Rotate270,
}

impl Orientation {
    /// Whether this rotation swaps width and height.
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }

    /// Dimensions after applying this rotation to `width × height`.
    pub const fn rotated_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Whether no transformation is needed.
    pub const fn is_identity(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// Mirror axis. Mirroring never changes dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mirror {
    /// Flip left-right.
    Horizontal,
    /// Flip top-bottom.
    Vertical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_dimensions() {
        assert!(!Orientation::Normal.swaps_dimensions());
        assert!(Orientation::Rotate90.swaps_dimensions());
        assert!(!Orientation::Rotate180.swaps_dimensions());
        assert!(Orientation::Rotate270.swaps_dimensions());
    }

    #[test]
    fn rotated_dimensions() {
        assert_eq!(Orientation::Rotate90.rotated_dimensions(100, 200), (200, 100));
        assert_eq!(Orientation::Rotate180.rotated_dimensions(100, 200), (100, 200));
    }
}

//! Compression kinds and tunable compression-level ranges.

/// Pixel-data compression kind.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    /// No compression at all.
    None,
    /// Deflate (zlib) compression.
    Deflate,
    /// JPEG DCT compression.
    Jpeg,
    /// Lempel-Ziv & Welch.
    Lzw,
    /// Run-length encoding.
    Rle,
    /// WebP (VP8/VP8L).
    WebP,
    /// AOMedia Video 1.
    Av1,
    /// Zstandard.
    Zstd,
}

impl Compression {
    /// Canonical name, e.g. `"DEFLATE"`.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Deflate => "DEFLATE",
            Compression::Jpeg => "JPEG",
            Compression::Lzw => "LZW",
            Compression::Rle => "RLE",
            Compression::WebP => "WEBP",
            Compression::Av1 => "AV1",
            Compression::Zstd => "ZSTD",
        }
    }
}

impl core::fmt::Display for Compression {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Continuous compression-level range declared by a codec.
///
/// For lossy codecs, more compression means less quality. For lossless
/// codecs, more compression only means a smaller file. The step is a UI
/// hint for building level-selection widgets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionLevel {
    /// Minimum accepted level.
    pub min: f64,
    /// Maximum accepted level.
    pub max: f64,
    /// Level used when the caller does not choose one.
    pub default_level: f64,
    /// Granularity for increasing or decreasing the level.
    pub step: f64,
}

impl CompressionLevel {
    /// Declare a level range.
    pub const fn new(min: f64, max: f64, default_level: f64, step: f64) -> Self {
        Self {
            min,
            max,
            default_level,
            step,
        }
    }

    /// Whether min < max, the default is within range, and the step is positive.
    pub fn is_valid(&self) -> bool {
        self.min < self.max
            && self.default_level >= self.min
            && self.default_level <= self.max
            && self.step > 0.0
    }

    /// Clamp a requested level into the declared range.
    pub fn clamp(&self, level: f64) -> f64 {
        level.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        let level = CompressionLevel::new(1.0, 9.0, 6.0, 1.0);
        assert!(level.is_valid());
    }

    #[test]
    fn invalid_ranges() {
        assert!(!CompressionLevel::new(9.0, 1.0, 6.0, 1.0).is_valid());
        assert!(!CompressionLevel::new(1.0, 9.0, 12.0, 1.0).is_valid());
        assert!(!CompressionLevel::new(1.0, 9.0, 6.0, 0.0).is_valid());
    }

    #[test]
    fn clamp() {
        let level = CompressionLevel::new(0.0, 100.0, 15.0, 1.0);
        assert_eq!(level.clamp(-5.0), 0.0);
        assert_eq!(level.clamp(150.0), 100.0);
        assert_eq!(level.clamp(42.0), 42.0);
    }
}

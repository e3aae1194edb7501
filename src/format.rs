//! Pixel format tags and per-format layout math.

/// Pixel storage format of a [`PixelBuffer`](crate::PixelBuffer).
///
/// Every format has a fixed bits-per-pixel and channel count. There is no
/// "unknown" variant — a buffer always carries a concrete format.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit palette indices. Requires a palette for color interpretation.
    Indexed8,
    /// 8-bit grayscale.
    Gray8,
    /// 16-bit grayscale.
    Gray16,
    /// 8-bit grayscale + 8-bit alpha.
    GrayAlpha8,
    /// 16-bit grayscale + 16-bit alpha.
    GrayAlpha16,
    /// 8-bit RGB (24 bpp).
    Rgb8,
    /// 8-bit BGR (24 bpp).
    Bgr8,
    /// 16-bit RGB (48 bpp).
    Rgb16,
    /// 8-bit RGBA (32 bpp).
    Rgba8,
    /// 8-bit BGRA (32 bpp).
    Bgra8,
    /// 16-bit RGBA (64 bpp).
    Rgba16,
    /// 16-bit BGRA (64 bpp).
    Bgra16,
}

/// Channel-layout family of a [`PixelFormat`], independent of bit depth.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFamily {
    Indexed,
    Gray,
    GrayAlpha,
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelFormat {
    /// All formats, in declaration order.
    pub const ALL: [PixelFormat; 12] = [
        PixelFormat::Indexed8,
        PixelFormat::Gray8,
        PixelFormat::Gray16,
        PixelFormat::GrayAlpha8,
        PixelFormat::GrayAlpha16,
        PixelFormat::Rgb8,
        PixelFormat::Bgr8,
        PixelFormat::Rgb16,
        PixelFormat::Rgba8,
        PixelFormat::Bgra8,
        PixelFormat::Rgba16,
        PixelFormat::Bgra16,
    ];

    /// Bits per pixel.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Indexed8 | PixelFormat::Gray8 => 8,
            PixelFormat::Gray16 | PixelFormat::GrayAlpha8 => 16,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 24,
            PixelFormat::GrayAlpha16 | PixelFormat::Rgba8 | PixelFormat::Bgra8 => 32,
            PixelFormat::Rgb16 => 48,
            PixelFormat::Rgba16 | PixelFormat::Bgra16 => 64,
        }
    }

    /// Number of channels (elements) per pixel.
    pub const fn channels(self) -> u32 {
        match self {
            PixelFormat::Indexed8 | PixelFormat::Gray8 | PixelFormat::Gray16 => 1,
            PixelFormat::GrayAlpha8 | PixelFormat::GrayAlpha16 => 2,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 | PixelFormat::Rgb16 => 3,
            PixelFormat::Rgba8
            | PixelFormat::Bgra8
            | PixelFormat::Rgba16
            | PixelFormat::Bgra16 => 4,
        }
    }

    /// Bytes per channel (1 for 8-bit formats, 2 for 16-bit formats).
    pub const fn bytes_per_channel(self) -> u32 {
        match self {
            PixelFormat::Indexed8
            | PixelFormat::Gray8
            | PixelFormat::GrayAlpha8
            | PixelFormat::Rgb8
            | PixelFormat::Bgr8
            | PixelFormat::Rgba8
            | PixelFormat::Bgra8 => 1,
            PixelFormat::Gray16
            | PixelFormat::GrayAlpha16
            | PixelFormat::Rgb16
            | PixelFormat::Rgba16
            | PixelFormat::Bgra16 => 2,
        }
    }

    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> u32 {
        self.bits_per_pixel() / 8
    }

    /// Channel-layout family.
    pub const fn family(self) -> PixelFamily {
        match self {
            PixelFormat::Indexed8 => PixelFamily::Indexed,
            PixelFormat::Gray8 | PixelFormat::Gray16 => PixelFamily::Gray,
            PixelFormat::GrayAlpha8 | PixelFormat::GrayAlpha16 => PixelFamily::GrayAlpha,
            PixelFormat::Rgb8 | PixelFormat::Rgb16 => PixelFamily::Rgb,
            PixelFormat::Bgr8 => PixelFamily::Bgr,
            PixelFormat::Rgba8 | PixelFormat::Rgba16 => PixelFamily::Rgba,
            PixelFormat::Bgra8 | PixelFormat::Bgra16 => PixelFamily::Bgra,
        }
    }

    /// Whether the format carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::GrayAlpha8
                | PixelFormat::GrayAlpha16
                | PixelFormat::Rgba8
                | PixelFormat::Bgra8
                | PixelFormat::Rgba16
                | PixelFormat::Bgra16
        )
    }

    /// Whether the format is palette-indexed.
    pub const fn is_indexed(self) -> bool {
        matches!(self, PixelFormat::Indexed8)
    }

    /// Minimum bytes per scanline for the given width, without padding.
    pub const fn min_bytes_per_line(self, width: u32) -> usize {
        (width as usize) * (self.bytes_per_pixel() as usize)
    }

    /// Canonical format name, e.g. `"RGB8"`.
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Indexed8 => "INDEXED8",
            PixelFormat::Gray8 => "GRAY8",
            PixelFormat::Gray16 => "GRAY16",
            PixelFormat::GrayAlpha8 => "GRAY-ALPHA8",
            PixelFormat::GrayAlpha16 => "GRAY-ALPHA16",
            PixelFormat::Rgb8 => "RGB8",
            PixelFormat::Bgr8 => "BGR8",
            PixelFormat::Rgb16 => "RGB16",
            PixelFormat::Rgba8 => "RGBA8",
            PixelFormat::Bgra8 => "BGRA8",
            PixelFormat::Rgba16 => "RGBA16",
            PixelFormat::Bgra16 => "BGRA16",
        }
    }

    /// Parse a canonical format name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        PixelFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

impl core::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

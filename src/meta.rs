//! Ancillary image data: palettes, metadata entries, resolution, ICC
//! profiles, and source-image provenance.

use crate::compression::Compression;
use crate::error::{CodecError, Result};
use crate::format::PixelFormat;
use crate::orientation::Orientation;
use crate::variant::Variant;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Color table for indexed pixel formats.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pixel_format: PixelFormat,
    data: Vec<u8>,
}

impl Palette {
    /// Create a palette from raw entry data.
    ///
    /// Only `Rgb8` and `Rgba8` entry formats are accepted, and the data
    /// length must be a whole number of entries.
    pub fn new(pixel_format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        if !matches!(pixel_format, PixelFormat::Rgb8 | PixelFormat::Rgba8) {
            return Err(CodecError::InvalidArgument(format!(
                "palette entry format must be RGB8 or RGBA8, got {pixel_format}"
            )));
        }
        let entry_size = pixel_format.bytes_per_pixel() as usize;
        if data.is_empty() || !data.len().is_multiple_of(entry_size) {
            return Err(CodecError::InvalidArgument(format!(
                "palette data length {} is not a whole number of {entry_size}-byte entries",
                data.len()
            )));
        }
        Ok(Self { pixel_format, data })
    }

    /// Entry format (`Rgb8` or `Rgba8`).
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Raw entry data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of colors in the table.
    pub fn color_count(&self) -> usize {
        self.data.len() / self.pixel_format.bytes_per_pixel() as usize
    }

    /// Entry bytes for the given index, `None` when out of range.
    pub fn color(&self, index: usize) -> Option<&[u8]> {
        let entry_size = self.pixel_format.bytes_per_pixel() as usize;
        let start = index.checked_mul(entry_size)?;
        self.data.get(start..start + entry_size)
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Well-known metadata keys, with an escape hatch for codec-specific ones.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaKey {
    Artist,
    Author,
    Comment,
    Copyright,
    CreationTime,
    Description,
    Software,
    Source,
    Title,
    /// Binary EXIF profile.
    Exif,
    /// XMP packet.
    Xmp,
    /// Any key not covered above, by name.
    Other(String),
}

impl MetaKey {
    /// Map a textual key (e.g. a PNG tEXt keyword) to a well-known variant.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "artist" => MetaKey::Artist,
            "author" => MetaKey::Author,
            "comment" => MetaKey::Comment,
            "copyright" => MetaKey::Copyright,
            "creation time" => MetaKey::CreationTime,
            "description" => MetaKey::Description,
            "software" => MetaKey::Software,
            "source" => MetaKey::Source,
            "title" => MetaKey::Title,
            _ => MetaKey::Other(keyword.into()),
        }
    }
}

/// One metadata entry. Buffers keep entries in the order the codec
/// produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaEntry {
    pub key: MetaKey,
    pub value: Variant,
}

impl MetaEntry {
    /// Create an entry.
    pub fn new(key: MetaKey, value: impl Into<Variant>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Physical resolution unit.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionUnit {
    #[default]
    Unknown,
    Micrometer,
    Centimeter,
    Meter,
    Inch,
}

/// Physical pixel density of an image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub unit: ResolutionUnit,
    pub x: f64,
    pub y: f64,
}

// ---------------------------------------------------------------------------
// ICC profile
// ---------------------------------------------------------------------------

/// Embedded ICC color profile, carried as opaque bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct IccProfile(pub Vec<u8>);

impl core::fmt::Debug for IccProfile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "IccProfile({} bytes)", self.0.len())
    }
}

// ---------------------------------------------------------------------------
// Source image provenance
// ---------------------------------------------------------------------------

/// Chroma subsampling scheme of the source data.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChromaSubsampling {
    None,
    C420,
    C422,
    C444,
    C411,
    C410,
    C400,
}

/// How the pixels were stored in the file, as opposed to the in-memory
/// format after any implicit conversion the codec performed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceImage {
    /// Pixel format as found in the file.
    pub pixel_format: Option<PixelFormat>,
    /// Compression of the source pixel data.
    pub compression: Option<Compression>,
    /// Chroma subsampling of the source, where applicable.
    pub chroma_subsampling: Option<ChromaSubsampling>,
    /// Orientation flag as found in the file.
    pub orientation: Orientation,
    /// Whether the source was stored interlaced.
    pub interlaced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_lookup() {
        let palette = Palette::new(PixelFormat::Rgb8, vec![255, 0, 0, 0, 255, 0, 0, 0, 255])
            .expect("valid palette");
        assert_eq!(palette.color_count(), 3);
        assert_eq!(palette.color(1), Some(&[0u8, 255, 0][..]));
        assert_eq!(palette.color(3), None);
    }

    #[test]
    fn palette_rejects_bad_entry_format() {
        assert!(Palette::new(PixelFormat::Gray8, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn palette_rejects_partial_entries() {
        assert!(Palette::new(PixelFormat::Rgb8, vec![1, 2, 3, 4]).is_err());
        assert!(Palette::new(PixelFormat::Rgb8, Vec::new()).is_err());
    }

    #[test]
    fn meta_keyword_mapping() {
        assert_eq!(MetaKey::from_keyword("Comment"), MetaKey::Comment);
        assert_eq!(
            MetaKey::from_keyword("X-Custom"),
            MetaKey::Other("X-Custom".into())
        );
    }
}

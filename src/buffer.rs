//! Owned, stride-aware pixel storage.

use std::path::Path;

use crate::error::{CodecError, Result};
use crate::format::PixelFormat;
use crate::meta::{IccProfile, MetaEntry, Palette, Resolution, SourceImage};
use crate::reader::StreamReader;
use crate::writer::StreamWriter;

/// One frame of decoded pixels.
///
/// Owns a contiguous byte region of `bytes_per_line × height`. Scanlines may
/// carry trailing padding when an explicit stride was requested; the minimum
/// stride is `width × bytes_per_pixel` with no implicit padding.
///
/// Width and height are always positive — construction rejects zero
/// dimensions before allocating anything.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    bytes_per_line: usize,
    /// Color table; only meaningful for indexed formats.
    pub palette: Option<Palette>,
    /// Embedded ICC color profile, when extracted.
    pub icc_profile: Option<IccProfile>,
    /// Metadata entries in codec order.
    pub meta_data: Vec<MetaEntry>,
    /// Physical pixel density, when known.
    pub resolution: Option<Resolution>,
    /// Frame display delay in milliseconds, for animation frames.
    pub delay_ms: Option<u32>,
    /// How the pixels were stored in the source file.
    pub source: Option<SourceImage>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer with the minimum stride.
    pub fn new(pixel_format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        let bytes_per_line = check_dimensions(pixel_format, width, height, None)?;
        Ok(Self::allocated(pixel_format, width, height, bytes_per_line))
    }

    /// Create a zero-filled buffer with an explicit stride.
    ///
    /// `bytes_per_line` must be at least the minimum row size for the
    /// format and width; extra bytes are padding.
    pub fn with_stride(
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        bytes_per_line: usize,
    ) -> Result<Self> {
        let bytes_per_line = check_dimensions(pixel_format, width, height, Some(bytes_per_line))?;
        Ok(Self::allocated(pixel_format, width, height, bytes_per_line))
    }

    /// Adopt caller-provided pixel data.
    ///
    /// The data length must equal `bytes_per_line × height` exactly, and
    /// the stride must be at least the minimum row size. Element widths are
    /// implied by the format: a 16-bit-channel format expects big-layout
    /// native bytes exactly as the buffer stores them.
    pub fn from_vec(
        data: Vec<u8>,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        bytes_per_line: usize,
    ) -> Result<Self> {
        let bytes_per_line = check_dimensions(pixel_format, width, height, Some(bytes_per_line))?;
        let expected = bytes_per_line * height as usize;
        if data.len() != expected {
            return Err(CodecError::InvalidArgument(format!(
                "pixel data is {} bytes, expected {expected} ({bytes_per_line} × {height})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            pixel_format,
            bytes_per_line,
            palette: None,
            icc_profile: None,
            meta_data: Vec::new(),
            resolution: None,
            delay_ms: None,
            source: None,
        })
    }

    fn allocated(
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        bytes_per_line: usize,
    ) -> Self {
        Self {
            data: vec![0u8; bytes_per_line * height as usize],
            width,
            height,
            pixel_format,
            bytes_per_line,
            palette: None,
            icc_profile: None,
            meta_data: Vec::new(),
            resolution: None,
            delay_ms: None,
            source: None,
        }
    }

    /// Image width in pixels. Always positive.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels. Always positive.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel storage format.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Scanline stride in bytes, padding included.
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Total pixel data size in bytes.
    pub fn pixels_size(&self) -> usize {
        self.data.len()
    }

    /// Entire pixel region, rows in order, stride apart.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel region.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Scanline `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics when `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of range 0..{}", self.height);
        let start = y as usize * self.bytes_per_line;
        &self.data[start..start + self.pixel_format.min_bytes_per_line(self.width)]
    }

    /// Mutable scanline `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics when `y >= height`.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of range 0..{}", self.height);
        let start = y as usize * self.bytes_per_line;
        let len = self.pixel_format.min_bytes_per_line(self.width);
        &mut self.data[start..start + len]
    }

    /// Consume the buffer and return the raw pixel bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Replace the pixel storage. Used by conversions; dimensions and
    /// format must already describe the new data.
    pub(crate) fn replace_storage(
        &mut self,
        data: Vec<u8>,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        bytes_per_line: usize,
    ) {
        debug_assert_eq!(data.len(), bytes_per_line * height as usize);
        self.data = data;
        self.pixel_format = pixel_format;
        self.width = width;
        self.height = height;
        self.bytes_per_line = bytes_per_line;
    }

    // -- convenience wrappers over the session types --------------------

    /// Load the first frame of an image file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        StreamReader::open(path)?.read()
    }

    /// Load every frame of an image file.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        StreamReader::open(path)?.read_all()
    }

    /// Decode the first frame from in-memory encoded bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        StreamReader::from_slice(data)?.read()
    }

    /// Save this buffer as a single-frame image file. The codec is
    /// resolved from the path extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = StreamWriter::create(path)?;
        writer.write(self)?;
        writer.finish()
    }

    /// Encode this buffer into an in-memory file using the named codec.
    pub fn to_bytes(&self, codec_name: &str) -> Result<Vec<u8>> {
        let codec = crate::CodecRegistry::global().from_name(codec_name)?;
        let mut writer = StreamWriter::to_vec(codec)?;
        writer.write(self)?;
        writer.into_bytes()
    }
}

/// Validate dimensions and stride, returning the effective stride.
fn check_dimensions(
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    bytes_per_line: Option<usize>,
) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(CodecError::InvalidArgument(format!(
            "image dimensions must be positive, got {width}×{height}"
        )));
    }
    let min = pixel_format.min_bytes_per_line(width);
    let stride = match bytes_per_line {
        Some(stride) if stride < min => {
            return Err(CodecError::InvalidArgument(format!(
                "stride {stride} is below the minimum {min} for {pixel_format} width {width}"
            )));
        }
        Some(stride) => stride,
        None => min,
    };
    stride
        .checked_mul(height as usize)
        .ok_or_else(|| CodecError::InvalidArgument("image size overflows usize".into()))?;
    Ok(stride)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            PixelBuffer::new(PixelFormat::Rgb8, 0, 10),
            Err(CodecError::InvalidArgument(_))
        ));
        assert!(matches!(
            PixelBuffer::new(PixelFormat::Rgb8, 10, 0),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn minimal_stride_by_default() {
        let buffer = PixelBuffer::new(PixelFormat::Rgb8, 10, 4).unwrap();
        assert_eq!(buffer.bytes_per_line(), 30);
        assert_eq!(buffer.pixels_size(), 120);
    }

    #[test]
    fn explicit_stride_with_padding() {
        let buffer = PixelBuffer::with_stride(PixelFormat::Rgb8, 10, 4, 32).unwrap();
        assert_eq!(buffer.bytes_per_line(), 32);
        assert_eq!(buffer.pixels_size(), 128);
        assert_eq!(buffer.row(0).len(), 30);
    }

    #[test]
    fn undersized_stride_rejected() {
        assert!(matches!(
            PixelBuffer::with_stride(PixelFormat::Rgb8, 10, 4, 29),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn from_vec_length_must_match() {
        let ok = PixelBuffer::from_vec(vec![0u8; 120], PixelFormat::Rgb8, 10, 4, 30);
        assert!(ok.is_ok());

        let short = PixelBuffer::from_vec(vec![0u8; 119], PixelFormat::Rgb8, 10, 4, 30);
        assert!(matches!(short, Err(CodecError::InvalidArgument(_))));

        let long = PixelBuffer::from_vec(vec![0u8; 121], PixelFormat::Rgb8, 10, 4, 30);
        assert!(matches!(long, Err(CodecError::InvalidArgument(_))));
    }

    #[test]
    fn rows_are_stride_apart() {
        let mut buffer = PixelBuffer::with_stride(PixelFormat::Gray8, 3, 2, 8).unwrap();
        buffer.row_mut(1).copy_from_slice(&[7, 8, 9]);
        assert_eq!(&buffer.as_bytes()[8..11], &[7, 8, 9]);
        assert_eq!(buffer.row(0), &[0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn row_out_of_range_panics() {
        let buffer = PixelBuffer::new(PixelFormat::Gray8, 2, 2).unwrap();
        let _ = buffer.row(2);
    }
}

//! JPEG codec adapter using jpeg-decoder and jpeg-encoder.

use std::io::Write;

use crate::buffer::PixelBuffer;
use crate::compression::{Compression, CompressionLevel};
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::features::{CodecFeatures, LoadFeatures, SaveFeatures};
use crate::format::PixelFormat;
use crate::meta::{IccProfile, SourceImage};
use crate::options::{LoadOptions, SaveOptions};

use super::{CodecId, SinkWrite, SourceRead};

const NAME: &str = "JPEG";

/// Levels mirror libjpeg's quality scale inverted: more compression means
/// lower quality. Encoder quality = 100 − level.
const LEVEL: CompressionLevel = CompressionLevel::new(0.0, 100.0, 15.0, 1.0);

pub(crate) static DESCRIPTOR: CodecDescriptor = CodecDescriptor {
    id: CodecId::Jpeg,
    name: NAME,
    version: "0.3.0",
    description: "Joint Photographic Experts Group",
    extensions: &["jpg", "jpeg", "jpe", "jfif"],
    mime_types: &["image/jpeg"],
    magic: &[b"\xff\xd8\xff"],
    load_features: Some(LoadFeatures::new(
        CodecFeatures::new()
            .with_static_image(true)
            .with_meta_data(true)
            .with_iccp(true),
    )),
    save_features: Some(SaveFeatures {
        pixel_formats: &[PixelFormat::Gray8, PixelFormat::Rgb8],
        compressions: &[Compression::Jpeg],
        default_compression: Compression::Jpeg,
        compression_level: Some(LEVEL),
        features: CodecFeatures::new().with_static_image(true),
    }),
};

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub(crate) struct JpegReader {
    decoder: jpeg_decoder::Decoder<SourceRead>,
    options: LoadOptions,
    exhausted: bool,
}

impl JpegReader {
    pub(crate) fn open(source: SourceRead, options: &LoadOptions) -> Result<Self> {
        let mut decoder = jpeg_decoder::Decoder::new(source);
        // Header parse up front so a corrupt source fails at construction.
        decoder
            .read_info()
            .map_err(|e| CodecError::corrupt(NAME, e))?;
        Ok(Self {
            decoder,
            options: options.clone(),
            exhausted: false,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        if self.exhausted {
            return Ok(None);
        }
        self.exhausted = true;

        let pixels = self
            .decoder
            .decode()
            .map_err(|e| CodecError::corrupt(NAME, e))?;
        let info = self
            .decoder
            .info()
            .ok_or_else(|| CodecError::InvalidArgument("JPEG decoder reported no info".into()))?;

        let width = u32::from(info.width);
        let height = u32::from(info.height);
        let (format, data, source_format) = match info.pixel_format {
            jpeg_decoder::PixelFormat::L8 => {
                (PixelFormat::Gray8, pixels, Some(PixelFormat::Gray8))
            }
            jpeg_decoder::PixelFormat::L16 => {
                let mut data = pixels;
                be_to_ne_u16(&mut data);
                (PixelFormat::Gray16, data, Some(PixelFormat::Gray16))
            }
            jpeg_decoder::PixelFormat::RGB24 => (PixelFormat::Rgb8, pixels, None),
            jpeg_decoder::PixelFormat::CMYK32 => {
                (PixelFormat::Rgb8, cmyk_to_rgb(&pixels), None)
            }
        };

        let mut frame = PixelBuffer::from_vec(
            data,
            format,
            width,
            height,
            format.min_bytes_per_line(width),
        )?;
        frame.source = Some(SourceImage {
            // Color JPEGs are stored as YCbCr/YCCK, which has no in-memory
            // buffer format; only grayscale sources map directly.
            pixel_format: source_format,
            compression: Some(Compression::Jpeg),
            // The decoder does not surface sampling factors
            chroma_subsampling: None,
            orientation: Default::default(),
            interlaced: false,
        });
        if self.options.iccp {
            frame.icc_profile = self.decoder.icc_profile().map(IccProfile);
        }
        Ok(Some(frame))
    }
}

/// Adobe-style inverted CMYK to RGB.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let k = u16::from(px[3]);
        rgb.push((u16::from(px[0]) * k / 255) as u8);
        rgb.push((u16::from(px[1]) * k / 255) as u8);
        rgb.push((u16::from(px[2]) * k / 255) as u8);
    }
    rgb
}

fn be_to_ne_u16(data: &mut [u8]) {
    if cfg!(target_endian = "little") {
        for pair in data.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

pub(crate) fn encode_frame(
    sink: &mut SinkWrite,
    frame: &PixelBuffer,
    options: &SaveOptions,
) -> Result<()> {
    if frame.width() > u32::from(u16::MAX) || frame.height() > u32::from(u16::MAX) {
        return Err(CodecError::InvalidArgument(format!(
            "JPEG dimensions are limited to 65535, got {}×{}",
            frame.width(),
            frame.height()
        )));
    }

    let color_type = match frame.pixel_format() {
        PixelFormat::Gray8 => jpeg_encoder::ColorType::Luma,
        PixelFormat::Rgb8 => jpeg_encoder::ColorType::Rgb,
        other => {
            return Err(CodecError::Unsupported(format!(
                "JPEG cannot encode {other}"
            )));
        }
    };

    let level = options
        .compression_level
        .filter(|l| (LEVEL.min..=LEVEL.max).contains(l))
        .unwrap_or(LEVEL.default_level);
    let quality = (100.0 - level).clamp(1.0, 100.0) as u8;

    let mut encoded: Vec<u8> = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut encoded, quality);
    if let Some(progressive) = options
        .tuning
        .get("jpeg-progressive")
        .and_then(|v| v.as_bool())
    {
        encoder.set_progressive(progressive);
    }

    let mut packed = Vec::new();
    let bytes: &[u8] = if frame.bytes_per_line()
        == frame.pixel_format().min_bytes_per_line(frame.width())
    {
        frame.as_bytes()
    } else {
        packed.reserve(frame.pixel_format().min_bytes_per_line(frame.width()) * frame.height() as usize);
        for y in 0..frame.height() {
            packed.extend_from_slice(frame.row(y));
        }
        &packed
    };

    encoder
        .encode(
            bytes,
            frame.width() as u16,
            frame.height() as u16,
            color_type,
        )
        .map_err(|e| CodecError::corrupt(NAME, e))?;

    sink.write_all(&encoded)
        .map_err(|e| CodecError::io("writing destination", e))?;
    Ok(())
}

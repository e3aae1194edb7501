//! PNG codec adapter using the png crate.

use crate::buffer::PixelBuffer;
use crate::compression::{Compression, CompressionLevel};
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::features::{CodecFeatures, LoadFeatures, SaveFeatures};
use crate::format::PixelFormat;
use crate::meta::{IccProfile, MetaEntry, MetaKey, Resolution, ResolutionUnit, SourceImage};
use crate::options::{LoadOptions, SaveOptions};

use super::{CodecId, SinkWrite, SourceRead};

const NAME: &str = "PNG";

pub(crate) static DESCRIPTOR: CodecDescriptor = CodecDescriptor {
    id: CodecId::Png,
    name: NAME,
    version: "0.18.0",
    description: "Portable Network Graphics",
    extensions: &["png"],
    mime_types: &["image/png"],
    magic: &[b"\x89PNG\r\n\x1a\n"],
    load_features: Some(LoadFeatures::new(
        CodecFeatures::new()
            .with_static_image(true)
            .with_animated(true)
            .with_meta_data(true)
            .with_interlaced(true)
            .with_iccp(true),
    )),
    save_features: Some(SaveFeatures {
        pixel_formats: &[
            PixelFormat::Gray8,
            PixelFormat::Gray16,
            PixelFormat::GrayAlpha8,
            PixelFormat::GrayAlpha16,
            PixelFormat::Rgb8,
            PixelFormat::Rgb16,
            PixelFormat::Rgba8,
            PixelFormat::Rgba16,
        ],
        compressions: &[Compression::Deflate],
        default_compression: Compression::Deflate,
        compression_level: Some(CompressionLevel::new(1.0, 9.0, 6.0, 1.0)),
        features: CodecFeatures::new()
            .with_static_image(true)
            .with_meta_data(true)
            .with_iccp(true),
    }),
};

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub(crate) struct PngReader {
    reader: png::Reader<SourceRead>,
    frames_left: u32,
    first_frame: bool,
    icc_profile: Option<IccProfile>,
    meta_data: Vec<MetaEntry>,
    resolution: Option<Resolution>,
    source: SourceImage,
}

impl PngReader {
    pub(crate) fn open(source: SourceRead, options: &LoadOptions) -> Result<Self> {
        let mut decoder = png::Decoder::new(source);
        decoder.set_transformations(png::Transformations::EXPAND);
        let reader = decoder
            .read_info()
            .map_err(|e| CodecError::corrupt(NAME, e))?;

        let info = reader.info();
        let frames_left = info
            .animation_control
            .map(|actl| actl.num_frames)
            .unwrap_or(1);

        let icc_profile = if options.iccp {
            info.icc_profile.as_ref().map(|p| IccProfile(p.to_vec()))
        } else {
            None
        };

        let mut meta_data = Vec::new();
        if options.meta_data {
            for chunk in &info.uncompressed_latin1_text {
                meta_data.push(MetaEntry::new(
                    MetaKey::from_keyword(&chunk.keyword),
                    chunk.text.clone(),
                ));
            }
        }

        let resolution = info.pixel_dims.map(|dims| Resolution {
            unit: match dims.unit {
                png::Unit::Meter => ResolutionUnit::Meter,
                _ => ResolutionUnit::Unknown,
            },
            x: f64::from(dims.xppu),
            y: f64::from(dims.yppu),
        });

        let source = SourceImage {
            pixel_format: stored_pixel_format(info.color_type, info.bit_depth),
            compression: Some(Compression::Deflate),
            chroma_subsampling: None,
            orientation: Default::default(),
            interlaced: info.interlaced,
        };

        Ok(Self {
            reader,
            frames_left,
            first_frame: true,
            icc_profile,
            meta_data,
            resolution,
            source,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        if self.frames_left == 0 {
            return Ok(None);
        }

        // Frame delay comes from the fcTL parsed ahead of the frame data.
        let delay_ms = self.reader.info().frame_control.map(|fctl| {
            let den = if fctl.delay_den == 0 {
                100
            } else {
                fctl.delay_den
            };
            u32::from(fctl.delay_num) * 1000 / u32::from(den)
        });

        let buffer_size = self.reader.output_buffer_size().ok_or_else(|| {
            CodecError::InvalidArgument("cannot determine PNG output buffer size".into())
        })?;
        let mut raw = vec![0u8; buffer_size];
        let output = self
            .reader
            .next_frame(&mut raw)
            .map_err(|e| CodecError::corrupt(NAME, e))?;
        raw.truncate(output.buffer_size());

        let format = decoded_pixel_format(output.color_type, output.bit_depth)?;
        if format.bytes_per_channel() == 2 {
            be_to_ne_u16(&mut raw);
        }

        let mut frame =
            PixelBuffer::from_vec(raw, format, output.width, output.height, output.line_size)?;
        frame.delay_ms = delay_ms;
        frame.resolution = self.resolution;
        frame.source = Some(self.source.clone());
        if self.first_frame {
            frame.icc_profile = self.icc_profile.take();
            frame.meta_data = core::mem::take(&mut self.meta_data);
            self.first_frame = false;
        }

        self.frames_left -= 1;
        Ok(Some(frame))
    }
}

/// In-memory pixel format the decoder produces, after palette and
/// low-bit-depth expansion.
fn decoded_pixel_format(color_type: png::ColorType, bit_depth: png::BitDepth) -> Result<PixelFormat> {
    let format = match (color_type, bit_depth) {
        (png::ColorType::Grayscale, png::BitDepth::Eight) => PixelFormat::Gray8,
        (png::ColorType::Grayscale, png::BitDepth::Sixteen) => PixelFormat::Gray16,
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => PixelFormat::GrayAlpha8,
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Sixteen) => PixelFormat::GrayAlpha16,
        (png::ColorType::Rgb, png::BitDepth::Eight) => PixelFormat::Rgb8,
        (png::ColorType::Rgb, png::BitDepth::Sixteen) => PixelFormat::Rgb16,
        (png::ColorType::Rgba, png::BitDepth::Eight) => PixelFormat::Rgba8,
        (png::ColorType::Rgba, png::BitDepth::Sixteen) => PixelFormat::Rgba16,
        (color_type, bit_depth) => {
            return Err(CodecError::Unsupported(format!(
                "PNG output {color_type:?}/{bit_depth:?} has no pixel format mapping"
            )));
        }
    };
    Ok(format)
}

/// Pixel format as stored in the file, before any expansion.
fn stored_pixel_format(color_type: png::ColorType, bit_depth: png::BitDepth) -> Option<PixelFormat> {
    match (color_type, bit_depth) {
        (png::ColorType::Indexed, _) => Some(PixelFormat::Indexed8),
        other => decoded_pixel_format(other.0, other.1).ok(),
    }
}

/// png hands out and expects 16-bit samples as big-endian byte pairs;
/// buffers store native-endian.
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
    let (color_type, bit_depth) = encoding_layout(frame.pixel_format())?;

    let mut info = png::Info::with_size(frame.width(), frame.height());
    info.color_type = color_type;
    info.bit_depth = bit_depth;

    if options.iccp
        && let Some(icc) = &frame.icc_profile
    {
        info.icc_profile = Some(icc.0.clone().into());
    }
    if options.meta_data {
        for entry in &frame.meta_data {
            let Some(text) = entry.value.as_str() else {
                continue;
            };
            let keyword = match &entry.key {
                MetaKey::Other(keyword) => keyword.as_str(),
                key => keyword_of(key),
            };
            info.uncompressed_latin1_text
                .push(png::text_metadata::TEXtChunk::new(keyword, text));
        }
    }

    let mut encoder =
        png::Encoder::with_info(&mut *sink, info).map_err(|e| CodecError::corrupt(NAME, e))?;
    encoder.set_compression(compression_preset(options.compression_level));

    let mut writer = encoder
        .write_header()
        .map_err(|e| CodecError::corrupt(NAME, e))?;

    let mut packed = packed_rows(frame);
    if frame.pixel_format().bytes_per_channel() == 2 {
        be_to_ne_u16(packed.to_mut()); // symmetric swap back to big-endian
    }
    writer
        .write_image_data(&packed)
        .map_err(|e| CodecError::corrupt(NAME, e))?;
    writer.finish().map_err(|e| CodecError::corrupt(NAME, e))?;
    Ok(())
}

fn encoding_layout(format: PixelFormat) -> Result<(png::ColorType, png::BitDepth)> {
    let layout = match format {
        PixelFormat::Gray8 => (png::ColorType::Grayscale, png::BitDepth::Eight),
        PixelFormat::Gray16 => (png::ColorType::Grayscale, png::BitDepth::Sixteen),
        PixelFormat::GrayAlpha8 => (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight),
        PixelFormat::GrayAlpha16 => (png::ColorType::GrayscaleAlpha, png::BitDepth::Sixteen),
        PixelFormat::Rgb8 => (png::ColorType::Rgb, png::BitDepth::Eight),
        PixelFormat::Rgb16 => (png::ColorType::Rgb, png::BitDepth::Sixteen),
        PixelFormat::Rgba8 => (png::ColorType::Rgba, png::BitDepth::Eight),
        PixelFormat::Rgba16 => (png::ColorType::Rgba, png::BitDepth::Sixteen),
        other => {
            return Err(CodecError::Unsupported(format!(
                "PNG cannot encode {other}"
            )));
        }
    };
    Ok(layout)
}

fn compression_preset(level: Option<f64>) -> png::Compression {
    let level = level.unwrap_or(6.0);
    // Same direction as zlib levels: 1 = fastest, 9 = smallest.
    if level <= 2.0 {
        png::Compression::Fast
    } else if level <= 7.0 {
        png::Compression::Balanced
    } else {
        png::Compression::High
    }
}

fn keyword_of(key: &MetaKey) -> &'static str {
    match key {
        MetaKey::Artist => "Artist",
        MetaKey::Author => "Author",
        MetaKey::Comment => "Comment",
        MetaKey::Copyright => "Copyright",
        MetaKey::CreationTime => "Creation Time",
        MetaKey::Description => "Description",
        MetaKey::Software => "Software",
        MetaKey::Source => "Source",
        MetaKey::Title => "Title",
        _ => "Comment",
    }
}

/// Rows packed to the minimum stride, as the encoder expects.
fn packed_rows(frame: &PixelBuffer) -> std::borrow::Cow<'_, [u8]> {
    let min_stride = frame.pixel_format().min_bytes_per_line(frame.width());
    if frame.bytes_per_line() == min_stride {
        std::borrow::Cow::Borrowed(frame.as_bytes())
    } else {
        let mut packed = Vec::with_capacity(min_stride * frame.height() as usize);
        for y in 0..frame.height() {
            packed.extend_from_slice(frame.row(y));
        }
        std::borrow::Cow::Owned(packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;
    use std::io::Cursor;

    fn roundtrip(frame: &PixelBuffer, options: &SaveOptions) -> PixelBuffer {
        let mut sink = SinkWrite::Memory(Cursor::new(Vec::new()));
        encode_frame(&mut sink, frame, options).expect("encode");
        let bytes = sink.into_bytes().unwrap();

        let source: SourceRead = Box::new(Cursor::new(bytes));
        let load = DESCRIPTOR.load_features.as_ref().unwrap().to_options();
        let mut reader = PngReader::open(source, &load).expect("open");
        let decoded = reader.next_frame().expect("decode").expect("one frame");
        assert!(reader.next_frame().expect("eof probe").is_none());
        decoded
    }

    #[test]
    fn descriptor_sanity() {
        assert!(DESCRIPTOR.matches_extension("PNG"));
        assert!(DESCRIPTOR.matches_magic(b"\x89PNG\r\n\x1a\n\x00\x00"));
        assert!(DESCRIPTOR.can_load() && DESCRIPTOR.can_save());
    }

    #[test]
    fn rgb8_roundtrip_is_exact() {
        let mut frame = PixelBuffer::new(PixelFormat::Rgb8, 4, 3).unwrap();
        for (i, byte) in frame.as_bytes_mut().iter_mut().enumerate() {
            *byte = (i * 7 % 256) as u8;
        }
        let options = DESCRIPTOR.save_features.as_ref().unwrap().to_options();
        let decoded = roundtrip(&frame, &options);
        assert_eq!(decoded.pixel_format(), PixelFormat::Rgb8);
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.as_bytes(), frame.as_bytes());
    }

    #[test]
    fn rgb16_roundtrip_is_exact() {
        let mut frame = PixelBuffer::new(PixelFormat::Rgb16, 3, 2).unwrap();
        let values: Vec<u8> = (0..frame.pixels_size())
            .map(|i| (i * 13 % 256) as u8)
            .collect();
        frame.as_bytes_mut().copy_from_slice(&values);
        let options = DESCRIPTOR.save_features.as_ref().unwrap().to_options();
        let decoded = roundtrip(&frame, &options);
        assert_eq!(decoded.pixel_format(), PixelFormat::Rgb16);
        assert_eq!(decoded.as_bytes(), frame.as_bytes());
    }

    #[test]
    fn padded_stride_is_packed_on_encode() {
        let mut frame = PixelBuffer::with_stride(PixelFormat::Gray8, 3, 2, 8).unwrap();
        frame.row_mut(0).copy_from_slice(&[1, 2, 3]);
        frame.row_mut(1).copy_from_slice(&[4, 5, 6]);
        let options = DESCRIPTOR.save_features.as_ref().unwrap().to_options();
        let decoded = roundtrip(&frame, &options);
        assert_eq!(decoded.as_bytes(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn text_metadata_roundtrip() {
        let mut frame = PixelBuffer::new(PixelFormat::Rgb8, 2, 2).unwrap();
        frame
            .meta_data
            .push(MetaEntry::new(MetaKey::Comment, "hello png"));
        let options = DESCRIPTOR.save_features.as_ref().unwrap().to_options();
        let decoded = roundtrip(&frame, &options);
        assert!(decoded.meta_data.iter().any(|entry| {
            entry.key == MetaKey::Comment && entry.value == Variant::from("hello png")
        }));
    }

    #[test]
    fn icc_profile_roundtrip() {
        let mut frame = PixelBuffer::new(PixelFormat::Rgb8, 2, 2).unwrap();
        frame.icc_profile = Some(IccProfile(vec![0x61, 0x63, 0x73, 0x70]));
        let options = DESCRIPTOR.save_features.as_ref().unwrap().to_options();
        assert!(options.iccp);
        let decoded = roundtrip(&frame, &options);
        assert_eq!(
            decoded.icc_profile,
            Some(IccProfile(vec![0x61, 0x63, 0x73, 0x70]))
        );
    }

    #[test]
    fn corrupt_data_is_typed() {
        let source: SourceRead = Box::new(Cursor::new(b"\x89PNG\r\n\x1a\ngarbage".to_vec()));
        let result = PngReader::open(source, &LoadOptions::default());
        assert!(matches!(result, Err(CodecError::CorruptData { .. })));
    }

    #[test]
    fn source_provenance_recorded() {
        let mut frame = PixelBuffer::new(PixelFormat::Rgb8, 2, 2).unwrap();
        frame.as_bytes_mut().fill(9);
        let options = DESCRIPTOR.save_features.as_ref().unwrap().to_options();
        let decoded = roundtrip(&frame, &options);
        let source = decoded.source.expect("provenance");
        assert_eq!(source.compression, Some(Compression::Deflate));
        assert_eq!(source.pixel_format, Some(PixelFormat::Rgb8));
        assert!(!source.interlaced);
    }
}

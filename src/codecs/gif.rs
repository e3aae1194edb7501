//! GIF codec adapter using the gif crate.
//!
//! Frames decode to RGBA8 (transparency resolved through the color table);
//! the indexed source layout is recorded as provenance. Encoding accepts
//! indexed data with a palette directly, or RGB/RGBA data which the backend
//! quantizes.

use crate::buffer::PixelBuffer;
use crate::compression::Compression;
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::features::{CodecFeatures, LoadFeatures, SaveFeatures};
use crate::format::PixelFormat;
use crate::meta::{ChromaSubsampling, SourceImage};
use crate::options::{LoadOptions, SaveOptions};

use super::{CodecId, SinkWrite, SourceRead};

const NAME: &str = "GIF";

pub(crate) static DESCRIPTOR: CodecDescriptor = CodecDescriptor {
    id: CodecId::Gif,
    name: NAME,
    version: "0.13.0",
    description: "Graphics Interchange Format",
    extensions: &["gif"],
    mime_types: &["image/gif"],
    magic: &[b"GIF87a", b"GIF89a"],
    load_features: Some(LoadFeatures::new(
        CodecFeatures::new()
            .with_static_image(true)
            .with_animated(true),
    )),
    save_features: Some(SaveFeatures {
        pixel_formats: &[
            PixelFormat::Indexed8,
            PixelFormat::Rgb8,
            PixelFormat::Rgba8,
        ],
        compressions: &[Compression::Lzw],
        default_compression: Compression::Lzw,
        compression_level: None,
        features: CodecFeatures::new()
            .with_static_image(true)
            .with_animated(true),
    }),
};

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub(crate) struct GifReader {
    decoder: gif::Decoder<SourceRead>,
    exhausted: bool,
}

impl GifReader {
    pub(crate) fn open(source: SourceRead, _options: &LoadOptions) -> Result<Self> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let decoder = options
            .read_info(source)
            .map_err(|e| CodecError::corrupt(NAME, e))?;
        Ok(Self {
            decoder,
            exhausted: false,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        if self.exhausted {
            return Ok(None);
        }
        let Some(frame) = self
            .decoder
            .read_next_frame()
            .map_err(|e| CodecError::corrupt(NAME, e))?
        else {
            self.exhausted = true;
            return Ok(None);
        };

        let width = u32::from(frame.width);
        let height = u32::from(frame.height);
        let data = frame.buffer.to_vec();
        let delay_ms = u32::from(frame.delay) * 10;

        let mut buffer = PixelBuffer::from_vec(
            data,
            PixelFormat::Rgba8,
            width,
            height,
            PixelFormat::Rgba8.min_bytes_per_line(width),
        )?;
        buffer.delay_ms = Some(delay_ms);
        buffer.source = Some(SourceImage {
            pixel_format: Some(PixelFormat::Indexed8),
            compression: Some(Compression::Lzw),
            chroma_subsampling: Some(ChromaSubsampling::None),
            orientation: Default::default(),
            interlaced: frame.interlaced,
        });
        Ok(Some(buffer))
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Create the encoder from the first frame's dimensions and palette.
pub(crate) fn start_encoder(
    sink: SinkWrite,
    first: &PixelBuffer,
) -> Result<gif::Encoder<SinkWrite>> {
    let (width, height) = frame_dimensions(first)?;
    let global_palette = match (&first.palette, first.pixel_format()) {
        (Some(palette), PixelFormat::Indexed8) => palette_triples(palette)?,
        _ => Vec::new(),
    };
    let mut encoder = gif::Encoder::new(sink, width, height, &global_palette)
        .map_err(|e| CodecError::corrupt(NAME, e))?;
    encoder
        .set_repeat(gif::Repeat::Infinite)
        .map_err(|e| CodecError::corrupt(NAME, e))?;
    Ok(encoder)
}

pub(crate) fn encode_frame(
    encoder: &mut gif::Encoder<SinkWrite>,
    frame: &PixelBuffer,
    _options: &SaveOptions,
) -> Result<()> {
    let (width, height) = frame_dimensions(frame)?;
    let packed = packed_rows(frame);

    let mut gif_frame = match frame.pixel_format() {
        PixelFormat::Indexed8 => {
            let palette = frame.palette.as_ref().ok_or_else(|| {
                CodecError::InvalidArgument("indexed frame has no palette".into())
            })?;
            let mut f = gif::Frame::default();
            f.width = width;
            f.height = height;
            f.buffer = packed.into();
            f.palette = Some(palette_triples(palette)?);
            f
        }
        PixelFormat::Rgb8 => gif::Frame::from_rgb(width, height, &packed),
        PixelFormat::Rgba8 => {
            let mut rgba = packed;
            gif::Frame::from_rgba(width, height, &mut rgba)
        }
        other => {
            return Err(CodecError::Unsupported(format!(
                "GIF cannot encode {other}"
            )));
        }
    };
    gif_frame.delay = (frame.delay_ms.unwrap_or(0) / 10).min(u32::from(u16::MAX)) as u16;

    encoder
        .write_frame(&gif_frame)
        .map_err(|e| CodecError::corrupt(NAME, e))?;
    Ok(())
}

fn frame_dimensions(frame: &PixelBuffer) -> Result<(u16, u16)> {
    if frame.width() > u32::from(u16::MAX) || frame.height() > u32::from(u16::MAX) {
        return Err(CodecError::InvalidArgument(format!(
            "GIF dimensions are limited to 65535, got {}×{}",
            frame.width(),
            frame.height()
        )));
    }
    Ok((frame.width() as u16, frame.height() as u16))
}

/// RGB triples for the gif color table, alpha stripped if present.
fn palette_triples(palette: &crate::meta::Palette) -> Result<Vec<u8>> {
    if palette.color_count() > 256 {
        return Err(CodecError::InvalidArgument(format!(
            "GIF palettes hold at most 256 colors, got {}",
            palette.color_count()
        )));
    }
    let mut triples = Vec::with_capacity(palette.color_count() * 3);
    for i in 0..palette.color_count() {
        let entry = palette.color(i).expect("index within color_count");
        triples.extend_from_slice(&entry[..3]);
    }
    Ok(triples)
}

fn packed_rows(frame: &PixelBuffer) -> Vec<u8> {
    let min_stride = frame.pixel_format().min_bytes_per_line(frame.width());
    let mut packed = Vec::with_capacity(min_stride * frame.height() as usize);
    for y in 0..frame.height() {
        packed.extend_from_slice(frame.row(y));
    }
    packed
}

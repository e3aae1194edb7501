//! PNM (binary PGM/PPM) codec, parsed and serialized in-crate.

use std::io::{Read, Write};

use crate::buffer::PixelBuffer;
use crate::compression::Compression;
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::features::{CodecFeatures, LoadFeatures, SaveFeatures};
use crate::format::PixelFormat;
use crate::meta::SourceImage;
use crate::options::{LoadOptions, SaveOptions};

use super::{CodecId, SinkWrite, SourceRead};

const NAME: &str = "PNM";

pub(crate) static DESCRIPTOR: CodecDescriptor = CodecDescriptor {
    id: CodecId::Pnm,
    name: NAME,
    version: "1.0.0",
    description: "Portable Any Map",
    extensions: &["pnm", "pgm", "ppm"],
    mime_types: &[
        "image/x-portable-anymap",
        "image/x-portable-graymap",
        "image/x-portable-pixmap",
    ],
    magic: &[b"P5", b"P6"],
    load_features: Some(LoadFeatures::new(
        CodecFeatures::new().with_static_image(true),
    )),
    save_features: Some(SaveFeatures {
        pixel_formats: &[
            PixelFormat::Gray8,
            PixelFormat::Gray16,
            PixelFormat::Rgb8,
            PixelFormat::Rgb16,
        ],
        compressions: &[Compression::None],
        default_compression: Compression::None,
        compression_level: None,
        features: CodecFeatures::new().with_static_image(true),
    }),
};

#[derive(Debug)]
struct ParseError(String);

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for ParseError {}

fn corrupt(message: impl Into<String>) -> CodecError {
    CodecError::corrupt(NAME, ParseError(message.into()))
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub(crate) struct PnmReader {
    frame: Option<PixelBuffer>,
}

impl PnmReader {
    pub(crate) fn open(mut source: SourceRead, _options: &LoadOptions) -> Result<Self> {
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|e| CodecError::io("reading source", e))?;
        Ok(Self {
            frame: Some(parse(&bytes)?),
        })
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        Ok(self.frame.take())
    }
}

fn parse(bytes: &[u8]) -> Result<PixelBuffer> {
    let channels: u32 = match bytes.get(..2) {
        Some(b"P5") => 1,
        Some(b"P6") => 3,
        _ => return Err(corrupt("missing P5/P6 signature")),
    };

    let mut pos = 2;
    let width = read_header_int(bytes, &mut pos)?;
    let height = read_header_int(bytes, &mut pos)?;
    let maxval = read_header_int(bytes, &mut pos)?;
    if !(1..=65535).contains(&maxval) {
        return Err(corrupt(format!("maxval {maxval} out of range 1..=65535")));
    }
    if width == 0 || height == 0 || width > u32::MAX as u64 || height > u32::MAX as u64 {
        return Err(corrupt(format!("bad dimensions {width}×{height}")));
    }
    // Single whitespace byte separates the header from the raster.
    match bytes.get(pos) {
        Some(b) if b.is_ascii_whitespace() => pos += 1,
        _ => return Err(corrupt("missing raster separator")),
    }

    let (width, height) = (width as u32, height as u32);
    let wide = maxval > 255;
    let format = match (channels, wide) {
        (1, false) => PixelFormat::Gray8,
        (1, true) => PixelFormat::Gray16,
        (3, false) => PixelFormat::Rgb8,
        _ => PixelFormat::Rgb16,
    };

    let samples = width as usize * height as usize * channels as usize;
    let sample_size = if wide { 2 } else { 1 };
    let raster = bytes
        .get(pos..pos + samples * sample_size)
        .ok_or_else(|| corrupt("truncated raster data"))?;

    let mut data = Vec::with_capacity(samples * sample_size);
    if wide {
        // Raster samples are big-endian; scale odd maxvals to full range.
        for pair in raster.chunks_exact(2) {
            let v = u32::from(u16::from_be_bytes([pair[0], pair[1]]));
            if v > maxval as u32 {
                return Err(corrupt(format!("sample {v} exceeds maxval {maxval}")));
            }
            let scaled = (v * 65535 / maxval as u32) as u16;
            data.extend_from_slice(&scaled.to_ne_bytes());
        }
    } else if maxval == 255 {
        data.extend_from_slice(raster);
    } else {
        for &v in raster {
            if u64::from(v) > maxval {
                return Err(corrupt(format!("sample {v} exceeds maxval {maxval}")));
            }
            data.push((u32::from(v) * 255 / maxval as u32) as u8);
        }
    }

    let mut frame = PixelBuffer::from_vec(
        data,
        format,
        width,
        height,
        format.min_bytes_per_line(width),
    )?;
    frame.source = Some(SourceImage {
        pixel_format: Some(format),
        compression: Some(Compression::None),
        chroma_subsampling: None,
        orientation: Default::default(),
        interlaced: false,
    });
    Ok(frame)
}

/// Read one whitespace-delimited decimal, skipping `#` comments.
fn read_header_int(bytes: &[u8], pos: &mut usize) -> Result<u64> {
    loop {
        match bytes.get(*pos) {
            Some(b) if b.is_ascii_whitespace() => *pos += 1,
            Some(b'#') => {
                while let Some(b) = bytes.get(*pos) {
                    *pos += 1;
                    if *b == b'\n' {
                        break;
                    }
                }
            }
            Some(b) if b.is_ascii_digit() => break,
            _ => return Err(corrupt("malformed header")),
        }
    }
    let mut value: u64 = 0;
    while let Some(b) = bytes.get(*pos) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
            .ok_or_else(|| corrupt("header value overflow"))?;
        *pos += 1;
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

pub(crate) fn encode_frame(
    sink: &mut SinkWrite,
    frame: &PixelBuffer,
    _options: &SaveOptions,
) -> Result<()> {
    let (magic, wide) = match frame.pixel_format() {
        PixelFormat::Gray8 => ("P5", false),
        PixelFormat::Gray16 => ("P5", true),
        PixelFormat::Rgb8 => ("P6", false),
        PixelFormat::Rgb16 => ("P6", true),
        other => {
            return Err(CodecError::Unsupported(format!(
                "PNM cannot encode {other}"
            )));
        }
    };
    let maxval = if wide { 65535 } else { 255 };

    let header = format!("{magic}\n{} {}\n{maxval}\n", frame.width(), frame.height());
    sink.write_all(header.as_bytes())
        .map_err(|e| CodecError::io("writing destination", e))?;

    for y in 0..frame.height() {
        let row = frame.row(y);
        if wide {
            let mut be_row = Vec::with_capacity(row.len());
            for pair in row.chunks_exact(2) {
                let v = u16::from_ne_bytes([pair[0], pair[1]]);
                be_row.extend_from_slice(&v.to_be_bytes());
            }
            sink.write_all(&be_row)
                .map_err(|e| CodecError::io("writing destination", e))?;
        } else {
            sink.write_all(row)
                .map_err(|e| CodecError::io("writing destination", e))?;
        }
    }
    Ok(())
}

//! Header-only metadata probing.
//!
//! Extracts dimensions, pixel format, and source compression from the
//! leading bytes of an image without decoding pixel data. All parsers are
//! pure byte parsing — no codec backend is involved, so probing stays cheap
//! and works on truncated prefixes (missing values come back as `None`
//! rather than errors).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::codecs::CodecId;
use crate::compression::Compression;
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::format::PixelFormat;
use crate::registry::CodecRegistry;

/// How many leading bytes a probe reads from a file. JPEG headers can push
/// the frame marker past large APP segments (EXIF thumbnails), so this is
/// deliberately generous while staying far below a pixel decode.
const PROBE_PREFIX_BYTES: usize = 256 * 1024;

/// Result of probing an image source.
///
/// The codec is always resolved; everything else is best-effort from the
/// available header bytes.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct ProbeReport {
    /// Codec that claimed the source by magic bytes.
    pub codec: &'static CodecDescriptor,
    /// Image width in pixels.
    pub width: Option<u32>,
    /// Image height in pixels.
    pub height: Option<u32>,
    /// Pixel format the data is stored in.
    pub pixel_format: Option<PixelFormat>,
    /// Bits per stored pixel.
    pub bits_per_pixel: Option<u32>,
    /// Compression of the stored pixel data.
    pub source_compression: Option<Compression>,
    /// Whether the source is stored interlaced.
    pub interlaced: Option<bool>,
}

impl ProbeReport {
    fn bare(codec: &'static CodecDescriptor) -> Self {
        Self {
            codec,
            width: None,
            height: None,
            pixel_format: None,
            bits_per_pixel: None,
            source_compression: None,
            interlaced: None,
        }
    }
}

/// Probe an image file. Reads a bounded prefix, never decodes pixels.
///
/// Fails with a typed I/O error when the path cannot be opened, and with
/// [`CodecError::UnrecognizedFormat`] when no codec claims the content.
pub fn probe_path(path: impl AsRef<Path>) -> Result<ProbeReport> {
    let mut file = File::open(path).map_err(|e| CodecError::io("opening source", e))?;
    let mut prefix = Vec::with_capacity(64 * 1024);
    file.by_ref()
        .take(PROBE_PREFIX_BYTES as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| CodecError::io("reading source", e))?;
    probe_bytes(&prefix)
}

/// Probe in-memory image data (a leading slice is enough).
pub fn probe_bytes(data: &[u8]) -> Result<ProbeReport> {
    let codec = CodecRegistry::global().from_magic(data)?;
    Ok(probe_for(codec, data))
}

/// Dispatch to the format-specific parser. The caller has already matched
/// the magic bytes.
fn probe_for(codec: &'static CodecDescriptor, data: &[u8]) -> ProbeReport {
    match codec.id {
        CodecId::Png => probe_png(codec, data),
        CodecId::Jpeg => probe_jpeg(codec, data),
        CodecId::Gif => probe_gif(codec, data),
        CodecId::Pnm => probe_pnm(codec, data),
    }
}

// ---------------------------------------------------------------------------
// PNG: 8-byte signature + IHDR (4 len + 4 type + 13 data)
// Total: 29 bytes for dimensions, depth, color type, interlace flag
// ---------------------------------------------------------------------------

fn probe_png(codec: &'static CodecDescriptor, data: &[u8]) -> ProbeReport {
    let mut report = ProbeReport::bare(codec);
    report.source_compression = Some(Compression::Deflate);

    if data.len() < 29 || &data[12..16] != b"IHDR" {
        return report;
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    let bit_depth = data[24];
    let color_type = data[25];
    let interlace = data[28];

    report.width = Some(width);
    report.height = Some(height);
    report.interlaced = Some(interlace == 1);
    report.pixel_format = match (color_type, bit_depth) {
        (0, 8) => Some(PixelFormat::Gray8),
        (0, 16) => Some(PixelFormat::Gray16),
        (2, 8) => Some(PixelFormat::Rgb8),
        (2, 16) => Some(PixelFormat::Rgb16),
        (3, _) => Some(PixelFormat::Indexed8),
        (4, 8) => Some(PixelFormat::GrayAlpha8),
        (4, 16) => Some(PixelFormat::GrayAlpha16),
        (6, 8) => Some(PixelFormat::Rgba8),
        (6, 16) => Some(PixelFormat::Rgba16),
        _ => None,
    };
    report.bits_per_pixel = match color_type {
        0 => Some(u32::from(bit_depth)),
        2 => Some(u32::from(bit_depth) * 3),
        3 => Some(u32::from(bit_depth)),
        4 => Some(u32::from(bit_depth) * 2),
        6 => Some(u32::from(bit_depth) * 4),
        _ => None,
    };
    report
}

// ---------------------------------------------------------------------------
// GIF: 6-byte header + 7-byte Logical Screen Descriptor = 13 bytes
// ---------------------------------------------------------------------------

fn probe_gif(codec: &'static CodecDescriptor, data: &[u8]) -> ProbeReport {
    let mut report = ProbeReport::bare(codec);
    report.source_compression = Some(Compression::Lzw);
    report.pixel_format = Some(PixelFormat::Indexed8);
    report.bits_per_pixel = Some(8);

    if data.len() < 13 {
        return report;
    }

    report.width = Some(u32::from(u16::from_le_bytes([data[6], data[7]])));
    report.height = Some(u32::from(u16::from_le_bytes([data[8], data[9]])));
    report.interlaced = None; // per-frame flag, not in the LSD
    report
}

// ---------------------------------------------------------------------------
// JPEG: scan marker segments for SOF (Start of Frame)
//
// SOI (FF D8), then marker segments (FF xx, 2-byte length, payload). The
// SOF0-SOF15 payload carries precision, height, width, component count.
// Stop at SOS — past it is entropy-coded data.
// ---------------------------------------------------------------------------

fn probe_jpeg(codec: &'static CodecDescriptor, data: &[u8]) -> ProbeReport {
    let mut report = ProbeReport::bare(codec);
    report.source_compression = Some(Compression::Jpeg);

    if data.len() < 4 {
        return report;
    }

    let mut pos = 2; // past SOI
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            break; // lost marker sync
        }
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            break;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Standalone markers have no length field
        if marker == 0x00 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }
        // SOS / EOI: nothing more to scan
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        if pos + 2 > data.len() {
            break;
        }
        let seg_len = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;

        let is_sof = matches!(
            marker,
            0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE
                | 0xCF
        );
        if is_sof {
            if pos + 8 <= data.len() {
                let precision = data[pos + 2];
                let height = u16::from_be_bytes([data[pos + 3], data[pos + 4]]);
                let width = u16::from_be_bytes([data[pos + 5], data[pos + 6]]);
                let components = data[pos + 7];

                report.width = Some(u32::from(width));
                report.height = Some(u32::from(height));
                report.bits_per_pixel = Some(u32::from(precision) * u32::from(components));
                report.pixel_format = match (components, precision) {
                    (1, 8) => Some(PixelFormat::Gray8),
                    (1, 16) => Some(PixelFormat::Gray16),
                    // Color JPEGs are stored as YCbCr/YCCK; no buffer format
                    _ => None,
                };
                report.interlaced = Some(matches!(marker, 0xC2 | 0xC6 | 0xCA | 0xCE));
            }
            break;
        }

        if seg_len < 2 {
            break; // invalid segment length
        }
        pos += seg_len;
    }

    report
}

// ---------------------------------------------------------------------------
// PNM: ASCII header — magic, width, height, maxval
// ---------------------------------------------------------------------------

fn probe_pnm(codec: &'static CodecDescriptor, data: &[u8]) -> ProbeReport {
    let mut report = ProbeReport::bare(codec);
    report.source_compression = Some(Compression::None);

    let channels: u32 = match data.get(..2) {
        Some(b"P5") => 1,
        Some(b"P6") => 3,
        _ => return report,
    };

    let mut pos = 2;
    let Some(width) = pnm_header_int(data, &mut pos) else {
        return report;
    };
    let Some(height) = pnm_header_int(data, &mut pos) else {
        report.width = u32::try_from(width).ok();
        return report;
    };
    report.width = u32::try_from(width).ok();
    report.height = u32::try_from(height).ok();

    if let Some(maxval) = pnm_header_int(data, &mut pos) {
        let wide = maxval > 255;
        report.pixel_format = Some(match (channels, wide) {
            (1, false) => PixelFormat::Gray8,
            (1, true) => PixelFormat::Gray16,
            (3, false) => PixelFormat::Rgb8,
            _ => PixelFormat::Rgb16,
        });
        report.bits_per_pixel = report.pixel_format.map(PixelFormat::bits_per_pixel);
    }
    report
}

fn pnm_header_int(data: &[u8], pos: &mut usize) -> Option<u64> {
    loop {
        match data.get(*pos) {
            Some(b) if b.is_ascii_whitespace() => *pos += 1,
            Some(b'#') => {
                while let Some(b) = data.get(*pos) {
                    *pos += 1;
                    if *b == b'\n' {
                        break;
                    }
                }
            }
            Some(b) if b.is_ascii_digit() => break,
            _ => return None,
        }
    }
    let mut value: u64 = 0;
    while let Some(b) = data.get(*pos) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
        *pos += 1;
    }
    Some(value)
}

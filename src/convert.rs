//! Pixel format conversion, rotation, and mirroring.
//!
//! Conversions run through a canonical `Rgba<u16>` intermediate: every
//! source pixel is widened to 16-bit RGBA, then emitted in the target
//! layout. Gray targets use ITU-R BT.601 luma weights. 16-bit channels are
//! stored as native-endian byte pairs; codecs convert wire endianness at
//! their boundary.

use rgb::{Rgb, Rgba};

use crate::buffer::PixelBuffer;
use crate::error::{CodecError, Result};
use crate::format::{PixelFamily, PixelFormat};
use crate::meta::Palette;
use crate::orientation::{Mirror, Orientation};

/// Options controlling lossy aspects of a conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConversionOptions {
    /// When the target format has no alpha channel, composite source alpha
    /// over [`background`](Self::background) instead of discarding it.
    pub blend_alpha: bool,
    /// Background color for alpha compositing, in 16-bit channels.
    pub background: Rgb<u16>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            blend_alpha: true,
            background: Rgb { r: 0, g: 0, b: 0 },
        }
    }
}

/// Whether a conversion path exists between two formats.
///
/// Pure format-level predicate: every format converts to every non-indexed
/// target, and identity conversions are always possible. Nothing converts
/// *to* an indexed format — there is no quantizer at this layer.
pub fn check_conversion(from: PixelFormat, to: PixelFormat) -> bool {
    from == to || !to.is_indexed()
}

// ---------------------------------------------------------------------------
// Scalar helpers
// ---------------------------------------------------------------------------

#[inline]
fn widen8(v: u8) -> u16 {
    u16::from(v) * 257
}

#[inline]
fn narrow16(v: u16) -> u8 {
    ((u32::from(v) + 128) / 257) as u8
}

/// ITU-R BT.601 luma from 16-bit channels.
#[inline]
fn luma601(px: Rgba<u16>) -> u16 {
    ((299 * u32::from(px.r) + 587 * u32::from(px.g) + 114 * u32::from(px.b)) / 1000) as u16
}

#[inline]
fn read_u16(bytes: &[u8]) -> u16 {
    bytemuck::pod_read_unaligned(&bytes[..2])
}

#[inline]
fn write_u16(v: u16, bytes: &mut [u8]) {
    bytes.copy_from_slice(bytemuck::bytes_of(&v));
}

// ---------------------------------------------------------------------------
// Per-format kernels
// ---------------------------------------------------------------------------

type DecodePx = fn(&[u8]) -> Rgba<u16>;
type EncodePx = fn(Rgba<u16>, &mut [u8]);

/// Pixel decoder for non-indexed formats. Indexed sources go through the
/// palette path instead.
fn decode_fn(format: PixelFormat) -> DecodePx {
    match format {
        PixelFormat::Indexed8 => unreachable!("indexed sources decode via palette"),
        PixelFormat::Gray8 => |p| gray_px(widen8(p[0]), u16::MAX),
        PixelFormat::Gray16 => |p| gray_px(read_u16(p), u16::MAX),
        PixelFormat::GrayAlpha8 => |p| gray_px(widen8(p[0]), widen8(p[1])),
        PixelFormat::GrayAlpha16 => |p| gray_px(read_u16(&p[0..2]), read_u16(&p[2..4])),
        PixelFormat::Rgb8 => |p| rgba(widen8(p[0]), widen8(p[1]), widen8(p[2]), u16::MAX),
        PixelFormat::Bgr8 => |p| rgba(widen8(p[2]), widen8(p[1]), widen8(p[0]), u16::MAX),
        PixelFormat::Rgb16 => |p| {
            rgba(
                read_u16(&p[0..2]),
                read_u16(&p[2..4]),
                read_u16(&p[4..6]),
                u16::MAX,
            )
        },
        PixelFormat::Rgba8 => |p| rgba(widen8(p[0]), widen8(p[1]), widen8(p[2]), widen8(p[3])),
        PixelFormat::Bgra8 => |p| rgba(widen8(p[2]), widen8(p[1]), widen8(p[0]), widen8(p[3])),
        PixelFormat::Rgba16 => |p| {
            rgba(
                read_u16(&p[0..2]),
                read_u16(&p[2..4]),
                read_u16(&p[4..6]),
                read_u16(&p[6..8]),
            )
        },
        PixelFormat::Bgra16 => |p| {
            rgba(
                read_u16(&p[4..6]),
                read_u16(&p[2..4]),
                read_u16(&p[0..2]),
                read_u16(&p[6..8]),
            )
        },
    }
}

fn encode_fn(format: PixelFormat) -> EncodePx {
    match format {
        PixelFormat::Indexed8 => unreachable!("conversion to indexed has no path"),
        PixelFormat::Gray8 => |px, out| out[0] = narrow16(luma601(px)),
        PixelFormat::Gray16 => |px, out| write_u16(luma601(px), out),
        PixelFormat::GrayAlpha8 => |px, out| {
            out[0] = narrow16(luma601(px));
            out[1] = narrow16(px.a);
        },
        PixelFormat::GrayAlpha16 => |px, out| {
            write_u16(luma601(px), &mut out[0..2]);
            write_u16(px.a, &mut out[2..4]);
        },
        PixelFormat::Rgb8 => |px, out| {
            out[0] = narrow16(px.r);
            out[1] = narrow16(px.g);
            out[2] = narrow16(px.b);
        },
        PixelFormat::Bgr8 => |px, out| {
            out[0] = narrow16(px.b);
            out[1] = narrow16(px.g);
            out[2] = narrow16(px.r);
        },
        PixelFormat::Rgb16 => |px, out| {
            write_u16(px.r, &mut out[0..2]);
            write_u16(px.g, &mut out[2..4]);
            write_u16(px.b, &mut out[4..6]);
        },
        PixelFormat::Rgba8 => |px, out| {
            out[0] = narrow16(px.r);
            out[1] = narrow16(px.g);
            out[2] = narrow16(px.b);
            out[3] = narrow16(px.a);
        },
        PixelFormat::Bgra8 => |px, out| {
            out[0] = narrow16(px.b);
            out[1] = narrow16(px.g);
            out[2] = narrow16(px.r);
            out[3] = narrow16(px.a);
        },
        PixelFormat::Rgba16 => |px, out| {
            write_u16(px.r, &mut out[0..2]);
            write_u16(px.g, &mut out[2..4]);
            write_u16(px.b, &mut out[4..6]);
            write_u16(px.a, &mut out[6..8]);
        },
        PixelFormat::Bgra16 => |px, out| {
            write_u16(px.b, &mut out[0..2]);
            write_u16(px.g, &mut out[2..4]);
            write_u16(px.r, &mut out[4..6]);
            write_u16(px.a, &mut out[6..8]);
        },
    }
}

#[inline]
fn rgba(r: u16, g: u16, b: u16, a: u16) -> Rgba<u16> {
    Rgba { r, g, b, a }
}

#[inline]
fn gray_px(v: u16, a: u16) -> Rgba<u16> {
    Rgba { r: v, g: v, b: v, a }
}

fn palette_px(palette: &Palette, index: u8) -> Result<Rgba<u16>> {
    let entry = palette.color(index as usize).ok_or_else(|| {
        CodecError::InvalidArgument(format!(
            "palette index {index} out of range 0..{}",
            palette.color_count()
        ))
    })?;
    Ok(match palette.pixel_format() {
        PixelFormat::Rgba8 => rgba(
            widen8(entry[0]),
            widen8(entry[1]),
            widen8(entry[2]),
            widen8(entry[3]),
        ),
        _ => rgba(widen8(entry[0]), widen8(entry[1]), widen8(entry[2]), u16::MAX),
    })
}

/// Composite or drop alpha when the target has none.
#[inline]
fn resolve_alpha(px: Rgba<u16>, target_has_alpha: bool, options: &ConversionOptions) -> Rgba<u16> {
    if target_has_alpha || px.a == u16::MAX {
        return px;
    }
    if !options.blend_alpha {
        return px;
    }
    let blend = |c: u16, bg: u16| -> u16 {
        let a = u32::from(px.a);
        ((u32::from(c) * a + u32::from(bg) * (65535 - a) + 32767) / 65535) as u16
    };
    Rgba {
        r: blend(px.r, options.background.r),
        g: blend(px.g, options.background.g),
        b: blend(px.b, options.background.b),
        a: px.a,
    }
}

// ---------------------------------------------------------------------------
// Conversion cost model
// ---------------------------------------------------------------------------

fn color_group(family: PixelFamily) -> u8 {
    match family {
        PixelFamily::Gray | PixelFamily::GrayAlpha => 0,
        _ => 1,
    }
}

/// Relative cost of converting between two formats. Lower is better;
/// zero means identity.
fn conversion_cost(from: PixelFormat, to: PixelFormat) -> u32 {
    if from == to {
        return 0;
    }
    let mut cost = if from.family() == to.family() {
        10
    } else if color_group(from.family()) == color_group(to.family()) {
        20
    } else {
        40
    };
    if from.has_alpha() && !to.has_alpha() {
        cost += 100;
    }
    let from_depth = from.bytes_per_channel();
    let to_depth = to.bytes_per_channel();
    if to_depth >= from_depth {
        cost += to_depth - from_depth;
    } else {
        cost += 50 * (from_depth - to_depth);
    }
    cost
}

impl PixelFormat {
    /// Pick the best conversion target among `candidates` for a source of
    /// format `from`: exact match first, then same family with minimal
    /// bit-depth loss (widening preferred over narrowing), then any
    /// reachable candidate. Ties break toward earlier candidates.
    pub fn closest_of(from: PixelFormat, candidates: &[PixelFormat]) -> Option<PixelFormat> {
        candidates
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, c)| check_conversion(from, *c))
            .min_by_key(|(i, c)| (conversion_cost(from, *c), *i))
            .map(|(_, c)| c)
    }
}

// ---------------------------------------------------------------------------
// PixelBuffer operations
// ---------------------------------------------------------------------------

impl PixelBuffer {
    /// Buffer-level conversion feasibility: the format path must exist and
    /// an indexed source must actually carry its palette.
    pub fn can_convert(&self, to: PixelFormat) -> bool {
        if !check_conversion(self.pixel_format(), to) {
            return false;
        }
        if self.pixel_format() == to {
            return true;
        }
        !self.pixel_format().is_indexed() || self.palette.is_some()
    }

    /// Pick the best target among `candidates` for this buffer's format.
    pub fn closest_pixel_format(&self, candidates: &[PixelFormat]) -> Option<PixelFormat> {
        let reachable: Vec<PixelFormat> = candidates
            .iter()
            .copied()
            .filter(|c| self.can_convert(*c))
            .collect();
        PixelFormat::closest_of(self.pixel_format(), &reachable)
    }

    /// Convert to `to` with default options, returning a new buffer.
    pub fn convert_to(&self, to: PixelFormat) -> Result<PixelBuffer> {
        self.convert_to_with(to, &ConversionOptions::default())
    }

    /// Convert to `to`, returning a new buffer. The source is untouched.
    pub fn convert_to_with(
        &self,
        to: PixelFormat,
        options: &ConversionOptions,
    ) -> Result<PixelBuffer> {
        let from = self.pixel_format();
        if !check_conversion(from, to) {
            return Err(CodecError::Unsupported(format!(
                "no conversion path from {from} to {to}"
            )));
        }

        if from == to {
            return Ok(self.clone());
        }

        let width = self.width();
        let height = self.height();
        let dst_stride = to.min_bytes_per_line(width);
        let mut data = vec![0u8; dst_stride * height as usize];

        let src_bpp = from.bytes_per_pixel() as usize;
        let dst_bpp = to.bytes_per_pixel() as usize;
        let encode = encode_fn(to);

        if from.is_indexed() {
            let palette = self.palette.as_ref().ok_or_else(|| {
                CodecError::InvalidArgument("indexed buffer has no palette".into())
            })?;
            let palette_alpha = palette.pixel_format().has_alpha();
            for y in 0..height {
                let src_row = self.row(y);
                let dst_row = &mut data[y as usize * dst_stride..][..dst_stride];
                for x in 0..width as usize {
                    let mut px = palette_px(palette, src_row[x])?;
                    if palette_alpha {
                        px = resolve_alpha(px, to.has_alpha(), options);
                    }
                    encode(px, &mut dst_row[x * dst_bpp..][..dst_bpp]);
                }
            }
        } else {
            let decode = decode_fn(from);
            let source_alpha = from.has_alpha();
            for y in 0..height {
                let src_row = self.row(y);
                let dst_row = &mut data[y as usize * dst_stride..][..dst_stride];
                for x in 0..width as usize {
                    let mut px = decode(&src_row[x * src_bpp..][..src_bpp]);
                    if source_alpha {
                        px = resolve_alpha(px, to.has_alpha(), options);
                    }
                    encode(px, &mut dst_row[x * dst_bpp..][..dst_bpp]);
                }
            }
        }

        let mut out = PixelBuffer::from_vec(data, to, width, height, dst_stride)?;
        out.icc_profile = self.icc_profile.clone();
        out.meta_data = self.meta_data.clone();
        out.resolution = self.resolution;
        out.delay_ms = self.delay_ms;
        out.source = self.source.clone();
        Ok(out)
    }

    /// Convert in place with default options.
    pub fn convert(&mut self, to: PixelFormat) -> Result<()> {
        self.convert_with(to, &ConversionOptions::default())
    }

    /// Convert in place. On failure the buffer is unchanged.
    pub fn convert_with(&mut self, to: PixelFormat, options: &ConversionOptions) -> Result<()> {
        if self.pixel_format() == to {
            return Ok(());
        }
        let converted = self.convert_to_with(to, options)?;
        let (width, height, stride) = (
            converted.width(),
            converted.height(),
            converted.bytes_per_line(),
        );
        self.replace_storage(converted.into_vec(), to, width, height, stride);
        self.palette = None;
        Ok(())
    }

    /// Convert in place to the closest pixel format a codec declares for
    /// saving. No-op when the current format is already accepted.
    pub fn convert_for_save(&mut self, save_features: &crate::SaveFeatures) -> Result<()> {
        if save_features.supports_pixel_format(self.pixel_format()) {
            return Ok(());
        }
        let target = self
            .closest_pixel_format(save_features.pixel_formats)
            .ok_or_else(|| {
                CodecError::Unsupported(format!(
                    "no conversion path from {} to any of the codec's save formats",
                    self.pixel_format()
                ))
            })?;
        log::debug!(
            "converting {} to {} for saving",
            self.pixel_format(),
            target
        );
        self.convert(target)
    }

    /// Rotate, returning a new buffer. 90/270 rotations swap dimensions.
    pub fn rotated(&self, orientation: Orientation) -> PixelBuffer {
        if orientation.is_identity() {
            return self.clone();
        }

        let width = self.width() as usize;
        let height = self.height() as usize;
        let bpp = self.pixel_format().bytes_per_pixel() as usize;
        let (out_w, out_h) = orientation.rotated_dimensions(self.width(), self.height());
        let dst_stride = self.pixel_format().min_bytes_per_line(out_w);
        let mut data = vec![0u8; dst_stride * out_h as usize];

        for y in 0..height {
            let src_row = self.row(y as u32);
            for x in 0..width {
                let (dst_x, dst_y) = match orientation {
                    Orientation::Normal => unreachable!(),
                    Orientation::Rotate90 => (height - 1 - y, x),
                    Orientation::Rotate180 => (width - 1 - x, height - 1 - y),
                    Orientation::Rotate270 => (y, width - 1 - x),
                };
                let dst = &mut data[dst_y * dst_stride + dst_x * bpp..][..bpp];
                dst.copy_from_slice(&src_row[x * bpp..][..bpp]);
            }
        }

        let mut out = PixelBuffer::from_vec(data, self.pixel_format(), out_w, out_h, dst_stride)
            .expect("rotated dimensions are valid");
        out.palette = self.palette.clone();
        out.icc_profile = self.icc_profile.clone();
        out.meta_data = self.meta_data.clone();
        out.resolution = self.resolution;
        out.delay_ms = self.delay_ms;
        out.source = self.source.clone();
        out
    }

    /// Rotate in place.
    pub fn rotate(&mut self, orientation: Orientation) {
        if orientation.is_identity() {
            return;
        }
        let rotated = self.rotated(orientation);
        let (width, height, stride, format) = (
            rotated.width(),
            rotated.height(),
            rotated.bytes_per_line(),
            rotated.pixel_format(),
        );
        self.replace_storage(rotated.into_vec(), format, width, height, stride);
    }

    /// Mirror in place. Dimensions are unchanged.
    pub fn mirror(&mut self, axis: Mirror) {
        let width = self.width() as usize;
        let height = self.height();
        let bpp = self.pixel_format().bytes_per_pixel() as usize;
        match axis {
            Mirror::Horizontal => {
                for y in 0..height {
                    let row = self.row_mut(y);
                    for x in 0..width / 2 {
                        let (left, right) = row.split_at_mut((width - x) * bpp - bpp);
                        left[x * bpp..x * bpp + bpp].swap_with_slice(&mut right[..bpp]);
                    }
                }
            }
            Mirror::Vertical => {
                let stride = self.bytes_per_line();
                let data = self.as_bytes_mut();
                for y in 0..height as usize / 2 {
                    let other = height as usize - 1 - y;
                    let (top, bottom) = data.split_at_mut(other * stride);
                    top[y * stride..y * stride + stride].swap_with_slice(&mut bottom[..stride]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Palette;

    fn rgb_buffer(pixels: &[[u8; 3]], width: u32, height: u32) -> PixelBuffer {
        let data: Vec<u8> = pixels.iter().flatten().copied().collect();
        PixelBuffer::from_vec(
            data,
            PixelFormat::Rgb8,
            width,
            height,
            PixelFormat::Rgb8.min_bytes_per_line(width),
        )
        .unwrap()
    }

    #[test]
    fn check_conversion_matrix() {
        for from in PixelFormat::ALL {
            for to in PixelFormat::ALL {
                let expected = from == to || !to.is_indexed();
                assert_eq!(check_conversion(from, to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn rgb_to_bgr_swaps_channels() {
        let buffer = rgb_buffer(&[[10, 20, 30]], 1, 1);
        let bgr = buffer.convert_to(PixelFormat::Bgr8).unwrap();
        assert_eq!(bgr.as_bytes(), &[30, 20, 10]);
    }

    #[test]
    fn rgb_to_gray_uses_luma() {
        let buffer = rgb_buffer(&[[255, 0, 0]], 1, 1);
        let gray = buffer.convert_to(PixelFormat::Gray8).unwrap();
        // 0.299 * 255 ≈ 76
        assert_eq!(gray.as_bytes(), &[76]);

        let white = rgb_buffer(&[[255, 255, 255]], 1, 1);
        assert_eq!(white.convert_to(PixelFormat::Gray8).unwrap().as_bytes(), &[255]);
    }

    #[test]
    fn widening_roundtrip_is_exact() {
        let buffer = rgb_buffer(&[[0, 127, 255]], 1, 1);
        let wide = buffer.convert_to(PixelFormat::Rgb16).unwrap();
        let back = wide.convert_to(PixelFormat::Rgb8).unwrap();
        assert_eq!(back.as_bytes(), buffer.as_bytes());
    }

    #[test]
    fn blend_alpha_composites_over_background() {
        let mut buffer = PixelBuffer::new(PixelFormat::Rgba8, 1, 1).unwrap();
        buffer.as_bytes_mut().copy_from_slice(&[200, 100, 0, 128]);

        let options = ConversionOptions {
            blend_alpha: true,
            background: Rgb { r: 0, g: 0, b: 0 },
        };
        let blended = buffer.convert_to_with(PixelFormat::Rgb8, &options).unwrap();
        // ~50% alpha over black halves each channel
        let bytes = blended.as_bytes();
        assert!((bytes[0] as i32 - 100).abs() <= 1, "r = {}", bytes[0]);
        assert!((bytes[1] as i32 - 50).abs() <= 1, "g = {}", bytes[1]);
        assert_eq!(bytes[2], 0);
    }

    #[test]
    fn drop_alpha_keeps_channels() {
        let mut buffer = PixelBuffer::new(PixelFormat::Rgba8, 1, 1).unwrap();
        buffer.as_bytes_mut().copy_from_slice(&[200, 100, 0, 128]);

        let options = ConversionOptions {
            blend_alpha: false,
            background: Rgb { r: 0, g: 0, b: 0 },
        };
        let dropped = buffer.convert_to_with(PixelFormat::Rgb8, &options).unwrap();
        assert_eq!(dropped.as_bytes(), &[200, 100, 0]);
    }

    #[test]
    fn indexed_expands_through_palette() {
        let mut buffer = PixelBuffer::new(PixelFormat::Indexed8, 2, 1).unwrap();
        buffer.as_bytes_mut().copy_from_slice(&[0, 1]);
        buffer.palette =
            Some(Palette::new(PixelFormat::Rgb8, vec![255, 0, 0, 0, 0, 255]).unwrap());

        let rgb = buffer.convert_to(PixelFormat::Rgb8).unwrap();
        assert_eq!(rgb.as_bytes(), &[255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn indexed_without_palette_fails() {
        let buffer = PixelBuffer::new(PixelFormat::Indexed8, 2, 1).unwrap();
        assert!(!buffer.can_convert(PixelFormat::Rgb8));
        assert!(matches!(
            buffer.convert_to(PixelFormat::Rgb8),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn conversion_to_indexed_unsupported() {
        let buffer = rgb_buffer(&[[1, 2, 3]], 1, 1);
        assert!(!buffer.can_convert(PixelFormat::Indexed8));
        assert!(matches!(
            buffer.convert_to(PixelFormat::Indexed8),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[test]
    fn can_convert_implies_convert_succeeds() {
        let buffer = rgb_buffer(&[[1, 2, 3]], 1, 1);
        for to in PixelFormat::ALL {
            if buffer.can_convert(to) {
                assert!(buffer.convert_to(to).is_ok(), "convert to {to}");
            } else {
                assert!(buffer.convert_to(to).is_err(), "convert to {to}");
            }
        }
    }

    #[test]
    fn in_place_conversion_replaces_storage() {
        let mut buffer = rgb_buffer(&[[10, 20, 30]], 1, 1);
        buffer.convert(PixelFormat::Rgba8).unwrap();
        assert_eq!(buffer.pixel_format(), PixelFormat::Rgba8);
        assert_eq!(buffer.as_bytes(), &[10, 20, 30, 255]);
    }

    #[test]
    fn closest_prefers_exact_then_family() {
        let candidates = [PixelFormat::Gray8, PixelFormat::Rgb16, PixelFormat::Rgb8];
        assert_eq!(
            PixelFormat::closest_of(PixelFormat::Rgb8, &candidates),
            Some(PixelFormat::Rgb8)
        );
        let no_exact = [PixelFormat::Gray8, PixelFormat::Rgb16];
        assert_eq!(
            PixelFormat::closest_of(PixelFormat::Rgb8, &no_exact),
            Some(PixelFormat::Rgb16)
        );
        // Alpha source prefers the alpha-capable candidate
        assert_eq!(
            PixelFormat::closest_of(
                PixelFormat::Rgba8,
                &[PixelFormat::Rgb8, PixelFormat::Bgra8]
            ),
            Some(PixelFormat::Bgra8)
        );
        assert_eq!(PixelFormat::closest_of(PixelFormat::Rgb8, &[]), None);
    }

    #[test]
    fn convert_for_save_targets_declared_format() {
        use crate::compression::Compression;
        use crate::features::{CodecFeatures, SaveFeatures};

        let save = SaveFeatures {
            pixel_formats: &[PixelFormat::Gray8, PixelFormat::Rgba8],
            compressions: &[Compression::None],
            default_compression: Compression::None,
            compression_level: None,
            features: CodecFeatures::new().with_static_image(true),
        };
        let mut buffer = rgb_buffer(&[[9, 9, 9]], 1, 1);
        buffer.convert_for_save(&save).unwrap();
        assert_eq!(buffer.pixel_format(), PixelFormat::Rgba8);
    }

    #[test]
    fn rotate90_moves_pixels() {
        // 2x1 image: [A, B] → after 90 CW: column [A; B] reading top-down
        let buffer = rgb_buffer(&[[1, 1, 1], [2, 2, 2]], 2, 1);
        let rotated = buffer.rotated(Orientation::Rotate90);
        assert_eq!(rotated.width(), 1);
        assert_eq!(rotated.height(), 2);
        assert_eq!(rotated.row(0), &[1, 1, 1]);
        assert_eq!(rotated.row(1), &[2, 2, 2]);
    }

    #[test]
    fn rotate180_reverses() {
        let mut buffer = rgb_buffer(&[[1, 1, 1], [2, 2, 2]], 2, 1);
        buffer.rotate(Orientation::Rotate180);
        assert_eq!(buffer.row(0), &[2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn rotate_roundtrip() {
        let buffer = rgb_buffer(&[[1, 2, 3], [4, 5, 6], [7, 8, 9], [10, 11, 12]], 2, 2);
        let back = buffer
            .rotated(Orientation::Rotate90)
            .rotated(Orientation::Rotate270);
        assert_eq!(back.as_bytes(), buffer.as_bytes());
        let spun = buffer
            .rotated(Orientation::Rotate180)
            .rotated(Orientation::Rotate180);
        assert_eq!(spun.as_bytes(), buffer.as_bytes());
    }

    #[test]
    fn mirror_horizontal() {
        let mut buffer = rgb_buffer(&[[1, 1, 1], [2, 2, 2], [3, 3, 3]], 3, 1);
        buffer.mirror(Mirror::Horizontal);
        assert_eq!(buffer.row(0), &[3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn mirror_vertical() {
        let mut buffer = rgb_buffer(&[[1, 1, 1], [2, 2, 2]], 1, 2);
        buffer.mirror(Mirror::Vertical);
        assert_eq!(buffer.row(0), &[2, 2, 2]);
        assert_eq!(buffer.row(1), &[1, 1, 1]);
    }

    #[test]
    fn gray16_to_gray8_narrowing() {
        let mut buffer = PixelBuffer::new(PixelFormat::Gray16, 1, 1).unwrap();
        write_u16(0x8080, buffer.as_bytes_mut());
        let narrow = buffer.convert_to(PixelFormat::Gray8).unwrap();
        assert_eq!(narrow.as_bytes(), &[0x80]);
    }
}

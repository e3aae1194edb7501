//! Declared codec capability sets and default-option derivation.

use crate::compression::{Compression, CompressionLevel};
use crate::format::PixelFormat;
use crate::options::{LoadOptions, SaveOptions};
use crate::variant::Tuning;

/// Capability flags shared by load and save feature sets.
///
/// Constructed with const builders so descriptors can live in statics:
///
/// ```
/// use zenframes::CodecFeatures;
///
/// static FEATURES: CodecFeatures = CodecFeatures::new()
///     .with_static_image(true)
///     .with_meta_data(true)
///     .with_iccp(true);
///
/// assert!(FEATURES.static_image());
/// assert!(!FEATURES.animated());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct CodecFeatures {
    static_image: bool,
    animated: bool,
    multi_paged: bool,
    meta_data: bool,
    interlaced: bool,
    iccp: bool,
}

impl Default for CodecFeatures {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecFeatures {
    /// Create a feature set with everything disabled.
    pub const fn new() -> Self {
        Self {
            static_image: false,
            animated: false,
            multi_paged: false,
            meta_data: false,
            interlaced: false,
            iccp: false,
        }
    }

    /// Whether single static images are supported.
    pub const fn static_image(&self) -> bool {
        self.static_image
    }

    /// Whether animated (timed multi-frame) images are supported.
    pub const fn animated(&self) -> bool {
        self.animated
    }

    /// Whether multi-paged (untimed multi-frame) images are supported.
    pub const fn multi_paged(&self) -> bool {
        self.multi_paged
    }

    /// Whether image metadata (comments, EXIF) is supported.
    pub const fn meta_data(&self) -> bool {
        self.meta_data
    }

    /// Whether interlaced images are supported.
    pub const fn interlaced(&self) -> bool {
        self.interlaced
    }

    /// Whether embedded ICC profiles are supported.
    pub const fn iccp(&self) -> bool {
        self.iccp
    }

    /// Whether more than one frame per image is supported in any form.
    pub const fn multi_frame(&self) -> bool {
        self.animated || self.multi_paged
    }

    // --- const builder methods for static construction ---

    /// Set static image support.
    pub const fn with_static_image(mut self, v: bool) -> Self {
        self.static_image = v;
        self
    }

    /// Set animation support.
    pub const fn with_animated(mut self, v: bool) -> Self {
        self.animated = v;
        self
    }

    /// Set multi-page support.
    pub const fn with_multi_paged(mut self, v: bool) -> Self {
        self.multi_paged = v;
        self
    }

    /// Set metadata support.
    pub const fn with_meta_data(mut self, v: bool) -> Self {
        self.meta_data = v;
        self
    }

    /// Set interlacing support.
    pub const fn with_interlaced(mut self, v: bool) -> Self {
        self.interlaced = v;
        self
    }

    /// Set ICC profile support.
    pub const fn with_iccp(mut self, v: bool) -> Self {
        self.iccp = v;
        self
    }
}

/// What a codec can do when loading.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct LoadFeatures {
    /// Capability flags for load operations.
    pub features: CodecFeatures,
}

impl LoadFeatures {
    /// Declare load features.
    pub const fn new(features: CodecFeatures) -> Self {
        Self { features }
    }

    /// Materialize default load options.
    ///
    /// Metadata and ICC extraction default to on exactly when the codec
    /// supports them.
    pub fn to_options(&self) -> LoadOptions {
        LoadOptions {
            meta_data: self.features.meta_data(),
            iccp: self.features.iccp(),
            tuning: Tuning::new(),
        }
    }
}

/// What a codec can do when saving.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub struct SaveFeatures {
    /// Pixel formats the codec accepts for writing. Never empty on a
    /// codec that reports save support.
    pub pixel_formats: &'static [PixelFormat],
    /// Compression kinds the codec can produce. Never empty on a codec
    /// that reports save support.
    pub compressions: &'static [Compression],
    /// Compression used when the caller does not choose one. Always a
    /// member of [`compressions`](Self::compressions).
    pub default_compression: Compression,
    /// Continuous level range, when the default compression is tunable.
    pub compression_level: Option<CompressionLevel>,
    /// Capability flags for save operations.
    pub features: CodecFeatures,
}

impl SaveFeatures {
    /// Materialize default save options.
    pub fn to_options(&self) -> SaveOptions {
        SaveOptions {
            compression: self.default_compression,
            compression_level: self.compression_level.map(|l| l.default_level),
            meta_data: self.features.meta_data(),
            interlaced: false,
            iccp: self.features.iccp(),
            tuning: Tuning::new(),
        }
    }

    /// Whether the given pixel format is accepted for writing.
    pub fn supports_pixel_format(&self, format: PixelFormat) -> bool {
        self.pixel_formats.contains(&format)
    }

    /// Structural sanity of the declaration. Checked once at registry
    /// construction, not per call.
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.pixel_formats.is_empty()
            && !self.compressions.is_empty()
            && self.compressions.contains(&self.default_compression)
            && self.compression_level.is_none_or(|l| l.is_valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_default_all_false() {
        let features = CodecFeatures::new();
        assert!(!features.static_image());
        assert!(!features.animated());
        assert!(!features.multi_paged());
        assert!(!features.meta_data());
        assert!(!features.interlaced());
        assert!(!features.iccp());
        assert!(!features.multi_frame());
    }

    #[test]
    fn static_construction() {
        static FEATURES: CodecFeatures = CodecFeatures::new()
            .with_static_image(true)
            .with_animated(true)
            .with_iccp(true);
        assert!(FEATURES.static_image());
        assert!(FEATURES.animated());
        assert!(FEATURES.multi_frame());
        assert!(!FEATURES.meta_data());
    }

    #[test]
    fn load_options_follow_features() {
        let with_meta = LoadFeatures::new(
            CodecFeatures::new()
                .with_static_image(true)
                .with_meta_data(true),
        );
        let options = with_meta.to_options();
        assert!(options.meta_data);
        assert!(!options.iccp);
        assert!(options.tuning.is_empty());

        let bare = LoadFeatures::new(CodecFeatures::new().with_static_image(true));
        assert!(!bare.to_options().meta_data);
    }

    #[test]
    fn save_options_echo_defaults() {
        let features = SaveFeatures {
            pixel_formats: &[PixelFormat::Rgb8],
            compressions: &[Compression::Deflate],
            default_compression: Compression::Deflate,
            compression_level: Some(CompressionLevel::new(1.0, 9.0, 6.0, 1.0)),
            features: CodecFeatures::new().with_static_image(true),
        };
        assert!(features.is_well_formed());
        let options = features.to_options();
        assert_eq!(options.compression, Compression::Deflate);
        assert!((options.compression_level.unwrap() - 6.0).abs() < 1e-3);
    }

    #[test]
    fn malformed_save_features_detected() {
        let bad_default = SaveFeatures {
            pixel_formats: &[PixelFormat::Rgb8],
            compressions: &[Compression::Deflate],
            default_compression: Compression::Jpeg,
            compression_level: None,
            features: CodecFeatures::new(),
        };
        assert!(!bad_default.is_well_formed());

        let empty_formats = SaveFeatures {
            pixel_formats: &[],
            compressions: &[Compression::None],
            default_compression: Compression::None,
            compression_level: None,
            features: CodecFeatures::new(),
        };
        assert!(!empty_formats.is_well_formed());
    }
}

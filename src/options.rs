//! Per-session load and save options.

use crate::compression::Compression;
use crate::variant::Tuning;

/// Options applied to a load session.
///
/// Usually derived from a codec's declared features via
/// [`LoadFeatures::to_options`](crate::LoadFeatures::to_options), then
/// adjusted. Copies are fully independent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadOptions {
    /// Extract metadata (comments, EXIF) into the decoded buffers.
    pub meta_data: bool,
    /// Extract embedded ICC profiles into the decoded buffers.
    pub iccp: bool,
    /// Codec-specific tuning knobs.
    pub tuning: Tuning,
}

/// Options applied to a save session.
///
/// Usually derived via
/// [`SaveFeatures::to_options`](crate::SaveFeatures::to_options), then
/// adjusted. Copies are fully independent.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveOptions {
    /// Compression kind to produce. Must be one the codec declares.
    pub compression: Compression,
    /// Compression level within the codec's declared range, when the
    /// compression is tunable. Out-of-range values fall back to the
    /// codec default.
    pub compression_level: Option<f64>,
    /// Write metadata entries carried by the buffers.
    pub meta_data: bool,
    /// Write interlaced output, for codecs that support it.
    pub interlaced: bool,
    /// Write ICC profiles carried by the buffers.
    pub iccp: bool,
    /// Codec-specific tuning knobs.
    pub tuning: Tuning,
}

impl SaveOptions {
    /// Set the compression level, chainable.
    pub fn with_compression_level(mut self, level: f64) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Set the compression kind, chainable.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    #[test]
    fn copies_are_independent() {
        let mut a = LoadOptions::default();
        a.tuning.insert("gif-scale".into(), Variant::Int(2));
        let mut b = a.clone();
        b.meta_data = true;
        b.tuning.insert("gif-scale".into(), Variant::Int(4));

        assert!(!a.meta_data);
        assert_eq!(a.tuning["gif-scale"].as_int(), Some(2));
        assert_eq!(b.tuning["gif-scale"].as_int(), Some(4));
    }

    #[test]
    fn save_options_builders() {
        let options = SaveOptions {
            compression: Compression::Deflate,
            compression_level: None,
            meta_data: false,
            interlaced: false,
            iccp: false,
            tuning: Tuning::new(),
        }
        .with_compression(Compression::None)
        .with_compression_level(3.0);

        assert_eq!(options.compression, Compression::None);
        assert_eq!(options.compression_level, Some(3.0));
    }
}

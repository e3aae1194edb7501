//! Immutable per-codec metadata.

use crate::codecs::CodecId;
use crate::features::{LoadFeatures, SaveFeatures};

/// Immutable metadata describing one codec.
///
/// Descriptors are static data owned by the [`CodecRegistry`](crate::CodecRegistry);
/// callers hold `&'static` references and never construct or destroy them.
#[derive(Debug)]
#[non_exhaustive]
pub struct CodecDescriptor {
    /// Dispatch tag for the compiled-in implementation.
    pub(crate) id: CodecId,
    /// Short unique codec name in upper case, e.g. `"PNG"`.
    pub name: &'static str,
    /// Codec version, e.g. `"1.6.0"`.
    pub version: &'static str,
    /// Human-readable description, e.g. `"Portable Network Graphics"`.
    pub description: &'static str,
    /// Supported file extensions, lower case, without dots.
    pub extensions: &'static [&'static str],
    /// Supported MIME types.
    pub mime_types: &'static [&'static str],
    /// Magic byte prefixes, in match-priority order.
    pub magic: &'static [&'static [u8]],
    /// Load capabilities; `None` when the codec cannot load.
    pub load_features: Option<LoadFeatures>,
    /// Save capabilities; `None` when the codec cannot save.
    pub save_features: Option<SaveFeatures>,
}

impl CodecDescriptor {
    /// Whether this codec can load images.
    pub const fn can_load(&self) -> bool {
        self.load_features.is_some()
    }

    /// Whether this codec can save images.
    pub const fn can_save(&self) -> bool {
        self.save_features.is_some()
    }

    /// Whether the descriptor claims the given extension (case-insensitive,
    /// leading dot ignored).
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        !ext.is_empty()
            && self
                .extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Whether the descriptor claims the given MIME type (case-insensitive).
    pub fn matches_mime_type(&self, mime: &str) -> bool {
        !mime.is_empty()
            && self
                .mime_types
                .iter()
                .any(|m| m.eq_ignore_ascii_case(mime))
    }

    /// Whether any magic pattern matches the start of `prefix`.
    pub fn matches_magic(&self, prefix: &[u8]) -> bool {
        self.magic
            .iter()
            .any(|pattern| prefix.len() >= pattern.len() && &prefix[..pattern.len()] == *pattern)
    }
}

impl core::fmt::Display for CodecDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::Compression;
    use crate::features::CodecFeatures;
    use crate::format::PixelFormat;

    fn descriptor() -> CodecDescriptor {
        CodecDescriptor {
            id: CodecId::Pnm,
            name: "TEST",
            version: "0.0.1",
            description: "Test codec",
            extensions: &["tst", "test"],
            mime_types: &["image/x-test"],
            magic: &[b"TST1", b"TST2"],
            load_features: Some(LoadFeatures::new(
                CodecFeatures::new().with_static_image(true),
            )),
            save_features: Some(SaveFeatures {
                pixel_formats: &[PixelFormat::Rgb8],
                compressions: &[Compression::None],
                default_compression: Compression::None,
                compression_level: None,
                features: CodecFeatures::new().with_static_image(true),
            }),
        }
    }

    #[test]
    fn extension_matching() {
        let d = descriptor();
        assert!(d.matches_extension("tst"));
        assert!(d.matches_extension("TEST"));
        assert!(d.matches_extension(".tst"));
        assert!(!d.matches_extension(""));
        assert!(!d.matches_extension("png"));
    }

    #[test]
    fn mime_matching() {
        let d = descriptor();
        assert!(d.matches_mime_type("IMAGE/X-TEST"));
        assert!(!d.matches_mime_type(""));
        assert!(!d.matches_mime_type("image/png"));
    }

    #[test]
    fn magic_matching() {
        let d = descriptor();
        assert!(d.matches_magic(b"TST1rest-of-file"));
        assert!(d.matches_magic(b"TST2"));
        assert!(!d.matches_magic(b"TST"));
        assert!(!d.matches_magic(b"PNG"));
    }
}

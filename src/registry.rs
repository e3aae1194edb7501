//! Process-wide codec registry and lookups.

use std::path::Path;
use std::sync::OnceLock;

use crate::codecs;
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};

/// Registry of all compiled-in codecs.
///
/// Compile-time features determine which codecs are present. The registry is
/// immutable once constructed and safe for unbounded concurrent reads; the
/// usual entry point is the shared [`global()`](CodecRegistry::global)
/// instance, but registries can also be constructed and passed explicitly.
#[derive(Debug)]
pub struct CodecRegistry {
    codecs: Vec<&'static CodecDescriptor>,
}

impl CodecRegistry {
    /// Build a registry holding every compiled-in codec.
    ///
    /// Descriptor order is fixed: popular formats first. Structural
    /// invariants of each descriptor (non-empty save formats, default
    /// compression membership, sane level ranges) are validated here,
    /// not on every lookup.
    pub fn new() -> Self {
        let codecs = codecs::compiled_in();
        for descriptor in &codecs {
            validate(descriptor);
        }
        log::debug!("codec registry initialized with {} codecs", codecs.len());
        Self { codecs }
    }

    /// Shared process-wide instance, built on first use.
    pub fn global() -> &'static CodecRegistry {
        static GLOBAL: OnceLock<CodecRegistry> = OnceLock::new();
        GLOBAL.get_or_init(CodecRegistry::new)
    }

    /// All codecs, in stable registration order.
    pub fn codecs(&self) -> &[&'static CodecDescriptor] {
        &self.codecs
    }

    /// Find a codec by file extension (case-insensitive, leading dot
    /// ignored). Fails with [`CodecError::NoCodec`] when nothing matches,
    /// including for the empty string.
    pub fn from_extension(&self, ext: &str) -> Result<&'static CodecDescriptor> {
        self.codecs
            .iter()
            .copied()
            .find(|c| c.matches_extension(ext))
            .ok_or_else(|| CodecError::NoCodec(format!("extension {ext:?}")))
    }

    /// Find a codec by MIME type (case-insensitive).
    pub fn from_mime_type(&self, mime: &str) -> Result<&'static CodecDescriptor> {
        self.codecs
            .iter()
            .copied()
            .find(|c| c.matches_mime_type(mime))
            .ok_or_else(|| CodecError::NoCodec(format!("mime type {mime:?}")))
    }

    /// Find a codec by name (case-insensitive exact match).
    pub fn from_name(&self, name: &str) -> Result<&'static CodecDescriptor> {
        self.codecs
            .iter()
            .copied()
            .find(|c| !name.is_empty() && c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CodecError::NoCodec(format!("name {name:?}")))
    }

    /// Find a codec by the extension of `path`. The file does not need
    /// to exist.
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<&'static CodecDescriptor> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| CodecError::NoCodec(format!("path {}", path.display())))?;
        self.from_extension(ext)
    }

    /// Find a codec whose magic pattern matches the given byte prefix.
    /// The earliest-registered match wins.
    pub fn from_magic(&self, prefix: &[u8]) -> Result<&'static CodecDescriptor> {
        self.codecs
            .iter()
            .copied()
            .find(|c| c.matches_magic(prefix))
            .ok_or(CodecError::UnrecognizedFormat)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry build-time invariants. A failure here is a defect in a codec
/// declaration, never in caller input.
fn validate(descriptor: &CodecDescriptor) {
    assert!(
        !descriptor.name.is_empty() && !descriptor.extensions.is_empty(),
        "codec {} must declare a name and at least one extension",
        descriptor.name
    );
    assert!(
        descriptor.can_load() || descriptor.can_save(),
        "codec {} must support loading or saving",
        descriptor.name
    );
    if let Some(save) = &descriptor.save_features {
        assert!(
            save.is_well_formed(),
            "codec {} declares malformed save features",
            descriptor.name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_not_empty() {
        assert!(!CodecRegistry::global().codecs().is_empty());
    }

    #[test]
    fn names_are_unique() {
        let registry = CodecRegistry::global();
        for (i, a) in registry.codecs().iter().enumerate() {
            for b in &registry.codecs()[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(b.name));
            }
        }
    }

    #[test]
    fn every_extension_resolves_to_its_codec() {
        let registry = CodecRegistry::global();
        for codec in registry.codecs() {
            for ext in codec.extensions {
                let found = registry.from_extension(ext).expect("extension resolves");
                assert!(found.name.eq_ignore_ascii_case(codec.name));
                let found = registry
                    .from_extension(&ext.to_uppercase())
                    .expect("case-insensitive");
                assert!(found.name.eq_ignore_ascii_case(codec.name));
            }
        }
    }

    #[test]
    fn every_mime_type_resolves() {
        let registry = CodecRegistry::global();
        for codec in registry.codecs() {
            for mime in codec.mime_types {
                let found = registry.from_mime_type(mime).expect("mime resolves");
                assert!(found.name.eq_ignore_ascii_case(codec.name));
            }
        }
    }

    #[test]
    fn lookup_by_name_is_case_insensitive() {
        let registry = CodecRegistry::global();
        for codec in registry.codecs() {
            let found = registry
                .from_name(&codec.name.to_lowercase())
                .expect("name resolves");
            assert_eq!(found.name, codec.name);
        }
    }

    #[test]
    fn empty_lookups_fail_with_no_codec() {
        let registry = CodecRegistry::global();
        assert!(matches!(
            registry.from_extension(""),
            Err(CodecError::NoCodec(_))
        ));
        assert!(matches!(
            registry.from_mime_type(""),
            Err(CodecError::NoCodec(_))
        ));
        assert!(matches!(registry.from_name(""), Err(CodecError::NoCodec(_))));
    }

    #[test]
    fn unknown_lookups_fail() {
        let registry = CodecRegistry::global();
        assert!(registry.from_extension("xyzzy").is_err());
        assert!(registry.from_mime_type("image/xyzzy").is_err());
        assert!(registry.from_name("xyzzy").is_err());
    }

    #[test]
    fn from_path_ignores_file_existence() {
        let registry = CodecRegistry::global();
        #[cfg(feature = "png")]
        {
            let codec = registry
                .from_path("/definitely/not/there/image.png")
                .expect("resolves by extension alone");
            assert_eq!(codec.name, "PNG");
        }
        assert!(registry.from_path("/tmp/noextension").is_err());
        assert!(registry.from_path("/tmp/image.xyzzy").is_err());
    }

    #[test]
    fn magic_sniff_is_deterministic() {
        let registry = CodecRegistry::global();
        assert!(matches!(
            registry.from_magic(b"not an image"),
            Err(CodecError::UnrecognizedFormat)
        ));
        #[cfg(feature = "png")]
        {
            let codec = registry
                .from_magic(b"\x89PNG\r\n\x1a\n\x00\x00")
                .expect("png magic");
            assert_eq!(codec.name, "PNG");
        }
    }

    #[test]
    fn save_feature_invariants_hold() {
        for codec in CodecRegistry::global().codecs() {
            if let Some(save) = &codec.save_features {
                assert!(save.compressions.contains(&save.default_compression));
                let options = save.to_options();
                assert_eq!(options.compression, save.default_compression);
                if let Some(level) = &save.compression_level {
                    assert!(level.min < level.max);
                    assert!(level.default_level >= level.min);
                    assert!(level.default_level <= level.max);
                    assert!(level.step > 0.0);
                    let echoed = options.compression_level.expect("default level present");
                    assert!((echoed - level.default_level).abs() < 1e-3);
                }
            }
        }
    }
}

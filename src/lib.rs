//! # zenframes
//!
//! Unified image codec registry with streaming multi-frame load/save
//! sessions.
//!
//! Each codec is feature-gated. Enable only what you need:
//!
//! ```toml
//! [dependencies]
//! zenframes = { version = "0.1", features = ["png", "jpeg", "gif"] }
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use zenframes::{CodecRegistry, PixelBuffer, PixelFormat, StreamReader, StreamWriter};
//!
//! // Look up a codec and derive default options
//! let codec = CodecRegistry::global().from_extension("png")?;
//! let options = codec.save_features.as_ref().unwrap().to_options();
//!
//! // Stream frames out of a file
//! let mut reader = StreamReader::open("animation.gif")?;
//! let frames = reader.read_all()?;
//!
//! // Write a frame, converting to something the codec accepts
//! let mut frame = frames.into_iter().next().unwrap();
//! frame.convert_for_save(codec.save_features.as_ref().unwrap())?;
//! let mut writer = StreamWriter::create("first-frame.png")?.with_options(options);
//! writer.write(&frame)?;
//! writer.finish()?;
//! # Ok::<(), zenframes::CodecError>(())
//! ```
//!
//! Probing reads metadata without touching pixel data:
//!
//! ```no_run
//! use zenframes::StreamReader;
//!
//! let report = StreamReader::probe("large.png")?;
//! println!("{} {}×{}", report.codec.name, report.width.unwrap(), report.height.unwrap());
//! # Ok::<(), zenframes::CodecError>(())
//! ```
//!
//! The registry is immutable after initialization and safe to share across
//! threads. Sessions are `Send` but single-threaded: use one session per
//! thread, or serialize access externally.

#![forbid(unsafe_code)]

mod buffer;
mod codecs;
mod compression;
mod convert;
mod descriptor;
mod error;
mod features;
mod format;
mod meta;
mod options;
mod orientation;
mod probe;
mod reader;
mod registry;
mod variant;
mod writer;

pub use buffer::PixelBuffer;
pub use compression::{Compression, CompressionLevel};
pub use convert::{ConversionOptions, check_conversion};
pub use descriptor::CodecDescriptor;
pub use error::{CodecError, Result};
pub use features::{CodecFeatures, LoadFeatures, SaveFeatures};
pub use format::{PixelFamily, PixelFormat};
pub use meta::{
    ChromaSubsampling, IccProfile, MetaEntry, MetaKey, Palette, Resolution, ResolutionUnit,
    SourceImage,
};
pub use options::{LoadOptions, SaveOptions};
pub use orientation::{Mirror, Orientation};
pub use probe::{ProbeReport, probe_bytes, probe_path};
pub use reader::StreamReader;
pub use registry::CodecRegistry;
pub use variant::{Tuning, Variant};
pub use writer::StreamWriter;

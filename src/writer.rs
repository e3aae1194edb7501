//! Streaming save sessions.

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::codecs::{EncodeSession, SinkWrite};
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::options::SaveOptions;
use crate::registry::CodecRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriterState {
    /// Constructed, nothing written yet.
    Open,
    /// At least one frame written.
    Writing,
    /// Explicitly finished.
    Finished,
}

/// Streaming save session bound to one destination and one resolved codec.
///
/// Frames are appended with [`write()`](StreamWriter::write);
/// [`finish()`](StreamWriter::finish) flushes and closes the destination and
/// is idempotent. Writing to a single-frame codec twice is an explicit
/// [`CodecError::Unsupported`] rejection, never a silent overwrite.
///
/// An unwritable destination (missing parent, permission denied) fails at
/// construction, not at `finish()`. Buffers passed to `write()` are borrowed
/// read-only and never retained.
///
/// # Example
///
/// ```no_run
/// use zenframes::{PixelBuffer, PixelFormat, StreamWriter};
///
/// let frame = PixelBuffer::new(PixelFormat::Rgb8, 64, 64)?;
/// let mut writer = StreamWriter::create("out.png")?;
/// writer.write(&frame)?;
/// writer.finish()?;
/// # Ok::<(), zenframes::CodecError>(())
/// ```
pub struct StreamWriter {
    codec: &'static CodecDescriptor,
    options: SaveOptions,
    state: WriterState,
    sink: Option<SinkWrite>,
    session: Option<EncodeSession>,
    frames_written: usize,
    finished_bytes: Option<Vec<u8>>,
}

impl StreamWriter {
    /// Create a save session writing to a file. The codec is resolved from
    /// the path extension; the file is created (and truncated) eagerly.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with(path, CodecRegistry::global())
    }

    /// [`create()`](StreamWriter::create) against an explicit registry.
    pub fn create_with(path: impl AsRef<Path>, registry: &CodecRegistry) -> Result<Self> {
        let path = path.as_ref();
        let codec = registry.from_path(path)?;
        let file = File::create(path).map_err(|e| CodecError::io("creating destination", e))?;
        Self::bind(codec, SinkWrite::File(BufWriter::new(file)))
    }

    /// Create a save session writing into an in-memory buffer. The encoded
    /// bytes come back from [`into_bytes()`](StreamWriter::into_bytes).
    pub fn to_vec(codec: &'static CodecDescriptor) -> Result<Self> {
        Self::bind(codec, SinkWrite::Memory(Cursor::new(Vec::new())))
    }

    fn bind(codec: &'static CodecDescriptor, sink: SinkWrite) -> Result<Self> {
        let save_features = codec
            .save_features
            .as_ref()
            .ok_or_else(|| CodecError::Unsupported(format!("{} cannot save", codec.name)))?;
        Ok(Self {
            codec,
            options: save_features.to_options(),
            state: WriterState::Open,
            sink: Some(sink),
            session: None,
            frames_written: 0,
            finished_bytes: None,
        })
    }

    /// The codec this session is bound to.
    pub fn codec(&self) -> &'static CodecDescriptor {
        self.codec
    }

    /// Replace the session options. Effective only before the first
    /// [`write()`](StreamWriter::write); afterwards the call is ignored
    /// with a warning.
    pub fn with_options(mut self, options: SaveOptions) -> Self {
        if self.state == WriterState::Open {
            self.options = options;
        } else {
            log::warn!("with_options called after writing began; ignored");
        }
        self
    }

    /// Override the codec resolved from the destination path, resetting
    /// options to the new codec's defaults (so call this before
    /// [`with_options()`](Self::with_options)). Effective only before the
    /// first write; afterwards the call is ignored with a warning.
    pub fn with_codec(mut self, codec: &'static CodecDescriptor) -> Self {
        if self.state != WriterState::Open {
            log::warn!("with_codec called after writing began; ignored");
            return self;
        }
        match codec.save_features.as_ref() {
            Some(save_features) => {
                self.codec = codec;
                self.options = save_features.to_options();
            }
            None => log::warn!("with_codec: {} cannot save; ignored", codec.name),
        }
        self
    }

    /// Append one frame.
    ///
    /// The frame's pixel format must be one the codec declares for saving
    /// (see [`PixelBuffer::convert_for_save`] for the conversion escape
    /// hatch). A second frame on a codec without multi-frame support is
    /// rejected with a typed error.
    pub fn write(&mut self, frame: &PixelBuffer) -> Result<()> {
        if self.state == WriterState::Finished {
            return Err(CodecError::SessionFinished);
        }
        let save_features = self
            .codec
            .save_features
            .as_ref()
            .expect("checked at construction");

        if !save_features.supports_pixel_format(frame.pixel_format()) {
            return Err(CodecError::Unsupported(format!(
                "{} does not save {}; convert_for_save() first",
                self.codec.name,
                frame.pixel_format()
            )));
        }
        if !save_features.compressions.contains(&self.options.compression) {
            return Err(CodecError::Unsupported(format!(
                "{} cannot produce {} compression",
                self.codec.name, self.options.compression
            )));
        }
        if self.frames_written >= 1 && !save_features.features.multi_frame() {
            return Err(CodecError::Unsupported(format!(
                "{} writes a single frame per image",
                self.codec.name
            )));
        }

        if self.session.is_none() {
            let sink = self.sink.take().expect("sink present before first write");
            self.session = Some(EncodeSession::new(self.codec.id, sink)?);
        }
        self.session
            .as_mut()
            .expect("session just ensured")
            .write_frame(frame, &self.options)?;

        self.state = WriterState::Writing;
        self.frames_written += 1;
        Ok(())
    }

    /// Append frames in order; equivalent to repeated
    /// [`write()`](StreamWriter::write).
    pub fn write_all<'a>(&mut self, frames: impl IntoIterator<Item = &'a PixelBuffer>) -> Result<()> {
        for frame in frames {
            self.write(frame)?;
        }
        Ok(())
    }

    /// Number of frames accepted so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and close the destination.
    ///
    /// Idempotent: callable any number of times without error. Finishing
    /// with zero frames written closes an empty destination — the original
    /// container contract requires at least one frame for a valid file, so
    /// the result is only useful as a truncated placeholder.
    pub fn finish(&mut self) -> Result<()> {
        if self.state == WriterState::Finished {
            return Ok(());
        }
        if self.frames_written == 0 {
            log::warn!("{} session finished with no frames written", self.codec.name);
        }

        let bytes = match (self.session.take(), self.sink.take()) {
            (Some(session), _) => session.finish()?,
            (None, Some(sink)) => sink.into_bytes(),
            (None, None) => None,
        };
        self.finished_bytes = bytes;
        self.state = WriterState::Finished;
        Ok(())
    }

    /// Finish the session and return the encoded bytes.
    ///
    /// Only meaningful for sessions created with
    /// [`to_vec()`](StreamWriter::to_vec); file-backed sessions fail with
    /// [`CodecError::InvalidArgument`].
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.finish()?;
        self.finished_bytes
            .take()
            .ok_or_else(|| CodecError::InvalidArgument("writer is not backed by memory".into()))
    }
}

impl core::fmt::Debug for StreamWriter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("codec", &self.codec.name)
            .field("state", &self.state)
            .field("frames_written", &self.frames_written)
            .finish_non_exhaustive()
    }
}

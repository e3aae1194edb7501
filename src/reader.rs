//! Streaming load sessions.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::codecs::{DecodeSession, SourceRead};
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::options::LoadOptions;
use crate::probe::ProbeReport;
use crate::registry::CodecRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReaderState {
    /// Constructed, no frame consumed yet.
    Open,
    /// At least one frame consumed, more may follow.
    Reading,
    /// A read ran past the last frame; stays here until finished.
    Exhausted,
    /// Explicitly closed.
    Finished,
}

/// Streaming load session bound to one source and one resolved codec.
///
/// Frames are pulled one at a time with [`read()`](StreamReader::read) or by
/// iterating. The session is a one-pass state machine:
/// `Open → Reading → Exhausted`, with an explicit `Finished` reachable from
/// every state via [`finish()`](StreamReader::finish). Reading past the last
/// frame fails with [`CodecError::NoMoreFrames`], repeatably; reading after
/// `finish()` fails with [`CodecError::SessionFinished`].
///
/// The underlying file handle is released on `finish()` and on drop, on
/// every exit path.
///
/// # Example
///
/// ```no_run
/// use zenframes::StreamReader;
///
/// let mut reader = StreamReader::open("photo.jpg")?;
/// let frame = reader.read()?;
/// println!("{}×{} {}", frame.width(), frame.height(), frame.pixel_format());
/// reader.finish()?;
/// # Ok::<(), zenframes::CodecError>(())
/// ```
pub struct StreamReader {
    codec: &'static CodecDescriptor,
    options: LoadOptions,
    state: ReaderState,
    source: Option<SourceRead>,
    session: Option<DecodeSession>,
    iter_fused: bool,
}

impl StreamReader {
    /// Open an image file for reading.
    ///
    /// The codec is resolved from the path extension, falling back to a
    /// magic-byte sniff of the file content. A missing or unreadable path
    /// fails here, not at the first read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, CodecRegistry::global())
    }

    /// [`open()`](StreamReader::open) against an explicit registry.
    pub fn open_with(path: impl AsRef<Path>, registry: &CodecRegistry) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CodecError::io("opening source", e))?;
        let mut reader = BufReader::new(file);

        let codec = match registry.from_path(path) {
            Ok(codec) => codec,
            Err(_) => {
                let codec = sniff(&mut reader, registry)?;
                log::debug!(
                    "no codec for extension of {}, sniffed {}",
                    path.display(),
                    codec.name
                );
                codec
            }
        };

        Self::bind(codec, Box::new(reader))
    }

    /// Read an image from owned in-memory bytes. The codec is resolved by
    /// magic sniff.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with(data, CodecRegistry::global())
    }

    /// [`from_bytes()`](StreamReader::from_bytes) against an explicit registry.
    pub fn from_bytes_with(data: Vec<u8>, registry: &CodecRegistry) -> Result<Self> {
        let codec = registry.from_magic(&data)?;
        Self::bind(codec, Box::new(Cursor::new(data)))
    }

    /// Read an image from a borrowed byte slice (copied into the session).
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Self::from_bytes(data.to_vec())
    }

    fn bind(codec: &'static CodecDescriptor, source: SourceRead) -> Result<Self> {
        let load_features = codec
            .load_features
            .as_ref()
            .ok_or_else(|| CodecError::Unsupported(format!("{} cannot load", codec.name)))?;
        Ok(Self {
            codec,
            options: load_features.to_options(),
            state: ReaderState::Open,
            source: Some(source),
            session: None,
            iter_fused: false,
        })
    }

    /// The codec this session is bound to.
    pub fn codec(&self) -> &'static CodecDescriptor {
        self.codec
    }

    /// Replace the session options. Effective only before the first
    /// [`read()`](StreamReader::read); afterwards the call is ignored with
    /// a warning.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        if self.state == ReaderState::Open {
            self.options = options;
        } else {
            log::warn!("with_options called after reading began; ignored");
        }
        self
    }

    /// Override the resolved codec, resetting options to the new codec's
    /// defaults (so call this before [`with_options()`](Self::with_options)).
    /// Effective only before the first read; afterwards the call is ignored
    /// with a warning.
    pub fn with_codec(mut self, codec: &'static CodecDescriptor) -> Self {
        if self.state != ReaderState::Open {
            log::warn!("with_codec called after reading began; ignored");
            return self;
        }
        match codec.load_features.as_ref() {
            Some(load_features) => {
                self.codec = codec;
                self.options = load_features.to_options();
            }
            None => log::warn!("with_codec: {} cannot load; ignored", codec.name),
        }
        self
    }

    /// Decode the next frame.
    ///
    /// Past the last frame this fails with [`CodecError::NoMoreFrames`] and
    /// keeps failing the same way on every subsequent call, until
    /// [`finish()`](StreamReader::finish) switches the failure to
    /// [`CodecError::SessionFinished`].
    pub fn read(&mut self) -> Result<PixelBuffer> {
        match self.state {
            ReaderState::Finished => return Err(CodecError::SessionFinished),
            ReaderState::Exhausted => return Err(CodecError::NoMoreFrames),
            ReaderState::Open => {
                let source = self.source.take().expect("source present in Open state");
                let session = match DecodeSession::open(self.codec.id, source, &self.options) {
                    Ok(session) => session,
                    Err(e) => {
                        // The source is consumed; the session cannot recover.
                        self.state = ReaderState::Finished;
                        return Err(e);
                    }
                };
                self.session = Some(session);
                self.state = ReaderState::Reading;
            }
            ReaderState::Reading => {}
        }

        let session = self.session.as_mut().expect("session present in Reading");
        match session.next_frame()? {
            Some(frame) => Ok(frame),
            None => {
                self.state = ReaderState::Exhausted;
                Err(CodecError::NoMoreFrames)
            }
        }
    }

    /// Drain every remaining frame, in order.
    ///
    /// Running out of frames ends the drain cleanly; every other failure
    /// propagates.
    pub fn read_all(&mut self) -> Result<Vec<PixelBuffer>> {
        let mut frames = Vec::new();
        loop {
            match self.read() {
                Ok(frame) => frames.push(frame),
                Err(CodecError::NoMoreFrames) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(frames)
    }

    /// Close the session and release the source.
    ///
    /// Idempotent: callable any number of times, from any state, without
    /// error — including before any read.
    pub fn finish(&mut self) -> Result<()> {
        self.session = None;
        self.source = None;
        self.state = ReaderState::Finished;
        Ok(())
    }

    /// Probe an image file for metadata without decoding pixels.
    ///
    /// No session object is required; see [`ProbeReport`] for what is
    /// extracted.
    pub fn probe(path: impl AsRef<Path>) -> Result<ProbeReport> {
        crate::probe::probe_path(path)
    }

    /// Probe in-memory image data without decoding pixels.
    pub fn probe_bytes(data: &[u8]) -> Result<ProbeReport> {
        crate::probe::probe_bytes(data)
    }
}

/// One-pass frame iteration. Ends at [`CodecError::NoMoreFrames`]; a decode
/// failure is yielded once and then iteration stops.
impl Iterator for StreamReader {
    type Item = Result<PixelBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.iter_fused {
            return None;
        }
        match self.read() {
            Ok(frame) => Some(Ok(frame)),
            Err(CodecError::NoMoreFrames) | Err(CodecError::SessionFinished) => None,
            Err(e) => {
                self.iter_fused = true;
                Some(Err(e))
            }
        }
    }
}

impl core::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamReader")
            .field("codec", &self.codec.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Magic-sniff a seekable source, rewinding afterwards.
fn sniff<R: Read + Seek>(
    reader: &mut R,
    registry: &CodecRegistry,
) -> Result<&'static CodecDescriptor> {
    let mut prefix = [0u8; 32];
    let mut filled = 0;
    while filled < prefix.len() {
        match reader
            .read(&mut prefix[filled..])
            .map_err(|e| CodecError::io("reading source", e))?
        {
            0 => break,
            n => filled += n,
        }
    }
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| CodecError::io("reading source", e))?;
    registry.from_magic(&prefix[..filled])
}

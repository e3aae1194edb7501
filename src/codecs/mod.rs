//! Format-specific codec adapters and session dispatch.
//!
//! Each adapter module declares a static [`CodecDescriptor`] and implements
//! a decode and/or encode session over its backend crate. Dispatch is a
//! closed enum — one tag per compiled-in codec.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Cursor, Seek, Write};

use crate::buffer::PixelBuffer;
use crate::descriptor::CodecDescriptor;
use crate::error::{CodecError, Result};
use crate::options::{LoadOptions, SaveOptions};

#[cfg(feature = "gif")]
pub(crate) mod gif;
#[cfg(feature = "jpeg")]
pub(crate) mod jpeg;
#[cfg(feature = "png")]
pub(crate) mod png;
#[cfg(feature = "pnm")]
pub(crate) mod pnm;

/// Dispatch tag identifying a compiled-in codec implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CodecId {
    Png,
    Jpeg,
    Gif,
    Pnm,
}

/// All compiled-in codec descriptors, popular formats first. The order is
/// stable and doubles as magic-sniff priority.
pub(crate) fn compiled_in() -> Vec<&'static CodecDescriptor> {
    let mut codecs: Vec<&'static CodecDescriptor> = Vec::new();
    #[cfg(feature = "png")]
    codecs.push(&png::DESCRIPTOR);
    #[cfg(feature = "jpeg")]
    codecs.push(&jpeg::DESCRIPTOR);
    #[cfg(feature = "gif")]
    codecs.push(&gif::DESCRIPTOR);
    #[cfg(feature = "pnm")]
    codecs.push(&pnm::DESCRIPTOR);
    codecs
}

// ---------------------------------------------------------------------------
// Session I/O plumbing
// ---------------------------------------------------------------------------

/// Seekable byte source a decode session reads from.
pub(crate) trait ReadSeek: BufRead + Seek {}
impl<T: BufRead + Seek> ReadSeek for T {}

/// Boxed source: a buffered file or an in-memory cursor.
pub(crate) type SourceRead = Box<dyn ReadSeek + Send>;

/// Destination an encode session writes into.
#[derive(Debug)]
pub(crate) enum SinkWrite {
    File(BufWriter<File>),
    Memory(Cursor<Vec<u8>>),
}

impl SinkWrite {
    /// The accumulated bytes for memory sinks, `None` for files.
    pub(crate) fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            SinkWrite::File(_) => None,
            SinkWrite::Memory(cursor) => Some(cursor.into_inner()),
        }
    }
}

impl Write for SinkWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SinkWrite::File(w) => w.write(buf),
            SinkWrite::Memory(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWrite::File(w) => w.flush(),
            SinkWrite::Memory(w) => w.flush(),
        }
    }
}

// ---------------------------------------------------------------------------
// Decode dispatch
// ---------------------------------------------------------------------------

/// A live decode session bound to one source.
pub(crate) enum DecodeSession {
    #[cfg(feature = "png")]
    Png(png::PngReader),
    #[cfg(feature = "jpeg")]
    Jpeg(jpeg::JpegReader),
    #[cfg(feature = "gif")]
    Gif(gif::GifReader),
    #[cfg(feature = "pnm")]
    Pnm(pnm::PnmReader),
}

impl DecodeSession {
    /// Open a session: parses the container header eagerly.
    pub(crate) fn open(id: CodecId, source: SourceRead, options: &LoadOptions) -> Result<Self> {
        match id {
            #[cfg(feature = "png")]
            CodecId::Png => Ok(DecodeSession::Png(png::PngReader::open(source, options)?)),
            #[cfg(feature = "jpeg")]
            CodecId::Jpeg => Ok(DecodeSession::Jpeg(jpeg::JpegReader::open(source, options)?)),
            #[cfg(feature = "gif")]
            CodecId::Gif => Ok(DecodeSession::Gif(gif::GifReader::open(source, options)?)),
            #[cfg(feature = "pnm")]
            CodecId::Pnm => Ok(DecodeSession::Pnm(pnm::PnmReader::open(source, options)?)),
            #[allow(unreachable_patterns)]
            _ => Err(CodecError::Unsupported(format!(
                "codec {id:?} is not compiled in"
            ))),
        }
    }

    /// Decode the next frame; `None` once the source is exhausted.
    pub(crate) fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        match self {
            #[cfg(feature = "png")]
            DecodeSession::Png(reader) => reader.next_frame(),
            #[cfg(feature = "jpeg")]
            DecodeSession::Jpeg(reader) => reader.next_frame(),
            #[cfg(feature = "gif")]
            DecodeSession::Gif(reader) => reader.next_frame(),
            #[cfg(feature = "pnm")]
            DecodeSession::Pnm(reader) => reader.next_frame(),
        }
    }
}

// ---------------------------------------------------------------------------
// Encode dispatch
// ---------------------------------------------------------------------------

enum EncodeBackend {
    #[cfg(feature = "png")]
    Png,
    #[cfg(feature = "jpeg")]
    Jpeg,
    /// The GIF encoder owns the sink while frames are streamed into it.
    #[cfg(feature = "gif")]
    Gif(Option<::gif::Encoder<SinkWrite>>),
    #[cfg(feature = "pnm")]
    Pnm,
}

/// A live encode session bound to one destination.
pub(crate) struct EncodeSession {
    backend: EncodeBackend,
    sink: Option<SinkWrite>,
}

impl EncodeSession {
    pub(crate) fn new(id: CodecId, sink: SinkWrite) -> Result<Self> {
        let backend = match id {
            #[cfg(feature = "png")]
            CodecId::Png => EncodeBackend::Png,
            #[cfg(feature = "jpeg")]
            CodecId::Jpeg => EncodeBackend::Jpeg,
            #[cfg(feature = "gif")]
            CodecId::Gif => EncodeBackend::Gif(None),
            #[cfg(feature = "pnm")]
            CodecId::Pnm => EncodeBackend::Pnm,
            #[allow(unreachable_patterns)]
            _ => {
                return Err(CodecError::Unsupported(format!(
                    "codec {id:?} is not compiled in"
                )));
            }
        };
        Ok(Self {
            backend,
            sink: Some(sink),
        })
    }

    /// Encode one frame. The caller has already validated the pixel format
    /// against the codec's save features and enforced the frame-count policy.
    pub(crate) fn write_frame(&mut self, frame: &PixelBuffer, options: &SaveOptions) -> Result<()> {
        match &mut self.backend {
            #[cfg(feature = "png")]
            EncodeBackend::Png => {
                let sink = self.sink.as_mut().expect("sink present until finish");
                png::encode_frame(sink, frame, options)
            }
            #[cfg(feature = "jpeg")]
            EncodeBackend::Jpeg => {
                let sink = self.sink.as_mut().expect("sink present until finish");
                jpeg::encode_frame(sink, frame, options)
            }
            #[cfg(feature = "gif")]
            EncodeBackend::Gif(encoder) => {
                if encoder.is_none() {
                    let sink = self.sink.take().expect("sink present until finish");
                    *encoder = Some(gif::start_encoder(sink, frame)?);
                }
                gif::encode_frame(encoder.as_mut().expect("just created"), frame, options)
            }
            #[cfg(feature = "pnm")]
            EncodeBackend::Pnm => {
                let sink = self.sink.as_mut().expect("sink present until finish");
                pnm::encode_frame(sink, frame, options)
            }
        }
    }

    /// Flush and close the destination, returning the accumulated bytes
    /// for memory sinks.
    pub(crate) fn finish(mut self) -> Result<Option<Vec<u8>>> {
        #[cfg(feature = "gif")]
        if let EncodeBackend::Gif(encoder) = &mut self.backend
            && let Some(encoder) = encoder.take()
        {
            // Writes the GIF trailer and hands the sink back.
            let sink = encoder
                .into_inner()
                .map_err(|e| CodecError::io("finalizing destination", e))?;
            self.sink = Some(sink);
        }

        let mut sink = self.sink.take().expect("sink present until finish");
        sink.flush()
            .map_err(|e| CodecError::io("flushing destination", e))?;
        Ok(sink.into_bytes())
    }
}

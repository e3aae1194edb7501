//! Unified error type for registry lookups, buffers, and sessions.

use std::io;

/// Unified error type for all zenframes operations.
///
/// Every failure surfaces as one of these variants — nothing is downgraded to
/// a default value. The single deliberate exception is
/// [`finish()`](crate::StreamReader::finish), which is defined as idempotent.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// No registered codec matches the given name, extension, or MIME type.
    #[error("no codec found for {0:?}")]
    NoCodec(String),

    /// Bytes do not match any registered magic pattern.
    #[error("unrecognized image format")]
    UnrecognizedFormat,

    /// Invalid construction or call arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested operation has no defined path for this codec or format.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Source or destination I/O failure. The underlying
    /// [`io::ErrorKind`] distinguishes not-found from permission-denied
    /// from other OS errors.
    #[error("i/o failure while {action}: {source}")]
    Io {
        /// What the session was doing when the error occurred.
        action: &'static str,
        source: io::Error,
    },

    /// Bytes were recognized but failed to parse as the declared format.
    #[error("corrupt {codec} data: {source}")]
    CorruptData {
        /// Name of the codec that rejected the data.
        codec: &'static str,
        source: Box<dyn core::error::Error + Send + Sync>,
    },

    /// A read session has no further frames.
    #[error("no more frames")]
    NoMoreFrames,

    /// The session was finished; no further operations are accepted.
    #[error("session already finished")]
    SessionFinished,
}

impl CodecError {
    /// Wrap a codec-specific parse/encode error.
    pub fn corrupt<E>(codec: &'static str, source: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        CodecError::CorruptData {
            codec,
            source: Box::new(source),
        }
    }

    /// Wrap an [`io::Error`] with the action that produced it.
    pub fn io(action: &'static str, source: io::Error) -> Self {
        CodecError::Io { action, source }
    }

    /// The [`io::ErrorKind`] for I/O failures, `None` otherwise.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            CodecError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kind_preserved() {
        let err = CodecError::io(
            "opening source",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert_eq!(CodecError::NoMoreFrames.io_kind(), None);
    }

    #[test]
    fn display_messages() {
        let err = CodecError::NoCodec("tiff".into());
        assert!(err.to_string().contains("tiff"));
        assert_eq!(CodecError::NoMoreFrames.to_string(), "no more frames");
    }
}

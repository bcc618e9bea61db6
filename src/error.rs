//! Error taxonomy for extraction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading or extracting an archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Input is not a ZIP container, or a local header failed validation.
    #[error("invalid zip archive: {0}")]
    Format(String),

    /// The source ran out of bytes before the entry's declared size.
    #[error("incomplete {kind} entry '{entry}': {missing} of {declared} bytes missing")]
    TruncatedEntry {
        entry: String,
        kind: &'static str,
        declared: u64,
        missing: u64,
    },

    /// Compressed bytes were rejected by the decompression backend.
    #[error("backend '{backend}' failed to decode '{entry}': {source}")]
    Decode {
        backend: String,
        entry: String,
        #[source]
        source: DecodeError,
    },

    /// Unknown backend or invalid filter pattern.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Async file I/O needs a tokio runtime and none is running.
    #[error("no async I/O runtime available; call from within a tokio runtime")]
    MissingRuntime,

    /// The incoming chunk stream yielded an error while spooling.
    #[error("archive stream failed: {0}")]
    Stream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Entry path would land outside the destination root.
    #[error("refusing to extract '{0}': path escapes the destination")]
    UnsafePath(String),

    /// Entry uses a compression method other than stored or deflate.
    #[error("unsupported compression method {method} for '{entry}'")]
    UnsupportedMethod { entry: String, method: u16 },

    #[error("I/O error at {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExtractError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        ExtractError::Format(msg.into())
    }

    pub(crate) fn at(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| ExtractError::Path { path, source }
    }

    /// Whether this error came from the decompression backend.
    pub fn is_decode(&self) -> bool {
        matches!(self, ExtractError::Decode { .. })
    }
}

/// Native decode failure reported by a deflate backend.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The input is not a valid stream for the selected framing.
    #[error("corrupt deflate stream: {0}")]
    Corrupt(String),

    /// The backend cannot decode this framing at all.
    #[error("framing {0} not supported by this backend")]
    UnsupportedVariant(&'static str),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

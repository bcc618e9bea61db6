//! # streamzip
//!
//! Bounded-memory ZIP extraction on tokio.
//!
//! Each entry's payload is streamed from the archive through the decoder to
//! its destination file in fixed-size chunks, so peak memory depends on the
//! chunk size and the concurrency limit, never on entry or archive size.
//!
//! ## Features
//!
//! - STORED and DEFLATE entries, including ZIP64 archives
//! - Automatic detection of raw, gzip-wrapped and zlib-wrapped deflate data
//! - Whitelist and regex selection of entries
//! - Concurrent extraction with a hard cap on simultaneously open entries
//! - Extraction from a byte stream (e.g. an HTTP body) through a spool
//! - Pluggable decompression backends
//!
//! ## Example
//!
//! ```no_run
//! use streamzip::{EntryFilter, ExtractOptions, ExtractionContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = ExtractionContext::new();
//!     let options = ExtractOptions::new()
//!         .destination("out")
//!         .filter(EntryFilter::new().regex(r"\.csv$")?)
//!         .concurrency(8);
//!
//!     ctx.extract("archive.zip", &options).await?;
//!     println!("decoded with {:?}", ctx.last_backend());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod context;
pub mod error;
pub mod extract;
pub mod inflate;
pub mod io;
pub mod observer;
pub mod zip;

use std::error::Error as StdError;
use std::path::Path;

use futures_util::Stream;

pub use cli::Cli;
pub use context::ExtractionContext;
pub use error::{DecodeError, ExtractError, Result};
pub use extract::{EntryFilter, ExtractOptions};
pub use inflate::{BackendRegistry, DEFAULT_BACKEND, DeflateBackend, WindowVariant};
pub use io::{ArchiveSource, LocalArchive, MemoryArchive, Spool};
pub use observer::{ExtractionObserver, NoopObserver};
pub use zip::{ZipEntry, ZipParser};

/// Extract `archive` with a fresh [`ExtractionContext`].
pub async fn extract(archive: impl AsRef<Path>, options: &ExtractOptions) -> Result<()> {
    ExtractionContext::new().extract(archive, options).await
}

/// Extract a streamed archive with a fresh [`ExtractionContext`].
pub async fn extract_stream<S, B, E>(
    stream: S,
    options: &ExtractOptions,
    spool: &Spool,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    ExtractionContext::new()
        .extract_stream(stream, options, spool)
        .await
}

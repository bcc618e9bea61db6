mod local;
mod memory;
pub mod spool;

pub use local::LocalArchive;
pub use memory::MemoryArchive;
pub use spool::Spool;

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek};

/// A sequential, seekable view of an archive owned by a single entry task.
pub trait SourceCursor: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> SourceCursor for T {}

/// Byte-level access to an archive.
///
/// The central directory reader uses [`read_at`](ArchiveSource::read_at) for
/// random access. Entry extraction calls [`open`](ArchiveSource::open) once per
/// entry so concurrent tasks never share a cursor position.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Stable identity of the archive content, used to key the window cache.
    fn identity(&self) -> String;

    /// Open an independent cursor positioned at the start of the archive.
    async fn open(&self) -> io::Result<Box<dyn SourceCursor>>;

    /// Fill `buf` completely, looping over short reads.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only
    /// when the source ends first.
    async fn read_full_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}

//! Spooling of an incoming chunk stream into something seekable.
//!
//! Entry extraction seeks to each local header, so a network stream is first
//! written out in full, either to a temporary file or to memory.

use std::error::Error as StdError;
use std::path::PathBuf;

use futures_util::{Stream, StreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::MemoryArchive;
use crate::error::{ExtractError, Result};

/// Where a streamed archive is kept while it is extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spool {
    /// A temporary `.zip` file, in `dir` or the system temp directory.
    TempFile { dir: Option<PathBuf> },
    /// An in-memory buffer.
    Memory,
}

impl Default for Spool {
    fn default() -> Self {
        Spool::TempFile { dir: None }
    }
}

impl Spool {
    pub fn temp_file_in(dir: impl Into<PathBuf>) -> Self {
        Spool::TempFile {
            dir: Some(dir.into()),
        }
    }
}

/// A fully received archive. A temporary file is deleted when this is dropped.
pub enum Spooled {
    File(NamedTempFile),
    Memory(MemoryArchive),
}

/// Drain `stream` into the chosen spool.
///
/// Empty chunks are skipped. If the stream yields an error the partial
/// spool file is removed before returning.
pub async fn spool<S, B, E>(stream: S, spool: &Spool) -> Result<Spooled>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    futures_util::pin_mut!(stream);

    match spool {
        Spool::Memory => {
            let mut buf = Vec::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| ExtractError::Stream(e.into()))?;
                buf.extend_from_slice(chunk.as_ref());
            }
            tracing::debug!(bytes = buf.len(), "spooled archive to memory");
            Ok(Spooled::Memory(MemoryArchive::new(buf)))
        }
        Spool::TempFile { dir } => {
            let dir = dir.clone().unwrap_or_else(std::env::temp_dir);
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(ExtractError::at(&dir))?;
            let temp = tempfile::Builder::new()
                .prefix("streamzip-")
                .suffix(".zip")
                .tempfile_in(&dir)
                .map_err(ExtractError::at(&dir))?;

            let mut file = tokio::fs::File::from_std(temp.reopen()?);
            let mut total = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| ExtractError::Stream(e.into()))?;
                let bytes = chunk.as_ref();
                if bytes.is_empty() {
                    continue;
                }
                file.write_all(bytes).await?;
                total += bytes.len() as u64;
            }
            file.flush().await?;
            tracing::debug!(
                bytes = total,
                path = %temp.path().display(),
                "spooled archive to disk"
            );
            Ok(Spooled::File(temp))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ArchiveSource;
    use futures_util::stream;
    use std::io;

    #[tokio::test]
    async fn memory_spool_concatenates_chunks() {
        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(b"ab".to_vec()),
            Ok(Vec::new()),
            Ok(b"cd".to_vec()),
        ]);
        match spool(chunks, &Spool::Memory).await.unwrap() {
            Spooled::Memory(archive) => assert_eq!(archive.size(), 4),
            Spooled::File(_) => panic!("expected memory spool"),
        }
    }

    #[tokio::test]
    async fn temp_file_holds_every_byte() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = stream::iter(vec![Ok::<_, io::Error>(&b"hello "[..]), Ok(&b"world"[..])]);
        let spooled = spool(chunks, &Spool::temp_file_in(dir.path())).await.unwrap();
        let Spooled::File(temp) = spooled else {
            panic!("expected file spool");
        };
        assert_eq!(std::fs::read(temp.path()).unwrap(), b"hello world");
        assert!(temp.path().starts_with(dir.path()));

        let path = temp.path().to_path_buf();
        drop(temp);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn stream_error_removes_partial_spool() {
        let dir = tempfile::tempdir().unwrap();
        let chunks = stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")),
        ]);
        let err = spool(chunks, &Spool::temp_file_in(dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ExtractError::Stream(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

use super::{ArchiveSource, SourceCursor};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Archive stored in the local filesystem.
///
/// Holds one handle for central-directory reads; every entry cursor opens
/// the file again.
pub struct LocalArchive {
    path: PathBuf,
    file: std::fs::File,
    size: u64,
    modified_nanos: u128,
}

impl LocalArchive {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let metadata = file.metadata()?;
        let modified_nanos = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path,
            file,
            size: metadata.len(),
            modified_nanos,
        })
    }
}

#[async_trait]
impl ArchiveSource for LocalArchive {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, offset)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            file.read(buf)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identity(&self) -> String {
        // A path reused for a different archive changes length or mtime.
        format!(
            "{}#{}@{}",
            self.path.display(),
            self.size,
            self.modified_nanos
        )
    }

    async fn open(&self) -> io::Result<Box<dyn SourceCursor>> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::new(file))
    }
}

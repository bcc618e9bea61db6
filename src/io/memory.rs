use super::{ArchiveSource, SourceCursor};
use async_trait::async_trait;
use std::io::{self, Cursor};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// Archive held entirely in memory, e.g. a spooled network stream.
///
/// Entry cursors share the buffer through an `Arc`; nothing is copied per entry.
#[derive(Clone)]
pub struct MemoryArchive {
    data: Arc<[u8]>,
    id: u64,
}

impl MemoryArchive {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            data: data.into(),
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl ArchiveSource for MemoryArchive {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identity(&self) -> String {
        format!("memory:{}#{}", self.id, self.data.len())
    }

    async fn open(&self) -> io::Result<Box<dyn SourceCursor>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.data))))
    }
}

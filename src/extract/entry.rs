//! Extraction of a single entry.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tracing::Instrument;

use super::copy::{DecodeSetup, copy_compressed, copy_stored, select_buffer_size};
use crate::error::{ExtractError, Result};
use crate::inflate::{CacheKey, DeflateBackend, WindowCache};
use crate::io::ArchiveSource;
use crate::observer::ExtractionObserver;
use crate::zip::{CompressionMethod, ZipEntry, skip_local_header};

/// Destination directories already known to exist during one run.
#[derive(Debug, Default)]
pub struct CreatedDirs {
    dirs: Mutex<HashSet<PathBuf>>,
}

impl CreatedDirs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.lock().contains(dir)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make sure `dir` exists, creating it only the first time it is seen.
    ///
    /// Two tasks racing on the same new directory may both call
    /// `create_dir_all`; that is idempotent, and the set still records the
    /// path once.
    pub async fn ensure(&self, dir: &Path, observer: &dyn ExtractionObserver) -> Result<()> {
        if dir.as_os_str().is_empty() || self.contains(dir) {
            return Ok(());
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(ExtractError::at(dir))?;
        if self.lock().insert(dir.to_path_buf()) {
            tracing::trace!(dir = %dir.display(), "created directory");
            observer.directory_created(dir);
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        self.dirs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// State shared by every entry task of one extraction call.
pub struct ExtractionRun {
    pub source: Arc<dyn ArchiveSource>,
    pub destination: PathBuf,
    pub buffer_size: Option<usize>,
    pub created_dirs: CreatedDirs,
    pub cache_key: CacheKey,
    pub backend: Arc<dyn DeflateBackend>,
    pub cache: Arc<WindowCache>,
    pub observer: Arc<dyn ExtractionObserver>,
}

/// Extract one entry below the run's destination. Returns bytes written.
pub async fn extract_entry(run: &ExtractionRun, entry: &ZipEntry) -> Result<u64> {
    let span = tracing::debug_span!("entry", name = %entry.name);
    run.observer.entry_started(entry);
    let result = write_entry(run, entry).instrument(span).await;
    run.observer.entry_finished(entry, result.is_ok());
    result
}

async fn write_entry(run: &ExtractionRun, entry: &ZipEntry) -> Result<u64> {
    let target = run.destination.join(relative_entry_path(&entry.name)?);

    if entry.is_directory {
        run.created_dirs.ensure(&target, run.observer.as_ref()).await?;
        return Ok(0);
    }

    if let CompressionMethod::Unknown(method) = entry.compression_method {
        return Err(ExtractError::UnsupportedMethod {
            entry: entry.name.clone(),
            method,
        });
    }

    if let Some(parent) = target.parent() {
        run.created_dirs.ensure(parent, run.observer.as_ref()).await?;
    }

    let mut src = run.source.open().await?;
    src.seek(SeekFrom::Start(entry.header_offset)).await?;
    let header = skip_local_header(&mut src, &entry.name).await?;
    run.observer.header_skipped(entry, &header);
    tracing::debug!(
        offset = entry.header_offset,
        payload_offset = entry.header_offset + header.total_len(),
        compressed = entry.compressed_size,
        "located entry payload"
    );

    let mut out = tokio::fs::File::create(&target)
        .await
        .map_err(ExtractError::at(&target))?;
    let chunk_size = select_buffer_size(entry.uncompressed_size, run.buffer_size);

    let written = if entry.compression_method == CompressionMethod::Stored {
        copy_stored(&mut src, &mut out, entry.compressed_size, chunk_size, &entry.name).await?
    } else {
        let setup = DecodeSetup {
            backend: run.backend.as_ref(),
            cache: &run.cache,
            cache_key: Some(&run.cache_key),
            observer: run.observer.as_ref(),
        };
        copy_compressed(
            &mut src,
            &mut out,
            entry.compressed_size,
            chunk_size,
            &entry.name,
            &setup,
        )
        .await?
    };
    out.flush().await?;

    tracing::debug!(written, "entry extracted");
    Ok(written)
}

/// Archive-relative entry name as a path that cannot leave the destination.
fn relative_entry_path(name: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath(name.to_string()));
            }
        }
    }
    Ok(relative)
}

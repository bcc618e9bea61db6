//! Fan-out of selected entries under a concurrency limit.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::entry::{CreatedDirs, ExtractionRun, extract_entry};
use super::options::ExtractOptions;
use crate::error::{ExtractError, Result};
use crate::inflate::{CacheKey, DeflateBackend, WindowCache};
use crate::io::ArchiveSource;
use crate::observer::ExtractionObserver;
use crate::zip::{ZipEntry, ZipParser};

/// Extract every entry of `source` selected by `options`.
///
/// The archive is validated and listed before anything touches the
/// destination, so a non-archive input leaves the filesystem untouched.
pub async fn run(
    source: Arc<dyn ArchiveSource>,
    options: &ExtractOptions,
    backend: Arc<dyn DeflateBackend>,
    cache: Arc<WindowCache>,
    observer: Arc<dyn ExtractionObserver>,
) -> Result<()> {
    let entries = ZipParser::new(Arc::clone(&source)).list_entries().await?;
    let total = entries.len();
    let selected: Vec<ZipEntry> = entries
        .into_iter()
        .filter(|entry| options.filter.matches(&entry.name))
        .collect();

    if selected.is_empty() {
        tracing::debug!(total, "no entries selected");
        return Ok(());
    }

    let concurrency = options.concurrency.max(1);
    let run = Arc::new(ExtractionRun {
        cache_key: CacheKey::new(backend.name(), source.identity()),
        source,
        destination: options.destination.clone().unwrap_or_else(PathBuf::new),
        buffer_size: options.buffer_size,
        created_dirs: CreatedDirs::new(),
        backend,
        cache,
        observer,
    });

    tracing::info!(
        archive = %run.cache_key.archive,
        selected = selected.len(),
        total,
        backend = %run.cache_key.backend,
        concurrency,
        "extracting archive"
    );

    if concurrency == 1 || selected.len() == 1 {
        for entry in &selected {
            extract_entry(&run, entry).await?;
        }
    } else {
        extract_concurrently(&run, selected, concurrency).await?;
    }

    tracing::debug!(
        directories = run.created_dirs.len(),
        "extraction finished"
    );
    Ok(())
}

/// Spawn one task per entry, admitting at most `limit` at a time.
///
/// A failing entry does not stop its siblings; the first failure in selection
/// order is returned once all tasks have finished. Dropping the returned
/// future drops the `JoinSet`, which aborts every task still queued or running.
async fn extract_concurrently(
    run: &Arc<ExtractionRun>,
    entries: Vec<ZipEntry>,
    limit: usize,
) -> Result<()> {
    let gate = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let run = Arc::clone(run);
        let gate = Arc::clone(&gate);
        tasks.spawn(async move {
            let outcome = match gate.acquire_owned().await {
                Ok(_permit) => extract_entry(&run, &entry).await.map(|_| ()),
                Err(_) => Err(io::Error::other("extraction gate closed").into()),
            };
            (index, outcome)
        });
    }

    let mut first_error: Option<(usize, ExtractError)> = None;
    while let Some(joined) = tasks.join_next().await {
        let (index, outcome) = match joined {
            Ok(tagged) => tagged,
            Err(join) if join.is_panic() => std::panic::resume_unwind(join.into_panic()),
            Err(join) => (usize::MAX, Err(ExtractError::Io(io::Error::other(join)))),
        };
        if let Err(err) = outcome {
            tracing::warn!(error = %err, "entry extraction failed");
            if first_error.as_ref().is_none_or(|(first, _)| index < *first) {
                first_error = Some((index, err));
            }
        }
    }

    match first_error {
        Some((_, err)) => Err(err),
        None => Ok(()),
    }
}

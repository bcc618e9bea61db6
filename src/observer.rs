//! Programmatic hooks into an extraction run.
//!
//! The same points also emit `tracing` events; an observer is for callers
//! that want to act on them in code (progress, instrumentation in tests).

use std::path::Path;

use crate::inflate::WindowVariant;
use crate::zip::{LocalHeader, ZipEntry};

/// Callbacks invoked from entry tasks. All methods default to no-ops.
///
/// Hooks may run concurrently from several tasks.
pub trait ExtractionObserver: Send + Sync {
    /// An entry task was admitted and is about to open its files.
    fn entry_started(&self, _entry: &ZipEntry) {}

    /// An entry task closed its files, successfully or not.
    fn entry_finished(&self, _entry: &ZipEntry, _succeeded: bool) {}

    /// A local header was validated and skipped.
    fn header_skipped(&self, _entry: &ZipEntry, _header: &LocalHeader) {}

    /// One window-detection attempt completed.
    fn window_probe(&self, _variant: WindowVariant, _accepted: bool) {}

    /// A destination directory was created (not merely found in the cache).
    fn directory_created(&self, _path: &Path) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ExtractionObserver for NoopObserver {}

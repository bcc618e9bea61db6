//! Long-lived extraction state.

use std::error::Error as StdError;
use std::path::Path;
use std::sync::{Arc, Mutex};

use futures_util::Stream;

use crate::error::{ExtractError, Result};
use crate::extract::{ExtractOptions, coordinator};
use crate::inflate::{BackendRegistry, DeflateBackend, WindowCache};
use crate::io::spool::{self, Spool, Spooled};
use crate::io::{ArchiveSource, LocalArchive};
use crate::observer::{ExtractionObserver, NoopObserver};

/// Owns the backend table, the window-bits cache and the observer.
///
/// One context can serve many extraction calls, including concurrent ones;
/// detection results are shared between calls on the same archive.
pub struct ExtractionContext {
    registry: BackendRegistry,
    cache: Arc<WindowCache>,
    last_backend: Mutex<Option<String>>,
    observer: Arc<dyn ExtractionObserver>,
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::with_registry(BackendRegistry::new())
    }

    pub fn with_registry(registry: BackendRegistry) -> Self {
        Self {
            registry,
            cache: Arc::new(WindowCache::new()),
            last_backend: Mutex::new(None),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observer that receives entry and detection events.
    pub fn with_observer(mut self, observer: Arc<dyn ExtractionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn register_backend(&mut self, backend: Arc<dyn DeflateBackend>) {
        self.registry.register(backend);
    }

    pub fn available_backends(&self) -> Vec<&str> {
        self.registry.available()
    }

    /// Identifier of the backend resolved by the most recent call.
    pub fn last_backend(&self) -> Option<String> {
        self.last_backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn window_cache(&self) -> &WindowCache {
        &self.cache
    }

    /// Extract the archive at `archive` according to `options`.
    pub async fn extract(&self, archive: impl AsRef<Path>, options: &ExtractOptions) -> Result<()> {
        let backend = self.prepare(options)?;
        let archive = archive.as_ref();
        let source = LocalArchive::open(archive).map_err(ExtractError::at(archive))?;
        self.run(Arc::new(source), options, backend).await
    }

    /// Extract from any [`ArchiveSource`].
    pub async fn extract_source(
        &self,
        source: Arc<dyn ArchiveSource>,
        options: &ExtractOptions,
    ) -> Result<()> {
        let backend = self.prepare(options)?;
        self.run(source, options, backend).await
    }

    /// Extract an archive that arrives as a stream of byte chunks.
    ///
    /// The stream is spooled first; a temporary spool file is removed whether
    /// extraction succeeds or not.
    pub async fn extract_stream<S, B, E>(
        &self,
        stream: S,
        options: &ExtractOptions,
        spool: &Spool,
    ) -> Result<()>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let backend = self.prepare(options)?;
        match spool::spool(stream, spool).await? {
            Spooled::File(temp) => {
                let source =
                    LocalArchive::open(temp.path()).map_err(ExtractError::at(temp.path()))?;
                // `temp` outlives the run and deletes the file when dropped.
                self.run(Arc::new(source), options, backend).await
            }
            Spooled::Memory(archive) => self.run(Arc::new(archive), options, backend).await,
        }
    }

    /// Checks that must pass before any I/O happens.
    fn prepare(&self, options: &ExtractOptions) -> Result<Arc<dyn DeflateBackend>> {
        tokio::runtime::Handle::try_current().map_err(|_| ExtractError::MissingRuntime)?;
        let backend = self.registry.resolve(options.backend.as_deref())?;
        *self
            .last_backend
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(backend.name().to_string());
        Ok(backend)
    }

    async fn run(
        &self,
        source: Arc<dyn ArchiveSource>,
        options: &ExtractOptions,
        backend: Arc<dyn DeflateBackend>,
    ) -> Result<()> {
        coordinator::run(
            source,
            options,
            backend,
            Arc::clone(&self.cache),
            Arc::clone(&self.observer),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_backend_fails_before_io() {
        let ctx = ExtractionContext::new();
        let options = ExtractOptions::new().backend("zlib-ng");
        let err = ctx
            .extract("/definitely/not/here.zip", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(_)));
        assert_eq!(ctx.last_backend(), None);
    }

    #[tokio::test]
    async fn blank_backend_records_default() {
        let ctx = ExtractionContext::new();
        let options = ExtractOptions::new().backend("");
        // The archive is missing, but resolution happens first.
        let _ = ctx.extract("/definitely/not/here.zip", &options).await;
        assert_eq!(ctx.last_backend().as_deref(), Some(crate::inflate::DEFAULT_BACKEND));
        assert!(ctx.available_backends().contains(&"flate2"));
    }

    #[tokio::test]
    async fn mixed_case_backend_is_recorded_lowercase() {
        #[derive(Debug)]
        struct Shouting;

        impl DeflateBackend for Shouting {
            fn name(&self) -> &str {
                "Shouting"
            }

            fn decoder(
                &self,
                variant: crate::inflate::WindowVariant,
            ) -> std::result::Result<Box<dyn crate::inflate::Decoder>, crate::error::DecodeError> {
                crate::inflate::Flate2Backend.decoder(variant)
            }
        }

        let mut ctx = ExtractionContext::new();
        ctx.register_backend(Arc::new(Shouting));
        let options = ExtractOptions::new().backend("SHOUTING");
        let _ = ctx.extract("/definitely/not/here.zip", &options).await;
        assert_eq!(ctx.last_backend().as_deref(), Some("shouting"));
        assert!(ctx.available_backends().contains(&"shouting"));
    }

    #[test]
    fn extraction_outside_a_runtime_is_refused() {
        let ctx = ExtractionContext::new();
        let options = ExtractOptions::new();
        let result = futures_util::FutureExt::now_or_never(ctx.extract("unused.zip", &options));
        assert!(matches!(result, Some(Err(ExtractError::MissingRuntime))));
    }
}

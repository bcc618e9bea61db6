//! Framing detection for deflate-family streams.
//!
//! Entries in one archive written by one tool use the same framing, so the
//! result of the first probe is cached per backend and archive.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use super::DeflateBackend;
use crate::error::{ExtractError, Result};
use crate::observer::ExtractionObserver;

/// Base-two log of the largest deflate window.
pub const MAX_WBITS: i32 = 15;

/// The header convention wrapped around a deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowVariant {
    /// Bare deflate, as ZIP stores it.
    Raw,
    /// RFC 1952 gzip member.
    Gzip,
    /// RFC 1950 zlib stream.
    Zlib,
}

impl WindowVariant {
    /// Order in which variants are probed.
    pub const PROBE_ORDER: [WindowVariant; 3] =
        [WindowVariant::Raw, WindowVariant::Gzip, WindowVariant::Zlib];

    /// zlib-style `windowBits` value selecting this framing.
    pub fn window_bits(self) -> i32 {
        match self {
            WindowVariant::Raw => -MAX_WBITS,
            WindowVariant::Gzip => MAX_WBITS | 16,
            WindowVariant::Zlib => MAX_WBITS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowVariant::Raw => "raw",
            WindowVariant::Gzip => "gzip",
            WindowVariant::Zlib => "zlib",
        }
    }
}

impl fmt::Display for WindowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.window_bits())
    }
}

/// Find the first framing whose decoder accepts `prefix`.
pub fn detect(
    prefix: &[u8],
    backend: &dyn DeflateBackend,
    observer: &dyn ExtractionObserver,
) -> Result<WindowVariant> {
    for variant in WindowVariant::PROBE_ORDER {
        let accepted = backend
            .decoder(variant)
            .and_then(|mut decoder| decoder.decompress(prefix))
            .is_ok();
        tracing::trace!(
            backend = backend.name(),
            variant = variant.as_str(),
            window_bits = variant.window_bits(),
            accepted,
            "probed window bits"
        );
        observer.window_probe(variant, accepted);
        if accepted {
            return Ok(variant);
        }
    }
    Err(ExtractError::format(format!(
        "unable to detect compression window size with backend '{}'",
        backend.name()
    )))
}

/// Key for [`WindowCache`]: one backend reading one archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub backend: String,
    pub archive: String,
}

impl CacheKey {
    pub fn new(backend: impl Into<String>, archive: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            archive: archive.into(),
        }
    }
}

/// Memoized detection results. Entries are never invalidated.
#[derive(Debug, Default)]
pub struct WindowCache {
    entries: Mutex<HashMap<CacheKey, WindowVariant>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<WindowVariant> {
        self.lock().get(key).copied()
    }

    /// Cached variant for `key`, or probe `prefix` and remember the result.
    ///
    /// Without a key detection always probes and nothing is stored.
    pub fn detect(
        &self,
        key: Option<&CacheKey>,
        prefix: &[u8],
        backend: &dyn DeflateBackend,
        observer: &dyn ExtractionObserver,
    ) -> Result<WindowVariant> {
        if let Some(variant) = key.and_then(|k| self.get(k)) {
            return Ok(variant);
        }

        let variant = detect(prefix, backend, observer)?;
        if let Some(key) = key {
            // Concurrent probes of the same archive agree, so last write wins.
            self.lock().insert(key.clone(), variant);
        }
        tracing::debug!(backend = backend.name(), variant = %variant, "detected deflate framing");
        Ok(variant)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, WindowVariant>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

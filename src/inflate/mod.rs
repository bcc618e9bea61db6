//! Interchangeable deflate decoders and the registry that selects them.
//!
//! A backend turns a [`WindowVariant`] into a fresh [`Decoder`]. Every backend
//! reports malformed input through [`DecodeError`], so window detection and the
//! stream copier handle failures the same way whichever implementation runs.

mod flate;
#[cfg(feature = "miniz")]
mod miniz;
pub mod window;

pub use flate::Flate2Backend;
#[cfg(feature = "miniz")]
pub use miniz::MinizBackend;
pub use window::{CacheKey, WindowCache, WindowVariant};

use std::fmt;
use std::sync::Arc;

use crate::error::{DecodeError, ExtractError, Result};

type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Identifier of the backend that is always available.
pub const DEFAULT_BACKEND: &str = "flate2";

/// One decompression session. Lives for exactly one entry.
pub trait Decoder: Send {
    /// Feed compressed bytes and return whatever output is ready.
    ///
    /// Output may lag behind input; the remainder is returned by
    /// [`finish`](Decoder::finish).
    fn decompress(&mut self, input: &[u8]) -> DecodeResult<Vec<u8>>;

    /// Flush buffered state and return the trailing output.
    fn finish(self: Box<Self>) -> DecodeResult<Vec<u8>>;
}

/// Factory for decoders of one deflate implementation.
pub trait DeflateBackend: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Build a decoder expecting the given framing.
    ///
    /// Backends that cannot decode a framing return
    /// [`DecodeError::UnsupportedVariant`], which detection treats as a
    /// failed probe.
    fn decoder(&self, variant: WindowVariant) -> DecodeResult<Box<dyn Decoder>>;
}

/// A registered backend whose own name was not lowercase.
#[derive(Debug)]
struct Renamed {
    name: String,
    inner: Arc<dyn DeflateBackend>,
}

impl DeflateBackend for Renamed {
    fn name(&self) -> &str {
        &self.name
    }

    fn decoder(&self, variant: WindowVariant) -> DecodeResult<Box<dyn Decoder>> {
        self.inner.decoder(variant)
    }
}

/// Table of available backends, keyed by lowercase identifier.
#[derive(Clone, Debug)]
pub struct BackendRegistry {
    backends: Vec<(String, Arc<dyn DeflateBackend>)>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Registry holding the baseline backend plus every compiled-in accelerator.
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::baseline();
        #[cfg(feature = "miniz")]
        registry.register(Arc::new(MinizBackend));
        registry
    }

    /// Registry holding only the baseline backend.
    pub fn baseline() -> Self {
        Self {
            backends: vec![(DEFAULT_BACKEND.to_string(), Arc::new(Flate2Backend) as _)],
        }
    }

    /// Add or replace a backend under its own name, lowercased.
    ///
    /// The stored backend reports the lowercased identifier from `name()`, so
    /// cache keys and the last-used backend agree with what `resolve` accepts.
    pub fn register(&mut self, backend: Arc<dyn DeflateBackend>) {
        let name = backend.name().to_ascii_lowercase();
        tracing::debug!(backend = %name, "registering deflate backend");
        let backend: Arc<dyn DeflateBackend> = if backend.name() == name {
            backend
        } else {
            Arc::new(Renamed {
                name: name.clone(),
                inner: backend,
            })
        };
        match self.backends.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = backend,
            None => self.backends.push((name, backend)),
        }
    }

    /// Look up a backend; `None` or a blank name selects the default.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn DeflateBackend>> {
        let wanted = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_ascii_lowercase(),
            _ => DEFAULT_BACKEND.to_string(),
        };
        self.backends
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, b)| Arc::clone(b))
            .ok_or_else(|| {
                ExtractError::Configuration(format!(
                    "unknown backend '{wanted}'. Available: {}",
                    self.available().join(", ")
                ))
            })
    }

    /// Identifiers in registration order.
    pub fn available(&self) -> Vec<&str> {
        self.backends.iter().map(|(n, _)| n.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    impl DeflateBackend for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn decoder(&self, variant: WindowVariant) -> DecodeResult<Box<dyn Decoder>> {
            Err(DecodeError::UnsupportedVariant(variant.as_str()))
        }
    }

    #[test]
    fn blank_name_resolves_default() {
        let registry = BackendRegistry::new();
        assert_eq!(registry.resolve(None).unwrap().name(), DEFAULT_BACKEND);
        assert_eq!(registry.resolve(Some("  ")).unwrap().name(), DEFAULT_BACKEND);
        assert_eq!(registry.resolve(Some("FLATE2")).unwrap().name(), DEFAULT_BACKEND);
    }

    #[test]
    fn unknown_name_lists_known_backends() {
        let registry = BackendRegistry::new();
        let err = registry.resolve(Some("isal")).unwrap_err();
        match err {
            ExtractError::Configuration(msg) => {
                assert!(msg.contains("isal"));
                assert!(msg.contains("flate2"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn register_adds_and_replaces() {
        let mut registry = BackendRegistry::baseline();
        registry.register(Arc::new(Named("Custom")));
        registry.register(Arc::new(Named("custom")));
        assert_eq!(registry.available(), vec!["flate2", "custom"]);
        assert!(registry.resolve(Some("custom")).is_ok());
    }

    #[test]
    fn mixed_case_backend_reports_normalized_name() {
        let mut registry = BackendRegistry::baseline();
        registry.register(Arc::new(Named("Custom")));
        let backend = registry.resolve(Some("CUSTOM")).unwrap();
        assert_eq!(backend.name(), "custom");
        assert!(matches!(
            backend.decoder(WindowVariant::Raw),
            Err(DecodeError::UnsupportedVariant("raw"))
        ));
    }

    #[cfg(feature = "miniz")]
    #[test]
    fn accelerator_is_registered_when_compiled_in() {
        assert!(BackendRegistry::new().available().contains(&"miniz"));
    }
}

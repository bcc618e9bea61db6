use std::collections::HashSet;
use std::path::PathBuf;

use regex::Regex;

use crate::error::{ExtractError, Result};

/// Concurrency used when the caller does not choose one.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Selects which entries an extraction writes.
///
/// The name whitelist and the pattern list are independent constraints and
/// both must pass. An absent constraint always passes; a pattern list passes
/// when any one pattern is found anywhere in the entry name.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    names: Option<HashSet<String>>,
    patterns: Option<Vec<Regex>>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict extraction to these exact entry names.
    ///
    /// An empty list leaves the whitelist unset.
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        self.names = (!names.is_empty()).then_some(names);
        self
    }

    /// Restrict extraction to names containing a match for `pattern`.
    pub fn regex(self, pattern: &str) -> Result<Self> {
        self.regexes([pattern])
    }

    /// Restrict extraction to names matching at least one of `patterns`.
    pub fn regexes<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    ExtractError::Configuration(format!("invalid pattern '{}': {e}", p.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.patterns = (!compiled.is_empty()).then_some(compiled);
        Ok(self)
    }

    pub fn matches(&self, name: &str) -> bool {
        let whitelisted = self.names.as_ref().is_none_or(|names| names.contains(name));
        let pattern_hit = self
            .patterns
            .as_ref()
            .is_none_or(|patterns| patterns.iter().any(|p| p.is_match(name)));
        whitelisted && pattern_hit
    }

    pub fn is_unrestricted(&self) -> bool {
        self.names.is_none() && self.patterns.is_none()
    }
}

/// Parameters of one extraction call.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Root for extracted paths; the working directory when unset.
    pub destination: Option<PathBuf>,
    pub filter: EntryFilter,
    /// Fixed chunk size; sized per entry when unset or zero.
    pub buffer_size: Option<usize>,
    /// Maximum number of entries extracted at once. Zero is treated as one.
    pub concurrency: usize,
    /// Backend identifier; the default backend when unset or blank.
    pub backend: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            destination: None,
            filter: EntryFilter::default(),
            buffer_size: None,
            concurrency: DEFAULT_CONCURRENCY,
            backend: None,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = Some(dir.into());
        self
    }

    pub fn filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = Some(bytes);
        self
    }

    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    pub fn backend(mut self, name: impl Into<String>) -> Self {
        self.backend = Some(name.into());
        self
    }
}

use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::extract::{DEFAULT_CONCURRENCY, EntryFilter, ExtractOptions};
use crate::io::Spool;

#[derive(Parser, Debug)]
#[command(name = "streamzip")]
#[command(version)]
#[command(about = "Extract ZIP archives with bounded memory and concurrency", long_about = None)]
#[command(after_help = "Examples:\n  \
  streamzip data.zip -d out -j 8              extract everything with 8 workers\n  \
  streamzip data.zip -r '\\.csv$' -r '^img/'   extract CSVs and images only\n  \
  streamzip https://example.com/a.zip -d out  stream a remote archive through a spool file")]
pub struct Cli {
    /// ZIP file path or HTTP(S) URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Exact entry names to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// Extract files into DIR
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<PathBuf>,

    /// Only extract entries whose name contains a match (repeatable)
    #[arg(short = 'r', long = "regex", value_name = "PATTERN")]
    pub regex: Vec<String>,

    /// Read chunk size in bytes (default: sized per entry)
    #[arg(short = 'b', long = "buffer-size", value_name = "BYTES")]
    pub buffer_size: Option<usize>,

    /// Maximum number of entries extracted at once
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub jobs: usize,

    /// Decompression backend
    #[arg(long, value_name = "NAME")]
    pub backend: Option<String>,

    /// Directory for the spool file when reading from a URL
    #[arg(long = "spool-dir", value_name = "DIR")]
    pub spool_dir: Option<PathBuf>,

    /// Keep a streamed archive in memory instead of a spool file
    #[arg(long = "in-memory")]
    pub in_memory: bool,

    /// List entries instead of extracting
    #[arg(short = 'l')]
    pub list: bool,

    /// Print the available decompression backends and exit
    #[arg(long = "list-backends")]
    pub list_backends: bool,

    /// More log output (-vv for chunk-level tracing)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    /// Default log filter implied by `-v` / `-q`.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    pub fn spool(&self) -> Spool {
        if self.in_memory {
            Spool::Memory
        } else {
            Spool::TempFile {
                dir: self.spool_dir.clone(),
            }
        }
    }

    /// Build extraction options; fails on an invalid pattern.
    pub fn options(&self) -> Result<ExtractOptions> {
        let filter = EntryFilter::new()
            .names(self.files.iter().cloned())
            .regexes(&self.regex)?;
        let mut options = ExtractOptions::new().filter(filter).concurrency(self.jobs);
        options.destination = self.extract_dir.clone();
        options.buffer_size = self.buffer_size;
        options.backend = self.backend.clone();
        Ok(options)
    }
}

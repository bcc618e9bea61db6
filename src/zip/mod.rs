//! ZIP container structures.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, entries, etc.)
//! - [`parser`]: Central directory reader that enumerates entries
//! - [`local_header`]: Validation and skipping of per-entry local headers
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Entry metadata is always taken from the central directory. The local
//! header is only checked for its signature and skipped, so names and extra
//! fields there are never trusted.
//!
//! ## Supported Features
//!
//! - Standard ZIP format and ZIP64 extensions
//! - STORED and DEFLATE compression methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No writing or repairing of archives

pub mod local_header;
mod parser;
mod structures;

pub use local_header::{LocalHeader, skip_local_header};
pub use parser::ZipParser;
pub use structures::*;

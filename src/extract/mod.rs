//! The streaming extraction engine.
//!
//! [`coordinator`] selects entries and schedules them, [`entry`] extracts one
//! entry with its own file handles, and [`copy`] moves the payload bytes in
//! bounded chunks.

pub mod coordinator;
pub mod copy;
pub mod entry;
mod options;

pub use copy::{DEFAULT_BUFFER_SIZE, DecodeSetup, copy_compressed, copy_stored, select_buffer_size};
pub use entry::CreatedDirs;
pub use options::{DEFAULT_CONCURRENCY, EntryFilter, ExtractOptions};

//! # Sylva Tree Store boundary
//!
//! File-backed storage surface consumed by the index lifecycle core:
//!
//! - Fixed-length file headers carrying a layout tag and an optional
//!   population-failure message, with a header-only read primitive
//! - A sorted fixed-width key-file write/read path (streamed writes,
//!   memory-mapped reads, duplicate rejection for unique layouts)
//! - A shared recovery-cleanup scheduler handed to every accessor
//!
//! Structural tree algorithms, page caching, and crash recovery proper are
//! not this crate's business; it provides exactly the seam the index core
//! needs to create, open, and introspect index files.

pub mod cleanup;
pub mod error;
pub mod file;
pub mod header;

pub use cleanup::CleanupScheduler;
pub use error::{Result, TreeError};
pub use file::{write_failure, TreeReader, TreeSpec, TreeWriter};
pub use header::{read_header, LayoutTag, TreeHeader, FAILURE_SLOT_LEN, HEADER_LEN};

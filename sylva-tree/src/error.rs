//! Error types for tree-store file operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for tree-store operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors surfaced at the tree-store file boundary.
#[derive(Error, Debug)]
pub enum TreeError {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File does not start with the tree-file magic bytes.
    #[error("not a tree file (bad magic): {0}")]
    BadMagic(PathBuf),

    /// File header declares a format version this build cannot read.
    #[error("unsupported tree file format version {0}")]
    UnsupportedFormat(u8),

    /// File is shorter than its header or declared body.
    #[error("tree file truncated: {0}")]
    Truncated(PathBuf),

    /// Header layout tag does not match what the caller expected.
    #[error("layout mismatch: file carries ({identifier}, {major}, {minor})")]
    LayoutMismatch {
        identifier: u64,
        major: u32,
        minor: u32,
    },

    /// Key appended out of sort order.
    #[error("key appended out of order")]
    OutOfOrderKey,

    /// Second insert at an existing key in a unique tree.
    #[error("duplicate key in unique tree")]
    DuplicateKey,

    /// Key bytes do not match the width fixed at creation.
    #[error("key width mismatch: got {got}, layout fixes {fixed}")]
    KeyWidth { got: usize, fixed: usize },

    /// Payload bytes do not match the width fixed at creation.
    #[error("payload width mismatch: got {got}, layout fixes {fixed}")]
    PayloadWidth { got: usize, fixed: usize },
}

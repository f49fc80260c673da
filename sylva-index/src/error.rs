//! Error types for the index lifecycle core.

use crate::descriptor::IndexId;
use sylva_tree::TreeError;
use thiserror::Error;

/// Result type for index provider operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors reported by the index provider. None of these are retried
/// internally; every condition is returned synchronously to the caller.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Populator requested while the provider is read-only. Caller error.
    #[error("can't create populator on a read-only index provider")]
    ReadOnly,

    /// Uniqueness-kind code outside the supported set. Schema error.
    #[error("unsupported index kind code {0}")]
    UnsupportedKind(u8),

    /// Population failure queried on an index whose header stores none.
    #[error("index {0} has no population failure recorded")]
    NoFailureRecorded(IndexId),

    /// The tree store could not open the index file. Propagated unmodified;
    /// the caller decides remediation.
    #[error("storage open failure: {0}")]
    StorageOpen(#[source] TreeError),

    /// I/O problem while reading an index file header. Unrecoverable at
    /// this layer.
    #[error("environment failure reading index header: {0}")]
    Environment(#[source] TreeError),
}

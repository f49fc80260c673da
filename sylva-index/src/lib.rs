//! # Sylva index lifecycle core
//!
//! Orchestrates on-disk, single-property numeric indexes stored through the
//! tree-store boundary (`sylva-tree`):
//!
//! - Chooses the on-disk layout from an index's declared uniqueness kind
//! - Derives deterministic file locations from numeric index ids
//! - Creates bulk-load (populator) and serving (accessor) handles bound to
//!   the right layout and file
//! - Retrieves a persisted population-failure message without knowing which
//!   layout variant built the file
//!
//! The provider itself holds no shared mutable state; everything after
//! construction is pure dispatch and path computation, safe under
//! unrestricted concurrent use.

pub mod accessor;
pub mod descriptor;
pub mod error;
pub mod failure;
pub mod files;
pub mod layout;
pub mod populator;
pub mod provider;
pub mod sampling;

// ── Provider surface ─────────────────────────────────────────────────────────
pub use provider::{
    IndexState, MigrationTask, NumberIndexProvider, ProviderConfig, Support,
};

// ── Handles ──────────────────────────────────────────────────────────────────
pub use accessor::NumberIndexAccessor;
pub use populator::NumberIndexPopulator;

// ── Identity and descriptors ─────────────────────────────────────────────────
pub use descriptor::{IndexDescriptor, IndexId, KIND_GENERAL, KIND_UNIQUE};

// ── Layouts ──────────────────────────────────────────────────────────────────
pub use layout::{
    compatible_layout, decode_value, encode_value, IndexEntry, IndexKind, NumberLayout,
    ValueError, NON_UNIQUE_LAYOUT, REGISTERED_LAYOUTS, UNIQUE_LAYOUT,
};

// ── Errors, files, sampling ──────────────────────────────────────────────────
pub use error::{IndexError, Result};
pub use files::IndexFiles;
pub use sampling::{IndexSample, IndexSamplingConfig};

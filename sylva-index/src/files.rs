//! Index file locations.

use crate::descriptor::IndexId;
use std::path::{Path, PathBuf};

/// Derives the on-disk location of every index file from its id.
///
/// Pure and deterministic: `path(id) = base_dir / decimal(id)`. The base
/// directory is fixed once per provider instance so each provider keeps a
/// private namespace, separate from indexes managed by other providers.
#[derive(Debug, Clone)]
pub struct IndexFiles {
    base_dir: PathBuf,
}

impl IndexFiles {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File location for `id`. Injective over distinct ids.
    pub fn path(&self, id: IndexId) -> PathBuf {
        self.base_dir.join(id.get().to_string())
    }
}

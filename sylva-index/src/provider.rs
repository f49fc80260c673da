//! The index provider: entry point composing layouts, file locations, and
//! the tree-store boundary into populator/accessor creation and
//! failure-message retrieval.

use crate::accessor::NumberIndexAccessor;
use crate::descriptor::{IndexDescriptor, IndexId};
use crate::error::{IndexError, Result};
use crate::failure::read_population_failure;
use crate::files::IndexFiles;
use crate::layout::{IndexKind, NumberLayout};
use crate::populator::NumberIndexPopulator;
use crate::sampling::IndexSamplingConfig;
use std::path::PathBuf;
use std::sync::Arc;
use sylva_tree::CleanupScheduler;

/// Provider configuration, fixed at construction and never mutated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderConfig {
    /// When set, populator creation is refused; accessor creation and
    /// failure retrieval stay permitted.
    pub read_only: bool,
}

/// Index lifecycle states as tracked by the caller. Population starts in
/// `Creating` and ends `Online` or (terminally, until rebuild) `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Creating,
    Online,
    Failed,
}

/// Explicit outcome of a provider capability query: not-yet-implemented
/// hooks answer [`Support::Unsupported`] rather than a default value a
/// caller could mistake for a real answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support<T> {
    Supported(T),
    Unsupported,
}

/// Placeholder for store-migration participation. This index family does
/// not take part in store migrations yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationTask;

/// Top-level provider for on-disk single-property numeric indexes.
///
/// Holds no mutable state: the base directory, read-only flag, and shared
/// cleanup scheduler are fixed at construction, so all operations are safe
/// under unrestricted concurrent invocation.
pub struct NumberIndexProvider {
    files: IndexFiles,
    cleanup: Arc<CleanupScheduler>,
    read_only: bool,
}

impl NumberIndexProvider {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        cleanup: Arc<CleanupScheduler>,
        config: ProviderConfig,
    ) -> Self {
        Self {
            files: IndexFiles::new(base_dir),
            cleanup,
            read_only: config.read_only,
        }
    }

    pub fn files(&self) -> &IndexFiles {
        &self.files
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Create a populator for a new index. Returns an unopened handle bound
    /// to the id's file location and the layout for the descriptor's kind;
    /// nothing touches disk until the populator itself does.
    pub fn populator(
        &self,
        index_id: IndexId,
        descriptor: &IndexDescriptor,
        sampling: IndexSamplingConfig,
    ) -> Result<NumberIndexPopulator> {
        if self.read_only {
            return Err(IndexError::ReadOnly);
        }
        let layout = Self::layout_for(descriptor)?;
        tracing::debug!(index_id = %index_id, ?layout, "creating index populator");
        Ok(NumberIndexPopulator::new(
            self.files.path(index_id),
            layout,
            sampling,
        ))
    }

    /// Open an accessor for an existing index. Never gated by the read-only
    /// flag; uses the same kind-to-layout mapping as populator creation, so
    /// the two paths cannot select mismatched layouts. Tree-store open
    /// failures are propagated unmodified.
    pub fn accessor(
        &self,
        index_id: IndexId,
        descriptor: &IndexDescriptor,
        _sampling: IndexSamplingConfig,
    ) -> Result<NumberIndexAccessor> {
        let layout = Self::layout_for(descriptor)?;
        tracing::debug!(index_id = %index_id, ?layout, "opening index accessor");
        NumberIndexAccessor::open(&self.files.path(index_id), layout, &self.cleanup)
            .map_err(IndexError::StorageOpen)
    }

    /// Retrieve the persisted failure message for a failed index. Callers
    /// must only ask for indexes they track as failed; a header without a
    /// failure string is reported as [`IndexError::NoFailureRecorded`].
    pub fn population_failure(&self, index_id: IndexId) -> Result<String> {
        match read_population_failure(&self.files.path(index_id)) {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(IndexError::NoFailureRecorded(index_id)),
            Err(e) => Err(IndexError::Environment(e)),
        }
    }

    /// Initial-state query. Inert for this index family: the caller's own
    /// tracking is authoritative.
    pub fn initial_state(
        &self,
        _index_id: IndexId,
        _descriptor: &IndexDescriptor,
    ) -> Support<IndexState> {
        Support::Unsupported
    }

    /// Store-migration participation. Inert for this index family.
    pub fn migration_participant(&self) -> Support<MigrationTask> {
        Support::Unsupported
    }

    /// The one kind-to-layout mapping, shared by populator and accessor
    /// creation.
    fn layout_for(descriptor: &IndexDescriptor) -> Result<NumberLayout> {
        let kind = IndexKind::from_code(descriptor.kind_code())
            .ok_or(IndexError::UnsupportedKind(descriptor.kind_code()))?;
        Ok(NumberLayout::for_kind(kind))
    }
}

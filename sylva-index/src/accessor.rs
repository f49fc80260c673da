//! Serving accessor handle.

use crate::layout::{encode_value, NumberLayout, ValueError};
use std::path::Path;
use std::sync::Arc;
use sylva_tree::{CleanupScheduler, LayoutTag, Result, TreeReader};

/// Serves reads against an already-populated index file.
///
/// Each open yields an independent handle over its own mapping, so any
/// number of accessors for the same index may exist concurrently.
#[derive(Debug)]
pub struct NumberIndexAccessor {
    reader: TreeReader,
    layout: NumberLayout,
}

impl NumberIndexAccessor {
    /// Open `path` with the given layout, verifying the header. Files that
    /// were never cleanly shut down are still served (their body reads as
    /// empty) but are handed to the shared cleanup scheduler.
    pub(crate) fn open(
        path: &Path,
        layout: NumberLayout,
        cleanup: &Arc<CleanupScheduler>,
    ) -> Result<Self> {
        let reader = TreeReader::open(path, &layout.tree_spec())?;
        if !reader.header().clean_shutdown {
            let orphan = path.to_path_buf();
            cleanup.schedule(format!("orphaned index file {}", orphan.display()), move || {
                tracing::warn!(
                    path = %orphan.display(),
                    "index file not cleanly shut down; needs rebuild"
                );
            });
        }
        Ok(Self { reader, layout })
    }

    pub fn layout(&self) -> NumberLayout {
        self.layout
    }

    /// Layout tag read back from the file header.
    pub fn layout_tag(&self) -> LayoutTag {
        self.reader.header().layout
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// Failure message stored in the header, if population failed. Exposed
    /// for diagnostics; failed indexes may still be opened.
    pub fn population_failure(&self) -> Option<&str> {
        self.reader.header().failure.as_deref()
    }

    /// Entity ids indexed under exactly `value`, in ascending entity order.
    pub fn lookup(&self, value: f64) -> std::result::Result<Vec<u64>, ValueError> {
        let probe = encode_value(value)?.to_be_bytes();
        let lo = self.reader.lower_bound(&probe);
        let hi = self.reader.upper_bound(&probe);
        Ok(self.entity_ids(lo, hi))
    }

    /// Entity ids indexed under values in `[low, high]`, ascending by
    /// (value, entity id).
    pub fn range(&self, low: f64, high: f64) -> std::result::Result<Vec<u64>, ValueError> {
        let lo_key = encode_value(low)?.to_be_bytes();
        let hi_key = encode_value(high)?.to_be_bytes();
        let lo = self.reader.lower_bound(&lo_key);
        let hi = self.reader.upper_bound(&hi_key);
        Ok(self.entity_ids(lo, hi.max(lo)))
    }

    fn entity_ids(&self, lo: usize, hi: usize) -> Vec<u64> {
        (lo..hi)
            .map(|i| {
                self.layout
                    .entity_id_of(self.reader.key_at(i), self.reader.payload_at(i))
            })
            .collect()
    }
}

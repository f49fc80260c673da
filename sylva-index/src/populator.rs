//! Bulk-load populator handle.

use crate::layout::{IndexEntry, NumberLayout};
use crate::sampling::{IndexSample, IndexSamplingConfig};
use std::path::{Path, PathBuf};
use sylva_tree::{write_failure, LayoutTag, Result, TreeWriter};

/// Bulk-loads initial entries into a newly created index file.
///
/// The handle starts unopened: the provider returns it without touching
/// disk, and [`create`](Self::create) brings the file into existence. At
/// most one populator may be active per index id; that invariant belongs to
/// the caller, and a second concurrent populator corrupts the shared file.
#[derive(Debug)]
pub struct NumberIndexPopulator {
    path: PathBuf,
    layout: NumberLayout,
    sampling: IndexSamplingConfig,
    writer: Option<TreeWriter>,
    entries: Vec<IndexEntry>,
    failure: Option<String>,
}

impl NumberIndexPopulator {
    pub(crate) fn new(path: PathBuf, layout: NumberLayout, sampling: IndexSamplingConfig) -> Self {
        Self {
            path,
            layout,
            sampling,
            writer: None,
            entries: Vec::new(),
            failure: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> NumberLayout {
        self.layout
    }

    /// Layout tag this populator stamps into the file header.
    pub fn layout_tag(&self) -> LayoutTag {
        self.layout.tag()
    }

    /// Create the index file (and missing parent directories) with a
    /// provisional header. Until [`close`](Self::close) the file reads as
    /// not cleanly shut down.
    pub fn create(&mut self) -> Result<()> {
        self.writer = Some(TreeWriter::create(&self.path, self.layout.tree_spec())?);
        Ok(())
    }

    /// Buffer one entry for the final sorted write.
    pub fn add(&mut self, entry: IndexEntry) {
        self.entries.push(entry);
    }

    /// Record a population failure. Persisted to the file header at close;
    /// the index stays failed until the file is rebuilt.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
    }

    /// Close the populator. With `populated == true` the buffered entries
    /// are sorted by the layout ordering and written out, and the sample
    /// summary is returned; otherwise the failure message (or a generic
    /// one) is persisted and the body is discarded.
    ///
    /// A second insert at an existing value in a unique layout surfaces
    /// here as the tree store's duplicate-key rejection.
    pub fn close(mut self, populated: bool) -> Result<Option<IndexSample>> {
        if !populated || self.failure.is_some() {
            let message = self
                .failure
                .as_deref()
                .unwrap_or("population did not complete");
            tracing::debug!(path = %self.path.display(), message, "index population failed");
            match self.writer.take() {
                Some(writer) => writer.finish_failed(message)?,
                // Writer already gone, e.g. closing over a file left behind
                // by an earlier crashed populator: rewrite its header in
                // place, creating the file first if it never existed.
                None if self.path.exists() => write_failure(&self.path, message)?,
                None => {
                    TreeWriter::create(&self.path, self.layout.tree_spec())?
                        .finish_failed(message)?;
                }
            }
            return Ok(None);
        }

        let mut writer = match self.writer.take() {
            Some(w) => w,
            // Never created: bring the file into existence so the outcome
            // is still observable.
            None => TreeWriter::create(&self.path, self.layout.tree_spec())?,
        };

        self.entries
            .sort_unstable_by_key(|e| (e.key_bits(), e.entity_id()));

        let (mut key, mut payload) = (Vec::new(), Vec::new());
        let mut unique_values = 0u64;
        let mut prev_bits = None;
        for entry in &self.entries {
            self.layout.encode_into(entry, &mut key, &mut payload);
            writer.append(&key, &payload)?;
            if prev_bits != Some(entry.key_bits()) {
                unique_values += 1;
                prev_bits = Some(entry.key_bits());
            }
        }
        let indexed = writer.finish()?;
        tracing::debug!(path = %self.path.display(), indexed, "index population complete");

        Ok(Some(IndexSample {
            indexed,
            unique_values,
            sample_size: indexed.min(self.sampling.sample_size_limit as u64),
        }))
    }
}

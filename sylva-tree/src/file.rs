//! Sorted key-file write and read paths behind the tree-store boundary.
//!
//! A tree file is the header region (see [`crate::header`]) followed by
//! `entry_count` fixed-width records, each `key_width` key bytes then
//! `payload_width` payload bytes, sorted by raw key bytes. Key encodings are
//! chosen by the caller so that lexicographic byte order equals logical
//! order, which keeps the read side a plain binary search over the mapped
//! body.
//!
//! Writers stream records through a [`std::io::BufWriter`] and rewrite the
//! header in place on an orderly close; readers map the file and never copy
//! the body.

use crate::error::{Result, TreeError};
use crate::header::{LayoutTag, TreeHeader, HEADER_LEN};
use memmap2::Mmap;
use std::cmp::Ordering;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Shape of one tree file, fixed at creation and verified at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSpec {
    pub tag: LayoutTag,
    pub key_width: u16,
    pub payload_width: u16,
    /// Whether a second insert at an existing key is rejected.
    pub unique: bool,
}

impl TreeSpec {
    pub fn record_width(&self) -> usize {
        self.key_width as usize + self.payload_width as usize
    }
}

// ============================================================================
// Write path
// ============================================================================

/// Streaming writer for a new tree file.
///
/// Creation writes a header with the clean-shutdown flag cleared; the flag
/// is set again only by [`finish`](Self::finish) or
/// [`finish_failed`](Self::finish_failed), so a crash mid-build leaves a
/// file that readers recognize as not cleanly shut down.
#[derive(Debug)]
pub struct TreeWriter {
    path: PathBuf,
    spec: TreeSpec,
    out: io::BufWriter<File>,
    entry_count: u64,
    last_key: Vec<u8>,
}

impl TreeWriter {
    /// Create the file (and any missing parent directories) and write the
    /// provisional header.
    pub fn create(path: &Path, spec: TreeSpec) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut out = io::BufWriter::new(file);
        let mut buf = [0u8; HEADER_LEN];
        Self::header_for(&spec, false, 0, None).write_to(&mut buf);
        out.write_all(&buf)?;
        out.flush()?;
        Ok(Self {
            path: path.to_path_buf(),
            spec,
            out,
            entry_count: 0,
            last_key: Vec::new(),
        })
    }

    /// Append one record. Keys must arrive in non-decreasing byte order;
    /// equal keys are rejected when the spec is unique.
    pub fn append(&mut self, key: &[u8], payload: &[u8]) -> Result<()> {
        if key.len() != self.spec.key_width as usize {
            return Err(TreeError::KeyWidth {
                got: key.len(),
                fixed: self.spec.key_width as usize,
            });
        }
        if payload.len() != self.spec.payload_width as usize {
            return Err(TreeError::PayloadWidth {
                got: payload.len(),
                fixed: self.spec.payload_width as usize,
            });
        }
        if self.entry_count > 0 {
            match key.cmp(&self.last_key) {
                Ordering::Less => return Err(TreeError::OutOfOrderKey),
                Ordering::Equal if self.spec.unique => return Err(TreeError::DuplicateKey),
                _ => {}
            }
        }
        self.out.write_all(key)?;
        self.out.write_all(payload)?;
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.entry_count += 1;
        Ok(())
    }

    /// Orderly close: flush the body and rewrite the header clean with the
    /// final entry count. Returns the number of records written.
    pub fn finish(self) -> Result<u64> {
        let count = self.entry_count;
        let spec = self.spec;
        Self::finalize(self.out, &Self::header_for(&spec, true, count, None))?;
        Ok(count)
    }

    /// Close recording a population failure. The body is disregarded: the
    /// header is rewritten clean with zero entries and the failure message
    /// in the failure slot.
    pub fn finish_failed(self, failure: &str) -> Result<()> {
        let spec = self.spec;
        Self::finalize(self.out, &Self::header_for(&spec, true, 0, Some(failure)))
    }

    /// Path this writer was created with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header_for(
        spec: &TreeSpec,
        clean: bool,
        entry_count: u64,
        failure: Option<&str>,
    ) -> TreeHeader {
        TreeHeader {
            layout: spec.tag,
            clean_shutdown: clean,
            entry_count,
            key_width: spec.key_width,
            payload_width: spec.payload_width,
            failure: failure.map(str::to_owned),
        }
    }

    fn finalize(out: io::BufWriter<File>, header: &TreeHeader) -> Result<()> {
        let mut file = out.into_inner().map_err(|e| TreeError::Io(e.into_error()))?;
        let mut buf = [0u8; HEADER_LEN];
        header.write_to(&mut buf);
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&buf)?;
        file.flush()?;
        Ok(())
    }
}

/// Rewrite the header of an existing tree file in place, recording a
/// population failure after the writer is gone.
pub fn write_failure(path: &Path, failure: &str) -> Result<()> {
    let header = crate::header::read_header(path)?;
    let mut file = OpenOptions::new().write(true).open(path)?;
    let mut buf = [0u8; HEADER_LEN];
    TreeHeader {
        failure: Some(failure.to_owned()),
        ..header
    }
    .write_to(&mut buf);
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&buf)?;
    file.flush()?;
    Ok(())
}

// ============================================================================
// Read path
// ============================================================================

/// Memory-mapped reader over a finished tree file.
///
/// Every open yields an independent mapping, so any number of readers may
/// serve the same file concurrently.
#[derive(Debug)]
pub struct TreeReader {
    path: PathBuf,
    header: TreeHeader,
    mmap: Mmap,
    record_width: usize,
}

impl TreeReader {
    /// Open the file and verify its header against `expected`.
    pub fn open(path: &Path, expected: &TreeSpec) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let header = TreeHeader::read_from(&mmap, path)?;
        if header.layout != expected.tag
            || header.key_width != expected.key_width
            || header.payload_width != expected.payload_width
        {
            return Err(TreeError::LayoutMismatch {
                identifier: header.layout.identifier,
                major: header.layout.major,
                minor: header.layout.minor,
            });
        }
        let record_width = header.record_width();
        let body_len = (header.entry_count as usize)
            .checked_mul(record_width)
            .ok_or_else(|| TreeError::Truncated(path.to_path_buf()))?;
        if mmap.len() < HEADER_LEN + body_len {
            return Err(TreeError::Truncated(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            header,
            mmap,
            record_width,
        })
    }

    pub fn header(&self) -> &TreeHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the body.
    pub fn len(&self) -> usize {
        self.header.entry_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.entry_count == 0
    }

    /// Key bytes of record `i`. Panics if `i` is out of bounds.
    pub fn key_at(&self, i: usize) -> &[u8] {
        let start = HEADER_LEN + i * self.record_width;
        &self.mmap[start..start + self.header.key_width as usize]
    }

    /// Payload bytes of record `i`. Panics if `i` is out of bounds.
    pub fn payload_at(&self, i: usize) -> &[u8] {
        let start = HEADER_LEN + i * self.record_width + self.header.key_width as usize;
        &self.mmap[start..start + self.header.payload_width as usize]
    }

    /// Index of the first record whose key does not compare below `probe`.
    ///
    /// `probe` may be shorter than the key width, in which case only the
    /// leading `probe.len()` key bytes participate, which turns the search
    /// into a prefix scan over composite keys.
    pub fn lower_bound(&self, probe: &[u8]) -> usize {
        debug_assert!(probe.len() <= self.header.key_width as usize);
        let (mut lo, mut hi) = (0usize, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid)[..probe.len()].cmp(probe) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Index just past the last record whose key prefix equals or compares
    /// below `probe`.
    pub fn upper_bound(&self, probe: &[u8]) -> usize {
        debug_assert!(probe.len() <= self.header.key_width as usize);
        let (mut lo, mut hi) = (0usize, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid)[..probe.len()].cmp(probe) == Ordering::Greater {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }
}

//! Tree file header: fixed-length region at the start of every tree file.
//!
//! ```text
//! [Header: 296 bytes]
//!   magic: "SYT1" (4B), format_version: u8, flags: u8, _pad: u16
//!   layout_identifier: u64
//!   layout_major: u32
//!   layout_minor: u32
//!   entry_count: u64
//!   key_width: u16, payload_width: u16
//!   failure_len: u32
//!   failure_slot: [u8; 256]
//! [Body: entry_count × (key_width + payload_width) bytes]
//! ```
//!
//! The header carries everything a reader needs to decide compatibility
//! without touching the body, and [`read_header`] reads exactly this region.
//! The failure slot has fixed capacity so recording a population failure is
//! an in-place rewrite of the first 296 bytes.

use crate::error::{Result, TreeError};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Magic bytes for a tree file.
pub const TREE_MAGIC: [u8; 4] = *b"SYT1";

/// Current tree file format version.
pub const TREE_FORMAT_VERSION: u8 = 1;

/// Total header length in bytes.
pub const HEADER_LEN: usize = 296;

/// Capacity of the failure-message slot.
pub const FAILURE_SLOT_LEN: usize = 256;

/// Flag bit: the file was closed in an orderly fashion.
const FLAG_CLEAN_SHUTDOWN: u8 = 1 << 0;

/// Identity of a key/value layout: (identifier, major, minor) uniquely
/// determines the binary key and payload format of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutTag {
    pub identifier: u64,
    pub major: u32,
    pub minor: u32,
}

/// Decoded tree file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeHeader {
    pub layout: LayoutTag,
    /// Whether the writer reached an orderly close. Cleared at creation,
    /// set again when the file is finished.
    pub clean_shutdown: bool,
    pub entry_count: u64,
    pub key_width: u16,
    pub payload_width: u16,
    /// Population failure message, present iff population failed.
    pub failure: Option<String>,
}

impl TreeHeader {
    /// Width in bytes of one body record.
    pub fn record_width(&self) -> usize {
        self.key_width as usize + self.payload_width as usize
    }

    /// Encode the header into the first [`HEADER_LEN`] bytes of `buf`.
    pub fn write_to(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_LEN);
        buf[0..4].copy_from_slice(&TREE_MAGIC);
        buf[4] = TREE_FORMAT_VERSION;
        buf[5] = if self.clean_shutdown {
            FLAG_CLEAN_SHUTDOWN
        } else {
            0
        };
        buf[6..8].fill(0); // pad
        buf[8..16].copy_from_slice(&self.layout.identifier.to_le_bytes());
        buf[16..20].copy_from_slice(&self.layout.major.to_le_bytes());
        buf[20..24].copy_from_slice(&self.layout.minor.to_le_bytes());
        buf[24..32].copy_from_slice(&self.entry_count.to_le_bytes());
        buf[32..34].copy_from_slice(&self.key_width.to_le_bytes());
        buf[34..36].copy_from_slice(&self.payload_width.to_le_bytes());
        let failure = self.failure.as_deref().map(fit_failure).unwrap_or("");
        buf[36..40].copy_from_slice(&(failure.len() as u32).to_le_bytes());
        buf[40..HEADER_LEN].fill(0);
        buf[40..40 + failure.len()].copy_from_slice(failure.as_bytes());
    }

    /// Decode a header from the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// `path` is only used to label errors.
    pub fn read_from(buf: &[u8], path: &Path) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(TreeError::Truncated(path.to_path_buf()));
        }
        if buf[0..4] != TREE_MAGIC {
            return Err(TreeError::BadMagic(path.to_path_buf()));
        }
        if buf[4] != TREE_FORMAT_VERSION {
            return Err(TreeError::UnsupportedFormat(buf[4]));
        }
        let failure_len = u32::from_le_bytes(buf[36..40].try_into().unwrap()) as usize;
        if failure_len > FAILURE_SLOT_LEN {
            return Err(TreeError::Truncated(path.to_path_buf()));
        }
        let failure = if failure_len == 0 {
            None
        } else {
            let raw = &buf[40..40 + failure_len];
            let msg = std::str::from_utf8(raw).map_err(|e| {
                TreeError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid UTF-8 in failure slot: {e}"),
                ))
            })?;
            Some(msg.to_owned())
        };
        Ok(Self {
            layout: LayoutTag {
                identifier: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
                major: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
                minor: u32::from_le_bytes(buf[20..24].try_into().unwrap()),
            },
            clean_shutdown: buf[5] & FLAG_CLEAN_SHUTDOWN != 0,
            entry_count: u64::from_le_bytes(buf[24..32].try_into().unwrap()),
            key_width: u16::from_le_bytes(buf[32..34].try_into().unwrap()),
            payload_width: u16::from_le_bytes(buf[34..36].try_into().unwrap()),
            failure,
        })
    }
}

/// Trim a failure message to the slot capacity on a char boundary.
fn fit_failure(msg: &str) -> &str {
    if msg.len() <= FAILURE_SLOT_LEN {
        return msg;
    }
    let mut end = FAILURE_SLOT_LEN;
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    &msg[..end]
}

/// Read only the header region of a tree file.
///
/// This is the lightweight primitive behind failure-message retrieval: no
/// body bytes are read and no layout codec is required.
pub fn read_header(path: &Path) -> Result<TreeHeader> {
    let mut file = File::open(path)?;
    let mut buf = [0u8; HEADER_LEN];
    file.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            TreeError::Truncated(path.to_path_buf())
        } else {
            TreeError::Io(e)
        }
    })?;
    TreeHeader::read_from(&buf, path)
}

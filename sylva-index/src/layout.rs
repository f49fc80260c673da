//! Layout variants, the layout registry, and numeric key encoding.
//!
//! Two layouts are registered for this index family:
//!
//! - **Unique**: key = 8 order-preserving value bytes, payload = 8 entity-id
//!   bytes. The tree store rejects a second insert at an existing value.
//! - **NonUnique**: key = 8 value bytes + 8 big-endian entity-id bytes, no
//!   payload. Duplicate values coexist; the entity id breaks ties so
//!   iteration order is deterministic.
//!
//! Key bytes are big-endian so lexicographic byte order equals numeric
//! order. A layout's (identifier, major, minor) tag uniquely determines the
//! binary format; the same selection must be made at populator creation and
//! at every later accessor creation for the same index.

use crate::descriptor::{KIND_GENERAL, KIND_UNIQUE};
use sylva_tree::{LayoutTag, TreeSpec};
use thiserror::Error;

/// Tag of the unique number layout.
pub const UNIQUE_LAYOUT: LayoutTag = LayoutTag {
    identifier: u64::from_be_bytes(*b"SYNUMUNI"),
    major: 0,
    minor: 1,
};

/// Tag of the non-unique number layout.
pub const NON_UNIQUE_LAYOUT: LayoutTag = LayoutTag {
    identifier: u64::from_be_bytes(*b"SYNUMGEN"),
    major: 0,
    minor: 1,
};

/// Every layout this index family has ever registered. Maintained by hand;
/// a new layout variant must be added here or failure-message retrieval
/// will reject files it built.
pub const REGISTERED_LAYOUTS: [LayoutTag; 2] = [UNIQUE_LAYOUT, NON_UNIQUE_LAYOUT];

/// Whether an on-disk (identifier, major, minor) triple belongs to any
/// registered layout, independent of uniqueness kind.
///
/// This is the predicate behind failure-message retrieval, which must work
/// without knowing which concrete layout built the file.
pub fn compatible_layout(identifier: u64, major: u32, minor: u32) -> bool {
    REGISTERED_LAYOUTS
        .iter()
        .any(|tag| tag.identifier == identifier && tag.major == major && tag.minor == minor)
}

// ============================================================================
// Uniqueness kinds
// ============================================================================

/// Declared uniqueness kind of an index. Closed set: a third kind is a
/// deliberate, compile-visible extension, not a runtime fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    General,
    Unique,
}

impl IndexKind {
    /// Decode the raw kind code supplied by the schema subsystem.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            KIND_GENERAL => Some(Self::General),
            KIND_UNIQUE => Some(Self::Unique),
            _ => None,
        }
    }
}

// ============================================================================
// Number layouts
// ============================================================================

/// Concrete layout variant bound into populators and accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberLayout {
    Unique,
    NonUnique,
}

impl NumberLayout {
    /// The one mapping from uniqueness kind to layout. Exhaustive by
    /// construction: populator and accessor creation both go through here,
    /// so they can never disagree.
    pub const fn for_kind(kind: IndexKind) -> Self {
        match kind {
            IndexKind::General => Self::NonUnique,
            IndexKind::Unique => Self::Unique,
        }
    }

    pub const fn tag(self) -> LayoutTag {
        match self {
            Self::Unique => UNIQUE_LAYOUT,
            Self::NonUnique => NON_UNIQUE_LAYOUT,
        }
    }

    /// File shape this layout fixes for the tree store.
    pub const fn tree_spec(self) -> TreeSpec {
        match self {
            Self::Unique => TreeSpec {
                tag: UNIQUE_LAYOUT,
                key_width: 8,
                payload_width: 8,
                unique: true,
            },
            Self::NonUnique => TreeSpec {
                tag: NON_UNIQUE_LAYOUT,
                key_width: 16,
                payload_width: 0,
                unique: false,
            },
        }
    }

    /// Encode one entry into key and payload bytes for this layout.
    pub fn encode_into(self, entry: &IndexEntry, key: &mut Vec<u8>, payload: &mut Vec<u8>) {
        key.clear();
        payload.clear();
        key.extend_from_slice(&entry.key_bits().to_be_bytes());
        match self {
            Self::Unique => payload.extend_from_slice(&entry.entity_id().to_be_bytes()),
            Self::NonUnique => key.extend_from_slice(&entry.entity_id().to_be_bytes()),
        }
    }

    /// Recover the entity id of a stored record.
    pub fn entity_id_of(self, key: &[u8], payload: &[u8]) -> u64 {
        let bytes = match self {
            Self::Unique => &payload[0..8],
            Self::NonUnique => &key[8..16],
        };
        u64::from_be_bytes(bytes.try_into().expect("record width fixed by layout"))
    }
}

// ============================================================================
// Value encoding
// ============================================================================

const F64_SIGN_BIT: u64 = 1 << 63;

/// Values that cannot live in an ordered numeric index.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    #[error("NaN is not allowed in index values")]
    NaN,
    #[error("infinite values are not allowed in index values")]
    Infinite,
}

/// Encode a finite `f64` as an order-preserving `u64`.
///
/// Positive values get only the sign bit flipped; negative values get all
/// bits flipped. `-0.0` is canonicalized to `+0.0` first so the two zeros
/// collide rather than straddle the midpoint.
pub fn encode_value(value: f64) -> Result<u64, ValueError> {
    if value.is_nan() {
        return Err(ValueError::NaN);
    }
    if value.is_infinite() {
        return Err(ValueError::Infinite);
    }
    Ok(encode_bits(value))
}

fn encode_bits(value: f64) -> u64 {
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    if bits & F64_SIGN_BIT != 0 {
        !bits
    } else {
        bits ^ F64_SIGN_BIT
    }
}

/// Inverse of [`encode_value`].
pub fn decode_value(key: u64) -> f64 {
    let bits = if key & F64_SIGN_BIT != 0 {
        key ^ F64_SIGN_BIT
    } else {
        !key
    };
    f64::from_bits(bits)
}

/// One (value, entity) pair to be indexed. Construction validates the
/// value, so every held entry is encodable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    value: f64,
    entity_id: u64,
}

impl IndexEntry {
    pub fn new(value: f64, entity_id: u64) -> Result<Self, ValueError> {
        encode_value(value)?;
        Ok(Self { value, entity_id })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn entity_id(&self) -> u64 {
        self.entity_id
    }

    pub(crate) fn key_bits(&self) -> u64 {
        encode_bits(self.value)
    }
}

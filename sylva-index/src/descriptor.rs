//! Index identity and caller-supplied index descriptors.

use std::fmt;

/// Numeric index id. Caller-unique and strictly positive; the id alone
/// determines the index file location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexId(u64);

impl IndexId {
    pub fn new(raw: u64) -> Self {
        debug_assert!(raw > 0, "index ids are strictly positive");
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uniqueness-kind code for a general (non-unique) index.
pub const KIND_GENERAL: u8 = 0;

/// Uniqueness-kind code for a unique index.
pub const KIND_UNIQUE: u8 = 1;

/// Caller-supplied specification of what an index holds: the indexed
/// property and the declared uniqueness kind.
///
/// The kind travels as the raw code handed over by the schema subsystem;
/// it is decoded exactly once, at layout selection. Changing an index's
/// declared kind without rebuilding its file breaks layout re-derivation,
/// so descriptors are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDescriptor {
    property_id: u64,
    kind_code: u8,
}

impl IndexDescriptor {
    /// Descriptor for a general index: duplicate values coexist.
    pub const fn general(property_id: u64) -> Self {
        Self {
            property_id,
            kind_code: KIND_GENERAL,
        }
    }

    /// Descriptor for a unique index: one entry per value.
    pub const fn unique(property_id: u64) -> Self {
        Self {
            property_id,
            kind_code: KIND_UNIQUE,
        }
    }

    /// Descriptor carrying a raw kind code straight from the schema
    /// subsystem. Unknown codes surface later as an unsupported-kind error.
    pub const fn with_kind_code(property_id: u64, kind_code: u8) -> Self {
        Self {
            property_id,
            kind_code,
        }
    }

    pub const fn property_id(&self) -> u64 {
        self.property_id
    }

    pub const fn kind_code(&self) -> u8 {
        self.kind_code
    }
}

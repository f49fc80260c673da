//! Population failure retrieval via the header-only read primitive.

use crate::layout::compatible_layout;
use std::path::Path;
use sylva_tree::{read_header, Result, TreeError};

/// Read the population failure message stored in the header of the index
/// file at `path`, if any.
///
/// Works without knowing which concrete layout built the file: the header
/// triple only has to match *some* registered layout. A triple matching
/// none is treated as a foreign file, not as "no failure".
pub fn read_population_failure(path: &Path) -> Result<Option<String>> {
    let header = read_header(path)?;
    let tag = header.layout;
    if !compatible_layout(tag.identifier, tag.major, tag.minor) {
        return Err(TreeError::LayoutMismatch {
            identifier: tag.identifier,
            major: tag.major,
            minor: tag.minor,
        });
    }
    Ok(header.failure)
}

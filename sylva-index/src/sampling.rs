//! Sampling configuration and the sample a populator produces at close.

/// Sampling configuration handed to populators and accessors. The semantics
/// of sampling decisions live with the caller; this core only caps the
/// sample a populator reports.
#[derive(Debug, Clone, Copy)]
pub struct IndexSamplingConfig {
    /// Upper bound on the reported sample size.
    pub sample_size_limit: usize,
}

impl Default for IndexSamplingConfig {
    fn default() -> Self {
        Self {
            sample_size_limit: 1_000_000,
        }
    }
}

/// Summary of a completed population run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSample {
    /// Entries written to the index.
    pub indexed: u64,
    /// Distinct values among them.
    pub unique_values: u64,
    /// Entries that participated in the sample (capped by config).
    pub sample_size: u64,
}

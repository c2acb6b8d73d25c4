use thiserror::Error;

/// Errors surfaced by interning and store configuration.
///
/// A value type without `Eq + Hash` cannot reach any entry point: that
/// capability check happens at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InternError {
    /// The allocator refused memory for a bucket slot or a resized
    /// bucket array. The store is unchanged by the failed call.
    #[error("allocation failed while reserving {requested} interner slots")]
    AllocationFailure { requested: usize },

    /// `initial_bucket_count` must be positive.
    #[error("invalid initial bucket count {0}: must be positive")]
    InvalidBucketCount(usize),
}

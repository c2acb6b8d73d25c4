//! Store configuration.

use crate::error::InternError;

/// Bucket count used when none is configured.
pub const DEFAULT_BUCKET_COUNT: usize = 16;

/// Ratio of slots to buckets above which the bucket array doubles.
pub const MAX_LOAD_FACTOR: f64 = 0.75;

/// Options read once, when a store is created.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    initial_bucket_count: usize,
}

impl StoreConfig {
    /// Validate and build a config. Returns
    /// [`InternError::InvalidBucketCount`] when `initial_bucket_count` is 0.
    pub fn new(initial_bucket_count: usize) -> Result<Self, InternError> {
        if initial_bucket_count == 0 {
            return Err(InternError::InvalidBucketCount(initial_bucket_count));
        }
        Ok(Self {
            initial_bucket_count,
        })
    }

    /// Number of buckets a new store starts with.
    pub fn initial_bucket_count(&self) -> usize {
        self.initial_bucket_count
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_bucket_count: DEFAULT_BUCKET_COUNT,
        }
    }
}

/// True when holding `slots` entries in `buckets` buckets exceeds the
/// maximum load factor.
#[inline]
pub(crate) fn over_load(slots: usize, buckets: usize) -> bool {
    slots as f64 > buckets as f64 * MAX_LOAD_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sixteen_buckets() {
        assert_eq!(StoreConfig::default().initial_bucket_count(), 16);
    }

    #[test]
    fn zero_buckets_rejected() {
        assert_eq!(
            StoreConfig::new(0),
            Err(InternError::InvalidBucketCount(0))
        );
        assert_eq!(StoreConfig::new(3).unwrap().initial_bucket_count(), 3);
    }

    #[test]
    fn load_threshold() {
        assert!(!over_load(12, 16));
        assert!(over_load(13, 16));
        assert!(!over_load(0, 1));
        assert!(over_load(1, 1));
    }
}

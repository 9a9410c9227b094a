//! Address book configuration.

/// Configuration for the address book tables.
#[derive(Debug, Clone)]
pub struct AddressBookConfig {
    /// Number of buckets in the new table.
    pub new_bucket_count: usize,
    /// Number of buckets in the tried table.
    pub tried_bucket_count: usize,
    /// Slots per bucket, both tables.
    pub bucket_size: usize,
    /// Failures before a tried peer falls back into the new table.
    pub max_tried_failures: u32,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            new_bucket_count: 128,
            tried_bucket_count: 64,
            bucket_size: 32,
            max_tried_failures: 3,
        }
    }
}

impl AddressBookConfig {
    /// Testing config with smaller tables.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            new_bucket_count: 8,
            tried_bucket_count: 4,
            bucket_size: 4,
            max_tried_failures: 3,
        }
    }
}

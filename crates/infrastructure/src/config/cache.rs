//! Cache retention and admin-surface defaults.

use serde::{Deserialize, Serialize};

/// Cache behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default age threshold (days) for the cleanup command
    #[serde(default = "default_cleanup_max_age_days")]
    pub cleanup_max_age_days: u64,

    /// Default number of entries shown by the list command
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

const fn default_cleanup_max_age_days() -> u64 {
    30
}

const fn default_list_limit() -> usize {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cleanup_max_age_days: default_cleanup_max_age_days(),
            list_limit: default_list_limit(),
        }
    }
}

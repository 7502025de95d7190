//! TTL policy for every tier and namespace.

use std::time::Duration;

use tessera_core::CacheKey;

/// Time-to-live settings for the cache tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Upper bound for any entry in the local memory tier.
    pub local_ttl: Duration,
    /// Distributed TTL for `settings:{key}`.
    pub key_ttl: Duration,
    /// Distributed TTL for `settings:category:{category}`.
    pub category_ttl: Duration,
    /// Distributed TTL for `settings:public`.
    pub public_ttl: Duration,
    /// Distributed TTL for `settings:all`.
    pub all_ttl: Duration,
    /// TTL for the built-in default bundle served when the store is empty.
    pub defaults_ttl: Duration,
    /// TTL for resolved feature flag states.
    pub flag_ttl: Duration,
    /// How often the sweeper purges expired local entries.
    pub sweep_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            local_ttl: Duration::from_secs(300),
            key_ttl: Duration::from_secs(300),
            category_ttl: Duration::from_secs(300),
            public_ttl: Duration::from_secs(600),
            all_ttl: Duration::from_secs(900),
            defaults_ttl: Duration::from_secs(60),
            flag_ttl: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CachePolicy {
    /// Distributed-tier TTL for a namespace.
    pub fn distributed_ttl(&self, key: &CacheKey<'_>) -> Duration {
        match key {
            CacheKey::Setting(_) => self.key_ttl,
            CacheKey::Category(_) => self.category_ttl,
            CacheKey::Public => self.public_ttl,
            CacheKey::All => self.all_ttl,
        }
    }

    /// Local-tier TTL for a namespace: never outlives the distributed copy.
    pub fn local_ttl(&self, key: &CacheKey<'_>) -> Duration {
        self.local_ttl.min(self.distributed_ttl(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates_outlive_category_lookups() {
        let policy = CachePolicy::default();
        assert!(policy.distributed_ttl(&CacheKey::All) > policy.distributed_ttl(&CacheKey::Category("x")));
        assert!(policy.distributed_ttl(&CacheKey::Public) > policy.distributed_ttl(&CacheKey::Category("x")));
        assert!(policy.defaults_ttl < policy.all_ttl);
    }

    #[test]
    fn test_local_ttl_is_capped() {
        let policy = CachePolicy {
            local_ttl: Duration::from_secs(1000),
            ..Default::default()
        };
        assert_eq!(policy.local_ttl(&CacheKey::Setting("a")), policy.key_ttl);
        assert_eq!(policy.local_ttl(&CacheKey::All), policy.all_ttl);
    }
}

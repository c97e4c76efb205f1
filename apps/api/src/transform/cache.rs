//! Time-bounded memoization of transformation results.
//!
//! Entries are replaced whole and never patched; `clear` drops everything.
//! Timestamps use tokio's clock so expiry follows a paused test clock.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::transform::rules::RuleSelection;
use crate::transform::Descriptor;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache key derived from descriptor content, tenant slug and rule subset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(descriptor: &Descriptor, slug: &str, selection: &RuleSelection) -> Self {
        // serde_json maps are ordered, so equal descriptors serialize identically
        Self(format!("{slug}|{}|{descriptor}", selection.cache_key()))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Descriptor,
    stored_at: Instant,
}

pub struct TransformCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl TransformCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value unless it is older than the TTL; expired entries are evicted.
    pub fn get(&self, key: &CacheKey) -> Option<Descriptor> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, value: Descriptor) {
        self.entries.lock().insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ignores_rule_request_order() {
        let d = json!({"type": "card"});
        let a = CacheKey::new(&d, "acme", &RuleSelection::only(["limits", "features"]));
        let b = CacheKey::new(&d, "acme", &RuleSelection::only(["features", "limits"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_separates_tenants_and_descriptors() {
        let d = json!({"type": "card"});
        let acme = CacheKey::new(&d, "acme", &RuleSelection::All);
        assert_ne!(acme, CacheKey::new(&d, "globex", &RuleSelection::All));
        assert_ne!(
            acme,
            CacheKey::new(&json!({"type": "list"}), "acme", &RuleSelection::All)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = TransformCache::default();
        let key = CacheKey::new(&json!({}), "acme", &RuleSelection::All);
        cache.insert(key.clone(), json!({"cached": true}));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&key), Some(json!({"cached": true})));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&key), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let cache = TransformCache::default();
        cache.insert(CacheKey::new(&json!({}), "a", &RuleSelection::All), json!(1));
        cache.insert(CacheKey::new(&json!({}), "b", &RuleSelection::All), json!(2));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}

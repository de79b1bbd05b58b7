//! Bounded memoization for the expensive discovery queries.
//!
//! Keys are normalized argument tuples; there is no TTL, only the size
//! bound. Callers that need fresh data (live typeahead searches) bypass
//! the cache entirely.

use crate::ontology::{Property, ResourceClass, UniqueValue};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Matches the memoization bound of the discovery layer; roughly "a few
/// thousand distinct argument tuples".
pub const CACHE_CAPACITY: usize = 3600;

/// Full argument tuple of a memoized call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Classes,
    Properties {
        search: Option<String>,
        limit: usize,
    },
    UniqueValues {
        property_uri: String,
        search: Option<String>,
        limit: usize,
    },
}

#[derive(Debug, Clone)]
pub enum CacheValue {
    Classes(Vec<ResourceClass>),
    Properties(Vec<Property>),
    UniqueValues(Vec<UniqueValue>),
}

/// Shared, bounded LRU cache. Concurrent reads are safe behind the
/// lock; a lost race simply recomputes, which is idempotent.
#[derive(Debug)]
pub struct QueryCache {
    inner: Mutex<LruCache<CacheKey, CacheValue>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        match self.inner.lock() {
            Ok(mut cache) => cache.get(key).cloned(),
            Err(_) => None,
        }
    }

    pub fn insert(&self, key: CacheKey, value: CacheValue) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, value);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::ClassSource;

    fn class(uri: &str) -> ResourceClass {
        ResourceClass {
            uri: uri.to_string(),
            label: uri.to_string(),
            source: ClassSource::Auto,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = QueryCache::new();
        cache.insert(CacheKey::Classes, CacheValue::Classes(vec![class("http://ex/A")]));
        match cache.get(&CacheKey::Classes) {
            Some(CacheValue::Classes(classes)) => assert_eq!(classes.len(), 1),
            _ => panic!("Expected cached classes"),
        }
    }

    #[test]
    fn test_miss_on_distinct_key() {
        let cache = QueryCache::new();
        cache.insert(
            CacheKey::Properties {
                search: None,
                limit: 50,
            },
            CacheValue::Properties(Vec::new()),
        );
        assert!(cache
            .get(&CacheKey::Properties {
                search: None,
                limit: 100,
            })
            .is_none());
        assert!(cache
            .get(&CacheKey::Properties {
                search: Some("x".to_string()),
                limit: 50,
            })
            .is_none());
    }

    #[test]
    fn test_capacity_bound_evicts_lru() {
        let cache = QueryCache::with_capacity(2);
        for i in 0..3 {
            cache.insert(
                CacheKey::UniqueValues {
                    property_uri: format!("http://ex/p{}", i),
                    search: None,
                    limit: 50,
                },
                CacheValue::UniqueValues(Vec::new()),
            );
        }
        assert_eq!(cache.len(), 2);
        assert!(cache
            .get(&CacheKey::UniqueValues {
                property_uri: "http://ex/p0".to_string(),
                search: None,
                limit: 50,
            })
            .is_none());
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::new();
        cache.insert(CacheKey::Classes, CacheValue::Classes(Vec::new()));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;
        let cache = Arc::new(QueryCache::new());
        let mut handles = Vec::new();
        for i in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                cache.insert(
                    CacheKey::Properties {
                        search: Some(format!("t{}", i)),
                        limit: 50,
                    },
                    CacheValue::Properties(Vec::new()),
                );
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}

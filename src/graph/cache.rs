//! Bounded LRU cache of parsed syntax trees, keyed by file path
//!
//! Entries are slots in a [`TreePool`]. The cache decides *which* tree goes
//! and when; the pool performs the release. Eviction and release happen inside
//! one `&mut self` call, so no caller can observe a released tree.
//!
//! # Thread Safety
//!
//! **This cache is NOT thread-safe.** All mutating methods take `&mut self`.
//! A cache belongs to exactly one pipeline run.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use super::tree_pool::{TreeHandle, TreePool, TreeSlot};

/// Default number of trees kept alive at once
pub const DEFAULT_AST_CACHE_CAPACITY: usize = 50;

/// Cache statistics for monitoring effectiveness
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
    pub evictions: usize,
    pub released: usize,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache over tree handles
///
/// `order` holds paths from most to least recently used.
#[derive(Debug)]
pub struct AstCache<T: TreeHandle> {
    capacity: usize,
    entries: HashMap<String, TreeSlot>,
    order: VecDeque<String>,
    pool: TreePool<T>,
    hits: usize,
    misses: usize,
    evictions: usize,
}

impl<T: TreeHandle> AstCache<T> {
    /// Create a cache holding at most `capacity` trees (clamped to at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            pool: TreePool::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a tree and promote it to most recently used
    pub fn get(&mut self, path: &str) -> Option<&T> {
        match self.entries.get(path).copied() {
            Some(slot) => {
                self.hits += 1;
                self.touch(path);
                self.pool.get(slot)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up a tree without touching recency or stats
    pub fn peek(&self, path: &str) -> Option<&T> {
        self.entries
            .get(path)
            .and_then(|&slot| self.pool.get(slot))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert a tree as most recently used
    ///
    /// Replacing an existing path releases the old tree. Inserting a new path
    /// into a full cache evicts and releases the least recently used tree first.
    pub fn set(&mut self, path: impl Into<String>, tree: T) {
        let path = path.into();

        if let Some(old) = self.entries.remove(&path) {
            self.pool.reclaim(old);
            self.remove_from_order(&path);
        } else if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        let slot = self.pool.admit(tree);
        self.entries.insert(path.clone(), slot);
        self.order.push_front(path);
    }

    /// Evict and release the least recently used tree
    ///
    /// Returns the evicted path, or None when the cache is empty.
    pub fn evict_lru(&mut self) -> Option<String> {
        let path = self.order.pop_back()?;
        if let Some(slot) = self.entries.remove(&path) {
            self.pool.reclaim(slot);
            self.evictions += 1;
        }
        Some(path)
    }

    /// Release every cached tree. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        self.entries.clear();
        self.order.clear();
        self.pool.release_all()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Paths from most to least recently used
    pub fn recency(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            evictions: self.evictions,
            released: self.pool.released(),
        }
    }

    fn touch(&mut self, path: &str) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_front(key);
            }
        }
    }

    fn remove_from_order(&mut self, path: &str) {
        if let Some(pos) = self.order.iter().position(|p| p == path) {
            self.order.remove(pos);
        }
    }
}

impl<T: TreeHandle> Default for AstCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_AST_CACHE_CAPACITY)
    }
}

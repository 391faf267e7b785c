//! FIFO response cache.
//!
//! Bounds memory by entry count, evicting the oldest-inserted entries when
//! a new key would exceed the configured capacity. Lookups never reorder
//! entries.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

use crate::state::Body;

/// Capacity policy of a [`ResponseCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Store nothing; every navigation is a miss.
    Disabled,
    /// Never evict.
    Unlimited,
    /// Keep at most `n` entries.
    Bounded(NonZeroUsize),
}

impl From<i64> for CachePolicy {
    /// `0` disables the cache, negative values are unlimited, positive
    /// values bound the entry count.
    fn from(capacity: i64) -> Self {
        match usize::try_from(capacity) {
            Ok(n) => match NonZeroUsize::new(n) {
                Some(n) => CachePolicy::Bounded(n),
                None => CachePolicy::Disabled,
            },
            Err(_) => CachePolicy::Unlimited,
        }
    }
}

/// Mapping from normalized URL to response body.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, Body>,
    /// Front = oldest insertion, back = newest.
    order: VecDeque<String>,
    policy: CachePolicy,
}

impl ResponseCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            policy,
        }
    }

    /// Look up a cached body by URL.
    pub fn get(&self, url: &str) -> Option<&Body> {
        self.entries.get(url)
    }

    /// Insert a body, evicting the oldest entries as needed.
    ///
    /// Overwriting an existing key keeps its original insertion position.
    pub fn put(&mut self, url: String, body: Body) {
        let limit = match self.policy {
            CachePolicy::Disabled => return,
            CachePolicy::Unlimited => None,
            CachePolicy::Bounded(n) => Some(n.get()),
        };

        if let Some(existing) = self.entries.get_mut(&url) {
            *existing = body;
            return;
        }

        if let Some(n) = limit
            && self.entries.len() >= n
        {
            let evict = self.entries.len() - n + 1;
            for _ in 0..evict {
                if let Some(oldest) = self.order.pop_front() {
                    log::debug!("cache evict {oldest}");
                    self.entries.remove(&oldest);
                }
            }
        }

        self.order.push_back(url.clone());
        self.entries.insert(url, body);
    }

    /// Whether `url` is cached.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Number of cached entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Cached URLs, oldest insertion first.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

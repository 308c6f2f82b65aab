//! Per-user TTL cache for generated insights

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// How long a generated insight stays valid
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    insights: String,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

/// In-memory insight cache keyed by user id
///
/// Concurrent misses for the same user are not coalesced; each one calls the
/// generator and the last insert wins.
#[derive(Debug)]
pub struct InsightCache {
    ttl: Duration,
    entries: RwLock<HashMap<i64, CacheEntry>>,
}

impl Default for InsightCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl InsightCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, user_id: i64) -> Option<String> {
        self.get_at(user_id, Instant::now())
    }

    /// Look up an entry as of `now`
    pub fn get_at(&self, user_id: i64, now: Instant) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&user_id)
            .filter(|e| !e.is_expired(now, self.ttl))
            .map(|e| e.insights.clone())
    }

    pub fn insert(&self, user_id: i64, insights: String) {
        self.insert_at(user_id, insights, Instant::now());
    }

    pub fn insert_at(&self, user_id: i64, insights: String, now: Instant) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        // Clean up expired entries while we hold the lock
        entries.retain(|_, e| !e.is_expired(now, self.ttl));

        entries.insert(
            user_id,
            CacheEntry {
                insights,
                inserted_at: now,
            },
        );
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now, self.ttl));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

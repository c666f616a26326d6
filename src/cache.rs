//! Time-bounded cache of generated recommendation lists.
//!
//! Entries are keyed by listener and request kind and stored as track ids so
//! a cached list always resolves against the current catalog. Expiry is lazy:
//! stale entries are invisible to lookups and only leave memory on
//! [`RecommendationCache::prune_expired`] or replacement.

use crate::hash_index::WeightedHashIndex;
use crate::model::{ListenerId, TrackId};
use log::{debug, trace};
use std::time::{Duration, Instant};

/// Which generator produced a cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    WeeklyDiscovery,
    Radio { seed: TrackId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub listener: ListenerId,
    pub kind: RequestKind,
}

impl CacheKey {
    #[must_use]
    pub fn weekly(listener: ListenerId) -> Self {
        Self { listener, kind: RequestKind::WeeklyDiscovery }
    }

    #[must_use]
    pub fn radio(listener: ListenerId, seed: TrackId) -> Self {
        Self { listener, kind: RequestKind::Radio { seed } }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    track_ids: Vec<TrackId>,
    created_at: Instant,
    generated_limit: usize,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) < ttl
    }
}

/// Recommendation lists with a fixed time-to-live.
#[derive(Debug)]
pub struct RecommendationCache {
    entries: WeightedHashIndex<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl RecommendationCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: WeightedHashIndex::new(), ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entries currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CacheKey, limit: usize) -> Option<Vec<TrackId>> {
        self.get_at(key, limit, Instant::now())
    }

    /// Cached ids for `key`, cut to `limit`.
    ///
    /// A hit needs an entry younger than the TTL that was generated for at
    /// least `limit` tracks. A smaller entry cannot answer a bigger request.
    pub fn get_at(&self, key: &CacheKey, limit: usize, now: Instant) -> Option<Vec<TrackId>> {
        let entry = self.entries.get(key)?;
        if !entry.is_fresh(now, self.ttl) || entry.generated_limit < limit {
            trace!("Cache miss for {key:?} (limit {limit})");
            return None;
        }
        trace!("Cache hit for {key:?} (limit {limit})");
        Some(entry.track_ids.iter().copied().take(limit).collect())
    }

    pub fn put(&mut self, key: CacheKey, track_ids: Vec<TrackId>, generated_limit: usize) {
        self.put_at(key, track_ids, generated_limit, Instant::now());
    }

    /// Stores a list, replacing whatever `key` held before.
    pub fn put_at(&mut self, key: CacheKey, track_ids: Vec<TrackId>, generated_limit: usize, now: Instant) {
        self.entries.put(key, CacheEntry { track_ids, created_at: now, generated_limit });
    }

    pub fn prune_expired(&mut self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    /// Drops every entry at or past its TTL and returns how many went.
    pub fn prune_expired_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now, ttl))
            .map(|(key, _)| *key)
            .collect();

        for key in &expired {
            self.entries.remove(key);
        }
        if !expired.is_empty() {
            debug!("Pruned {} expired recommendation lists", expired.len());
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn test_entry_served_until_ttl() {
        let mut cache = RecommendationCache::new(TTL);
        let start = Instant::now();
        cache.put_at(CacheKey::weekly(1), vec![3, 1, 2], 3, start);

        let just_before = start + TTL - Duration::from_secs(1);
        assert_eq!(cache.get_at(&CacheKey::weekly(1), 3, just_before), Some(vec![3, 1, 2]));
        assert_eq!(cache.get_at(&CacheKey::weekly(1), 3, start + TTL), None);
        assert_eq!(cache.get_at(&CacheKey::weekly(1), 3, start + TTL * 2), None);
    }

    #[test]
    fn test_limit_rules() {
        let mut cache = RecommendationCache::new(TTL);
        let start = Instant::now();
        cache.put_at(CacheKey::weekly(1), vec![5, 6], 10, start);

        // Fewer ids than requested is fine if generation was asked for that many.
        assert_eq!(cache.get_at(&CacheKey::weekly(1), 10, start), Some(vec![5, 6]));
        assert_eq!(cache.get_at(&CacheKey::weekly(1), 1, start), Some(vec![5]));
        assert_eq!(cache.get_at(&CacheKey::weekly(1), 11, start), None);
    }

    #[test]
    fn test_keys_do_not_collide() {
        let mut cache = RecommendationCache::new(TTL);
        let now = Instant::now();
        cache.put_at(CacheKey::weekly(1), vec![1], 5, now);
        cache.put_at(CacheKey::radio(1, 7), vec![2], 5, now);
        cache.put_at(CacheKey::radio(1, 8), vec![3], 5, now);
        cache.put_at(CacheKey::weekly(2), vec![4], 5, now);

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get_at(&CacheKey::radio(1, 7), 5, now), Some(vec![2]));
        assert_eq!(cache.get_at(&CacheKey::radio(1, 8), 5, now), Some(vec![3]));
        assert_eq!(cache.get_at(&CacheKey::radio(2, 7), 5, now), None);
    }

    #[test]
    fn test_prune_removes_only_stale_entries() {
        let mut cache = RecommendationCache::new(TTL);
        let start = Instant::now();
        cache.put_at(CacheKey::weekly(1), vec![1], 5, start);
        cache.put_at(CacheKey::weekly(2), vec![2], 5, start + Duration::from_secs(20 * 60));
        cache.put_at(CacheKey::radio(3, 9), vec![3], 5, start + Duration::from_secs(25 * 60));

        let later = start + Duration::from_secs(40 * 60);
        assert_eq!(cache.prune_expired_at(later), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.prune_expired_at(later), 0);
        assert_eq!(cache.get_at(&CacheKey::weekly(2), 5, later), Some(vec![2]));

        assert_eq!(cache.prune_expired_at(start + TTL * 3), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_replaces_and_restarts_ttl() {
        let mut cache = RecommendationCache::new(TTL);
        let start = Instant::now();
        cache.put_at(CacheKey::weekly(1), vec![1], 5, start);
        cache.put_at(CacheKey::weekly(1), vec![9], 5, start + TTL);

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get_at(&CacheKey::weekly(1), 5, start + TTL + Duration::from_secs(60)),
            Some(vec![9])
        );
    }

    #[test]
    fn test_clear() {
        let mut cache = RecommendationCache::new(TTL);
        cache.put(CacheKey::weekly(1), vec![1], 5);
        assert_eq!(cache.get(&CacheKey::weekly(1), 5), Some(vec![1]));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&CacheKey::weekly(1), 5), None);
    }
}

//! # Recommendation Engine
//!
//! Orchestrates the similarity graph, the candidate strategies and the
//! recommendation cache behind an `&self` API that can be shared across
//! threads.
//!
//! ## Weekly discovery
//!
//! | Stage         | Quota (default)         |
//! |---------------|-------------------------|
//! | collaborative | `floor(limit · 0.6)`    |
//! | content       | `floor(limit · 0.3)`    |
//! | popularity    | `floor(limit · 0.1)`    |
//! | genre fill    | whatever is still open  |
//!
//! ## Seeded radio
//!
//! | Stage         | Quota (default)         |
//! |---------------|-------------------------|
//! | same artist   | `floor(limit · 0.2)`    |
//! | same genre    | `floor(limit · 0.4)`    |
//! | collaborative | `floor(limit · 0.3)`    |
//! | popularity    | whatever is still open  |
//!
//! Both pipelines deduplicate by track id (first stage wins), shuffle the
//! pool with the engine's RNG and cut it to `limit`. Results are cached per
//! listener and request kind until the TTL runs out or the system is
//! refreshed. A list generated from a graph that a refresh has replaced in
//! the meantime is returned but not cached.
//!
//! ## Snapshots
//!
//! The graph is rebuilt from the store only on construction and on
//! [`RecommendationEngine::refresh_system`]. Listener records are read from
//! the store on every request, so favorite exclusion is always current while
//! similarity and the track catalog follow the last rebuild.

use crate::blend::{quota, BlendedPool};
use crate::cache::{CacheKey, RecommendationCache};
use crate::config::EngineConfig;
use crate::graph::{GraphState, SimilarityGraph};
use crate::model::{Listener, ListenerId, Track, TrackId};
use crate::store::CatalogStore;
use crate::strategy::{
    CollaborativeStrategy, ContentStrategy, GenreFillStrategy, PopularityStrategy, SameArtistStrategy,
    SameGenreStrategy, StrategyContext,
};
use anyhow::{Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

/// Point-in-time counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatistics {
    pub listeners: usize,
    pub tracks: usize,
    pub edges: usize,
    pub cached_lists: usize,
    pub graph_state: GraphState,
}

impl fmt::Display for EngineStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Listeners:        {}", self.listeners)?;
        writeln!(f, "Tracks:           {}", self.tracks)?;
        writeln!(f, "Similarity edges: {}", self.edges)?;
        writeln!(f, "Cached lists:     {}", self.cached_lists)?;
        write!(f, "Graph state:      {:?}", self.graph_state)
    }
}

pub struct RecommendationEngine<S: CatalogStore> {
    store: Arc<S>,
    config: EngineConfig,
    graph: RwLock<Arc<SimilarityGraph>>,
    cache: Mutex<RecommendationCache>,
    rng: Mutex<StdRng>,
}

impl<S: CatalogStore> fmt::Debug for RecommendationEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("config", &self.config)
            .field("statistics", &self.statistics())
            .finish_non_exhaustive()
    }
}

impl<S: CatalogStore> RecommendationEngine<S> {
    /// Validates `config` and builds the first graph from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`EngineConfig::validate`].
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        Self::with_rng(store, config, StdRng::from_entropy())
    }

    /// Like [`RecommendationEngine::new`], with a fixed shuffle seed so
    /// results are reproducible.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`EngineConfig::validate`].
    pub fn with_seed(store: Arc<S>, config: EngineConfig, seed: u64) -> Result<Self> {
        Self::with_rng(store, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<S>, config: EngineConfig, rng: StdRng) -> Result<Self> {
        config.validate().context("Refusing to start recommendation engine")?;
        let graph = SimilarityGraph::build(store.as_ref(), &config);
        let cache = RecommendationCache::new(config.cache_ttl());
        Ok(Self {
            store,
            config,
            graph: RwLock::new(Arc::new(graph)),
            cache: Mutex::new(cache),
            rng: Mutex::new(rng),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn graph(&self) -> Arc<SimilarityGraph> {
        Arc::clone(&self.graph.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, RecommendationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Up to `limit` tracks blended from collaborative, content and
    /// popularity candidates. Unknown listeners get an empty list.
    pub fn generate_weekly_discovery(&self, listener: ListenerId, limit: usize) -> Vec<Track> {
        let Some(listener) = self.store.listener_by_id(listener) else {
            debug!("Weekly discovery for unknown listener {listener}");
            return Vec::new();
        };
        let graph = self.graph();
        self.cached_or_generate(&graph, CacheKey::weekly(listener.id), limit, || {
            self.weekly_pipeline(&graph, &listener, limit)
        })
    }

    /// Up to `limit` tracks around `seed`. Without a seed, or with one the
    /// store cannot resolve, this is weekly discovery.
    pub fn generate_seeded_radio(&self, listener: ListenerId, seed: Option<TrackId>, limit: usize) -> Vec<Track> {
        let Some(seed_id) = seed else {
            return self.generate_weekly_discovery(listener, limit);
        };
        let Some(seed) = self.store.track_by_id(seed_id) else {
            debug!("Radio seed {seed_id} not in catalog, falling back to weekly discovery");
            return self.generate_weekly_discovery(listener, limit);
        };
        let Some(listener) = self.store.listener_by_id(listener) else {
            debug!("Radio for unknown listener {listener}");
            return Vec::new();
        };
        let graph = self.graph();
        self.cached_or_generate(&graph, CacheKey::radio(listener.id, seed.id), limit, || {
            self.radio_pipeline(&graph, &listener, &seed, limit)
        })
    }

    /// Listeners most similar to `listener`, strongest first.
    pub fn similar_listeners(&self, listener: ListenerId, limit: usize) -> Vec<(ListenerId, f64)> {
        self.graph().find_similar_listeners(listener, limit)
    }

    /// Rebuilds the graph from the store and drops every cached list.
    ///
    /// The new graph is built without holding any lock; requests running
    /// meanwhile keep using the previous snapshot and skip the cache write.
    pub fn refresh_system(&self) {
        let started = Instant::now();
        let graph = SimilarityGraph::build(self.store.as_ref(), &self.config);
        *self.graph.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(graph);
        self.cache().clear();
        info!("Recommendation system refreshed in {:?}", started.elapsed());
    }

    /// Removes expired cache entries and returns how many were removed.
    pub fn prune_expired_cache(&self) -> usize {
        self.cache().prune_expired()
    }

    #[must_use]
    pub fn statistics(&self) -> EngineStatistics {
        let graph = self.graph();
        EngineStatistics {
            listeners: graph.node_count(),
            tracks: graph.track_count(),
            edges: graph.edge_count(),
            cached_lists: self.cache().len(),
            graph_state: graph.state(),
        }
    }

    fn cached_or_generate(
        &self,
        graph: &Arc<SimilarityGraph>,
        key: CacheKey,
        limit: usize,
        generate: impl FnOnce() -> Vec<Track>,
    ) -> Vec<Track> {
        if limit == 0 {
            return Vec::new();
        }
        if let Some(ids) = self.cache().get(&key, limit) {
            return ids.into_iter().filter_map(|id| graph.track(id).cloned()).collect();
        }

        let tracks = generate();
        if tracks.is_empty() {
            return tracks;
        }
        // Checked under the cache lock: refresh swaps the graph before it
        // clears the cache.
        let mut cache = self.cache();
        if Arc::ptr_eq(graph, &self.graph()) {
            cache.put(key, tracks.iter().map(|t| t.id).collect(), limit);
        } else {
            debug!("Graph replaced while generating for {key:?}, not caching");
        }
        tracks
    }

    fn weekly_pipeline(&self, graph: &SimilarityGraph, listener: &Listener, limit: usize) -> Vec<Track> {
        let ctx = StrategyContext::new(graph, listener);
        let shares = self.config.discovery;
        let mut pool = BlendedPool::new();

        pool.fill(&CollaborativeStrategy, &ctx, quota(limit, shares.collaborative));
        pool.fill(&ContentStrategy::new(self.config.content), &ctx, quota(limit, shares.content));
        pool.fill(&PopularityStrategy, &ctx, quota(limit, shares.popularity));
        if pool.len() < limit {
            let remaining = limit - pool.len();
            pool.fill(&GenreFillStrategy::new(remaining), &ctx, remaining);
        }

        self.finish(pool, limit)
    }

    fn radio_pipeline(&self, graph: &SimilarityGraph, listener: &Listener, seed: &Track, limit: usize) -> Vec<Track> {
        let ctx = StrategyContext::new(graph, listener);
        let shares = self.config.radio;
        let mut pool = BlendedPool::excluding([seed.id]);

        pool.fill(&SameArtistStrategy::new(seed), &ctx, quota(limit, shares.same_artist));
        pool.fill(&SameGenreStrategy::new(seed), &ctx, quota(limit, shares.same_genre));
        pool.fill(&CollaborativeStrategy, &ctx, quota(limit, shares.collaborative));
        let remaining = limit.saturating_sub(pool.len());
        pool.fill(&PopularityStrategy, &ctx, remaining);

        self.finish(pool, limit)
    }

    fn finish(&self, pool: BlendedPool, limit: usize) -> Vec<Track> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.finish(&mut *rng, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

    const GENRES: [&str; 4] = ["rock", "jazz", "electronic", "folk"];

    fn fixture() -> MemoryStore {
        let store = MemoryStore::new();
        for id in 1..=24u64 {
            let genre = GENRES[(id % 4) as usize];
            store.upsert_track(
                Track::new(id, &format!("track {id}"), &format!("artist {}", id % 6), genre)
                    .with_stats(id * 37 % 500, id % 9, (id % 5) as f64),
            );
        }
        store.upsert_listener(Listener::new(1).with_favorites([1, 2, 3]).with_genres(["rock", "jazz"]));
        store.upsert_listener(Listener::new(2).with_favorites([1, 2, 3, 4, 5]).with_genres(["rock", "jazz"]));
        store.upsert_listener(Listener::new(3).with_favorites([2, 3, 6, 7]).with_genres(["jazz"]));
        store.upsert_listener(Listener::new(4).with_favorites([10, 11]).with_genres(["folk"]));
        store.upsert_listener(Listener::new(5));
        store
    }

    fn engine(seed: u64) -> RecommendationEngine<MemoryStore> {
        RecommendationEngine::with_seed(Arc::new(fixture()), EngineConfig::default(), seed).unwrap()
    }

    fn ids(tracks: &[Track]) -> Vec<TrackId> {
        tracks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_empty_catalog_yields_empty_discovery() {
        let engine = RecommendationEngine::with_seed(Arc::new(MemoryStore::new()), EngineConfig::default(), 1).unwrap();
        assert!(engine.generate_weekly_discovery(1, 20).is_empty());

        let stats = engine.statistics();
        assert_eq!(stats.listeners, 0);
        assert_eq!(stats.cached_lists, 0);
        assert_eq!(stats.graph_state, GraphState::Scored);
    }

    #[test]
    fn test_unknown_listener_yields_empty_everywhere() {
        let engine = engine(1);
        assert!(engine.generate_weekly_discovery(99, 10).is_empty());
        assert!(engine.generate_seeded_radio(99, Some(5), 10).is_empty());
        assert!(engine.generate_seeded_radio(99, None, 10).is_empty());
        assert!(engine.similar_listeners(99, 10).is_empty());
    }

    #[test]
    fn test_weekly_discovery_is_unique_and_skips_favorites() {
        let engine = engine(3);
        let result = engine.generate_weekly_discovery(1, 10);
        assert_eq!(result.len(), 10);

        let unique: HashSet<TrackId> = result.iter().map(|t| t.id).collect();
        assert_eq!(unique.len(), result.len());
        assert!(unique.is_disjoint(&[1, 2, 3].into()));
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = engine(11).generate_weekly_discovery(1, 12);
        let b = engine(11).generate_weekly_discovery(1, 12);
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_radio_without_seed_equals_weekly_discovery() {
        let weekly = engine(5).generate_weekly_discovery(3, 8);
        let radio = engine(5).generate_seeded_radio(3, None, 8);
        assert_eq!(ids(&weekly), ids(&radio));

        let unresolved = engine(5).generate_seeded_radio(3, Some(404), 8);
        assert_eq!(ids(&weekly), ids(&unresolved));
    }

    #[test]
    fn test_radio_excludes_seed_and_leans_on_it() {
        let engine = engine(9);
        let seed = 8;
        let result = engine.generate_seeded_radio(4, Some(seed), 10);

        assert_eq!(result.len(), 10);
        assert!(!ids(&result).contains(&seed));
        let seed_track = engine.store().track_by_id(seed).unwrap();
        let related = result
            .iter()
            .filter(|t| t.shares_artist_with(&seed_track) || t.genre == seed_track.genre)
            .count();
        assert!(related >= 6, "only {related} tracks related to the seed");
    }

    #[test]
    fn test_cached_list_is_served_until_refresh() {
        let engine = engine(21);
        let first = engine.generate_weekly_discovery(1, 10);
        let again = engine.generate_weekly_discovery(1, 10);
        assert_eq!(ids(&first), ids(&again));

        let smaller = engine.generate_weekly_discovery(1, 4);
        assert_eq!(ids(&smaller), ids(&first)[..4]);
        assert_eq!(engine.statistics().cached_lists, 1);

        engine.refresh_system();
        assert_eq!(engine.statistics().cached_lists, 0);
        assert_eq!(engine.prune_expired_cache(), 0);
    }

    #[test]
    fn test_list_generated_across_a_refresh_is_not_cached() {
        let engine = engine(4);
        let listener = engine.store().listener_by_id(1).unwrap();
        let key = CacheKey::weekly(1);

        let stale = engine.graph();
        let tracks = engine.cached_or_generate(&stale, key, 5, || {
            let tracks = engine.weekly_pipeline(&stale, &listener, 5);
            engine.refresh_system();
            tracks
        });
        assert_eq!(tracks.len(), 5);
        assert_eq!(engine.statistics().cached_lists, 0);

        let current = engine.graph();
        engine.cached_or_generate(&current, key, 5, || engine.weekly_pipeline(&current, &listener, 5));
        assert_eq!(engine.statistics().cached_lists, 1);
    }

    #[test]
    fn test_content_stage_fills_with_engagement_only_tracks() {
        let store = MemoryStore::new();
        store.upsert_track(Track::new(1, "So What", "Miles Davis", "jazz"));
        for id in 2..=21u64 {
            store.upsert_track(
                Track::new(id, &format!("rock {id}"), &format!("band {id}"), "rock").with_stats(100 + id % 10, 5, 3.0),
            );
        }
        store.upsert_listener(Listener::new(1).with_favorites([1]).with_genres(["jazz"]));
        let engine = RecommendationEngine::with_seed(Arc::new(store), EngineConfig::default(), 1).unwrap();

        // No neighbors and no other jazz: three content slots plus one
        // popularity slot.
        let result = engine.generate_weekly_discovery(1, 10);
        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|track| track.genre == "rock"));
    }

    #[test]
    fn test_refresh_picks_up_new_favorites() {
        let store = Arc::new(fixture());
        let engine = RecommendationEngine::with_seed(Arc::clone(&store), EngineConfig::default(), 2).unwrap();
        assert!(engine.similar_listeners(5, 5).is_empty());

        for track in [10, 11] {
            assert!(store.add_favorite(5, track));
        }
        assert!(engine.similar_listeners(5, 5).is_empty());

        engine.refresh_system();
        let similar = engine.similar_listeners(5, 5);
        assert_eq!(similar.first().map(|&(id, _)| id), Some(4));
    }

    #[test]
    fn test_zero_limit_is_empty() {
        let engine = engine(1);
        assert!(engine.generate_weekly_discovery(1, 0).is_empty());
        assert_eq!(engine.statistics().cached_lists, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.discovery.collaborative = 0.9;
        let result = RecommendationEngine::new(Arc::new(MemoryStore::new()), config);
        assert!(result.is_err());
    }

    #[test]
    fn test_statistics_display() {
        let engine = engine(1);
        let text = engine.statistics().to_string();
        assert!(text.contains("Listeners:        5"));
        assert!(text.contains("Tracks:           24"));
    }
}

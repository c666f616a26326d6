//! Listener similarity and track recommendations for a music catalog.
//!
//! Core modules:
//! - [`hash_index`] - Chained hash index used for every id lookup
//! - [`similarity`] - Jaccard-based taste similarity between listeners
//! - [`graph`] - Similarity graph, propagation search, collaborative picks
//! - [`engine`] - Weekly discovery, seeded radio, caching and refresh
//!
//! ### Supporting Modules
//!
//! - [`model`] - Listener and track records
//! - [`store`] - Catalog store trait and the in-memory snapshot store
//! - [`algorithm`] - Content scoring and ranking order
//! - [`strategy`] - Candidate sources blended by the engine
//! - [`blend`] - Quota-capped, deduplicating blend pool
//! - [`cache`] - TTL cache of generated lists
//! - [`config`] - Engine tunables, validation and config file loading
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use std::sync::Arc;
//! use tastemap::config::EngineConfig;
//! use tastemap::engine::RecommendationEngine;
//! use tastemap::model::{Listener, Track};
//! use tastemap::store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! for id in 1..=6 {
//!     store.upsert_track(Track::new(id, &format!("Track {id}"), "Nina Simone", "soul"));
//! }
//! store.upsert_listener(Listener::new(1).with_favorites([1, 2]).with_genres(["soul"]));
//! store.upsert_listener(Listener::new(2).with_favorites([1, 2, 3, 4]).with_genres(["soul"]));
//!
//! let engine = RecommendationEngine::with_seed(Arc::new(store), EngineConfig::default(), 7)?;
//!
//! let similar = engine.similar_listeners(1, 5);
//! assert_eq!(similar[0].0, 2);
//!
//! let discovery = engine.generate_weekly_discovery(1, 4);
//! assert_eq!(discovery.len(), 4);
//! assert!(discovery.iter().all(|track| track.id > 2));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Algorithm Details
//!
//! ### Listener similarity
//! - Weighted Jaccard over favorite tracks (0.5), genres (0.3) and credited
//!   artists (0.2)
//! - Edges only above 0.1, recomputed from scratch on every refresh
//! - Indirect similarity is the strongest bottleneck over all paths
//!
//! ### Recommendations
//! - Weekly discovery blends 60% collaborative, 30% content and 10% popular
//!   tracks, then tops up from favorite genres
//! - Radio blends 20% same artist, 40% same genre and 30% collaborative
//!   tracks around a seed, then tops up from popular tracks
//! - Both are shuffled and cached for 30 minutes per listener and request
//!
//! ## Error Handling
//!
//! Lookups never fail: unknown listeners and tracks produce empty lists or
//! fall back to weekly discovery. `anyhow::Result` is reserved for config
//! validation and file loading.

pub mod algorithm;
pub mod blend;
pub mod cache;
pub mod cli;
pub mod completion;
pub mod config;
pub mod engine;
pub mod graph;
pub mod hash_index;
pub mod model;
pub mod similarity;
pub mod store;
pub mod strategy;

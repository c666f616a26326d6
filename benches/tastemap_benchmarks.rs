//! # tastemap Performance Benchmarks
//!
//! Benchmarks for the hot paths of the recommendation core.
//!
//! ## Benchmark Categories
//!
//! - **Hash Index**: insert with growth, lookups
//! - **Similarity Graph**: full rebuild, propagation search
//! - **Recommendations**: content scoring, weekly discovery
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench hash_index
//! cargo bench similarity_graph
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use tastemap::algorithm::{content_score, ContentProfile};
use tastemap::config::{ContentWeights, EngineConfig};
use tastemap::engine::RecommendationEngine;
use tastemap::graph::SimilarityGraph;
use tastemap::hash_index::WeightedHashIndex;
use tastemap::model::{Listener, Track};
use tastemap::store::MemoryStore;

const GENRES: [&str; 8] = ["rock", "jazz", "soul", "electronic", "folk", "metal", "hip-hop", "classical"];

/// Catalog with `listeners` listeners over 2000 tracks. Listeners in the
/// same taste cluster share most favorites, so the graph is dense enough to
/// exercise propagation.
fn create_benchmark_store(listeners: u64) -> MemoryStore {
    let store = MemoryStore::new();
    for id in 1..=2000u64 {
        let genre = GENRES[(id % GENRES.len() as u64) as usize];
        store.upsert_track(
            Track::new(id, &format!("Track {id:04}"), &format!("Artist {}", id / 20), genre)
                .with_stats(id * 31 % 5000, id % 40, (id % 50) as f64 / 10.0),
        );
    }
    for id in 1..=listeners {
        let cluster = id % 16;
        let favorites = (0..24).map(|i| 1 + (cluster * 120 + i * 5 + id % 7) % 2000);
        let genres = [GENRES[(cluster % 8) as usize], GENRES[((cluster + id) % 8) as usize]];
        store.upsert_listener(Listener::new(id).with_favorites(favorites).with_genres(genres));
    }
    store
}

/// Benchmark hash index insert and lookup
fn benchmark_hash_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_index");

    for size in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("put_with_growth", size), &size, |b, &size| {
            b.iter(|| {
                let mut index = WeightedHashIndex::new();
                for key in 0..size {
                    index.put(black_box(key), key * 2);
                }
                index
            })
        });
    }

    let index: WeightedHashIndex<u64, u64> = (0..10_000).map(|k| (k, k)).collect();
    group.bench_function("get_10000", |b| {
        b.iter(|| (0..10_000u64).filter_map(|k| index.get(black_box(&k))).count())
    });

    group.finish();
}

/// Benchmark graph rebuild and propagation
fn benchmark_similarity_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity_graph");
    group.sample_size(20);
    let config = EngineConfig::default();

    for listeners in [100u64, 400] {
        let store = create_benchmark_store(listeners);
        group.bench_with_input(BenchmarkId::new("rebuild", listeners), &store, |b, store| {
            b.iter(|| SimilarityGraph::build(black_box(store), &config))
        });
    }

    let graph = SimilarityGraph::build(&create_benchmark_store(400), &config);
    group.bench_function("find_similar_listeners", |b| {
        b.iter(|| graph.find_similar_listeners(black_box(17), 10))
    });
    group.bench_function("recommend_tracks", |b| {
        b.iter(|| graph.recommend_tracks(black_box(17), 20))
    });

    group.finish();
}

/// Benchmark content scoring and the full weekly pipeline
fn benchmark_recommendations(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommendations");

    let favorites: Vec<Track> = (1..=30)
        .map(|id| Track::new(id, "f", &format!("Artist {}", id % 6), GENRES[(id % 3) as usize]))
        .collect();
    let profile = ContentProfile::from_favorites(&favorites);
    let weights = ContentWeights::default();
    let candidates: Vec<Track> = (100..2100)
        .map(|id| Track::new(id, "c", &format!("Artist {}", id % 60), GENRES[(id % 8) as usize]).with_stats(id, id % 9, 3.5))
        .collect();
    group.bench_function("content_score_2000", |b| {
        b.iter(|| {
            candidates
                .iter()
                .map(|track| content_score(black_box(track), &profile, &weights))
                .sum::<f64>()
        })
    });

    let store = Arc::new(create_benchmark_store(400));
    group.bench_function("weekly_discovery_uncached", |b| {
        b.iter_batched(
            || RecommendationEngine::with_seed(Arc::clone(&store), EngineConfig::default(), 1).unwrap(),
            |engine| engine.generate_weekly_discovery(black_box(17), 20),
            BatchSize::LargeInput,
        )
    });

    let engine = RecommendationEngine::with_seed(Arc::clone(&store), EngineConfig::default(), 1).unwrap();
    engine.generate_weekly_discovery(17, 20);
    group.bench_function("weekly_discovery_cached", |b| {
        b.iter(|| engine.generate_weekly_discovery(black_box(17), 20))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_hash_index,
    benchmark_similarity_graph,
    benchmark_recommendations
);
criterion_main!(benches);

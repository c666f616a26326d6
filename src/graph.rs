//! # Similarity Graph
//!
//! Undirected weighted graph over listener ids. Edges carry the composite
//! taste similarity of two listeners (see [`crate::similarity`]) and exist
//! only above the materialization threshold.
//!
//! ## Lifecycle
//!
//! ```text
//! Empty --add_listener/add_track--> Populated --compute_similarities--> Scored
//!   ^                                   ^                                  |
//!   |                                   +------ add_listener/add_track ----+
//! ```
//!
//! Edges are never patched: every `compute_similarities` call clears them and
//! rescores all listener pairs. The engine treats a scored graph as an
//! immutable snapshot and replaces it wholesale on refresh.
//!
//! ## Propagation
//!
//! [`SimilarityGraph::find_similar_listeners`] is a best-path search shaped like
//! Dijkstra, but it maximizes a confidence instead of minimizing a distance.
//! The confidence of a path is its weakest edge, so similarity degrades along
//! a chain of listeners and never accumulates.

use crate::algorithm::{compare_ranked, rank_scored};
use crate::config::{EngineConfig, SimilarityWeights};
use crate::hash_index::WeightedHashIndex;
use crate::model::{Listener, ListenerId, Track, TrackId};
use crate::similarity::{composite_similarity, TasteProfile};
use crate::store::CatalogStore;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

/// Where a graph is in its build cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Empty,
    Populated,
    Scored,
}

/// One half of a symmetric edge, stored in the adjacency list of its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub neighbor: ListenerId,
    pub weight: f64,
}

/// Frontier entry of the propagation search. Higher confidence pops first,
/// lower id breaks ties.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    confidence: f64,
    listener: ListenerId,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.confidence
            .total_cmp(&other.confidence)
            .then_with(|| other.listener.cmp(&self.listener))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

/// Listener similarity graph plus the listeners and tracks it was built from.
#[derive(Debug)]
pub struct SimilarityGraph {
    listeners: WeightedHashIndex<ListenerId, Listener>,
    tracks: WeightedHashIndex<TrackId, Track>,
    adjacency: WeightedHashIndex<ListenerId, Vec<Edge>>,
    edge_count: usize,
    state: GraphState,
    weights: SimilarityWeights,
    edge_threshold: f64,
    neighbor_limit: usize,
    max_listeners: Option<usize>,
}

impl Default for SimilarityGraph {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl SimilarityGraph {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            listeners: WeightedHashIndex::new(),
            tracks: WeightedHashIndex::new(),
            adjacency: WeightedHashIndex::new(),
            edge_count: 0,
            state: GraphState::Empty,
            weights: config.similarity,
            edge_threshold: config.edge_threshold,
            neighbor_limit: config.neighbor_limit,
            max_listeners: config.max_listeners,
        }
    }

    /// Builds and scores a fresh graph from the current store contents.
    pub fn build(store: &dyn CatalogStore, config: &EngineConfig) -> Self {
        let mut graph = Self::new(config);
        for track in store.all_tracks() {
            graph.add_track(track);
        }
        for listener in store.all_listeners() {
            graph.add_listener(listener);
        }
        graph.compute_similarities();
        graph
    }

    #[must_use]
    pub fn state(&self) -> GraphState {
        self.state
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn listener(&self, id: ListenerId) -> Option<&Listener> {
        self.listeners.get(&id)
    }

    #[must_use]
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> + '_ {
        self.tracks.values()
    }

    /// Adjacency list of `id`; empty for unknown listeners.
    #[must_use]
    pub fn edges(&self, id: ListenerId) -> &[Edge] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registers a listener with no edges. Returns `false` if it was already
    /// present, in which case nothing changes.
    pub fn add_listener(&mut self, listener: Listener) -> bool {
        if self.adjacency.contains_key(&listener.id) {
            return false;
        }
        trace!("Adding listener {} to similarity graph", listener.id);
        self.adjacency.put(listener.id, Vec::new());
        self.listeners.put(listener.id, listener);
        self.state = GraphState::Populated;
        true
    }

    /// Registers a track for artist resolution and recommendation lookups.
    /// Returns `false` if it was already present.
    pub fn add_track(&mut self, track: Track) -> bool {
        if self.tracks.contains_key(&track.id) {
            return false;
        }
        self.tracks.put(track.id, track);
        self.state = GraphState::Populated;
        true
    }

    /// Clears every edge and rescores all listener pairs.
    ///
    /// Pair scoring is quadratic in the listener count and runs on the rayon
    /// pool; edges are inserted afterwards in a fixed order.
    pub fn compute_similarities(&mut self) {
        let started = Instant::now();
        for edges in self.adjacency.values_mut() {
            edges.clear();
        }
        self.edge_count = 0;

        let mut ids: Vec<ListenerId> = self.listeners.keys().copied().collect();
        ids.sort_unstable();

        if let Some(max) = self.max_listeners {
            if ids.len() > max {
                warn!(
                    "Skipping similarity scoring: {} listeners exceeds the configured maximum of {}",
                    ids.len(),
                    max
                );
                self.state = GraphState::Scored;
                return;
            }
        }

        let profiles: Vec<TasteProfile> = ids
            .iter()
            .filter_map(|id| self.listeners.get(id))
            .map(|listener| TasteProfile::build(listener, |track| self.tracks.get(&track)))
            .collect();

        let weights = self.weights;
        let threshold = self.edge_threshold;
        let scored: Vec<(usize, usize, f64)> = (0..profiles.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let profiles = &profiles;
                (i + 1..profiles.len()).filter_map(move |j| {
                    let weight = composite_similarity(&profiles[i], &profiles[j], &weights).min(1.0);
                    (weight > threshold).then_some((i, j, weight))
                })
            })
            .collect();

        for (i, j, weight) in scored {
            self.insert_edge(ids[i], ids[j], weight);
        }
        self.state = GraphState::Scored;

        info!(
            "Scored similarity graph: {} listeners, {} edges in {:?}",
            ids.len(),
            self.edge_count,
            started.elapsed()
        );
    }

    /// Adds the symmetric pair of edge halves between two known listeners.
    pub(crate) fn insert_edge(&mut self, a: ListenerId, b: ListenerId, weight: f64) {
        if a == b || !self.adjacency.contains_key(&a) || !self.adjacency.contains_key(&b) {
            return;
        }
        if let Some(edges) = self.adjacency.get_mut(&a) {
            edges.push(Edge { neighbor: b, weight });
        }
        if let Some(edges) = self.adjacency.get_mut(&b) {
            edges.push(Edge { neighbor: a, weight });
        }
        self.edge_count += 1;
    }

    /// Listeners transitively similar to `origin`, strongest first.
    ///
    /// The origin and anything at or below the edge threshold are left out.
    /// Unknown listeners get an empty result.
    #[must_use]
    pub fn find_similar_listeners(&self, origin: ListenerId, limit: usize) -> Vec<(ListenerId, f64)> {
        if limit == 0 || !self.adjacency.contains_key(&origin) {
            return Vec::new();
        }

        let mut confidence: WeightedHashIndex<ListenerId, f64> = WeightedHashIndex::new();
        let mut visited: HashSet<ListenerId> = HashSet::new();
        let mut frontier = BinaryHeap::new();

        confidence.put(origin, 1.0);
        frontier.push(Frontier { confidence: 1.0, listener: origin });

        while let Some(Frontier { confidence: current, listener }) = frontier.pop() {
            if !visited.insert(listener) {
                continue;
            }
            for edge in self.edges(listener) {
                if visited.contains(&edge.neighbor) {
                    continue;
                }
                let candidate = current.min(edge.weight);
                let known = confidence.get(&edge.neighbor).copied().unwrap_or(0.0);
                if candidate > known {
                    confidence.put(edge.neighbor, candidate);
                    frontier.push(Frontier { confidence: candidate, listener: edge.neighbor });
                }
            }
        }

        let mut similar: Vec<(ListenerId, f64)> = confidence
            .iter()
            .filter(|&(&id, &value)| id != origin && value > self.edge_threshold)
            .map(|(&id, &value)| (id, value))
            .collect();
        similar.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        similar.truncate(limit);

        debug!(
            "Listener {origin}: {} similar listeners reached from {} visited",
            similar.len(),
            visited.len()
        );
        similar
    }

    /// Collaborative candidates for `origin` with their accumulated scores.
    ///
    /// Each of the closest listeners endorses their favorites with their
    /// confidence; endorsements of the same track add up.
    #[must_use]
    pub fn recommend_tracks_scored(&self, origin: ListenerId, limit: usize) -> Vec<(Track, f64)> {
        let Some(listener) = self.listeners.get(&origin) else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let mut scores: WeightedHashIndex<TrackId, f64> = WeightedHashIndex::new();
        for (neighbor, neighbor_confidence) in self.find_similar_listeners(origin, self.neighbor_limit) {
            let Some(neighbor) = self.listeners.get(&neighbor) else {
                continue;
            };
            for &track in &neighbor.favorite_tracks {
                if listener.is_favorite(track) {
                    continue;
                }
                match scores.get_mut(&track) {
                    Some(score) => *score += neighbor_confidence,
                    None => {
                        scores.put(track, neighbor_confidence);
                    }
                }
            }
        }

        let mut scored: Vec<(Track, f64)> = scores
            .iter()
            .filter_map(|(id, &score)| self.tracks.get(id).map(|track| (track.clone(), score)))
            .collect();
        scored.sort_by(compare_ranked);
        scored.truncate(limit);
        scored
    }

    /// Top `limit` collaborative recommendations for `origin`.
    #[must_use]
    pub fn recommend_tracks(&self, origin: ListenerId, limit: usize) -> Vec<Track> {
        rank_scored(self.recommend_tracks_scored(origin, limit))
    }
}

//! # Catalog Store Interface
//!
//! The recommendation core never owns listeners or tracks. It reads them
//! through [`CatalogStore`], which the surrounding application implements on
//! top of its own persistence.
//!
//! [`MemoryStore`] is the in-process implementation used by tests, benchmarks
//! and the `tastemap` binary. It can be filled programmatically or from a
//! JSON [`CatalogSnapshot`]:
//!
//! ```json
//! {
//!   "listeners": [{ "id": 1, "favorite_tracks": [10, 11], "favorite_genres": ["jazz"] }],
//!   "tracks": [{ "id": 10, "title": "So What", "artist": "Miles Davis", "genre": "jazz" }]
//! }
//! ```

use crate::hash_index::WeightedHashIndex;
use crate::model::{Listener, ListenerId, Track, TrackId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// Read-only view of the listener/track catalog.
///
/// All reads are snapshot reads; missing ids are `None`, never errors.
pub trait CatalogStore: Send + Sync {
    fn all_listeners(&self) -> Vec<Listener>;
    fn all_tracks(&self) -> Vec<Track>;
    fn listener_by_id(&self, id: ListenerId) -> Option<Listener>;
    fn track_by_id(&self, id: TrackId) -> Option<Track>;
}

/// Serialized form of a whole catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub listeners: Vec<Listener>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl CatalogSnapshot {
    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog snapshot at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Catalog snapshot at {} is not valid JSON", path.display()))
    }
}

#[derive(Debug, Default)]
struct Inner {
    listeners: WeightedHashIndex<ListenerId, Listener>,
    tracks: WeightedHashIndex<TrackId, Track>,
    // Listing order, so repeated runs over one catalog see the same sequence
    listener_order: Vec<ListenerId>,
    track_order: Vec<TrackId>,
}

/// In-memory catalog guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let store = Self::new();
        for track in snapshot.tracks {
            store.upsert_track(track);
        }
        for listener in snapshot.listeners {
            store.upsert_listener(listener);
        }
        log::debug!(
            "Loaded catalog snapshot: {} listeners, {} tracks",
            store.listener_count(),
            store.track_count()
        );
        store
    }

    /// Loads a JSON snapshot file into a fresh store.
    ///
    /// # Errors
    ///
    /// Propagates [`CatalogSnapshot::load`] failures.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        Ok(Self::from_snapshot(CatalogSnapshot::load(path)?))
    }

    /// Inserts or replaces a listener.
    pub fn upsert_listener(&self, listener: Listener) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = listener.id;
        if inner.listeners.put(id, listener).is_none() {
            inner.listener_order.push(id);
        }
    }

    /// Inserts or replaces a track.
    pub fn upsert_track(&self, track: Track) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = track.id;
        if inner.tracks.put(id, track).is_none() {
            inner.track_order.push(id);
        }
    }

    /// Adds `track` to a listener's favorites. Returns `false` for unknown listeners.
    pub fn add_favorite(&self, listener: ListenerId, track: TrackId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.listeners.get_mut(&listener) {
            Some(entry) => {
                entry.favorite_tracks.insert(track);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).listeners.len()
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).tracks.len()
    }
}

impl CatalogStore for MemoryStore {
    fn all_listeners(&self) -> Vec<Listener> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .listener_order
            .iter()
            .filter_map(|id| inner.listeners.get(id).cloned())
            .collect()
    }

    fn all_tracks(&self) -> Vec<Track> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .track_order
            .iter()
            .filter_map(|id| inner.tracks.get(id).cloned())
            .collect()
    }

    fn listener_by_id(&self, id: ListenerId) -> Option<Listener> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.listeners.get(&id).cloned()
    }

    fn track_by_id(&self, id: TrackId) -> Option<Track> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tracks.get(&id).cloned()
    }
}

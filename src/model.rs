//! Catalog entities read by the recommendation core.
//!
//! Listeners and tracks are owned by the catalog store; the core only reads
//! them while building a graph or scoring candidates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type ListenerId = u64;
pub type TrackId = u64;

/// A listener and the taste signals they have declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub id: ListenerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub favorite_tracks: HashSet<TrackId>,
    #[serde(default)]
    pub favorite_genres: HashSet<String>,
    #[serde(default)]
    pub following: HashSet<ListenerId>,
}

impl Listener {
    #[must_use]
    pub fn new(id: ListenerId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_favorites(mut self, tracks: impl IntoIterator<Item = TrackId>) -> Self {
        self.favorite_tracks.extend(tracks);
        self
    }

    #[must_use]
    pub fn with_genres<S: Into<String>>(mut self, genres: impl IntoIterator<Item = S>) -> Self {
        self.favorite_genres.extend(genres.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn is_favorite(&self, track: TrackId) -> bool {
        self.favorite_tracks.contains(&track)
    }
}

/// A catalog track with its engagement counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub collaborators: Vec<String>,
    pub genre: String,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub average_rating: f64,
}

impl Track {
    #[must_use]
    pub fn new(id: TrackId, title: &str, artist: &str, genre: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            artist: artist.to_string(),
            genre: genre.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_stats(mut self, play_count: u64, favorite_count: u64, average_rating: f64) -> Self {
        self.play_count = play_count;
        self.favorite_count = favorite_count;
        self.average_rating = average_rating;
        self
    }

    #[must_use]
    pub fn with_collaborators<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.collaborators.extend(names.into_iter().map(Into::into));
        self
    }

    /// Primary artist followed by every collaborator.
    pub fn artists(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.artist.as_str()).chain(self.collaborators.iter().map(String::as_str))
    }

    /// Whether this track credits any artist credited on `other`.
    #[must_use]
    pub fn shares_artist_with(&self, other: &Track) -> bool {
        self.artists().any(|mine| other.artists().any(|theirs| theirs == mine))
    }

    /// `plays·1 + favorites·2 + rating·100`, monotonic in all three inputs.
    #[must_use]
    pub fn popularity_score(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let (plays, favorites) = (self.play_count as f64, self.favorite_count as f64);
        plays + favorites * 2.0 + self.average_rating * 100.0
    }
}

//! Track scoring algorithms for recommendations.
//!
//! Content-based scoring against a listener's favorites, and the shared
//! ranking order used by every strategy.

use crate::config::ContentWeights;
use crate::model::Track;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Genre and artist occurrence counts over a listener's favorites.
#[derive(Debug, Clone, Default)]
pub struct ContentProfile {
    genre_counts: HashMap<String, usize>,
    artist_counts: HashMap<String, usize>,
}

impl ContentProfile {
    /// Counts genres and credited artists over already-resolved favorites.
    pub fn from_favorites<'a>(favorites: impl IntoIterator<Item = &'a Track>) -> Self {
        let mut profile = Self::default();
        for track in favorites {
            *profile.genre_counts.entry(track.genre.clone()).or_insert(0) += 1;
            for artist in track.artists() {
                *profile.artist_counts.entry(artist.to_string()).or_insert(0) += 1;
            }
        }
        profile
    }

    #[must_use]
    pub fn genre_frequency(&self, genre: &str) -> usize {
        self.genre_counts.get(genre).copied().unwrap_or(0)
    }

    /// Sum over every artist credited on `track`.
    #[must_use]
    pub fn artist_frequency(&self, track: &Track) -> usize {
        track
            .artists()
            .map(|artist| self.artist_counts.get(artist).copied().unwrap_or(0))
            .sum()
    }
}

/// Content-based score of a candidate track.
///
/// ```text
/// score = 2.0·genreFreq + 3.0·artistFreq
///       + 0.1·ln(1 + plays) + 0.2·ln(1 + favorites) + 0.5·rating
/// ```
///
/// Engagement counters alone keep a track above zero, so only a track with
/// no match and no engagement at all scores `0.0`.
///
/// # Examples
///
/// ```
/// use tastemap::algorithm::{content_score, ContentProfile};
/// use tastemap::config::ContentWeights;
/// use tastemap::model::Track;
///
/// let favorite = Track::new(1, "So What", "Miles Davis", "jazz");
/// let profile = ContentProfile::from_favorites([&favorite]);
///
/// let candidate = Track::new(2, "Freddie Freeloader", "Miles Davis", "jazz");
/// let score = content_score(&candidate, &profile, &ContentWeights::default());
/// assert_eq!(score, 5.0);
///
/// let unheard = Track::new(3, "Teardrop", "Massive Attack", "trip-hop");
/// assert_eq!(content_score(&unheard, &profile, &ContentWeights::default()), 0.0);
///
/// let popular = unheard.with_stats(1000, 50, 4.8);
/// assert!(content_score(&popular, &profile, &ContentWeights::default()) > 0.0);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn content_score(track: &Track, profile: &ContentProfile, weights: &ContentWeights) -> f64 {
    weights.genre_frequency * profile.genre_frequency(&track.genre) as f64
        + weights.artist_frequency * profile.artist_frequency(track) as f64
        + weights.plays * (track.play_count as f64).ln_1p()
        + weights.favorites * (track.favorite_count as f64).ln_1p()
        + weights.rating * track.average_rating
}

/// Ranking order shared by all strategies: score descending, then
/// popularity descending, then id ascending.
#[must_use]
pub fn compare_ranked(a: &(Track, f64), b: &(Track, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| compare_popularity(&a.0, &b.0))
}

/// Popularity descending, then id ascending.
#[must_use]
pub fn compare_popularity(a: &Track, b: &Track) -> Ordering {
    b.popularity_score()
        .total_cmp(&a.popularity_score())
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts scored tracks with [`compare_ranked`] and drops the scores.
#[must_use]
pub fn rank_scored(mut scored: Vec<(Track, f64)>) -> Vec<Track> {
    scored.sort_by(compare_ranked);
    scored.into_iter().map(|(track, _)| track).collect()
}

//! Listener-to-listener taste similarity.
//!
//! ```text
//! similarity(a, b) = 0.5·J(tracks) + 0.3·J(genres) + 0.2·J(artists)
//! J(A, B)          = |A ∩ B| / |A ∪ B|,  J(∅, ∅) = 0
//! ```
//!
//! The artist set of a listener is every artist credited (primary or
//! collaborator) on a favorite track that resolves in the catalog.

use crate::config::SimilarityWeights;
use crate::model::{Listener, Track, TrackId};
use std::collections::HashSet;
use std::hash::Hash;

/// Jaccard index of two sets, `0.0` when both are empty.
///
/// ```
/// use std::collections::HashSet;
/// use tastemap::similarity::jaccard;
///
/// let a: HashSet<u64> = [1, 2].into();
/// let b: HashSet<u64> = [1, 3, 4].into();
/// assert_eq!(jaccard(&a, &b), 0.25);
/// ```
#[must_use]
pub fn jaccard<T: Hash + Eq>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|item| large.contains(item)).count();
    let union = a.len() + b.len() - intersection;

    #[allow(clippy::cast_precision_loss)]
    let index = intersection as f64 / union as f64;
    index
}

/// The three sets compared between listeners.
#[derive(Debug, Clone, Default)]
pub struct TasteProfile {
    pub tracks: HashSet<TrackId>,
    pub genres: HashSet<String>,
    pub artists: HashSet<String>,
}

impl TasteProfile {
    /// Builds a profile, resolving favorites through `resolve`. Favorites
    /// that do not resolve still count as tracks but contribute no artists.
    pub fn build<'a>(listener: &Listener, resolve: impl Fn(TrackId) -> Option<&'a Track>) -> Self {
        let artists = listener
            .favorite_tracks
            .iter()
            .filter_map(|&id| resolve(id))
            .flat_map(|track| track.artists().map(str::to_string))
            .collect();

        Self {
            tracks: listener.favorite_tracks.clone(),
            genres: listener.favorite_genres.clone(),
            artists,
        }
    }
}

/// Weighted sum of the three Jaccard components.
#[must_use]
pub fn composite_similarity(a: &TasteProfile, b: &TasteProfile, weights: &SimilarityWeights) -> f64 {
    weights.tracks * jaccard(&a.tracks, &b.tracks)
        + weights.genres * jaccard(&a.genres, &b.genres)
        + weights.artists * jaccard(&a.artists, &b.artists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[u64]) -> HashSet<u64> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_jaccard_edge_cases() {
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&[1]), &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&[1, 2, 3]), &set(&[1, 2, 3])), 1.0);
        assert_eq!(jaccard(&set(&[1, 2]), &set(&[3, 4])), 0.0);
    }

    #[test]
    fn test_jaccard_bounds_and_symmetry() {
        let samples = [
            set(&[]),
            set(&[1]),
            set(&[1, 2]),
            set(&[2, 3, 4]),
            set(&[1, 2, 3, 4, 5, 6]),
            set(&[7, 8, 9]),
        ];
        for a in &samples {
            for b in &samples {
                let index = jaccard(a, b);
                assert!((0.0..=1.0).contains(&index), "J out of bounds: {index}");
                assert_eq!(index, jaccard(b, a));
            }
            if !a.is_empty() {
                assert_eq!(jaccard(a, a), 1.0);
            }
        }
    }

    #[test]
    fn test_profile_resolves_artists_and_skips_missing_tracks() {
        let tracks = [
            Track::new(1, "a", "Bjork", "electronic").with_collaborators(["Thom Yorke"]),
            Track::new(2, "b", "Portishead", "trip-hop"),
        ];
        let listener = Listener::new(1).with_favorites([1, 2, 404]);
        let profile = TasteProfile::build(&listener, |id| tracks.iter().find(|t| t.id == id));

        assert_eq!(profile.tracks.len(), 3);
        assert_eq!(profile.artists.len(), 3);
        assert!(profile.artists.contains("Thom Yorke"));
    }

    #[test]
    fn test_composite_weights_components() {
        let a = TasteProfile {
            tracks: set(&[1, 2]),
            genres: ["jazz".to_string()].into(),
            artists: HashSet::new(),
        };
        let b = TasteProfile {
            tracks: set(&[1, 3, 4]),
            genres: ["jazz".to_string()].into(),
            artists: HashSet::new(),
        };
        let score = composite_similarity(&a, &b, &SimilarityWeights::default());
        assert!((score - (0.5 * 0.25 + 0.3 * 1.0)).abs() < 1e-12);
    }
}

//! # Candidate Strategies
//!
//! Every source of recommendation candidates implements [`CandidateStrategy`]:
//! given the request context and the ids already placed in the result, it
//! returns its candidates best first. How many of them make it into the
//! result is decided by the blender (see [`crate::blend`]), not here.
//!
//! | Strategy                  | Used by          | Order                           |
//! |---------------------------|------------------|---------------------------------|
//! | [`CollaborativeStrategy`] | discovery, radio | summed neighbor confidence      |
//! | [`ContentStrategy`]       | discovery        | content score                   |
//! | [`PopularityStrategy`]    | discovery, radio | popularity score                |
//! | [`GenreFillStrategy`]     | discovery        | genre name, then popularity     |
//! | [`SameArtistStrategy`]    | radio            | popularity score                |
//! | [`SameGenreStrategy`]     | radio            | popularity score                |
//!
//! All orders fall back to higher popularity, then lower id, so output is
//! deterministic for a given graph.

use crate::algorithm::{compare_popularity, content_score, rank_scored, ContentProfile};
use crate::config::ContentWeights;
use crate::graph::SimilarityGraph;
use crate::model::{Listener, Track, TrackId};
use std::collections::HashSet;

/// Everything a strategy may look at for one request.
#[derive(Debug)]
pub struct StrategyContext<'a> {
    pub graph: &'a SimilarityGraph,
    pub listener: &'a Listener,
    pub profile: ContentProfile,
}

impl<'a> StrategyContext<'a> {
    /// Builds the context, resolving the listener's favorites against the
    /// graph's track table. Unresolvable favorites are ignored.
    #[must_use]
    pub fn new(graph: &'a SimilarityGraph, listener: &'a Listener) -> Self {
        let profile = ContentProfile::from_favorites(
            listener.favorite_tracks.iter().filter_map(|&id| graph.track(id)),
        );
        Self { graph, listener, profile }
    }

    /// Catalog tracks that are neither favorites nor excluded.
    fn fresh_tracks<'s>(&'s self, exclude: &'s HashSet<TrackId>) -> impl Iterator<Item = &'a Track> + 's {
        self.graph
            .tracks()
            .filter(move |track| !self.listener.is_favorite(track.id) && !exclude.contains(&track.id))
    }
}

/// A ranked source of candidate tracks.
pub trait CandidateStrategy {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Candidates best first, never containing an id from `exclude`.
    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track>;
}

fn by_popularity<'a>(tracks: impl Iterator<Item = &'a Track>) -> Vec<Track> {
    let mut tracks: Vec<Track> = tracks.cloned().collect();
    tracks.sort_by(compare_popularity);
    tracks
}

/// Favorites of similar listeners, via [`SimilarityGraph::recommend_tracks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CollaborativeStrategy;

impl CandidateStrategy for CollaborativeStrategy {
    fn name(&self) -> &'static str {
        "collaborative"
    }

    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track> {
        ctx.graph
            .recommend_tracks(ctx.listener.id, ctx.graph.track_count())
            .into_iter()
            .filter(|track| !ctx.listener.is_favorite(track.id) && !exclude.contains(&track.id))
            .collect()
    }
}

/// Non-favorite tracks ranked by [`content_score`]. Tracks scoring zero are
/// left out.
#[derive(Debug, Clone, Copy)]
pub struct ContentStrategy {
    weights: ContentWeights,
}

impl ContentStrategy {
    #[must_use]
    pub fn new(weights: ContentWeights) -> Self {
        Self { weights }
    }
}

impl CandidateStrategy for ContentStrategy {
    fn name(&self) -> &'static str {
        "content"
    }

    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track> {
        let scored = ctx
            .fresh_tracks(exclude)
            .map(|track| (track, content_score(track, &ctx.profile, &self.weights)))
            .filter(|&(_, score)| score > 0.0)
            .map(|(track, score)| (track.clone(), score))
            .collect();
        rank_scored(scored)
    }
}

/// Non-favorite tracks by global popularity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopularityStrategy;

impl CandidateStrategy for PopularityStrategy {
    fn name(&self) -> &'static str {
        "popularity"
    }

    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track> {
        by_popularity(ctx.fresh_tracks(exclude))
    }
}

/// Tops up a short list from the listener's favorite genres.
///
/// `remaining` slots are split evenly across the genres, rounding up, so the
/// output can overshoot `remaining` by less than one slot per genre.
#[derive(Debug, Clone, Copy)]
pub struct GenreFillStrategy {
    remaining: usize,
}

impl GenreFillStrategy {
    #[must_use]
    pub fn new(remaining: usize) -> Self {
        Self { remaining }
    }
}

impl CandidateStrategy for GenreFillStrategy {
    fn name(&self) -> &'static str {
        "genre fill"
    }

    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track> {
        let mut genres: Vec<&String> = ctx.listener.favorite_genres.iter().collect();
        if genres.is_empty() || self.remaining == 0 {
            return Vec::new();
        }
        genres.sort();
        let per_genre = self.remaining.div_ceil(genres.len());

        genres
            .into_iter()
            .flat_map(|genre| {
                by_popularity(ctx.fresh_tracks(exclude).filter(|track| &track.genre == genre))
                    .into_iter()
                    .take(per_genre)
            })
            .collect()
    }
}

/// Radio stage: tracks crediting any artist of the seed.
#[derive(Debug, Clone)]
pub struct SameArtistStrategy<'s> {
    seed: &'s Track,
}

impl<'s> SameArtistStrategy<'s> {
    #[must_use]
    pub fn new(seed: &'s Track) -> Self {
        Self { seed }
    }
}

impl CandidateStrategy for SameArtistStrategy<'_> {
    fn name(&self) -> &'static str {
        "same artist"
    }

    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track> {
        by_popularity(ctx.graph.tracks().filter(|track| {
            track.id != self.seed.id && !exclude.contains(&track.id) && track.shares_artist_with(self.seed)
        }))
    }
}

/// Radio stage: non-favorite tracks in the seed's genre.
#[derive(Debug, Clone)]
pub struct SameGenreStrategy<'s> {
    seed: &'s Track,
}

impl<'s> SameGenreStrategy<'s> {
    #[must_use]
    pub fn new(seed: &'s Track) -> Self {
        Self { seed }
    }
}

impl CandidateStrategy for SameGenreStrategy<'_> {
    fn name(&self) -> &'static str {
        "same genre"
    }

    fn candidates(&self, ctx: &StrategyContext<'_>, exclude: &HashSet<TrackId>) -> Vec<Track> {
        by_popularity(
            ctx.fresh_tracks(exclude)
                .filter(|track| track.id != self.seed.id && track.genre == self.seed.genre),
        )
    }
}

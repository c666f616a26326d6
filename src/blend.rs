//! Multi-source blending with deduplication.
//!
//! A [`BlendedPool`] collects tracks stage by stage. Each stage offers its
//! ranked candidates and a quota; the pool appends unseen tracks until the
//! quota is met. The first stage to place a track wins it.

use crate::model::{Track, TrackId};
use crate::strategy::{CandidateStrategy, StrategyContext};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// `floor(limit · share)`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn quota(limit: usize, share: f64) -> usize {
    (limit as f64 * share).floor() as usize
}

#[derive(Debug, Default)]
pub struct BlendedPool {
    tracks: Vec<Track>,
    seen: HashSet<TrackId>,
}

impl BlendedPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool that will never accept any of `ids`.
    #[must_use]
    pub fn excluding(ids: impl IntoIterator<Item = TrackId>) -> Self {
        Self { tracks: Vec::new(), seen: ids.into_iter().collect() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Appends up to `quota` unseen tracks from `candidates` in order and
    /// returns how many were taken.
    pub fn offer(&mut self, candidates: impl IntoIterator<Item = Track>, quota: usize) -> usize {
        let mut taken = 0;
        for track in candidates {
            if taken == quota {
                break;
            }
            if self.seen.insert(track.id) {
                self.tracks.push(track);
                taken += 1;
            }
        }
        taken
    }

    /// Runs one strategy stage against this pool.
    pub fn fill(&mut self, strategy: &dyn CandidateStrategy, ctx: &StrategyContext<'_>, quota: usize) -> usize {
        if quota == 0 {
            return 0;
        }
        let candidates = strategy.candidates(ctx, &self.seen);
        let offered = candidates.len();
        let taken = self.offer(candidates, quota);
        debug!(
            "Listener {}: {} stage placed {taken}/{quota} ({offered} candidates)",
            ctx.listener.id,
            strategy.name()
        );
        taken
    }

    /// Shuffles the pool uniformly and cuts it to `limit`.
    pub fn finish<R: Rng + ?Sized>(mut self, rng: &mut R, limit: usize) -> Vec<Track> {
        self.tracks.shuffle(rng);
        self.tracks.truncate(limit);
        self.tracks
    }
}

//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `tastemap` diagnostic binary. Every
//! command loads a catalog snapshot, builds an engine over it and prints one
//! result.
//!
//! ## Commands
//!
//! - `discover`: weekly discovery list for a listener
//! - `radio`: radio list around a seed track
//! - `similar`: listeners most similar to a listener
//! - `stats`: graph and cache counters
//! - `completion`: shell completion script
//! - `completion-enhanced`: bash or fish script that also completes listener ids
//!
//! ## Examples
//!
//! ```bash
//! tastemap --catalog catalog.json discover 42 --limit 30
//! tastemap --catalog catalog.json --seed 7 radio 42 --seed-track 1001
//! RUST_LOG=tastemap::graph=debug tastemap --catalog catalog.json stats
//! ```

use crate::model::{ListenerId, TrackId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "tastemap")]
#[command(about = "tastemap: listener similarity and track recommendations over a catalog snapshot")]
#[command(version)]
pub struct Args {
    /// JSON catalog snapshot with `listeners` and `tracks`
    #[arg(long, env = "TASTEMAP_CATALOG", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Engine config file (defaults to the platform config directory)
    #[arg(long, env = "TASTEMAP_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Fixed shuffle seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a weekly discovery list
    ///
    /// Blends tracks favorited by similar listeners, tracks matching the
    /// listener's genres and artists, and globally popular tracks, then
    /// tops up from the listener's favorite genres.
    Discover {
        /// Listener id
        listener: ListenerId,

        /// Number of tracks (defaults to the configured default limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Generate a radio list around a seed track
    ///
    /// Without `--seed-track`, or with an id missing from the catalog, this
    /// prints the weekly discovery list instead.
    Radio {
        /// Listener id
        listener: ListenerId,

        /// Track id to build the radio around
        #[arg(long)]
        seed_track: Option<TrackId>,

        /// Number of tracks (defaults to the configured default limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List the listeners most similar to a listener
    Similar {
        /// Listener id
        listener: ListenerId,

        /// Number of listeners
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print graph and cache statistics
    Stats,

    /// Generate shell completions
    ///
    /// Usage: tastemap completion bash > ~/.local/share/bash-completion/completions/tastemap
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Generate shell completions that also complete listener ids
    ///
    /// Usage: tastemap completion-enhanced bash > ~/.local/share/bash-completion/completions/tastemap
    /// Usage: tastemap completion-enhanced fish > ~/.config/fish/completions/tastemap.fish
    CompletionEnhanced {
        /// Shell to generate enhanced completions for (bash and fish)
        shell: Shell,
    },

    /// List listener ids in the catalog for completion (hidden command)
    #[command(hide = true)]
    CompleteListeners,
}

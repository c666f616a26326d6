//! # tastemap
//!
//! Diagnostic front end for the recommendation core. Loads a JSON catalog
//! snapshot into memory, builds the similarity graph and prints
//! recommendations for one listener.
//!
//! ## Usage
//!
//! ```bash
//! # Weekly discovery for listener 42
//! tastemap --catalog catalog.json discover 42
//!
//! # Radio around track 1001, reproducible shuffle
//! tastemap --catalog catalog.json --seed 7 radio 42 --seed-track 1001
//!
//! # Who listens like listener 42?
//! tastemap --catalog catalog.json similar 42 --limit 5
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use std::sync::Arc;
use tastemap::cli::{self, Command};
use tastemap::completion;
use tastemap::config::RuntimeConfig;
use tastemap::engine::RecommendationEngine;
use tastemap::model::Track;
use tastemap::store::MemoryStore;

fn build_engine(args: &cli::Args) -> Result<RecommendationEngine<MemoryStore>> {
    let catalog = args
        .catalog
        .clone()
        .context("No catalog snapshot given; pass --catalog or set TASTEMAP_CATALOG")?;
    let mut runtime = RuntimeConfig::new(catalog);
    if let Some(path) = &args.config {
        runtime = runtime.with_config_path(path.clone());
    }

    let config = runtime.engine_config()?;
    debug!("Engine config: {config:?}");
    let store = Arc::new(MemoryStore::load_snapshot(&runtime.catalog_path)?);
    info!(
        "Loaded {} listeners and {} tracks from {}",
        store.listener_count(),
        store.track_count(),
        runtime.catalog_path.display()
    );

    match args.seed {
        Some(seed) => RecommendationEngine::with_seed(store, config, seed),
        None => RecommendationEngine::new(store, config),
    }
}

fn print_tracks(tracks: &[Track]) {
    if tracks.is_empty() {
        println!("No recommendations.");
        return;
    }
    for (position, track) in tracks.iter().enumerate() {
        println!(
            "{:>3}. [{}] {} - {} ({}, popularity {:.1})",
            position + 1,
            track.id,
            track.artist,
            track.title,
            track.genre,
            track.popularity_score()
        );
    }
}

/// Parses arguments, builds the engine where needed and runs one command.
///
/// Logging goes through `env_logger`, so `RUST_LOG=tastemap=debug` shows
/// the per-stage blending decisions.
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match &args.command {
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(*shell), &mut cmd);
        }
        Command::CompletionEnhanced { shell } => match shell {
            cli::Shell::Bash => print!("{}", completion::enhanced_bash_completion()),
            cli::Shell::Fish => print!("{}", completion::enhanced_fish_completion()),
            _ => anyhow::bail!("Enhanced completions only supported for bash and fish"),
        },
        Command::CompleteListeners => {
            completion::print_listener_completions(args.catalog.as_deref());
        }
        Command::Discover { listener, limit } => {
            let engine = build_engine(&args)?;
            let limit = limit.unwrap_or(engine.config().default_limit);
            print_tracks(&engine.generate_weekly_discovery(*listener, limit));
        }
        Command::Radio { listener, seed_track, limit } => {
            let engine = build_engine(&args)?;
            let limit = limit.unwrap_or(engine.config().default_limit);
            print_tracks(&engine.generate_seeded_radio(*listener, *seed_track, limit));
        }
        Command::Similar { listener, limit } => {
            let engine = build_engine(&args)?;
            let similar = engine.similar_listeners(*listener, *limit);
            if similar.is_empty() {
                println!("No similar listeners.");
            }
            for (id, confidence) in similar {
                println!("{id:>8}  {confidence:.3}");
            }
        }
        Command::Stats => {
            let engine = build_engine(&args)?;
            println!("{}", engine.statistics());
        }
    }

    Ok(())
}

//! # Configuration Module
//!
//! Tunable parameters for the recommendation core plus the platform location
//! of the configuration file.
//!
//! ## Config File
//!
//! Tastemap looks for `config.json` in the platform-standard config directory:
//! - Linux: `~/.config/tastemap/`
//! - macOS: `~/Library/Application Support/tastemap/`
//! - Windows: `%APPDATA%\tastemap\`
//!
//! Every field is optional; missing fields take their defaults, so a file
//! containing only `{ "cache_ttl_secs": 600 }` is valid.
//!
//! ## Validation
//!
//! Values are checked once, when an engine is built. A malformed threshold or
//! share is rejected there instead of being clamped later.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns the platform-appropriate configuration file path.
///
/// The `tastemap` subdirectory is created if it doesn't exist yet.
///
/// # Errors
///
/// This function will return an error if:
/// - The system config directory cannot be determined
/// - The tastemap subdirectory cannot be created due to permissions
///
/// # Examples
///
/// ```no_run
/// use tastemap::config::get_config_path;
///
/// let path = get_config_path()?;
/// println!("Config location: {}", path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system config directory. Please ensure your platform supports standard config directories."
        ))?;

    let tastemap_dir = config_dir.join("tastemap");
    fs::create_dir_all(&tastemap_dir)
        .with_context(|| format!(
            "Failed to create Tastemap config directory at {}. Please check file permissions.",
            tastemap_dir.display()
        ))?;

    Ok(tastemap_dir.join("config.json"))
}

/// Weights of the three Jaccard components of listener similarity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub tracks: f64,
    pub genres: f64,
    pub artists: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            tracks: 0.5,
            genres: 0.3,
            artists: 0.2,
        }
    }
}

/// Coefficients of the content-based track score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentWeights {
    pub genre_frequency: f64,
    pub artist_frequency: f64,
    pub plays: f64,
    pub favorites: f64,
    pub rating: f64,
}

impl Default for ContentWeights {
    fn default() -> Self {
        Self {
            genre_frequency: 2.0,
            artist_frequency: 3.0,
            plays: 0.1,
            favorites: 0.2,
            rating: 0.5,
        }
    }
}

/// Share of a weekly discovery list reserved for each strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendShares {
    pub collaborative: f64,
    pub content: f64,
    pub popularity: f64,
}

impl Default for BlendShares {
    fn default() -> Self {
        Self {
            collaborative: 0.6,
            content: 0.3,
            popularity: 0.1,
        }
    }
}

/// Share of a seeded radio list reserved for each stage. The remainder is
/// filled from global popularity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioShares {
    pub same_artist: f64,
    pub same_genre: f64,
    pub collaborative: f64,
}

impl Default for RadioShares {
    fn default() -> Self {
        Self {
            same_artist: 0.2,
            same_genre: 0.4,
            collaborative: 0.3,
        }
    }
}

/// Every tunable of the recommendation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Edges at or below this weight are not materialized, and propagated
    /// confidences at or below it are not reported.
    pub edge_threshold: f64,
    /// How many similar listeners feed collaborative recommendations.
    pub neighbor_limit: usize,
    pub cache_ttl_secs: u64,
    /// Limit used when a caller does not pick one.
    pub default_limit: usize,
    /// Refuse the quadratic rebuild above this many listeners.
    pub max_listeners: Option<usize>,
    pub similarity: SimilarityWeights,
    pub content: ContentWeights,
    pub discovery: BlendShares,
    pub radio: RadioShares,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 0.1,
            neighbor_limit: 10,
            cache_ttl_secs: 30 * 60,
            default_limit: 20,
            max_listeners: None,
            similarity: SimilarityWeights::default(),
            content: ContentWeights::default(),
            discovery: BlendShares::default(),
            radio: RadioShares::default(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`EngineConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Config file {} is not valid JSON", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Like [`EngineConfig::load`], but a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Checks every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error for the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.edge_threshold.is_finite() && (0.0..1.0).contains(&self.edge_threshold),
            "edge_threshold must be in [0, 1), got {}",
            self.edge_threshold
        );
        ensure!(self.neighbor_limit > 0, "neighbor_limit must be at least 1");
        ensure!(self.cache_ttl_secs > 0, "cache_ttl_secs must be positive");
        ensure!(
            self.max_listeners != Some(0),
            "max_listeners must be at least 1 when set"
        );

        let SimilarityWeights { tracks, genres, artists } = self.similarity;
        ensure_weights("similarity", &[tracks, genres, artists])?;
        ensure!(
            tracks + genres + artists <= 1.0 + f64::EPSILON,
            "similarity weights must sum to at most 1 so edge weights stay in [0, 1]"
        );

        let content = self.content;
        ensure_weights(
            "content",
            &[
                content.genre_frequency,
                content.artist_frequency,
                content.plays,
                content.favorites,
                content.rating,
            ],
        )?;

        let BlendShares { collaborative, content, popularity } = self.discovery;
        ensure_shares("discovery", &[collaborative, content, popularity])?;

        let RadioShares { same_artist, same_genre, collaborative } = self.radio;
        ensure_shares("radio", &[same_artist, same_genre, collaborative])?;

        Ok(())
    }
}

fn ensure_weights(group: &str, weights: &[f64]) -> Result<()> {
    for weight in weights {
        ensure!(
            weight.is_finite() && *weight >= 0.0,
            "{group} weights must be finite and non-negative, got {weight}"
        );
    }
    Ok(())
}

fn ensure_shares(group: &str, shares: &[f64]) -> Result<()> {
    for share in shares {
        ensure!(
            share.is_finite() && (0.0..=1.0).contains(share),
            "{group} shares must be in [0, 1], got {share}"
        );
    }
    let total: f64 = shares.iter().sum();
    ensure!(
        total <= 1.0 + f64::EPSILON,
        "{group} shares must sum to at most 1, got {total}"
    );
    Ok(())
}

/// Configuration for the `tastemap` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// JSON catalog snapshot to load
    pub catalog_path: PathBuf,
    /// Engine config file; the platform default when not given
    pub config_path: Option<PathBuf>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new(catalog_path: PathBuf) -> Self {
        Self {
            catalog_path,
            config_path: None,
        }
    }

    #[must_use]
    pub fn with_config_path(mut self, config_path: PathBuf) -> Self {
        self.config_path = Some(config_path);
        self
    }

    /// Resolves and loads the engine config.
    ///
    /// An explicit path must exist; the platform default may be absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be located, read or validated.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config_path {
            Some(path) => EngineConfig::load(path),
            None => EngineConfig::load_or_default(&get_config_path()?),
        }
    }
}

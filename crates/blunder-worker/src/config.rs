//! Worker configuration from environment variables

use std::env;
use std::time::Duration;

use tracing::info;

use crate::analysis::DEFAULT_BLUNDER_THRESHOLD;
use crate::error::WorkerError;

pub const DEFAULT_SEARCH_DEPTH: u32 = 15;
pub const DEFAULT_LICHESS_URL: &str = "https://lichess.org";

/// Options the detection pipelines need, independent of where they came from.
#[derive(Clone, Debug)]
pub struct BlunderConfig {
    /// Minimum evaluation drop, in centipawns, that counts as a blunder
    pub threshold: i32,
    /// Oracle search depth per position
    pub search_depth: u32,
    /// Player name, matched case-insensitively against the White/Black headers
    pub player: String,
}

impl BlunderConfig {
    pub fn new(player: &str, threshold: i32, search_depth: u32) -> Result<Self, WorkerError> {
        let player = player.trim();
        if player.is_empty() {
            return Err(WorkerError::Config("player name is empty".into()));
        }
        if threshold <= 0 {
            return Err(WorkerError::Config(format!(
                "threshold must be positive, got {threshold}"
            )));
        }
        if search_depth == 0 {
            return Err(WorkerError::Config("search depth must be at least 1".into()));
        }
        Ok(Self {
            threshold,
            search_depth,
            player: player.to_string(),
        })
    }
}

/// How to launch the UCI engine.
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub path: String,
    pub search_depth: u32,
    pub threads: u32,
    pub hash_mb: u32,
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Player to analyze, if set in the environment
    pub player: Option<String>,

    /// Blunder threshold in centipawns
    pub threshold: i32,

    /// Search depth per position
    pub search_depth: u32,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Engine threads
    pub engine_threads: u32,

    /// Engine hash table size in MB
    pub engine_hash_mb: u32,

    /// Lichess personal API token
    pub lichess_token: Option<String>,

    /// Lichess base URL
    pub lichess_base_url: String,

    /// Delay between Lichess import and export, for server-side analysis
    pub analysis_wait: Duration,
}

/// Command-line values that take precedence over the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub player: Option<String>,
    pub threshold: Option<i32>,
    pub search_depth: Option<u32>,
    pub stockfish_path: Option<String>,
    pub analysis_wait_secs: Option<u64>,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Self {
        let player = env::var("BLUNDER_PLAYER").ok().filter(|v| !v.trim().is_empty());

        let threshold = env::var("BLUNDER_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BLUNDER_THRESHOLD);

        let search_depth = env::var("SEARCH_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SEARCH_DEPTH);

        let stockfish_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let engine_threads = env::var("ENGINE_THREADS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let engine_hash_mb = env::var("ENGINE_HASH_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(256);

        let lichess_token = env::var("LICHESS_API_TOKEN").ok().filter(|v| !v.is_empty());
        if lichess_token.is_none() {
            info!("LICHESS_API_TOKEN not set, Lichess requests will be anonymous");
        }

        let lichess_base_url =
            env::var("LICHESS_BASE_URL").unwrap_or_else(|_| DEFAULT_LICHESS_URL.to_string());

        let analysis_wait = env::var("ANALYSIS_WAIT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            player,
            threshold,
            search_depth,
            stockfish_path,
            engine_threads,
            engine_hash_mb,
            lichess_token,
            lichess_base_url,
            analysis_wait,
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(player) = overrides.player {
            self.player = Some(player);
        }
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(depth) = overrides.search_depth {
            self.search_depth = depth;
        }
        if let Some(path) = overrides.stockfish_path {
            self.stockfish_path = path;
        }
        if let Some(secs) = overrides.analysis_wait_secs {
            self.analysis_wait = Duration::from_secs(secs);
        }
        self
    }

    /// Validated pipeline options; the player must be known by now.
    pub fn blunder_config(&self) -> Result<BlunderConfig, WorkerError> {
        let player = self
            .player
            .as_deref()
            .ok_or_else(|| WorkerError::Config("no player given (--player or BLUNDER_PLAYER)".into()))?;
        BlunderConfig::new(player, self.threshold, self.search_depth)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            path: self.stockfish_path.clone(),
            search_depth: self.search_depth,
            threads: self.engine_threads,
            hash_mb: self.engine_hash_mb,
        }
    }
}

//! Engine configuration from environment variables.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use arcade_tetris_types::LINE_CLEAR_DELAY_MS;

/// Value of `ARCADE_TETRIS_BEST_PATH` that keeps scores in memory only
pub const BEST_PATH_NONE: &str = "none";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Piece generator seed; `None` derives one from the clock.
    pub seed: Option<u32>,
    /// Initial ghost visibility
    pub ghost: bool,
    pub clear_delay_ms: u32,
    /// Capacity of the command channel
    pub max_pending_commands: usize,
    /// Best-score file; `None` keeps scores in memory
    pub best_path: Option<PathBuf>,
    pub log_path: Option<String>,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ghost: true,
            clear_delay_ms: LINE_CLEAR_DELAY_MS,
            max_pending_commands: 32,
            best_path: default_best_path(),
            log_path: None,
            log_level: "info".to_string(),
        }
    }
}

fn default_best_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".arcade-tetris").join("best.json"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .and_then(|s| if s.is_empty() { None } else { Some(s) })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl EngineConfig {
    /// Create from `ARCADE_TETRIS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| non_empty(lookup(key));

        let seed = get("ARCADE_TETRIS_SEED").and_then(|s| s.parse().ok());

        let ghost = get("ARCADE_TETRIS_GHOST")
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.ghost);

        let clear_delay_ms = get("ARCADE_TETRIS_CLEAR_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.clear_delay_ms);

        let max_pending_commands = get("ARCADE_TETRIS_MAX_PENDING")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        let best_path = match get("ARCADE_TETRIS_BEST_PATH") {
            Some(s) if s.eq_ignore_ascii_case(BEST_PATH_NONE) => None,
            Some(s) => Some(PathBuf::from(s)),
            None => defaults.best_path,
        };

        let log_path = get("ARCADE_TETRIS_LOG");
        let log_level = get("ARCADE_TETRIS_LOG_LEVEL").unwrap_or(defaults.log_level);

        Self {
            seed,
            ghost,
            clear_delay_ms,
            max_pending_commands,
            best_path,
            log_path,
            log_level,
        }
    }

    /// Configured seed, or one taken from the wall clock
    pub fn seed_or_clock(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
                .unwrap_or(1)
        })
    }
}

//! Editor session configuration.

use std::{env, time::Duration};

use crate::history::DEFAULT_HISTORY_DEPTH;

/// Default snap grid cell size in world units.
pub const DEFAULT_GRID_SIZE: f64 = 32.0;

/// Default time between autosaves.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Storage key holding the serialized project.
pub const PROJECT_KEY: &str = "stagecraft-project";

/// Storage key holding the time of the last save (RFC 3339).
pub const AUTOSAVE_KEY: &str = "stagecraft-autosave";

/// Tunables for a [`DocumentStore`](crate::store::DocumentStore) and its
/// editor session.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Maximum number of undo snapshots retained.
    pub history_depth: usize,
    /// Snap grid cell size used when the grid is enabled.
    pub grid_size: f64,
    /// Interval between autosaves. `Duration::ZERO` disables autosave.
    pub autosave_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            grid_size: DEFAULT_GRID_SIZE,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `STAGECRAFT_HISTORY_DEPTH` and
    /// `STAGECRAFT_AUTOSAVE_SECS` when they parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            history_depth: history_depth().unwrap_or(defaults.history_depth),
            autosave_interval: autosave_interval().unwrap_or(defaults.autosave_interval),
            ..defaults
        }
    }
}

fn history_depth() -> Option<usize> {
    env::var("STAGECRAFT_HISTORY_DEPTH")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|depth| *depth > 0)
}

fn autosave_interval() -> Option<Duration> {
    env::var("STAGECRAFT_AUTOSAVE_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_behavior() {
        let config = StoreConfig::default();
        assert_eq!(config.history_depth, 50);
        assert_eq!(config.grid_size, 32.0);
        assert_eq!(config.autosave_interval, Duration::from_secs(30));
    }
}

//! Persistence boundary: a small key/value [`Storage`] trait, two backends,
//! and the project save/load helpers built on it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{AUTOSAVE_KEY, PROJECT_KEY};
use crate::model::Project;
use crate::validate::project_from_value;
use crate::ProjectError;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// String key/value storage the editor persists into.
pub trait Storage {
    /// Read the value under `key`, `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>, ProjectError>;

    /// Write `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), ProjectError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), ProjectError>;
}

/// Process-local storage, mainly for tests and headless tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ProjectError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), ProjectError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ProjectError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Use `root` as the storage directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| ProjectError::Storage {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ProjectError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ProjectError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ProjectError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProjectError::Storage {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), ProjectError> {
        let path = self.path_for(key)?;
        std::fs::write(&path, value).map_err(|source| ProjectError::Storage {
            key: key.to_owned(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), ProjectError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(ProjectError::Storage {
                key: key.to_owned(),
                source: e,
            }),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Project save/load
// ---------------------------------------------------------------------------

/// Serialize `project` under [`PROJECT_KEY`] and stamp [`AUTOSAVE_KEY`]
/// with `saved_at`.
pub fn write_project(
    storage: &mut dyn Storage,
    project: &Project,
    saved_at: DateTime<Utc>,
) -> Result<(), ProjectError> {
    let text = serde_json::to_string_pretty(project)?;
    storage.write(PROJECT_KEY, &text)?;
    storage.write(AUTOSAVE_KEY, &saved_at.to_rfc3339())?;
    tracing::debug!(
        project_id = %project.meta.id,
        bytes = text.len(),
        "project saved"
    );
    Ok(())
}

/// Parse and validate a project from JSON text.
pub fn parse_project(text: &str) -> Result<Project, ProjectError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Ok(project_from_value(value)?)
}

/// Read the persisted project. `Ok(None)` when nothing was ever saved.
pub fn read_project(storage: &dyn Storage) -> Result<Option<Project>, ProjectError> {
    storage
        .read(PROJECT_KEY)?
        .map(|text| parse_project(&text))
        .transpose()
}

/// Time of the last successful save, if one was recorded and parses.
pub fn last_saved(storage: &dyn Storage) -> Result<Option<DateTime<Utc>>, ProjectError> {
    Ok(storage.read(AUTOSAVE_KEY)?.and_then(|text| {
        DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }))
}

// ---------------------------------------------------------------------------
// Autosave scheduling
// ---------------------------------------------------------------------------

/// Elapsed-time autosave timer. Feed it frame or wall-clock deltas and save
/// whenever [`advance`](Self::advance) reports the interval has passed.
#[derive(Debug, Clone)]
pub struct Autosave {
    interval: Duration,
    pending: Duration,
}

impl Autosave {
    /// A timer firing every `interval`. A zero interval never fires.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accumulate `elapsed`; returns true when a save is due.
    ///
    /// Several intervals passing at once still produce a single save.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if self.interval.is_zero() {
            return false;
        }
        self.pending += elapsed;
        if self.pending < self.interval {
            return false;
        }
        self.pending = Duration::from_nanos(
            (self.pending.as_nanos() % self.interval.as_nanos()) as u64,
        );
        true
    }

    /// Restart the countdown, e.g. after a manual save.
    pub fn reset(&mut self) {
        self.pending = Duration::ZERO;
    }
}

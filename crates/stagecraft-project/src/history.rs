//! Linear undo/redo history of full project snapshots.
//!
//! The history is a bounded list of deep copies with a cursor pointing at
//! the snapshot that matches the live document. Committing after an undo
//! discards the redo branch; exceeding the depth evicts the oldest entry.
//!
//! ```
//! use stagecraft_project::prelude::*;
//!
//! let mut project = default_project(Template::Clicker, chrono::Utc::now());
//! let mut history = History::new(50);
//! history.commit(&project);
//!
//! project.meta.title = "Renamed".into();
//! history.commit(&project);
//!
//! let previous = history.undo().unwrap();
//! assert_eq!(previous.meta.title, "My New Game");
//! assert!(history.can_redo());
//! ```

use std::collections::VecDeque;

use crate::model::Project;

/// Default number of snapshots retained.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// One committed snapshot and its content digest.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub project: Project,
    /// Hex BLAKE3 digest of the snapshot's canonical JSON.
    pub digest: String,
}

impl HistoryEntry {
    fn capture(project: &Project) -> Self {
        Self {
            digest: project_digest(project),
            project: project.clone(),
        }
    }
}

/// BLAKE3 digest of a project's JSON serialization.
pub fn project_digest(project: &Project) -> String {
    let bytes = serde_json::to_vec(project).expect("Project should always be JSON-serializable");
    blake3::hash(&bytes).to_hex().to_string()
}

/// Bounded snapshot history with a cursor.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Index of the snapshot matching the live document. Meaningless while
    /// `entries` is empty.
    cursor: usize,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    /// Create an empty history retaining at most `max_depth` snapshots
    /// (minimum 1).
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_depth.clamp(1, 64)),
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Drop every snapshot and start over with `project` as the only entry.
    pub fn reset(&mut self, project: &Project) {
        self.entries.clear();
        self.entries.push_back(HistoryEntry::capture(project));
        self.cursor = 0;
    }

    /// Record `project` as the newest snapshot.
    ///
    /// Entries after the cursor are discarded first. If the depth limit is
    /// exceeded the oldest entry is evicted. The cursor ends on the new entry.
    pub fn commit(&mut self, project: &Project) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(HistoryEntry::capture(project));
        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        tracing::trace!(cursor = self.cursor, len = self.entries.len(), "history commit");
    }

    /// Step back one snapshot, returning a deep copy of it.
    pub fn undo(&mut self) -> Option<Project> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].project.clone())
    }

    /// Step forward one snapshot, returning a deep copy of it.
    pub fn redo(&mut self) -> Option<Project> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].project.clone())
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// The entry at the cursor, if any.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Digests of all retained snapshots, oldest first.
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.digest.as_str())
    }
}

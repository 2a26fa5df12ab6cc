//! Stagecraft project -- level documents, edit history and the editor store.
//!
//! A [`Project`](model::Project) is the complete, serializable description of
//! a 2D game: scenes of placed objects, authored rules, starting variables and
//! global settings. The [`DocumentStore`](store::DocumentStore) is the single
//! write path into it and keeps a bounded snapshot [`History`](history::History)
//! for undo/redo. [`EditorSession`](editor::EditorSession) binds a store to a
//! [`Storage`](persist::Storage) backend and handles autosave and canvas
//! gestures.
//!
//! # Quick Start
//!
//! ```
//! use stagecraft_project::prelude::*;
//!
//! let mut store = DocumentStore::new(StoreConfig::default());
//! store.create_project(Template::Platformer);
//!
//! store.update_object("player-1", &ObjectPatch::position(64.0, 400.0));
//! store.save_to_history();
//! assert!(store.undo());
//!
//! let player = store.project().unwrap().object("player-1").unwrap();
//! assert_eq!(player.x, 100.0);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod editor;
pub mod history;
pub mod model;
pub mod persist;
pub mod store;
pub mod template;
pub mod validate;

pub use validate::ValidationError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading, validating or persisting projects.
///
/// Unknown object, rule or scene ids are not errors: store mutations treat
/// them as no-ops.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The document is not valid JSON or could not be serialized.
    #[error("project JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but violates the project schema or invariants.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The storage backend failed.
    #[error("storage access for '{key}' failed: {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A storage key contained characters the backend cannot represent.
    #[error("invalid storage key '{key}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidKey { key: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{StoreConfig, AUTOSAVE_KEY, PROJECT_KEY};
    pub use crate::editor::EditorSession;
    pub use crate::history::{project_digest, History, HistoryEntry};
    pub use crate::model::*;
    pub use crate::persist::{
        last_saved, parse_project, read_project, write_project, Autosave, FileStorage,
        MemoryStorage, Storage,
    };
    pub use crate::store::{DocumentStore, EditorState};
    pub use crate::template::{default_project, search_palette, DropTemplate, PALETTE};
    pub use crate::validate::{validate_project, ValidationError};
    pub use crate::ProjectError;
}

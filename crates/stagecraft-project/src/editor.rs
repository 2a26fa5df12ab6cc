//! Editor session: a [`DocumentStore`] bound to a [`Storage`] backend, plus
//! the canvas gestures the host UI forwards (palette drops, drags, keyboard
//! deletion).
//!
//! ```
//! use stagecraft_project::prelude::*;
//!
//! let mut session = EditorSession::open(MemoryStorage::new(), StoreConfig::default());
//! let id = session
//!     .drop_template(&DropTemplate::for_type(ObjectType::Enemy), 105.0, 170.0)
//!     .expect("scene-1 exists");
//!
//! let enemy = session.store().project().unwrap().object(&id).unwrap();
//! assert_eq!((enemy.x, enemy.y), (96.0, 160.0));
//!
//! let storage = session.close();
//! assert!(read_project(&storage).unwrap().is_some());
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::StoreConfig;
use crate::model::{GameObject, ObjectPatch, Project, Template};
use crate::persist::{read_project, Autosave, Storage};
use crate::store::DocumentStore;
use crate::template::DropTemplate;
use crate::ProjectError;

/// Layer newly dropped objects are placed on.
pub const DROP_LAYER: i32 = 1;

/// A live editing session. Created with [`open`](Self::open), ended with
/// [`close`](Self::close).
#[derive(Debug)]
pub struct EditorSession<S: Storage> {
    store: DocumentStore,
    storage: S,
    autosave: Autosave,
    dragging: bool,
}

impl<S: Storage> EditorSession<S> {
    /// Start a session on `storage`.
    ///
    /// The persisted project is loaded when it exists and validates;
    /// otherwise the session starts from a fresh platformer project.
    pub fn open(storage: S, config: StoreConfig) -> Self {
        let autosave = Autosave::new(config.autosave_interval);
        let mut store = DocumentStore::new(config);

        match read_project(&storage) {
            Ok(Some(project)) => {
                if let Err(e) = store.load_project(project) {
                    tracing::warn!(error = %e, "persisted project rejected, starting fresh");
                    store.create_project(Template::Platformer);
                }
            }
            Ok(None) => {
                tracing::debug!("no persisted project, starting fresh");
                store.create_project(Template::Platformer);
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted project unreadable, starting fresh");
                store.create_project(Template::Platformer);
            }
        }

        Self {
            store,
            storage,
            autosave,
            dragging: false,
        }
    }

    /// Save one last time and hand the storage back.
    pub fn close(mut self) -> S {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "final save failed");
        }
        self.storage
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Frozen copy of the project for a play session.
    pub fn frozen_snapshot(&self) -> Option<Arc<Project>> {
        self.store.snapshot()
    }

    // -- persistence ----------------------------------------------------------

    /// Save now. `Ok(false)` when there is nothing to save.
    pub fn save(&mut self) -> Result<bool, ProjectError> {
        let saved = self.store.save_project(&mut self.storage)?;
        self.autosave.reset();
        Ok(saved)
    }

    /// Advance the autosave timer by `elapsed` and save when it fires.
    ///
    /// Failures are logged, not returned; autosave is best effort.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if !self.autosave.advance(elapsed) {
            return false;
        }
        match self.store.save_project(&mut self.storage) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "autosave failed");
                false
            }
        }
    }

    // -- gestures ---------------------------------------------------------------

    /// Drop a palette entry at world position `(x, y)` in the current scene.
    ///
    /// The position is snapped, the new object is selected and the edit is
    /// committed to history. Returns the new object's id.
    pub fn drop_template(&mut self, template: &DropTemplate, x: f64, y: f64) -> Option<String> {
        let (x, y) = self.store.editor().snap_point(x, y);
        let id = self.fresh_object_id()?;

        let mut object = GameObject::new(
            id.clone(),
            template.object_type,
            template.name.clone(),
            (x, y),
            (template.width, template.height),
        )
        .with_layer(DROP_LAYER);
        object.sprite = template.object_type.as_str().to_owned();
        object.body = template.body_flags();

        if !self.store.add_object(object) {
            return None;
        }
        self.store.select_object(Some(&id));
        self.store.save_to_history();
        tracing::debug!(object_id = %id, kind = %template.object_type, x, y, "object dropped");
        Some(id)
    }

    /// Move the selected object so its top-left lands on the snapped `(x, y)`.
    /// Not committed until [`end_drag`](Self::end_drag).
    pub fn drag_selected_to(&mut self, x: f64, y: f64) -> bool {
        let Some(id) = self.store.editor().selected_object_id.clone() else {
            return false;
        };
        let (x, y) = self.store.editor().snap_point(x, y);
        let moved = self.store.update_object(&id, &ObjectPatch::position(x, y));
        self.dragging |= moved;
        moved
    }

    /// Finish a drag, committing one history step if anything moved.
    pub fn end_drag(&mut self) {
        if std::mem::take(&mut self.dragging) {
            self.store.save_to_history();
        }
    }

    /// Delete the selected object and commit.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.store.editor().selected_object_id.clone() else {
            return false;
        };
        let deleted = self.store.delete_object(&id);
        if deleted {
            self.store.save_to_history();
        }
        deleted
    }

    /// Route a canvas key press. Returns true when it was handled.
    pub fn handle_key(&mut self, code: &str) -> bool {
        match code {
            "Delete" | "Backspace" => self.delete_selected(),
            _ => false,
        }
    }

    /// `obj-<millis>`, bumped until it collides with no existing object.
    fn fresh_object_id(&self) -> Option<String> {
        let project = self.store.project()?;
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("obj-{millis}");
            if project.object(&id).is_none() {
                return Some(id);
            }
            millis += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PROJECT_KEY;
    use crate::model::ObjectType;
    use crate::persist::{write_project, MemoryStorage};
    use crate::template::default_project;

    fn session() -> EditorSession<MemoryStorage> {
        EditorSession::open(MemoryStorage::new(), StoreConfig::default())
    }

    #[test]
    fn open_falls_back_to_platformer_on_corrupt_storage() {
        let mut storage = MemoryStorage::new();
        storage
            .write(PROJECT_KEY, r#"{"version":"1.0","meta":{},"settings":{}}"#)
            .unwrap();
        let s = EditorSession::open(storage, StoreConfig::default());
        let project = s.store().project().unwrap();
        assert_eq!(project.meta.template, Template::Platformer);
        assert_eq!(project.scenes[0].objects.len(), 6);
    }

    #[test]
    fn open_loads_persisted_project() {
        let mut storage = MemoryStorage::new();
        let mut saved = default_project(Template::Clicker, Utc::now());
        saved.meta.title = "Persisted".into();
        write_project(&mut storage, &saved, Utc::now()).unwrap();

        let s = EditorSession::open(storage, StoreConfig::default());
        assert_eq!(s.store().project().unwrap().meta.title, "Persisted");
    }

    #[test]
    fn drop_uses_palette_defaults() {
        let mut s = session();
        let id = s
            .drop_template(&DropTemplate::for_type(ObjectType::Player), 40.0, 40.0)
            .unwrap();
        let obj = s.store().project().unwrap().object(&id).unwrap();

        assert!(id.starts_with("obj-"));
        assert_eq!((obj.x, obj.y, obj.width, obj.height), (32.0, 32.0, 32.0, 64.0));
        assert_eq!(obj.layer, DROP_LAYER);
        assert_eq!(obj.sprite, "player");
        assert!(obj.body.solid && obj.body.gravity && !obj.body.is_static);
        assert_eq!(s.store().editor().selected_object_id.as_deref(), Some(id.as_str()));
        assert!(s.store().can_undo());
    }

    #[test]
    fn rapid_drops_get_distinct_ids() {
        let mut s = session();
        let t = DropTemplate::for_type(ObjectType::Decoration);
        let a = s.drop_template(&t, 0.0, 0.0).unwrap();
        let b = s.drop_template(&t, 0.0, 0.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn drag_commits_once_on_release() {
        let mut s = session();
        s.store_mut().select_object(Some("player-1"));
        let before = s.store().history().len();
        for step in 0..10 {
            s.drag_selected_to(100.0 + step as f64 * 7.0, 400.0);
        }
        assert_eq!(s.store().history().len(), before, "drag must not commit mid-gesture");
        s.end_drag();
        s.end_drag();
        assert_eq!(s.store().history().len(), before + 1);

        let player = s.store().project().unwrap().object("player-1").unwrap();
        assert_eq!((player.x, player.y), (160.0, 416.0));
    }

    #[test]
    fn delete_key_removes_selection_and_commits() {
        let mut s = session();
        s.store_mut().select_object(Some("goal-1"));
        assert!(s.handle_key("Delete"));
        assert!(s.store().project().unwrap().object("goal-1").is_none());
        assert!(s.store().editor().selected_object_id.is_none());
        assert!(!s.handle_key("Backspace"), "nothing left selected");
        assert!(s.store_mut().undo());
        assert!(s.store().project().unwrap().object("goal-1").is_some());
    }

    #[test]
    fn autosave_writes_after_interval() {
        let mut s = session();
        assert!(!s.tick(Duration::from_secs(10)));
        assert!(s.storage().is_empty());
        assert!(s.tick(Duration::from_secs(20)));
        assert!(read_project(s.storage()).unwrap().is_some());
    }

    #[test]
    fn close_returns_storage_with_saved_project() {
        let mut s = session();
        s.store_mut().delete_object("goal-1");
        let storage = s.close();
        let project = read_project(&storage).unwrap().unwrap();
        assert!(project.object("goal-1").is_none());
    }
}

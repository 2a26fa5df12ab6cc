//! The document store: the only write path into a [`Project`].
//!
//! [`DocumentStore`] owns the live project, the ephemeral [`EditorState`]
//! and the undo [`History`]. Every mutation is total: unknown ids and
//! mutations without a loaded project are logged no-ops, never errors.
//!
//! Mutations do not commit history on their own. Hosts call
//! [`save_to_history`](DocumentStore::save_to_history) at the end of a user
//! gesture, so a drag that touches an object sixty times a second still
//! produces one undo step.
//!
//! The live project is held in an [`Arc`]; [`DocumentStore::snapshot`] hands
//! out a frozen copy that later edits never affect (copy-on-write through
//! [`Arc::make_mut`]).

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::history::History;
use crate::model::*;
use crate::persist::{self, Storage};
use crate::template::{default_project, FIRST_SCENE_ID};
use crate::validate::{validate_project, ValidationError};
use crate::ProjectError;

// ---------------------------------------------------------------------------
// Editor state
// ---------------------------------------------------------------------------

/// Ephemeral view state. Never persisted with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub selected_object_id: Option<String>,
    pub grid_enabled: bool,
    pub grid_size: f64,
    pub zoom: f64,
    pub is_previewing: bool,
    pub current_scene_id: String,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::with_grid(crate::config::DEFAULT_GRID_SIZE)
    }
}

impl EditorState {
    fn with_grid(grid_size: f64) -> Self {
        Self {
            selected_object_id: None,
            grid_enabled: true,
            grid_size,
            zoom: 1.0,
            is_previewing: false,
            current_scene_id: FIRST_SCENE_ID.to_owned(),
        }
    }

    /// Round `value` to the nearest grid line when the grid is enabled.
    /// Halfway values round up.
    pub fn snap(&self, value: f64) -> f64 {
        if !self.grid_enabled || self.grid_size <= 0.0 {
            return value;
        }
        (value / self.grid_size + 0.5).floor() * self.grid_size
    }

    /// Snap both coordinates of a point.
    pub fn snap_point(&self, x: f64, y: f64) -> (f64, f64) {
        (self.snap(x), self.snap(y))
    }

    /// Convert canvas pixel coordinates to world coordinates at the current zoom.
    pub fn screen_to_world(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.zoom, y / self.zoom)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Advance `modified` to now, or one millisecond past its previous value when
/// the clock has not moved, so it strictly increases.
fn touch(meta: &mut ProjectMeta) {
    let floor: DateTime<Utc> = meta.modified + TimeDelta::milliseconds(1);
    meta.modified = Utc::now().max(floor);
}

/// The live project, its editor state and undo history.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    project: Option<Arc<Project>>,
    editor: EditorState,
    history: History,
    config: StoreConfig,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl DocumentStore {
    /// An empty store with no project loaded.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            project: None,
            editor: EditorState::with_grid(config.grid_size),
            history: History::new(config.history_depth),
            config,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn project(&self) -> Option<&Project> {
        self.project.as_deref()
    }

    /// A frozen handle to the current project. Subsequent edits copy on
    /// write and never show through it.
    pub fn snapshot(&self) -> Option<Arc<Project>> {
        self.project.clone()
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.project()?.scene(&self.editor.current_scene_id)
    }

    /// The selected object, looked up in any scene.
    pub fn selected_object(&self) -> Option<&GameObject> {
        let id = self.editor.selected_object_id.as_deref()?;
        self.project()?.object(id)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Replace everything with a fresh default project for `template`.
    pub fn create_project(&mut self, template: Template) {
        let project = default_project(template, Utc::now());
        tracing::info!(template = template.as_str(), project_id = %project.meta.id, "project created");
        self.install(project);
    }

    /// Replace everything with `project` after validating it.
    pub fn load_project(&mut self, project: Project) -> Result<(), ValidationError> {
        validate_project(&project)?;
        tracing::info!(
            project_id = %project.meta.id,
            scenes = project.scenes.len(),
            objects = project.object_count(),
            "project loaded"
        );
        self.install(project);
        Ok(())
    }

    /// Parse, validate and load a project from JSON text.
    pub fn load_project_json(&mut self, text: &str) -> Result<(), ProjectError> {
        let project = persist::parse_project(text)?;
        self.install(project);
        Ok(())
    }

    fn install(&mut self, project: Project) {
        let mut editor = EditorState::with_grid(self.config.grid_size);
        if let Some(first) = project.scenes.first() {
            editor.current_scene_id.clone_from(&first.id);
        }
        self.editor = editor;
        self.history.reset(&project);
        self.project = Some(Arc::new(project));
    }

    /// Persist the project through `storage`. Returns `Ok(false)` when no
    /// project is loaded.
    pub fn save_project(&self, storage: &mut dyn Storage) -> Result<bool, ProjectError> {
        let Some(project) = self.project() else {
            return Ok(false);
        };
        persist::write_project(storage, project, Utc::now())?;
        Ok(true)
    }

    // -- document mutations ---------------------------------------------------

    /// Run `edit` against the live project. `edit` returns whether it changed
    /// anything; `modified` is bumped only when it did.
    fn mutate(&mut self, op: &'static str, edit: impl FnOnce(&mut Project) -> bool) -> bool {
        let Some(shared) = self.project.as_mut() else {
            tracing::debug!(op, "no project loaded");
            return false;
        };
        let project = Arc::make_mut(shared);
        if !edit(project) {
            tracing::debug!(op, "no matching target");
            return false;
        }
        touch(&mut project.meta);
        true
    }

    /// Append `object` to the current scene. Returns false, leaving the
    /// project untouched, when the current scene does not exist or already
    /// holds an object with the same id. Duplicate ids are rejected rather
    /// than appended.
    pub fn add_object(&mut self, object: GameObject) -> bool {
        let scene_id = self.editor.current_scene_id.clone();
        self.mutate("add_object", |project| {
            let Some(scene) = project.scene_mut(&scene_id) else {
                return false;
            };
            if scene.object(&object.id).is_some() {
                tracing::warn!(object_id = %object.id, scene_id = %scene_id, "duplicate object id rejected");
                return false;
            }
            let mut object = object;
            object.layer = object.layer.clamp(0, MAX_LAYER);
            scene.objects.push(object);
            true
        })
    }

    /// Merge `patch` into every object with id `id`, in every scene.
    pub fn update_object(&mut self, id: &str, patch: &ObjectPatch) -> bool {
        self.mutate("update_object", |project| {
            let mut hit = false;
            for object in project
                .scenes
                .iter_mut()
                .flat_map(|s| s.objects.iter_mut())
                .filter(|o| o.id == id)
            {
                patch.apply(object);
                hit = true;
            }
            hit
        })
    }

    /// Remove the object with id `id` from whichever scene holds it.
    pub fn delete_object(&mut self, id: &str) -> bool {
        let removed = self.mutate("delete_object", |project| {
            let mut hit = false;
            for scene in &mut project.scenes {
                let before = scene.objects.len();
                scene.objects.retain(|o| o.id != id);
                hit |= scene.objects.len() != before;
            }
            hit
        });
        if self.editor.selected_object_id.as_deref() == Some(id) {
            self.editor.selected_object_id = None;
        }
        removed
    }

    pub fn add_rule(&mut self, rule: Rule) -> bool {
        self.mutate("add_rule", |project| {
            project.rules.push(rule);
            true
        })
    }

    pub fn update_rule(&mut self, id: &str, patch: &RulePatch) -> bool {
        self.mutate("update_rule", |project| {
            let mut hit = false;
            for rule in project.rules.iter_mut().filter(|r| r.id == id) {
                patch.apply(rule);
                hit = true;
            }
            hit
        })
    }

    pub fn delete_rule(&mut self, id: &str) -> bool {
        self.mutate("delete_rule", |project| {
            let before = project.rules.len();
            project.rules.retain(|r| r.id != id);
            project.rules.len() != before
        })
    }

    /// Append a scene. Does not switch to it.
    pub fn add_scene(&mut self, scene: Scene) -> bool {
        self.mutate("add_scene", |project| {
            if project.scene(&scene.id).is_some() {
                tracing::warn!(scene_id = %scene.id, "duplicate scene id rejected");
                return false;
            }
            project.scenes.push(scene);
            true
        })
    }

    // -- editor state ---------------------------------------------------------

    pub fn select_object(&mut self, id: Option<&str>) {
        self.editor.selected_object_id = id.map(str::to_owned);
    }

    pub fn set_current_scene(&mut self, scene_id: &str) {
        self.editor.current_scene_id = scene_id.to_owned();
    }

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.editor.grid_enabled = enabled;
    }

    /// Set the zoom factor. Non-positive or non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() && zoom > 0.0 {
            self.editor.zoom = zoom;
        } else {
            tracing::debug!(zoom, "ignoring invalid zoom");
        }
    }

    pub fn set_preview_mode(&mut self, previewing: bool) {
        self.editor.is_previewing = previewing;
    }

    // -- history --------------------------------------------------------------

    /// Commit the current project as a new undo step.
    pub fn save_to_history(&mut self) {
        if let Some(project) = self.project.as_deref() {
            self.history.commit(project);
        }
    }

    /// Restore the previous snapshot. Editor state is left alone.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(project) => {
                self.project = Some(Arc::new(project));
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Editor state is left alone.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(project) => {
                self.project = Some(Arc::new(project));
                true
            }
            None => false,
        }
    }
}

//! Starter projects and the object palette.
//!
//! [`default_project`] builds the fully populated document a new project
//! starts from. [`PALETTE`] lists the drop templates the editor offers, each
//! with the size a freshly dropped object gets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::*;

/// Id of the scene every template starts with.
pub const FIRST_SCENE_ID: &str = "scene-1";

/// Build a complete default project for `template`, stamped with `now`.
///
/// Only the platformer template populates its scene; topdown and clicker
/// share every setting but start empty.
pub fn default_project(template: Template, now: DateTime<Utc>) -> Project {
    let mut scene = Scene::new(FIRST_SCENE_ID, "Level 1", "#87CEEB");
    if template == Template::Platformer {
        scene.objects = platformer_objects();
    }

    let mut variables = BTreeMap::new();
    variables.insert("score".to_owned(), Variable::Number(0.0));
    variables.insert("lives".to_owned(), Variable::Number(3.0));

    Project {
        version: SCHEMA_VERSION.to_owned(),
        meta: ProjectMeta {
            id: format!("game-{}", now.timestamp_millis()),
            title: "My New Game".to_owned(),
            author: "Player".to_owned(),
            description: "A new game".to_owned(),
            thumbnail: None,
            created: now,
            modified: now,
            template,
        },
        settings: default_settings(),
        assets: Vec::new(),
        scenes: vec![scene],
        rules: Vec::new(),
        variables,
    }
}

/// Settings shared by all templates.
pub fn default_settings() -> GameSettings {
    let keys = |codes: &[&str]| codes.iter().map(|c| (*c).to_owned()).collect::<Vec<_>>();
    GameSettings {
        resolution: Resolution {
            width: 800,
            height: 600,
            scale_mode: ScaleMode::Fit,
        },
        physics: PhysicsSettings {
            gravity: 800.0,
            enable_collisions: true,
        },
        controls: ControlBindings {
            move_left: keys(&["ArrowLeft", "KeyA"]),
            move_right: keys(&["ArrowRight", "KeyD"]),
            jump: keys(&["Space", "ArrowUp", "KeyW"]),
            interact: keys(&["KeyE"]),
        },
        scoring: ScoringSettings {
            enabled: true,
            starting_score: 0.0,
            label: "Score".to_owned(),
            show_high_score: true,
        },
        lives: LivesSettings {
            enabled: true,
            starting_lives: 3,
            icon: "heart".to_owned(),
        },
        timer: TimerSettings {
            enabled: false,
            start_time: 60.0,
            count_down: true,
        },
        audio: AudioSettings {
            bg_music: None,
            bg_music_volume: 0.5,
            sfx_volume: 0.8,
            muted: false,
        },
        camera: CameraSettings {
            mode: CameraMode::FollowPlayer,
            smoothing: 0.1,
            bounds: None,
        },
    }
}

fn platformer_objects() -> Vec<GameObject> {
    let platform = |id: &str, name: &str, pos, size| {
        GameObject::new(id, ObjectType::Platform, name, pos, size).with_body(true, true, false)
    };

    vec![
        platform("platform-1", "Ground", (0.0, 550.0), (800.0, 50.0)),
        GameObject::new("player-1", ObjectType::Player, "Player", (100.0, 400.0), (32.0, 48.0))
            .with_layer(1)
            .with_body(true, false, true)
            .with_kind(ObjectKind::Player(PlayerProps {
                speed: Some(200.0),
                jump_force: Some(400.0),
            })),
        platform("platform-2", "Platform 1", (200.0, 450.0), (150.0, 20.0)),
        platform("platform-3", "Platform 2", (450.0, 350.0), (150.0, 20.0)),
        GameObject::new("collectible-1", ObjectType::Collectible, "Coin", (300.0, 400.0), (24.0, 24.0))
            .with_layer(1)
            .with_kind(ObjectKind::Collectible(CollectibleProps { value: Some(10.0) })),
        GameObject::new("goal-1", ObjectType::Goal, "Goal", (700.0, 450.0), (50.0, 100.0)),
    ]
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// A palette entry: what the host UI drags onto the canvas.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DropTemplate {
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub name: String,
    pub width: f64,
    pub height: f64,
}

impl DropTemplate {
    pub fn new(object_type: ObjectType, name: &str, width: f64, height: f64) -> Self {
        Self {
            object_type,
            name: name.to_owned(),
            width,
            height,
        }
    }

    /// Palette entry for `object_type`.
    pub fn for_type(object_type: ObjectType) -> Self {
        let (name, width, height) = PALETTE
            .iter()
            .find(|(t, ..)| *t == object_type)
            .map(|(_, name, w, h)| (*name, *w, *h))
            .unwrap_or(("Object", 32.0, 32.0));
        Self::new(object_type, name, width, height)
    }

    /// Body flags a freshly dropped object of this type gets: players and
    /// platforms block, platforms never move, only players fall.
    pub fn body_flags(&self) -> BodyFlags {
        let t = self.object_type;
        BodyFlags {
            solid: matches!(t, ObjectType::Platform | ObjectType::Player),
            is_static: t == ObjectType::Platform,
            gravity: t == ObjectType::Player,
        }
    }
}

/// Type, display name, default width and height of every palette entry.
pub const PALETTE: [(ObjectType, &str, f64, f64); 7] = [
    (ObjectType::Player, "Player", 32.0, 64.0),
    (ObjectType::Platform, "Platform", 128.0, 32.0),
    (ObjectType::Collectible, "Collectible", 24.0, 24.0),
    (ObjectType::Enemy, "Enemy", 32.0, 32.0),
    (ObjectType::Goal, "Goal", 48.0, 96.0),
    (ObjectType::Hazard, "Hazard", 32.0, 32.0),
    (ObjectType::Decoration, "Decoration", 64.0, 64.0),
];

/// Palette entries whose name contains `term`, ignoring case.
pub fn search_palette(term: &str) -> Vec<DropTemplate> {
    let needle = term.to_lowercase();
    PALETTE
        .iter()
        .filter(|(_, name, ..)| name.to_lowercase().contains(&needle))
        .map(|(t, name, w, h)| DropTemplate::new(*t, name, *w, *h))
        .collect()
}

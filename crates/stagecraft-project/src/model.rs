//! Project document types.
//!
//! Everything in this module is plain data: a [`Project`] is the complete,
//! serializable description of a game (scenes, objects, rules, settings and
//! starting variables). Behavior lives in [`crate::store`] (mutation) and in
//! the playback runtime (simulation).
//!
//! # Wire format
//!
//! The JSON shape is the one the editor persists: objects carry a `type`
//! string and an open `properties` object. In memory, properties are a typed
//! [`ObjectKind`] variant plus [`BodyFlags`], converted at the serde boundary
//! by [`ObjectRecord`]. Property keys the editor does not know about are kept
//! in [`GameObject::extra`] so a load/save cycle never drops authored data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema version written into new projects.
pub const SCHEMA_VERSION: &str = "1.0";

/// Highest layer an object may sit on. Layers run from 0 (back) to this value.
pub const MAX_LAYER: i32 = 10;

/// Player horizontal speed when the object does not specify one.
pub const DEFAULT_PLAYER_SPEED: f64 = 200.0;

/// Player jump impulse when the object does not specify one.
pub const DEFAULT_JUMP_FORCE: f64 = 400.0;

/// Points awarded by a collectible without an explicit value.
pub const DEFAULT_COLLECTIBLE_VALUE: f64 = 10.0;

/// Lives removed by an enemy without an explicit damage value.
pub const DEFAULT_ENEMY_DAMAGE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// The versioned root aggregate of an authored game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Schema version string (currently `"1.0"`).
    pub version: String,
    /// Identity, authorship and timestamps.
    pub meta: ProjectMeta,
    /// Global game configuration.
    pub settings: GameSettings,
    /// Referenced image/audio assets.
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Ordered scenes. A valid project has at least one.
    pub scenes: Vec<Scene>,
    /// Authored automation rules, in evaluation order.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Starting variables (`score`, `lives`, and anything user-defined).
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
}

impl Project {
    /// Look up a scene by id.
    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == scene_id)
    }

    /// Mutable scene lookup by id.
    pub fn scene_mut(&mut self, scene_id: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == scene_id)
    }

    /// Find the first object with the given id in any scene.
    pub fn object(&self, object_id: &str) -> Option<&GameObject> {
        self.scenes
            .iter()
            .flat_map(|s| s.objects.iter())
            .find(|o| o.id == object_id)
    }

    /// Look up a rule by id.
    pub fn rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// Numeric value of a variable, if it exists and holds a number.
    pub fn number_variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).and_then(Variable::as_number)
    }

    /// Total number of objects across all scenes.
    pub fn object_count(&self) -> usize {
        self.scenes.iter().map(|s| s.objects.len()).sum()
    }
}

/// Project identity and bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created: DateTime<Utc>,
    /// Last mutation time. Strictly increases across store mutations.
    pub modified: DateTime<Utc>,
    pub template: Template,
}

/// Starter template a project was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Platformer,
    Topdown,
    Clicker,
}

impl Template {
    pub fn as_str(self) -> &'static str {
        match self {
            Template::Platformer => "platformer",
            Template::Topdown => "topdown",
            Template::Clicker => "clicker",
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub resolution: Resolution,
    pub physics: PhysicsSettings,
    pub controls: ControlBindings,
    pub scoring: ScoringSettings,
    pub lives: LivesSettings,
    pub timer: TimerSettings,
    pub audio: AudioSettings,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub scale_mode: ScaleMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    Fit,
    Fill,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsSettings {
    /// Downward acceleration in world units per second squared.
    pub gravity: f64,
    pub enable_collisions: bool,
}

/// Key codes (DOM `KeyboardEvent.code` names) bound to each game action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlBindings {
    pub move_left: Vec<String>,
    pub move_right: Vec<String>,
    pub jump: Vec<String>,
    pub interact: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSettings {
    pub enabled: bool,
    pub starting_score: f64,
    pub label: String,
    pub show_high_score: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivesSettings {
    pub enabled: bool,
    pub starting_lives: u32,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub enabled: bool,
    pub start_time: f64,
    pub count_down: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_music: Option<String>,
    pub bg_music_volume: f64,
    pub sfx_volume: f64,
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSettings {
    pub mode: CameraMode,
    pub smoothing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraMode {
    Fixed,
    FollowPlayer,
    Custom,
}

/// Axis-aligned rectangle in world units (top-left anchored).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Audio,
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// One level/screen: a background and an ordered object list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub background: Background,
    #[serde(default)]
    pub objects: Vec<GameObject>,
}

impl Scene {
    /// An empty scene with a plain background color.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            background: Background {
                color: color.into(),
                image: None,
                parallax: None,
            },
            objects: Vec::new(),
        }
    }

    pub fn object(&self, object_id: &str) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id == object_id)
    }

    /// First object of type player, in list order.
    pub fn first_player(&self) -> Option<&GameObject> {
        self.objects
            .iter()
            .find(|o| o.object_type() == ObjectType::Player)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallax: Option<Vec<ParallaxLayer>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallaxLayer {
    pub image: String,
    pub scroll_speed: f64,
}

// ---------------------------------------------------------------------------
// Game objects
// ---------------------------------------------------------------------------

/// The kind tag of a [`GameObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Player,
    Platform,
    Collectible,
    Enemy,
    Goal,
    Hazard,
    Decoration,
}

impl ObjectType {
    pub const ALL: [ObjectType; 7] = [
        ObjectType::Player,
        ObjectType::Platform,
        ObjectType::Collectible,
        ObjectType::Enemy,
        ObjectType::Goal,
        ObjectType::Hazard,
        ObjectType::Decoration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Player => "player",
            ObjectType::Platform => "platform",
            ObjectType::Collectible => "collectible",
            ObjectType::Enemy => "enemy",
            ObjectType::Goal => "goal",
            ObjectType::Hazard => "hazard",
            ObjectType::Decoration => "decoration",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physics participation flags shared by every object type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyFlags {
    /// Takes part in blocking collisions.
    pub solid: bool,
    /// Immovable and ungravitated.
    pub is_static: bool,
    /// Affected by world gravity.
    pub gravity: bool,
}

/// Type-specific properties. Each variant carries only the fields that
/// matter for its type; unset fields resolve to defaults at use time.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Player(PlayerProps),
    Platform,
    Collectible(CollectibleProps),
    Enemy(EnemyProps),
    Goal,
    Hazard,
    Decoration,
}

impl ObjectKind {
    /// The variant for `object_type` with every optional field unset.
    pub fn empty(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::Player => ObjectKind::Player(PlayerProps::default()),
            ObjectType::Platform => ObjectKind::Platform,
            ObjectType::Collectible => ObjectKind::Collectible(CollectibleProps::default()),
            ObjectType::Enemy => ObjectKind::Enemy(EnemyProps::default()),
            ObjectType::Goal => ObjectKind::Goal,
            ObjectType::Hazard => ObjectKind::Hazard,
            ObjectType::Decoration => ObjectKind::Decoration,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectKind::Player(_) => ObjectType::Player,
            ObjectKind::Platform => ObjectType::Platform,
            ObjectKind::Collectible(_) => ObjectType::Collectible,
            ObjectKind::Enemy(_) => ObjectType::Enemy,
            ObjectKind::Goal => ObjectType::Goal,
            ObjectKind::Hazard => ObjectType::Hazard,
            ObjectKind::Decoration => ObjectType::Decoration,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerProps {
    pub speed: Option<f64>,
    pub jump_force: Option<f64>,
}

impl PlayerProps {
    pub fn speed(&self) -> f64 {
        self.speed.unwrap_or(DEFAULT_PLAYER_SPEED)
    }

    pub fn jump_force(&self) -> f64 {
        self.jump_force.unwrap_or(DEFAULT_JUMP_FORCE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollectibleProps {
    pub value: Option<f64>,
}

impl CollectibleProps {
    pub fn value(&self) -> f64 {
        self.value.unwrap_or(DEFAULT_COLLECTIBLE_VALUE)
    }
}

/// Enemy properties. `health`, `speed` and `patrol_distance` are authored and
/// persisted but not used by playback.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnemyProps {
    pub damage: Option<f64>,
    pub health: Option<f64>,
    pub speed: Option<f64>,
    pub patrol_distance: Option<f64>,
}

impl EnemyProps {
    pub fn damage(&self) -> f64 {
        self.damage.unwrap_or(DEFAULT_ENEMY_DAMAGE)
    }
}

/// A placed entity instance in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObjectRecord", into = "ObjectRecord")]
pub struct GameObject {
    pub id: String,
    pub name: String,
    /// Left edge in world units.
    pub x: f64,
    /// Top edge in world units.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Opaque sprite reference.
    pub sprite: String,
    /// Draw/processing order; higher is in front. Always within `0..=MAX_LAYER`.
    pub layer: i32,
    pub body: BodyFlags,
    pub kind: ObjectKind,
    /// Authored property keys with no typed meaning.
    pub extra: BTreeMap<String, Value>,
}

impl GameObject {
    /// A new object at `(x, y)` with type-appropriate empty properties.
    pub fn new(
        id: impl Into<String>,
        object_type: ObjectType,
        name: impl Into<String>,
        (x, y): (f64, f64),
        (width, height): (f64, f64),
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            width,
            height,
            sprite: String::new(),
            layer: 0,
            body: BodyFlags::default(),
            kind: ObjectKind::empty(object_type),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer.clamp(0, MAX_LAYER);
        self
    }

    pub fn with_body(mut self, solid: bool, is_static: bool, gravity: bool) -> Self {
        self.body = BodyFlags {
            solid,
            is_static,
            gravity,
        };
        self
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }
}

// ---------------------------------------------------------------------------
// Wire conversion
// ---------------------------------------------------------------------------

/// Serialized shape of a [`GameObject`]: type tag plus open property map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub sprite: String,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

fn take_flag(
    props: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<bool, String> {
    match props.remove(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(other) => Err(format!("property '{key}' must be a boolean, got {other}")),
    }
}

fn take_number(
    props: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<Option<f64>, String> {
    match props.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(other) => Err(format!("property '{key}' must be a number, got {other}")),
    }
}

impl TryFrom<ObjectRecord> for GameObject {
    type Error = String;

    fn try_from(record: ObjectRecord) -> Result<Self, Self::Error> {
        let mut props = record.properties;
        let body = BodyFlags {
            solid: take_flag(&mut props, "solid")?,
            is_static: take_flag(&mut props, "static")?,
            gravity: take_flag(&mut props, "gravity")?,
        };

        let kind = match record.object_type {
            ObjectType::Player => ObjectKind::Player(PlayerProps {
                speed: take_number(&mut props, "speed")?,
                jump_force: take_number(&mut props, "jumpForce")?,
            }),
            ObjectType::Collectible => ObjectKind::Collectible(CollectibleProps {
                value: take_number(&mut props, "value")?,
            }),
            ObjectType::Enemy => ObjectKind::Enemy(EnemyProps {
                damage: take_number(&mut props, "damage")?,
                health: take_number(&mut props, "health")?,
                speed: take_number(&mut props, "speed")?,
                patrol_distance: take_number(&mut props, "patrolDistance")?,
            }),
            other => ObjectKind::empty(other),
        };

        Ok(GameObject {
            id: record.id,
            name: record.name,
            x: record.x,
            y: record.y,
            width: record.width,
            height: record.height,
            sprite: record.sprite,
            layer: record.layer,
            body,
            kind,
            extra: props.into_iter().collect(),
        })
    }
}

impl From<GameObject> for ObjectRecord {
    fn from(object: GameObject) -> Self {
        let mut props = serde_json::Map::new();
        props.insert("solid".to_owned(), Value::Bool(object.body.solid));
        props.insert("static".to_owned(), Value::Bool(object.body.is_static));
        props.insert("gravity".to_owned(), Value::Bool(object.body.gravity));

        let mut put = |key: &str, value: Option<f64>| {
            if let Some(v) = value {
                props.insert(key.to_owned(), serde_json::json!(v));
            }
        };
        match &object.kind {
            ObjectKind::Player(p) => {
                put("speed", p.speed);
                put("jumpForce", p.jump_force);
            }
            ObjectKind::Collectible(c) => put("value", c.value),
            ObjectKind::Enemy(e) => {
                put("damage", e.damage);
                put("health", e.health);
                put("speed", e.speed);
                put("patrolDistance", e.patrol_distance);
            }
            _ => {}
        }
        for (key, value) in object.extra {
            props.entry(key).or_insert(value);
        }

        ObjectRecord {
            id: object.id,
            object_type: object.kind.object_type(),
            name: object.name,
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            sprite: object.sprite,
            layer: object.layer,
            properties: props,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// An authored (trigger, actions) pair.
///
/// Rules are stored and edited but not interpreted by playback; the runtime's
/// type-based collision outcomes are the only live gameplay behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub when: Trigger,
    #[serde(rename = "do")]
    pub actions: Vec<RuleAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub event: TriggerEvent,
    /// Trigger-specific parameters (e.g. `objectA`, `key`, `interval`).
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerEvent {
    Collision,
    KeyPress,
    KeyRelease,
    Click,
    GameStart,
    Timer,
    VariableCondition,
    ObjectCreated,
    ObjectDestroyed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub action: ActionKind,
    /// Action-specific parameters (e.g. `target`, `amount`, `message`).
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Destroy,
    Create,
    Move,
    AddScore,
    SubtractScore,
    PlaySound,
    WinGame,
    LoseGame,
    ShowMessage,
    ChangeVariable,
    ApplyForce,
    FlashScreen,
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// A starting variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl Variable {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Variable::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Variable::Number(value)
    }
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Partial update for a [`GameObject`]. `None` fields are left untouched.
///
/// Sizes that are not positive and finite are ignored; layers are clamped to
/// `0..=MAX_LAYER` so a patch can never break object invariants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    pub name: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub sprite: Option<String>,
    pub layer: Option<i32>,
    pub body: Option<BodyFlags>,
    pub kind: Option<ObjectKind>,
}

impl ObjectPatch {
    /// Patch that only moves the object.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn apply(&self, object: &mut GameObject) {
        if let Some(name) = &self.name {
            object.name.clone_from(name);
        }
        if let Some(x) = self.x.filter(|v| v.is_finite()) {
            object.x = x;
        }
        if let Some(y) = self.y.filter(|v| v.is_finite()) {
            object.y = y;
        }
        if let Some(w) = self.width.filter(|v| v.is_finite() && *v > 0.0) {
            object.width = w;
        }
        if let Some(h) = self.height.filter(|v| v.is_finite() && *v > 0.0) {
            object.height = h;
        }
        if let Some(sprite) = &self.sprite {
            object.sprite.clone_from(sprite);
        }
        if let Some(layer) = self.layer {
            object.layer = layer.clamp(0, MAX_LAYER);
        }
        if let Some(body) = self.body {
            object.body = body;
        }
        if let Some(kind) = &self.kind {
            object.kind = kind.clone();
        }
    }
}

/// Partial update for a [`Rule`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePatch {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub when: Option<Trigger>,
    pub actions: Option<Vec<RuleAction>>,
}

impl RulePatch {
    pub fn apply(&self, rule: &mut Rule) {
        if let Some(name) = &self.name {
            rule.name.clone_from(name);
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
        if let Some(when) = &self.when {
            rule.when = when.clone();
        }
        if let Some(actions) = &self.actions {
            rule.actions = actions.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_reads_typed_properties_from_open_map() {
        let json = serde_json::json!({
            "id": "player-1",
            "type": "player",
            "name": "Player",
            "x": 100, "y": 400, "width": 32, "height": 48,
            "sprite": "", "layer": 1,
            "properties": {
                "solid": true, "static": false, "gravity": true,
                "speed": 250, "jumpForce": 500, "glow": "blue"
            }
        });
        let obj: GameObject = serde_json::from_value(json).unwrap();

        assert_eq!(obj.object_type(), ObjectType::Player);
        assert!(obj.body.solid && obj.body.gravity && !obj.body.is_static);
        let ObjectKind::Player(props) = &obj.kind else {
            panic!("expected player kind, got {:?}", obj.kind);
        };
        assert_eq!(props.speed(), 250.0);
        assert_eq!(props.jump_force(), 500.0);
        assert_eq!(obj.extra.get("glow"), Some(&serde_json::json!("blue")));
    }

    #[test]
    fn missing_type_fields_default_at_use_time() {
        let json = serde_json::json!({
            "id": "c", "type": "collectible", "name": "Coin",
            "x": 0, "y": 0, "width": 24, "height": 24,
            "properties": {}
        });
        let obj: GameObject = serde_json::from_value(json).unwrap();
        let ObjectKind::Collectible(props) = obj.kind else {
            panic!("expected collectible");
        };
        assert_eq!(props.value, None);
        assert_eq!(props.value(), DEFAULT_COLLECTIBLE_VALUE);
        assert!(!obj.body.solid);
    }

    #[test]
    fn wrongly_typed_property_is_rejected() {
        let json = serde_json::json!({
            "id": "e", "type": "enemy", "name": "Bat",
            "x": 0, "y": 0, "width": 32, "height": 32,
            "properties": { "damage": "lots" }
        });
        let err = serde_json::from_value::<GameObject>(json).unwrap_err();
        assert!(err.to_string().contains("damage"), "got: {err}");
    }

    #[test]
    fn serialized_object_keeps_unset_fields_absent() {
        let obj = GameObject::new("g", ObjectType::Enemy, "Bat", (1.0, 2.0), (3.0, 4.0))
            .with_kind(ObjectKind::Enemy(EnemyProps {
                damage: Some(2.0),
                ..Default::default()
            }));
        let value = serde_json::to_value(&obj).unwrap();
        let props = &value["properties"];
        assert_eq!(value["type"], "enemy");
        assert_eq!(props["damage"], 2.0);
        assert!(props.get("health").is_none());
        assert_eq!(props["solid"], false);
    }

    #[test]
    fn rule_params_flatten_beside_tag() {
        let json = serde_json::json!({
            "id": "r1", "name": "Coin sound", "enabled": true,
            "when": { "event": "collision", "objectA": "player", "objectB": "collectible" },
            "do": [ { "action": "playSound", "sound": "coin" }, { "action": "addScore", "amount": 5 } ]
        });
        let rule: Rule = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(rule.when.event, TriggerEvent::Collision);
        assert_eq!(rule.when.params["objectA"], "player");
        assert_eq!(rule.actions[1].action, ActionKind::AddScore);
        assert_eq!(serde_json::to_value(&rule).unwrap(), json);
    }

    #[test]
    fn variables_keep_their_json_kind() {
        let vars: BTreeMap<String, Variable> =
            serde_json::from_str(r#"{"score":0,"name":"hero","hard":true}"#).unwrap();
        assert_eq!(vars["score"], Variable::Number(0.0));
        assert_eq!(vars["name"], Variable::Text("hero".into()));
        assert_eq!(vars["hard"], Variable::Flag(true));
    }

    #[test]
    fn patch_ignores_invalid_size_and_clamps_layer() {
        let mut obj = GameObject::new("o", ObjectType::Platform, "P", (0.0, 0.0), (10.0, 10.0));
        ObjectPatch {
            width: Some(-5.0),
            height: Some(f64::NAN),
            layer: Some(42),
            ..Default::default()
        }
        .apply(&mut obj);
        assert_eq!((obj.width, obj.height), (10.0, 10.0));
        assert_eq!(obj.layer, MAX_LAYER);
    }
}

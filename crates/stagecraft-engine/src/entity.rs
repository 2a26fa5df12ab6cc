//! Runtime entities instantiated from scene objects.

use serde::Serialize;
use stagecraft_project::model::{BodyFlags, GameObject, ObjectKind, ObjectType};

/// Identifier of a runtime entity. Ids follow the authored object order of
/// the scene, so iteration by id is iteration in scene order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Axis-aligned rectangle, top-left anchored, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Name tag drawn at an entity's centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// A live instance of a scene object.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Id of the authored object this entity was built from.
    pub object_id: String,
    pub object_type: ObjectType,
    pub rect: Rect,
    pub body: BodyFlags,
    pub kind: ObjectKind,
    pub label: Label,
}

impl Entity {
    pub fn from_object(id: EntityId, object: &GameObject) -> Self {
        let rect = Rect::new(object.x, object.y, object.width, object.height);
        let (cx, cy) = rect.center();
        Self {
            id,
            object_id: object.id.clone(),
            object_type: object.object_type(),
            rect,
            body: object.body,
            kind: object.kind.clone(),
            label: Label {
                text: object.name.clone(),
                x: cx,
                y: cy,
            },
        }
    }

    /// Whether the entity takes part in the physics simulation.
    pub fn has_body(&self) -> bool {
        self.body.solid || self.object_type == ObjectType::Player
    }

    /// Move the label back onto the entity's centre.
    pub fn sync_label(&mut self) {
        let (cx, cy) = self.rect.center();
        self.label.x = cx;
        self.label.y = cy;
    }
}

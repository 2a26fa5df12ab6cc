//! Observable playback state and its BLAKE3 hash.
//!
//! A [`PlaySnapshot`] captures everything a viewer could observe about a
//! session at the end of a tick: the lifecycle state, score and lives, the
//! camera and the rectangle of every live entity. Two runs fed the same
//! input produce byte-identical snapshots and therefore equal hashes.

use serde::Serialize;

use crate::camera::Camera;
use crate::entity::{Entity, EntityId};
use crate::session::PlayState;

/// One live entity as seen from outside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub object_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            object_id: entity.object_id.clone(),
            x: entity.rect.x,
            y: entity.rect.y,
            width: entity.rect.width,
            height: entity.rect.height,
        }
    }
}

/// Observable session state at a tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaySnapshot {
    pub tick: u64,
    pub state: PlayState,
    pub score: f64,
    pub lives: f64,
    pub can_jump: bool,
    pub camera: Option<Camera>,
    /// Live entities in id order.
    pub entities: Vec<EntityView>,
}

impl PlaySnapshot {
    /// BLAKE3 hex digest of the canonical JSON form of this snapshot.
    pub fn state_hash(&self) -> String {
        let json_bytes = serde_json::to_vec(self)
            .expect("PlaySnapshot should always be JSON-serializable");
        blake3::hash(&json_bytes).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(score: f64) -> PlaySnapshot {
        PlaySnapshot {
            tick: 3,
            state: PlayState::Running,
            score,
            lives: 3.0,
            can_jump: true,
            camera: None,
            entities: vec![EntityView {
                id: EntityId(0),
                object_id: "platform-1".into(),
                x: 0.0,
                y: 550.0,
                width: 800.0,
                height: 50.0,
            }],
        }
    }

    #[test]
    fn hash_is_stable_and_sensitive() {
        let a = snapshot(0.0);
        assert_eq!(a.state_hash(), snapshot(0.0).state_hash());
        assert_ne!(a.state_hash(), snapshot(10.0).state_hash());
        assert_eq!(a.state_hash().len(), 64);
    }
}

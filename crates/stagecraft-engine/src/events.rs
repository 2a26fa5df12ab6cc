//! Events emitted by a play session during a tick.
//!
//! Events are a read-only log for hosts and tests. They never feed back into
//! the simulation.

use serde::Serialize;

/// Something that happened during one tick of playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayEvent {
    /// The player left the ground.
    Jumped,
    /// A collectible was picked up. `score` is the new total.
    Collected {
        object_id: String,
        value: f64,
        score: f64,
    },
    /// An enemy touched the player. `lives` is what remains.
    EnemyHit {
        object_id: String,
        damage: f64,
        lives: f64,
    },
    /// The player was sent back to its authored spawn point.
    Respawned { x: f64, y: f64 },
    /// A hazard drained a life.
    HazardHit { object_id: String, lives: f64 },
    GoalReached,
    GameOver,
    Won,
    Restarted,
}

//! Stagecraft engine -- fixed-timestep playback of Stagecraft projects.
//!
//! This crate turns a frozen [`Project`](stagecraft_project::model::Project)
//! snapshot into a playable game: entities built from the first scene, a
//! deterministic rapier2d [`PhysicsWorld`](physics::PhysicsWorld), keyboard
//! input mapped through the project's control bindings, and the built-in
//! platformer outcomes (collect, enemy hit, goal, hazard).
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use stagecraft_engine::prelude::*;
//!
//! let project = Arc::new(default_project(Template::Platformer, chrono::Utc::now()));
//! let mut session = PlaySession::new(project, TickConfig::headless());
//! session.start().unwrap();
//!
//! session.key_down("ArrowRight");
//! session.run_ticks(60);
//!
//! assert_eq!(session.tick_count(), 60);
//! assert_eq!(session.state(), PlayState::Running);
//! ```

#![deny(unsafe_code)]

pub mod camera;
pub mod entity;
pub mod events;
pub mod hud;
pub mod physics;
pub mod session;
pub mod snapshot;
pub mod tick;

/// Re-export the project crate for convenience.
pub use stagecraft_project;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that prevent a play session from starting.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The project has no scene to instantiate.
    #[error("project has no scenes to play")]
    NoScene,

    /// The configured time step is zero, negative or not finite.
    #[error("invalid fixed time step {dt}: must be positive and finite")]
    InvalidTickConfig { dt: f64 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Everything from the project prelude.
    pub use stagecraft_project::prelude::*;

    pub use crate::camera::Camera;
    pub use crate::entity::{Entity, EntityId, Label, Rect};
    pub use crate::events::PlayEvent;
    pub use crate::hud::{Flash, Hud, Overlay};
    pub use crate::physics::{BodyKind, BodySpec, BodyState, ColliderRole, CollisionPair, PhysicsWorld};
    pub use crate::session::{PlaySession, PlayState};
    pub use crate::snapshot::{EntityView, PlaySnapshot};
    pub use crate::tick::{Action, InputState, KeyBindings, TickConfig, RESTART_KEY};
    pub use crate::SessionError;
}

//! rapier2d integration for playback.
//!
//! The [`PhysicsWorld`] owns a rapier2d simulation and maps runtime
//! [`EntityId`]s to rapier handles. The rest of the runtime works in
//! top-left anchored rectangles in pixels with y pointing down; this module
//! converts to rapier's centre-anchored bodies at the boundary.
//!
//! Only two collision roles block each other: the player and platforms.
//! Every other body is registered with empty interaction groups so it is
//! simulated (it can fall) but never pushes or is pushed. Gameplay contact
//! with collectibles, enemies, goals and hazards is overlap-based and
//! handled by the session, not by rapier.
//!
//! # Determinism
//!
//! rapier2d is compiled with `enhanced-determinism`. Together with a fixed
//! timestep and id-ordered registration, identical inputs produce identical
//! trajectories on the same platform.

use std::collections::HashMap;

use rapier2d::prelude::*;

use crate::entity::{EntityId, Rect};

/// Typical object size in pixels. Scales rapier's internal tolerances.
pub const LENGTH_UNIT: Real = 100.0;

/// Collision group of the player body.
const PLAYER_GROUP: Group = Group::GROUP_1;

/// Collision group of platform bodies.
const PLATFORM_GROUP: Group = Group::GROUP_2;

/// Minimum vertical component of a contact normal for the contact to count
/// as ground under the player.
const GROUND_NORMAL_Y: Real = 0.5;

// ---------------------------------------------------------------------------
// Body descriptors
// ---------------------------------------------------------------------------

/// How rapier treats a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Fully simulated.
    Dynamic,
    /// Moves only by the velocity the runtime sets, ignores forces.
    Kinematic,
    /// Immovable.
    Fixed,
}

/// Which blocking collisions a body takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderRole {
    /// Collides with platforms and reports collision events.
    Player,
    /// Collides with the player.
    Platform,
    /// Collides with nothing.
    Inert,
}

/// Everything needed to register a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    pub kind: BodyKind,
    pub role: ColliderRole,
    /// Whether world gravity applies. Only meaningful for dynamic bodies.
    pub gravity: bool,
}

/// Bookkeeping for one registered entity.
#[derive(Debug, Clone, Copy)]
struct BodyRecord {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    half_width: Real,
    half_height: Real,
}

/// Position and velocity of a moving body after a step, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// rapier2d simulation state plus the entity/handle maps.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    records: HashMap<EntityId, BodyRecord>,
    collider_to_entity: HashMap<ColliderHandle, EntityId>,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity)
            .field("bodies", &self.rigid_body_set.len())
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Create a world with downward gravity `gravity` in pixels per second
    /// squared.
    pub fn new(gravity: f64) -> Self {
        let mut integration_params = IntegrationParameters::default();
        integration_params.length_unit = LENGTH_UNIT;
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, gravity as Real],
            integration_params,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            records: HashMap::new(),
            collider_to_entity: HashMap::new(),
        }
    }

    /// Register `id` with a box collider covering `rect`.
    ///
    /// If the entity is already registered, this is a no-op.
    pub fn register_entity(&mut self, id: EntityId, rect: &Rect, spec: BodySpec) {
        if self.records.contains_key(&id) {
            return;
        }

        let half_width = (rect.width / 2.0) as Real;
        let half_height = (rect.height / 2.0) as Real;
        let (cx, cy) = rect.center();
        let translation = vector![cx as Real, cy as Real];

        let rb = match spec.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .translation(translation)
                .lock_rotations()
                .gravity_scale(if spec.gravity { 1.0 } else { 0.0 })
                .build(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based()
                .translation(translation)
                .build(),
            BodyKind::Fixed => RigidBodyBuilder::fixed().translation(translation).build(),
        };
        let body = self.rigid_body_set.insert(rb);

        let collider = match spec.role {
            ColliderRole::Player => ColliderBuilder::cuboid(half_width, half_height)
                .friction(0.0)
                .friction_combine_rule(CoefficientCombineRule::Min)
                .restitution(0.0)
                .collision_groups(InteractionGroups::new(PLAYER_GROUP, PLATFORM_GROUP))
                .active_events(ActiveEvents::COLLISION_EVENTS),
            ColliderRole::Platform => ColliderBuilder::cuboid(half_width, half_height)
                .restitution(0.0)
                .collision_groups(InteractionGroups::new(PLATFORM_GROUP, PLAYER_GROUP)),
            ColliderRole::Inert => ColliderBuilder::cuboid(half_width, half_height)
                .collision_groups(InteractionGroups::none()),
        }
        .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);

        self.records.insert(
            id,
            BodyRecord {
                body,
                collider,
                half_width,
                half_height,
            },
        );
        self.collider_to_entity.insert(collider, id);
    }

    /// Remove an entity's body and collider. Unknown ids are ignored.
    pub fn unregister_entity(&mut self, id: EntityId) {
        if let Some(record) = self.records.remove(&id) {
            self.collider_to_entity.remove(&record.collider);
            self.rigid_body_set.remove(
                record.body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
    }

    fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        let record = self.records.get(&id)?;
        self.rigid_body_set.get_mut(record.body)
    }

    /// Current linear velocity of `id`, in pixels per second.
    pub fn velocity(&self, id: EntityId) -> Option<(f64, f64)> {
        let record = self.records.get(&id)?;
        let v = self.rigid_body_set.get(record.body)?.linvel();
        Some((v.x as f64, v.y as f64))
    }

    /// Overwrite the horizontal velocity, keeping the vertical one.
    pub fn set_velocity_x(&mut self, id: EntityId, vx: f64) {
        if let Some(rb) = self.body_mut(id) {
            let vy = rb.linvel().y;
            rb.set_linvel(vector![vx as Real, vy], true);
        }
    }

    /// Overwrite the vertical velocity, keeping the horizontal one.
    pub fn set_velocity_y(&mut self, id: EntityId, vy: f64) {
        if let Some(rb) = self.body_mut(id) {
            let vx = rb.linvel().x;
            rb.set_linvel(vector![vx, vy as Real], true);
        }
    }

    /// Place `id` with its top-left corner at `(x, y)`. Velocity is kept.
    pub fn set_position(&mut self, id: EntityId, x: f64, y: f64) {
        let Some(record) = self.records.get(&id).copied() else {
            return;
        };
        if let Some(rb) = self.rigid_body_set.get_mut(record.body) {
            let center = vector![x as Real + record.half_width, y as Real + record.half_height];
            rb.set_translation(center, true);
        }
    }

    /// Step the simulation by `dt` seconds.
    ///
    /// Returns the collision pairs that started during the step, sorted by
    /// entity id.
    pub fn step(&mut self, dt: f64) -> Vec<CollisionPair> {
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut collisions = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.collider_to_entity.get(&h1).copied();
                let b = self.collider_to_entity.get(&h2).copied();
                if let (Some(a), Some(b)) = (a, b) {
                    collisions.push(CollisionPair::new(a, b));
                }
            }
        }
        // Channel delivery order is not guaranteed.
        collisions.sort_by_key(|c| (c.entity_a, c.entity_b));
        collisions
    }

    /// Top-left positions and velocities of every non-fixed body, sorted by
    /// entity id.
    pub fn read_results(&self) -> Vec<BodyState> {
        let mut results: Vec<BodyState> = self
            .records
            .iter()
            .filter_map(|(&id, record)| {
                let rb = self.rigid_body_set.get(record.body)?;
                if rb.is_fixed() {
                    return None;
                }
                let t = rb.translation();
                let v = rb.linvel();
                Some(BodyState {
                    id,
                    x: (t.x - record.half_width) as f64,
                    y: (t.y - record.half_height) as f64,
                    vx: v.x as f64,
                    vy: v.y as f64,
                })
            })
            .collect();
        results.sort_by_key(|s| s.id);
        results
    }

    /// Whether `id` is resting on something beneath it, judged from the
    /// active contacts of the last step.
    pub fn is_grounded(&self, id: EntityId) -> bool {
        let Some(record) = self.records.get(&id) else {
            return false;
        };
        let me = record.collider;
        self.narrow_phase
            .contact_pairs_with(me)
            .filter(|pair| pair.has_any_active_contact)
            .any(|pair| {
                pair.manifolds.iter().any(|manifold| {
                    if manifold.points.is_empty() {
                        return false;
                    }
                    // The manifold normal points away from collider1.
                    let ny = manifold.data.normal.y;
                    if pair.collider1 == me {
                        ny > GROUND_NORMAL_Y
                    } else {
                        ny < -GROUND_NORMAL_Y
                    }
                })
            })
    }

    pub fn has_entity(&self, id: EntityId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of rapier bodies currently alive.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

// ---------------------------------------------------------------------------
// CollisionPair
// ---------------------------------------------------------------------------

/// Two entities whose blocking contact started during a step. Stored with
/// the lower id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
}

impl CollisionPair {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self {
            entity_a: a.min(b),
            entity_b: a.max(b),
        }
    }

    /// The entity paired with `id`, if `id` is part of this pair.
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.entity_a == id {
            Some(self.entity_b)
        } else if self.entity_b == id {
            Some(self.entity_a)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

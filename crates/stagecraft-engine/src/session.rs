//! Play sessions: running a frozen project snapshot as a game.
//!
//! A [`PlaySession`] takes an `Arc<Project>` captured from the editor and
//! never looks at the editor's document again. The first scene becomes a set
//! of [`Entity`] values, bodies are registered with the [`PhysicsWorld`], and
//! every [`tick`](PlaySession::tick) advances the game by one fixed step.
//!
//! # Tick order
//!
//! While running, each tick:
//!
//! 1. Drives the player from input (horizontal speed, jump impulse).
//! 2. Steps physics and copies body positions back onto entities.
//! 3. Keeps the player inside the level rectangle.
//! 4. Resolves outcomes in a fixed order: platform contact, collectibles,
//!    goal, enemies, hazards.
//! 5. Moves labels, the camera and the HUD.
//!
//! Once the game is over or won, physics is paused and only a fresh press of
//! [`RESTART_KEY`] (or [`PlaySession::restart`]) leaves that state.
//!
//! # Rules
//!
//! Authored rules are not evaluated. The outcomes above are the only live
//! game logic; the number of dormant rules is logged when a session starts.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use stagecraft_project::model::{ObjectKind, ObjectType, PlayerProps, Project};

use crate::camera::Camera;
use crate::entity::{Entity, EntityId, Rect};
use crate::events::PlayEvent;
use crate::hud::{Hud, Overlay};
use crate::physics::{BodyKind, BodySpec, ColliderRole, CollisionPair, PhysicsWorld};
use crate::snapshot::{EntityView, PlaySnapshot};
use crate::tick::{Action, InputState, KeyBindings, TickConfig, RESTART_KEY};
use crate::SessionError;

/// Score when the project declares no numeric `score` variable.
pub const DEFAULT_SCORE: f64 = 0.0;

/// Lives when the project declares no numeric `lives` variable.
pub const DEFAULT_LIVES: f64 = 3.0;

/// Life lost per tick while the player overlaps a hazard.
pub const HAZARD_DAMAGE: f64 = 1.0;

// ---------------------------------------------------------------------------
// PlayState
// ---------------------------------------------------------------------------

/// Lifecycle of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    /// Created but not started.
    Uninitialized,
    Running,
    GameOver,
    Won,
    /// Stopped by the host. All simulation state has been released.
    Stopped,
}

impl PlayState {
    /// Whether a simulation exists in this state.
    pub fn is_active(self) -> bool {
        matches!(self, PlayState::Running | PlayState::GameOver | PlayState::Won)
    }
}

// ---------------------------------------------------------------------------
// PlaySession
// ---------------------------------------------------------------------------

/// A running game built from a frozen project snapshot.
#[derive(Debug)]
pub struct PlaySession {
    project: Arc<Project>,
    config: TickConfig,
    bindings: KeyBindings,
    state: PlayState,
    input: InputState,
    sim: Option<Simulation>,
    tick_count: u64,
    events: Vec<PlayEvent>,
}

impl PlaySession {
    /// Create a session for `project`. Nothing is simulated until
    /// [`start`](Self::start).
    pub fn new(project: Arc<Project>, config: TickConfig) -> Self {
        let bindings = KeyBindings::from_controls(&project.settings.controls);
        Self {
            project,
            config,
            bindings,
            state: PlayState::Uninitialized,
            input: InputState::default(),
            sim: None,
            tick_count: 0,
            events: Vec::new(),
        }
    }

    /// Build the simulation and enter [`PlayState::Running`].
    ///
    /// Starting a session that is already active is a no-op.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state.is_active() {
            tracing::debug!(state = ?self.state, "start ignored, session already active");
            return Ok(());
        }
        self.rebuild()?;
        tracing::info!(
            project = %self.project.meta.id,
            entities = self.entity_count(),
            dormant_rules = self.project.rules.len(),
            "play session started"
        );
        Ok(())
    }

    /// Throw the simulation away and rebuild it from the snapshot.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.rebuild()?;
        self.events.push(PlayEvent::Restarted);
        tracing::info!(project = %self.project.meta.id, "play session restarted");
        Ok(())
    }

    /// Release the physics world, entities and input state.
    pub fn stop(&mut self) {
        self.sim = None;
        self.input.clear();
        self.events.clear();
        self.state = PlayState::Stopped;
        tracing::info!(ticks = self.tick_count, "play session stopped");
    }

    fn rebuild(&mut self) -> Result<(), SessionError> {
        if !self.config.is_valid() {
            return Err(SessionError::InvalidTickConfig {
                dt: self.config.fixed_dt,
            });
        }
        let sim = Simulation::build(&self.project)?;
        self.sim = Some(sim);
        self.input.clear();
        self.events.clear();
        self.tick_count = 0;
        self.state = PlayState::Running;
        Ok(())
    }

    // -- Input ---------------------------------------------------------------

    pub fn key_down(&mut self, code: &str) {
        if self.state.is_active() {
            self.input.key_down(code);
        }
    }

    pub fn key_up(&mut self, code: &str) {
        self.input.key_up(code);
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    // -- Ticking -------------------------------------------------------------

    /// Advance one fixed step and return the events it produced.
    ///
    /// Does nothing before [`start`](Self::start) or after
    /// [`stop`](Self::stop).
    pub fn tick(&mut self) -> &[PlayEvent] {
        self.events.clear();
        let dt = self.config.fixed_dt;

        match self.state {
            PlayState::Running => {
                if let Some(sim) = self.sim.as_mut() {
                    sim.hud.flash.decay(dt);
                    if let Some(overlay) =
                        sim.step(dt, &self.bindings, &self.input, &mut self.events)
                    {
                        sim.hud.overlay = Some(overlay);
                        self.state = match overlay {
                            Overlay::GameOver => PlayState::GameOver,
                            Overlay::Won => PlayState::Won,
                        };
                        tracing::info!(
                            state = ?self.state,
                            score = sim.score,
                            lives = sim.lives,
                            tick = self.tick_count,
                            "game finished"
                        );
                    }
                }
            }
            PlayState::GameOver | PlayState::Won => {
                if let Some(sim) = self.sim.as_mut() {
                    sim.hud.flash.decay(dt);
                }
                if self.input.just_pressed(RESTART_KEY) {
                    if let Err(err) = self.restart() {
                        tracing::error!(error = %err, "restart failed");
                    }
                    return &self.events;
                }
            }
            PlayState::Uninitialized | PlayState::Stopped => return &self.events,
        }

        self.input.end_frame();
        self.tick_count += 1;
        &self.events
    }

    /// Run `count` ticks and return how many were executed.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut executed = 0;
        for _ in 0..count {
            if !self.state.is_active() {
                break;
            }
            self.tick();
            executed += 1;
        }
        executed
    }

    /// Events produced by the most recent tick.
    pub fn events(&self) -> &[PlayEvent] {
        &self.events
    }

    // -- Accessors -----------------------------------------------------------

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn is_headless(&self) -> bool {
        self.config.headless
    }

    /// Ticks since the last start or restart.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated seconds since the last start or restart.
    pub fn sim_time(&self) -> f64 {
        self.tick_count as f64 * self.config.fixed_dt
    }

    pub fn score(&self) -> f64 {
        self.sim.as_ref().map_or(DEFAULT_SCORE, |s| s.score)
    }

    pub fn lives(&self) -> f64 {
        self.sim.as_ref().map_or(DEFAULT_LIVES, |s| s.lives)
    }

    pub fn can_jump(&self) -> bool {
        self.sim.as_ref().is_some_and(|s| s.can_jump)
    }

    pub fn hud(&self) -> Option<&Hud> {
        self.sim.as_ref().map(|s| &s.hud)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.sim.as_ref().map(|s| &s.camera)
    }

    /// Live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.sim.iter().flat_map(|s| s.entities.values())
    }

    pub fn entity_count(&self) -> usize {
        self.sim.as_ref().map_or(0, |s| s.entities.len())
    }

    /// The live entity built from the authored object `object_id`.
    pub fn entity_by_object(&self, object_id: &str) -> Option<&Entity> {
        self.entities().find(|e| e.object_id == object_id)
    }

    pub fn player(&self) -> Option<&Entity> {
        let sim = self.sim.as_ref()?;
        sim.entities.get(&sim.player?)
    }

    pub fn physics(&self) -> Option<&PhysicsWorld> {
        self.sim.as_ref().map(|s| &s.physics)
    }

    /// Capture the observable state at the current tick boundary.
    pub fn snapshot(&self) -> PlaySnapshot {
        PlaySnapshot {
            tick: self.tick_count,
            state: self.state,
            score: self.score(),
            lives: self.lives(),
            can_jump: self.can_jump(),
            camera: self.camera().cloned(),
            entities: self.entities().map(EntityView::from).collect(),
        }
    }

    /// BLAKE3 hash of [`snapshot`](Self::snapshot).
    pub fn state_hash(&self) -> String {
        self.snapshot().state_hash()
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Everything that exists only while a game is being played.
#[derive(Debug)]
struct Simulation {
    physics: PhysicsWorld,
    entities: BTreeMap<EntityId, Entity>,
    player: Option<EntityId>,
    /// Authored top-left position of the player in the frozen scene.
    spawn: Option<(f64, f64)>,
    /// Level rectangle the player is kept inside.
    level: Rect,
    can_jump: bool,
    score: f64,
    lives: f64,
    hud: Hud,
    camera: Camera,
}

impl Simulation {
    fn build(project: &Project) -> Result<Self, SessionError> {
        let scene = project.scenes.first().ok_or(SessionError::NoScene)?;
        let settings = &project.settings;

        let mut physics = PhysicsWorld::new(settings.physics.gravity);
        let mut entities = BTreeMap::new();
        let mut player = None;

        for (index, object) in scene.objects.iter().enumerate() {
            let id = EntityId(index as u32);
            let entity = Entity::from_object(id, object);
            if entity.has_body() {
                physics.register_entity(id, &entity.rect, body_spec(&entity));
            }
            if player.is_none() && entity.object_type == ObjectType::Player {
                player = Some(id);
            }
            entities.insert(id, entity);
        }

        if player.is_none() {
            tracing::warn!(scene = %scene.id, "scene has no player; input and outcomes are inert");
        }

        let width = f64::from(settings.resolution.width);
        let height = f64::from(settings.resolution.height);
        let mut sim = Self {
            physics,
            entities,
            player,
            spawn: scene.first_player().map(|p| (p.x, p.y)),
            level: Rect::new(0.0, 0.0, width, height),
            can_jump: true,
            score: project.number_variable("score").unwrap_or(DEFAULT_SCORE),
            lives: project.number_variable("lives").unwrap_or(DEFAULT_LIVES),
            hud: Hud::new(settings),
            camera: Camera::new(&settings.camera, width, height),
        };
        sim.refresh_presentation();
        Ok(sim)
    }

    /// One running tick. Returns the overlay to show if the game ended.
    fn step(
        &mut self,
        dt: f64,
        bindings: &KeyBindings,
        input: &InputState,
        events: &mut Vec<PlayEvent>,
    ) -> Option<Overlay> {
        self.drive_player(bindings, input, events);

        let collisions = self.physics.step(dt);
        for state in self.physics.read_results() {
            if let Some(entity) = self.entities.get_mut(&state.id) {
                entity.rect.x = state.x;
                entity.rect.y = state.y;
            }
        }
        self.clamp_player();
        self.rearm_on_platform(&collisions);

        let outcome = self.resolve_overlaps(events);
        self.refresh_presentation();
        outcome
    }

    fn player_props(&self) -> PlayerProps {
        self.player
            .and_then(|id| self.entities.get(&id))
            .and_then(|e| match e.kind {
                ObjectKind::Player(props) => Some(props),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn drive_player(&mut self, bindings: &KeyBindings, input: &InputState, events: &mut Vec<PlayEvent>) {
        let Some(player) = self.player else { return };
        let props = self.player_props();

        let vx = if bindings.is_active(Action::MoveLeft, input) {
            -props.speed()
        } else if bindings.is_active(Action::MoveRight, input) {
            props.speed()
        } else {
            0.0
        };
        self.physics.set_velocity_x(player, vx);

        let grounded = self.physics.is_grounded(player);
        if bindings.is_active(Action::Jump, input) && self.can_jump && grounded {
            self.physics.set_velocity_y(player, -props.jump_force());
            self.can_jump = false;
            events.push(PlayEvent::Jumped);
        }
        // Resting re-arms the gate, including on the tick a jump started.
        if grounded {
            self.can_jump = true;
        }
    }

    fn clamp_player(&mut self) {
        let Some(player) = self.player else { return };
        let Some(entity) = self.entities.get_mut(&player) else {
            return;
        };
        let rect = entity.rect;
        let x = rect.x.clamp(self.level.x, (self.level.right() - rect.width).max(self.level.x));
        let y = rect.y.clamp(self.level.y, (self.level.bottom() - rect.height).max(self.level.y));
        if x == rect.x && y == rect.y {
            return;
        }
        self.physics.set_position(player, x, y);
        if x != rect.x {
            self.physics.set_velocity_x(player, 0.0);
        }
        if y != rect.y {
            self.physics.set_velocity_y(player, 0.0);
        }
        entity.rect.x = x;
        entity.rect.y = y;
    }

    fn rearm_on_platform(&mut self, collisions: &[CollisionPair]) {
        let Some(player) = self.player else { return };
        let hit_platform = collisions.iter().filter_map(|c| c.other(player)).any(|other| {
            self.entities
                .get(&other)
                .is_some_and(|e| e.object_type == ObjectType::Platform)
        });
        if hit_platform {
            self.can_jump = true;
        }
    }

    /// Apply collectible, goal, enemy and hazard overlaps in that order.
    fn resolve_overlaps(&mut self, events: &mut Vec<PlayEvent>) -> Option<Overlay> {
        let player = self.player?;
        let player_rect = self.entities.get(&player)?.rect;
        let touching: Vec<(EntityId, ObjectType)> = self
            .entities
            .values()
            .filter(|e| e.id != player && e.rect.overlaps(&player_rect))
            .map(|e| (e.id, e.object_type))
            .collect();

        for id in of_type(&touching, ObjectType::Collectible) {
            self.collect(id, events);
        }

        // Reaching the goal wins regardless of any damage taken this tick.
        if of_type(&touching, ObjectType::Goal).next().is_some() {
            events.push(PlayEvent::GoalReached);
            events.push(PlayEvent::Won);
            return Some(Overlay::Won);
        }

        for id in of_type(&touching, ObjectType::Enemy) {
            let Some(entity) = self.entities.get(&id) else { continue };
            let damage = match entity.kind {
                ObjectKind::Enemy(props) => props.damage(),
                _ => continue,
            };
            let object_id = entity.object_id.clone();
            self.lives -= damage;
            self.hud.flash.trigger();
            events.push(PlayEvent::EnemyHit {
                object_id,
                damage,
                lives: self.lives,
            });
            if self.lives <= 0.0 {
                events.push(PlayEvent::GameOver);
                return Some(Overlay::GameOver);
            }
            // Remaining overlaps are judged from the spawn point next tick.
            self.respawn(player, events);
            return None;
        }

        for id in of_type(&touching, ObjectType::Hazard) {
            let Some(entity) = self.entities.get(&id) else { continue };
            let object_id = entity.object_id.clone();
            self.lives -= HAZARD_DAMAGE;
            self.hud.flash.trigger();
            events.push(PlayEvent::HazardHit {
                object_id,
                lives: self.lives,
            });
            if self.lives <= 0.0 {
                events.push(PlayEvent::GameOver);
                return Some(Overlay::GameOver);
            }
        }

        None
    }

    fn collect(&mut self, id: EntityId, events: &mut Vec<PlayEvent>) {
        let Some(entity) = self.entities.remove(&id) else { return };
        self.physics.unregister_entity(id);
        let value = match entity.kind {
            ObjectKind::Collectible(props) => props.value(),
            _ => 0.0,
        };
        self.score += value;
        tracing::debug!(object_id = %entity.object_id, value, score = self.score, "collected");
        events.push(PlayEvent::Collected {
            object_id: entity.object_id,
            value,
            score: self.score,
        });
    }

    fn respawn(&mut self, player: EntityId, events: &mut Vec<PlayEvent>) {
        let Some((x, y)) = self.spawn else { return };
        self.physics.set_position(player, x, y);
        self.physics.set_velocity_x(player, 0.0);
        self.physics.set_velocity_y(player, 0.0);
        if let Some(entity) = self.entities.get_mut(&player) {
            entity.rect.x = x;
            entity.rect.y = y;
        }
        events.push(PlayEvent::Respawned { x, y });
    }

    fn refresh_presentation(&mut self) {
        for entity in self.entities.values_mut() {
            entity.sync_label();
        }
        if let Some(player) = self.player.and_then(|id| self.entities.get(&id)) {
            let (cx, cy) = player.rect.center();
            self.camera.follow(cx, cy);
        }
        self.hud.update(self.score, self.lives);
    }
}

fn of_type(
    touching: &[(EntityId, ObjectType)],
    wanted: ObjectType,
) -> impl Iterator<Item = EntityId> + '_ {
    touching
        .iter()
        .filter(move |(_, ty)| *ty == wanted)
        .map(|(id, _)| *id)
}

/// Physics treatment for an entity with a body.
fn body_spec(entity: &Entity) -> BodySpec {
    let is_player = entity.object_type == ObjectType::Player;
    let kind = match (entity.body.is_static, is_player) {
        (true, true) => BodyKind::Kinematic,
        (true, false) => BodyKind::Fixed,
        (false, _) => BodyKind::Dynamic,
    };
    let role = match entity.object_type {
        ObjectType::Player => ColliderRole::Player,
        ObjectType::Platform => ColliderRole::Platform,
        _ => ColliderRole::Inert,
    };
    BodySpec {
        kind,
        role,
        gravity: entity.body.gravity && !entity.body.is_static,
    }
}

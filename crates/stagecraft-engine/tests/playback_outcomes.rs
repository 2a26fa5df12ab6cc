//! End-to-end playback scenarios: outcomes, overlays, restart and
//! determinism, driven through the public session API.

use std::sync::Arc;

use chrono::TimeZone;
use stagecraft_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc.timestamp_millis_opt(0).unwrap()
}

/// Platformer settings with a single scene holding exactly `objects`.
fn level(objects: Vec<GameObject>, lives: f64) -> Arc<Project> {
    let mut project = default_project(Template::Platformer, epoch());
    project.scenes[0].objects = objects;
    project.variables.insert("lives".into(), Variable::Number(lives));
    Arc::new(project)
}

/// A player that floats: solid, dynamic, no gravity.
fn floating_player(x: f64, y: f64) -> GameObject {
    GameObject::new("player-1", ObjectType::Player, "Player", (x, y), (32.0, 48.0))
        .with_layer(1)
        .with_body(true, false, false)
}

fn coin(id: &str, x: f64, y: f64) -> GameObject {
    GameObject::new(id, ObjectType::Collectible, "Coin", (x, y), (24.0, 24.0))
        .with_kind(ObjectKind::Collectible(CollectibleProps { value: Some(10.0) }))
}

fn start(project: Arc<Project>) -> PlaySession {
    let mut session = PlaySession::new(project, TickConfig::headless());
    session.start().unwrap();
    session
}

/// Tick until `pred` matches an event or `limit` ticks pass. Returns the
/// matching event.
fn tick_until(
    session: &mut PlaySession,
    limit: u32,
    pred: impl Fn(&PlayEvent) -> bool,
) -> Option<PlayEvent> {
    for _ in 0..limit {
        if let Some(event) = session.tick().iter().find(|&e| pred(e)) {
            return Some(event.clone());
        }
    }
    None
}

fn entity_rects(session: &PlaySession) -> Vec<EntityView> {
    session.entities().map(EntityView::from).collect()
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[test]
fn collected_coin_stays_gone_after_enemy_respawn() {
    let enemy = GameObject::new("enemy-1", ObjectType::Enemy, "Enemy", (300.0, 400.0), (32.0, 32.0));
    let project = level(
        vec![floating_player(100.0, 400.0), coin("coin-1", 200.0, 400.0), enemy],
        3.0,
    );
    let mut session = start(project);
    session.key_down("ArrowRight");

    let collected = tick_until(&mut session, 120, |e| matches!(e, PlayEvent::Collected { .. }));
    assert_eq!(
        collected,
        Some(PlayEvent::Collected {
            object_id: "coin-1".into(),
            value: 10.0,
            score: 10.0
        })
    );
    assert!(session.entity_by_object("coin-1").is_none());

    let respawned = tick_until(&mut session, 120, |e| matches!(e, PlayEvent::Respawned { .. }));
    assert_eq!(respawned, Some(PlayEvent::Respawned { x: 100.0, y: 400.0 }));
    assert_eq!(session.lives(), 2.0);
    let player = session.player().unwrap();
    assert_eq!((player.rect.x, player.rect.y), (100.0, 400.0));
    assert!(session.hud().unwrap().flash.is_active());

    // Walk back across where the coin used to be.
    for _ in 0..40 {
        let events = session.tick();
        assert!(!events.iter().any(|e| matches!(e, PlayEvent::Collected { .. })));
    }
    assert_eq!(session.score(), 10.0);
    assert!(session.entity_by_object("coin-1").is_none());
    assert_eq!(session.hud().unwrap().score_text.as_deref(), Some("Score: 10"));
}

#[test]
fn hazard_game_over_freezes_every_position() {
    let hazard = GameObject::new("hazard-1", ObjectType::Hazard, "Spikes", (110.0, 410.0), (32.0, 32.0));
    let rock = GameObject::new("rock", ObjectType::Decoration, "Rock", (500.0, 0.0), (20.0, 20.0))
        .with_body(true, false, true);
    let mut session = start(level(vec![floating_player(100.0, 400.0), hazard, rock], 1.0));

    let events = session.tick().to_vec();
    assert_eq!(
        events,
        vec![
            PlayEvent::HazardHit {
                object_id: "hazard-1".into(),
                lives: 0.0
            },
            PlayEvent::GameOver
        ]
    );
    assert_eq!(session.state(), PlayState::GameOver);
    assert_eq!(
        session.hud().unwrap().overlay_text(),
        Some("GAME OVER\n\nPress SPACE to Restart")
    );

    let frozen = entity_rects(&session);
    session.key_down("ArrowRight");
    session.run_ticks(30);
    assert_eq!(session.state(), PlayState::GameOver);
    assert_eq!(entity_rects(&session), frozen);
    assert_eq!(session.lives(), 0.0);
}

#[test]
fn enemy_hit_on_last_life_ends_the_game_without_respawn() {
    let enemy = GameObject::new("enemy-1", ObjectType::Enemy, "Enemy", (110.0, 400.0), (32.0, 32.0));
    let mut session = start(level(vec![floating_player(100.0, 400.0), enemy], 1.0));

    let events = session.tick().to_vec();
    assert!(events.contains(&PlayEvent::GameOver));
    assert!(!events.iter().any(|e| matches!(e, PlayEvent::Respawned { .. })));
    assert_eq!(session.state(), PlayState::GameOver);
}

#[test]
fn goal_wins_with_one_life_and_no_score() {
    let goal = GameObject::new("goal-1", ObjectType::Goal, "Goal", (90.0, 380.0), (50.0, 100.0));
    let mut session = start(level(vec![floating_player(100.0, 400.0), goal], 1.0));

    assert_eq!(
        session.tick().to_vec(),
        vec![PlayEvent::GoalReached, PlayEvent::Won]
    );
    assert_eq!(session.state(), PlayState::Won);
    assert_eq!((session.lives(), session.score()), (1.0, 0.0));
    assert_eq!(
        session.hud().unwrap().overlay_text(),
        Some("YOU WIN!\n\nPress SPACE to Restart")
    );
}

#[test]
fn goal_is_checked_before_hazards() {
    let goal = GameObject::new("goal-1", ObjectType::Goal, "Goal", (90.0, 380.0), (50.0, 100.0));
    let hazard = GameObject::new("hazard-1", ObjectType::Hazard, "Spikes", (100.0, 420.0), (32.0, 32.0));
    let mut session = start(level(vec![floating_player(100.0, 400.0), hazard, goal], 1.0));

    session.tick();
    assert_eq!(session.state(), PlayState::Won);
    assert_eq!(session.lives(), 1.0);
}

#[test]
fn goal_wins_over_an_enemy_touched_on_the_same_tick() {
    for lives in [1.0, 3.0] {
        let goal = GameObject::new("goal-1", ObjectType::Goal, "Goal", (90.0, 380.0), (50.0, 100.0));
        let enemy = GameObject::new("enemy-1", ObjectType::Enemy, "Enemy", (110.0, 400.0), (32.0, 32.0));
        let mut session = start(level(vec![floating_player(100.0, 400.0), enemy, goal], lives));

        assert_eq!(
            session.tick().to_vec(),
            vec![PlayEvent::GoalReached, PlayEvent::Won],
            "lives = {lives}"
        );
        assert_eq!(session.state(), PlayState::Won);
        assert_eq!(session.lives(), lives);
    }
}

// ---------------------------------------------------------------------------
// Restart
// ---------------------------------------------------------------------------

#[test]
fn space_restarts_only_on_a_fresh_press() {
    let goal = GameObject::new("goal-1", ObjectType::Goal, "Goal", (300.0, 380.0), (50.0, 100.0));
    let mut session = start(level(vec![floating_player(100.0, 400.0), coin("coin-1", 150.0, 400.0), goal], 1.0));

    // Space is held from the start and also bound to jump.
    session.key_down("Space");
    session.key_down("ArrowRight");
    let won = tick_until(&mut session, 200, |e| *e == PlayEvent::Won);
    assert!(won.is_some());
    assert_eq!(session.score(), 10.0);

    session.run_ticks(5);
    assert_eq!(session.state(), PlayState::Won, "held key is not a fresh press");

    session.key_up("Space");
    session.key_down("Space");
    assert_eq!(session.tick().to_vec(), vec![PlayEvent::Restarted]);
    assert_eq!(session.state(), PlayState::Running);
    assert_eq!(session.tick_count(), 0);
    assert_eq!(session.score(), 0.0);
    assert!(session.entity_by_object("coin-1").is_some());
    assert_eq!(session.player().unwrap().rect.x, 100.0);
    assert!(session.hud().unwrap().overlay.is_none());
}

#[test]
fn restarted_session_matches_a_fresh_one() {
    let project = default_project(Template::Platformer, epoch());
    let project = Arc::new(project);
    let fresh = start(project.clone());

    let mut replayed = start(project);
    replayed.key_down("ArrowRight");
    replayed.run_ticks(45);
    replayed.restart().unwrap();
    assert_eq!(replayed.events(), &[PlayEvent::Restarted]);

    assert_eq!(replayed.state_hash(), fresh.state_hash());
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

#[test]
fn default_level_player_lands_on_ground_then_jumps() {
    let project = Arc::new(default_project(Template::Platformer, epoch()));
    let mut session = start(project);

    session.run_ticks(120);
    let landed_y = session.player().unwrap().rect.y;
    assert!(
        (landed_y - 502.0).abs() < 2.0,
        "player should rest on the ground at y=502, got {landed_y}"
    );
    assert!(session.physics().unwrap().is_grounded(EntityId(1)));
    assert!(session.can_jump());

    session.key_down("ArrowUp");
    let jumped = tick_until(&mut session, 5, |e| *e == PlayEvent::Jumped);
    assert!(jumped.is_some());
    session.key_up("ArrowUp");
    session.run_ticks(10);
    let peak_y = session.player().unwrap().rect.y;
    assert!(peak_y < landed_y - 40.0, "jump should rise, {landed_y} -> {peak_y}");
}

#[test]
fn player_is_clamped_to_the_level() {
    let mut session = start(level(vec![floating_player(20.0, 100.0)], 3.0));
    session.key_down("ArrowLeft");
    session.run_ticks(30);

    let player = session.player().unwrap();
    assert_eq!(player.rect.x, 0.0);
    let (vx, _) = session.physics().unwrap().velocity(player.id).unwrap();
    assert_eq!(vx, 0.0, "clamped axis loses its velocity");
}

#[test]
fn labels_follow_their_entities() {
    let mut session = start(level(vec![floating_player(100.0, 100.0)], 3.0));
    session.key_down("KeyD");
    session.run_ticks(12);
    let player = session.player().unwrap();
    let (cx, cy) = player.rect.center();
    assert_eq!((player.label.x, player.label.y), (cx, cy));
    assert!(player.rect.x > 130.0);
}

// ---------------------------------------------------------------------------
// Snapshot isolation and determinism
// ---------------------------------------------------------------------------

#[test]
fn editing_after_start_does_not_reach_the_session() {
    let mut editor = EditorSession::open(MemoryStorage::new(), StoreConfig::default());
    let frozen = editor.frozen_snapshot().unwrap();
    let session = start(frozen);

    editor.store_mut().delete_object("collectible-1");
    editor
        .store_mut()
        .update_object("player-1", &ObjectPatch::position(0.0, 0.0));

    assert!(session.entity_by_object("collectible-1").is_some());
    assert_eq!(session.player().unwrap().rect.x, 100.0);
    assert!(session.project().object("collectible-1").is_some());
}

#[test]
fn identical_input_gives_identical_hashes() {
    let script = |session: &mut PlaySession| -> Vec<String> {
        let mut hashes = Vec::new();
        for tick in 0..240u32 {
            match tick {
                10 => session.key_down("ArrowRight"),
                70 => session.key_down("Space"),
                75 => session.key_up("Space"),
                150 => session.key_up("ArrowRight"),
                160 => session.key_down("ArrowLeft"),
                _ => {}
            }
            session.tick();
            if tick % 20 == 0 {
                hashes.push(session.state_hash());
            }
        }
        hashes
    };

    let project = Arc::new(default_project(Template::Platformer, epoch()));
    let mut a = start(project.clone());
    let mut b = start(project);
    assert_eq!(script(&mut a), script(&mut b));
    assert_eq!(a.snapshot(), b.snapshot());
}

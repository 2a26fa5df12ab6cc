//! Property tests for playback: arbitrary key sequences never push the
//! player out of the level, and replaying the same sequence is deterministic.

use std::sync::Arc;

use chrono::TimeZone;
use proptest::prelude::*;
use stagecraft_engine::prelude::*;

const KEYS: [&str; 6] = ["ArrowLeft", "ArrowRight", "ArrowUp", "Space", "KeyA", "KeyD"];

#[derive(Debug, Clone)]
enum InputOp {
    Down(usize),
    Up(usize),
    Wait(u8),
}

fn input_op_strategy() -> impl Strategy<Value = InputOp> {
    prop_oneof![
        (0..KEYS.len()).prop_map(InputOp::Down),
        (0..KEYS.len()).prop_map(InputOp::Up),
        (1..20u8).prop_map(InputOp::Wait),
    ]
}

fn platformer() -> Arc<Project> {
    let created = chrono::Utc.timestamp_millis_opt(0).unwrap();
    Arc::new(default_project(Template::Platformer, created))
}

fn play(project: Arc<Project>, ops: &[InputOp]) -> PlaySession {
    let mut session = PlaySession::new(project, TickConfig::headless());
    session.start().unwrap();
    for op in ops {
        match *op {
            InputOp::Down(k) => session.key_down(KEYS[k]),
            InputOp::Up(k) => session.key_up(KEYS[k]),
            InputOp::Wait(n) => {
                session.run_ticks(u64::from(n));
            }
        }
    }
    session
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn player_stays_inside_the_level(ops in prop::collection::vec(input_op_strategy(), 1..40)) {
        let project = platformer();
        let width = f64::from(project.settings.resolution.width);
        let height = f64::from(project.settings.resolution.height);
        let mut session = PlaySession::new(project, TickConfig::headless());
        session.start().unwrap();

        for op in &ops {
            match *op {
                InputOp::Down(k) => session.key_down(KEYS[k]),
                InputOp::Up(k) => session.key_up(KEYS[k]),
                InputOp::Wait(n) => {
                    for _ in 0..n {
                        session.tick();
                        if let Some(player) = session.player() {
                            prop_assert!(player.rect.x >= 0.0);
                            prop_assert!(player.rect.y >= 0.0);
                            prop_assert!(player.rect.right() <= width + 1e-6);
                            prop_assert!(player.rect.bottom() <= height + 1e-6);
                        }
                    }
                }
            }
        }
        prop_assert!(session.state().is_active());
    }

    #[test]
    fn same_input_same_hash(ops in prop::collection::vec(input_op_strategy(), 1..30)) {
        let project = platformer();
        let a = play(project.clone(), &ops);
        let b = play(project, &ops);
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a.score(), b.score());
    }
}

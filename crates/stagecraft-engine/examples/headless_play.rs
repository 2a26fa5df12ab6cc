//! Headless playthrough of the default platformer level.
//!
//! Opens an editor session on in-memory storage, freezes the project, and
//! plays it for a few seconds with scripted input: walk right, hop onto the
//! first platform, keep walking until the coin and goal are reached.
//!
//! Run with:
//!   cargo run --example headless_play -p stagecraft-engine
//!
//! Set `RUST_LOG=stagecraft_engine=debug` to see per-event logging.

use anyhow::Context;
use stagecraft_engine::prelude::*;

/// Scripted key transitions: (tick, key, pressed).
const SCRIPT: &[(u64, &str, bool)] = &[
    (30, "ArrowRight", true),
    (45, "ArrowUp", true),
    (52, "ArrowUp", false),
    (140, "ArrowUp", true),
    (146, "ArrowUp", false),
];

const MAX_TICKS: u64 = 60 * 8;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let editor = EditorSession::open(MemoryStorage::new(), StoreConfig::from_env());
    let project = editor
        .frozen_snapshot()
        .context("editor session has no project to play")?;
    println!(
        "playing '{}' ({} objects, {} rules)",
        project.meta.title,
        project.object_count(),
        project.rules.len()
    );

    let mut session = PlaySession::new(project, TickConfig::headless());
    session.start().context("failed to start play session")?;

    let mut script = SCRIPT.iter().peekable();
    for tick in 0..MAX_TICKS {
        while let Some(&&(at, key, pressed)) = script.peek() {
            if at != tick {
                break;
            }
            if pressed {
                session.key_down(key);
            } else {
                session.key_up(key);
            }
            script.next();
        }

        for event in session.tick() {
            println!("[{tick:>4}] {}", serde_json::to_string(event)?);
        }
        if session.state() != PlayState::Running {
            break;
        }
    }

    let hud = session.hud().context("session has no HUD")?;
    println!("state:  {:?}", session.state());
    println!("time:   {:.2}s", session.sim_time());
    if let Some(score) = &hud.score_text {
        println!("{score}");
    }
    if let Some(lives) = &hud.lives_text {
        println!("{lives}");
    }
    if let Some(text) = hud.overlay_text() {
        println!("{}", text.replace("\n\n", " | "));
    }
    println!("hash:   {}", session.state_hash());

    session.stop();
    Ok(())
}

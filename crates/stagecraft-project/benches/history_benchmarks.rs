//! History and store throughput.
//!
//! Every commit deep-copies and hashes the whole project, so commit cost
//! scales with object count. These benchmarks track that cost for levels
//! from a handful of objects up to a few thousand.
//!
//! Run with: `cargo bench --bench history_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stagecraft_project::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A platformer project padded with `extra` enemies in the first scene.
fn project_with_objects(extra: usize) -> Project {
    let mut project = default_project(Template::Platformer, chrono::Utc::now());
    let scene = &mut project.scenes[0];
    for i in 0..extra {
        scene.objects.push(GameObject::new(
            format!("enemy-{i}"),
            ObjectType::Enemy,
            "Enemy",
            ((i % 25) as f64 * 32.0, (i / 25) as f64 * 32.0),
            (32.0, 32.0),
        ));
    }
    project
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_history_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_commit");
    for count in [10usize, 100, 1_000, 5_000] {
        let project = project_with_objects(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &project, |b, project| {
            let mut history = History::default();
            b.iter(|| history.commit(black_box(project)));
        });
    }
    group.finish();
}

fn bench_undo_redo_cycle(c: &mut Criterion) {
    let project = project_with_objects(1_000);
    let mut history = History::default();
    for _ in 0..DEPTH {
        history.commit(&project);
    }

    c.bench_function("undo_redo_cycle_1k", |b| {
        b.iter(|| {
            black_box(history.undo());
            black_box(history.redo());
        });
    });
}

const DEPTH: usize = 50;

fn bench_drag_gesture(c: &mut Criterion) {
    c.bench_function("drag_60_moves_then_commit", |b| {
        let mut store = DocumentStore::default();
        store
            .load_project(project_with_objects(500))
            .expect("generated project is valid");
        store.select_object(Some("player-1"));

        b.iter(|| {
            for step in 0..60 {
                store.update_object(
                    "player-1",
                    &ObjectPatch::position(100.0 + step as f64, 400.0),
                );
            }
            store.save_to_history();
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_history_commit,
    bench_undo_redo_cycle,
    bench_drag_gesture,
);
criterion_main!(benches);

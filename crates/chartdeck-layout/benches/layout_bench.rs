//! Benchmarks for layout operations.
//!
//! Run with: cargo bench -p chartdeck-layout

use std::hint::black_box;

use chartdeck_layout::{LayoutEngine, LayoutState, PaneUpdate, PlacementPolicy, SyncSettings};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

fn grown_state(engine: &LayoutEngine, panes: usize) -> LayoutState {
    let mut state = engine.initial_state("single", "600519");
    for _ in 1..panes {
        if let Some(next) = engine.add_pane(&state).into_state() {
            state = next;
        }
    }
    state
}

fn bench_add_pane(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/add_pane");

    for policy in [PlacementPolicy::OriginOnly, PlacementPolicy::SpanAware] {
        let engine = LayoutEngine::default().with_placement_policy(policy);
        for n in [4, 16, 64] {
            let state = grown_state(&engine, n);
            group.bench_with_input(
                BenchmarkId::new(format!("{policy:?}"), n),
                &state,
                |b, state| b.iter(|| black_box(engine.add_pane(state))),
            );
        }
    }

    group.finish();
}

fn bench_apply_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/apply_template");
    let engine = LayoutEngine::default();
    let state = engine.initial_state("single", "600519");

    for id in ["single", "quad", "nine-grid", "bloomberg-pro"] {
        group.bench_with_input(BenchmarkId::from_parameter(id), &id, |b, id| {
            b.iter(|| black_box(engine.apply_template(&state, id, "600519")))
        });
    }

    group.finish();
}

fn bench_group_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/propagation");
    let engine = LayoutEngine::default();

    for n in [4, 16, 64] {
        let state = grown_state(&engine, n);
        let ids: Vec<_> = state.pane_ids().collect();
        let Some(state) = engine
            .create_sync_group(&state, "all", ids.iter().copied(), SyncSettings::ALL)
            .into_state()
        else {
            continue;
        };
        let origin = ids[0];
        group.bench_with_input(BenchmarkId::new("symbol", n), &state, |b, state| {
            b.iter_batched(
                || PaneUpdate::symbol("000001"),
                |update| black_box(engine.update_pane(state, origin, update)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add_pane,
    bench_apply_template,
    bench_group_propagation,
);

criterion_main!(benches);

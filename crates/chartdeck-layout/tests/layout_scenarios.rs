//! End-to-end layout scenarios against the built-in catalog, plus the
//! structured tracing contract of the engine.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chartdeck_layout::{
    ChartType, GlobalSync, GridSize, IndicatorSet, LayoutEngine, LayoutState, NoOpReason, PaneId,
    PanePosition, PaneUpdate, SyncGroupId, SyncSettings, TemplateCatalog, TimeRange, ZoomLevel,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

fn engine() -> LayoutEngine {
    LayoutEngine::new(Arc::new(TemplateCatalog::builtin()))
}

fn applied(outcome: chartdeck_layout::LayoutOutcome) -> LayoutState {
    match outcome.into_state() {
        Some(state) => state,
        None => panic!("operation was expected to apply"),
    }
}

#[test]
fn quad_with_default_symbol() {
    let state = engine().initial_state("quad", "600519");
    assert_eq!(state.grid_size, GridSize { rows: 2, cols: 2 });
    assert_eq!(state.panes.len(), 4);
    assert!(state.panes.iter().all(|p| p.symbol == "600519"));
    let types: Vec<_> = state.panes.iter().map(|p| p.chart_type).collect();
    assert_eq!(
        types,
        vec![
            ChartType::Candlestick,
            ChartType::Candlestick,
            ChartType::Level2,
            ChartType::Line,
        ]
    );
    let ids: BTreeSet<_> = state.pane_ids().collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn every_builtin_template_is_contained() {
    let engine = engine();
    for template in engine.catalog().iter() {
        let state = engine.initial_state(&template.id, "600519");
        assert_eq!(state.grid_size, template.grid_size, "{}", template.id);
        assert_eq!(state.panes.len(), template.panes.len());
        for pane in state.panes.iter().filter(|p| !p.is_maximized) {
            assert!(
                state.grid_size.contains(pane.position, pane.size),
                "{} pane {} escapes the grid",
                template.id,
                pane.id
            );
        }
    }
    assert!(engine.catalog().audit().is_clean());
}

#[test]
fn same_template_twice_matches_blueprints_with_fresh_ids() {
    let engine = engine();
    let first = engine.initial_state("bloomberg-pro", "600519");
    let second = applied(engine.apply_template(&first, "bloomberg-pro", "600519"));
    assert_eq!(first.grid_size, second.grid_size);
    let first_ids: BTreeSet<_> = first.pane_ids().collect();
    for (a, b) in first.panes.iter().zip(&second.panes) {
        assert!(!first_ids.contains(&b.id));
        assert_eq!(a.title, b.title);
        assert_eq!(a.chart_type, b.chart_type);
        assert_eq!(a.time_frame, b.time_frame);
        assert_eq!(a.indicators, b.indicators);
        assert_eq!((a.position, a.size), (b.position, b.size));
    }
}

#[test]
fn single_plus_three_adds_forms_a_row() {
    let engine = engine();
    let mut state = engine.initial_state("single", "600519");
    for _ in 0..3 {
        state = applied(engine.add_pane(&state));
    }
    assert_eq!(state.grid_size, GridSize { rows: 1, cols: 4 });
    let origins: Vec<_> = state.panes.iter().map(|p| p.position).collect();
    assert_eq!(
        origins,
        (0..4).map(|col| PanePosition::new(0, col)).collect::<Vec<_>>()
    );
}

#[test]
fn grouped_symbol_change_reaches_the_group_only() {
    let engine = engine();
    let state = engine.initial_state("quad", "600519");
    let ids: Vec<_> = state.pane_ids().collect();
    let state = applied(engine.create_sync_group(
        &state,
        "left column",
        [ids[0], ids[1], ids[2]],
        SyncSettings::default(),
    ));
    let state = applied(engine.update_pane(&state, ids[0], PaneUpdate::symbol("000001")));
    for id in &ids[..3] {
        assert_eq!(state.pane(*id).unwrap().symbol, "000001");
    }
    assert_eq!(state.pane(ids[3]).unwrap().symbol, "600519");
}

#[test]
fn every_shared_axis_propagates() {
    let engine = engine();
    let state = engine.initial_state("horizontal-split", "600519");
    let [a, b] = [state.panes[0].id, state.panes[1].id];
    let state = applied(engine.create_sync_group(&state, "pair", [a, b], SyncSettings::ALL));

    let range = TimeRange::new(1_000, 5_000).unwrap();
    let indicators: IndicatorSet = ["BOLL", "RSI"].into_iter().collect();
    let update = PaneUpdate {
        time_range: Some(range),
        zoom: Some(ZoomLevel::new(300)),
        indicators: Some(indicators.clone()),
        ..PaneUpdate::default()
    };
    let state = applied(engine.update_pane(&state, b, update));
    let receiver = state.pane(a).unwrap();
    assert_eq!(receiver.time_range, Some(range));
    assert_eq!(receiver.zoom.percent(), 300);
    assert_eq!(receiver.indicators, indicators);
}

#[test]
fn propagation_is_not_transitive_across_groups() {
    let engine = engine();
    let state = engine.initial_state("six-pack", "600519");
    let ids: Vec<_> = state.pane_ids().collect();
    let state = applied(engine.create_sync_group(&state, "ab", [ids[0], ids[1]], SyncSettings::ALL));
    let state = applied(engine.create_sync_group(&state, "bc", [ids[1], ids[2]], SyncSettings::ALL));
    let state = applied(engine.update_pane(&state, ids[0], PaneUpdate::symbol("AAPL")));
    assert_eq!(state.pane(ids[1]).unwrap().symbol, "AAPL");
    assert_eq!(state.pane(ids[2]).unwrap().symbol, "600519");
}

#[test]
fn global_symbol_sync_toggle() {
    let engine = engine();
    let state = engine.initial_state("quad", "600519");
    let blocked = engine.sync_symbol_to_all(&state, "TSLA", None);
    assert!(matches!(
        blocked.reason(),
        Some(NoOpReason::GlobalSyncDisabled { .. })
    ));

    let state = applied(engine.set_global_sync(
        &state,
        GlobalSync {
            enabled: true,
            sync_symbol: true,
            ..GlobalSync::default()
        },
    ));
    let state = applied(engine.sync_symbol_to_all(&state, "TSLA", Some(state.panes[0].id)));
    assert!(state.panes.iter().all(|p| p.symbol == "TSLA"));
}

#[test]
fn maximize_twice_restores_placement() {
    let engine = engine();
    let state = engine.initial_state("bloomberg-pro", "600519");
    for pane in &state.panes {
        let once = applied(engine.toggle_pane_maximize(&state, pane.id));
        let twice = applied(engine.toggle_pane_maximize(&once, pane.id));
        let restored = twice.pane(pane.id).unwrap();
        assert_eq!((restored.position, restored.size), (pane.position, pane.size));
        assert!(!restored.is_maximized);
    }
}

#[test]
fn unknown_ids_leave_state_deep_equal() {
    let engine = engine();
    let state = engine.initial_state("quad", "600519");
    let ghost = PaneId::new(4_242).unwrap();
    let ghost_group = SyncGroupId::new(77).unwrap();
    let outcomes = [
        engine.remove_pane(&state, ghost),
        engine.update_pane(&state, ghost, PaneUpdate::symbol("X")),
        engine.toggle_pane_maximize(&state, ghost),
        engine.toggle_pane_minimize(&state, ghost),
        engine.set_master_pane(&state, Some(ghost)),
        engine.remove_sync_group(&state, ghost_group),
        engine.join_sync_group(&state, ghost_group, state.panes[0].id),
        engine.set_sync_settings(&state, ghost_group, SyncSettings::ALL),
        engine.create_sync_group(&state, "ghosts", [ghost], SyncSettings::ALL),
        engine.apply_template(&state, "does-not-exist", "600519"),
    ];
    for outcome in outcomes {
        assert!(!outcome.is_applied(), "{:?} should be a no-op", outcome.kind());
    }
    let before = state.clone();
    let _ = engine.remove_pane(&state, ghost);
    assert_eq!(state, before);
}

#[test]
fn json_catalog_drives_the_engine() {
    let json = r#"[{
        "id": "wide",
        "name": "Wide",
        "description": "one wide chart over two small ones",
        "grid_size": {"rows": 2, "cols": 2},
        "category": "custom",
        "panes": [
            {"title": "Top", "chart_type": "area", "time_frame": "1h",
             "position": {"row": 0, "col": 0}, "size": {"rows": 1, "cols": 2}},
            {"title": "Left", "chart_type": "line", "time_frame": "5m",
             "position": {"row": 1, "col": 0}},
            {"title": "Book", "chart_type": "level2", "time_frame": "1m",
             "position": {"row": 1, "col": 1}, "sync_enabled": true}
        ]
    }]"#;
    let catalog = TemplateCatalog::from_json_str(json).unwrap();
    let engine = LayoutEngine::new(Arc::new(catalog));
    let state = engine.initial_state("wide", "AAPL");
    assert_eq!(state.panes.len(), 3);
    assert_eq!(state.panes[0].chart_type, ChartType::Area);
    assert!(state.panes[2].sync_enabled);
    assert!(state.validate().is_ok());
}

// ============================================================================
// Tracing capture
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    events.lock().unwrap().clone()
}

#[test]
fn applied_and_ignored_operations_are_traced() {
    let engine = engine();
    let state = engine.initial_state("single", "600519");
    let ghost = PaneId::new(9_999).unwrap();

    let events = with_captured_events(|| {
        let _ = engine.add_pane(&state);
        let _ = engine.remove_pane(&state, ghost);
    });
    let layout: Vec<_> = events
        .iter()
        .filter(|e| e.target == "chartdeck.layout")
        .collect();
    assert_eq!(layout.len(), 2);

    let add = layout[0];
    assert_eq!(add.fields.get("op").map(String::as_str), Some("add_pane"));
    assert_eq!(add.fields.get("touched").map(String::as_str), Some("1"));
    assert!(add.fields.contains_key("before_hash"));
    assert!(add.fields.contains_key("after_hash"));

    let ignored = layout[1];
    assert_eq!(ignored.fields.get("op").map(String::as_str), Some("remove_pane"));
    assert_eq!(
        ignored.fields.get("reason").map(String::as_str),
        Some("unknown pane-9999")
    );
}
